//! Draggable-element behavior over an abstract document host.
//!
//! A [`Draggable`] turns pointer and touch input into constrained, optionally
//! inertial movement of one element. Everything it needs from the document
//! goes through the capability traits in [`host`]; [`headless::HeadlessDom`]
//! implements them in memory.

pub mod draggable;
pub mod geometry;
pub mod headless;
pub mod host;
pub mod notify;
pub mod options;
pub mod position;
pub mod scene;
pub mod session;
pub mod timers;
pub mod tracker;

pub use draggable::{DragState, Draggable};
pub use geometry::{Limits, Point, Rect, Sides};
pub use host::{ElementId, Host, PointerEvent, PointerKind};
pub use notify::{Notice, NoticeKind};
pub use options::{Axis, OptionError, Options, PinValue, RepeatValue, ThresholdValue, Within};

//! Capabilities a draggable needs from the surrounding document, and the
//! input events it consumes.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Sides};

/// Opaque handle to a document element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u32);

/// Identity of a bound draggable instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct InstanceId(pub u32);

/// Element lookup and instance bindings.
pub trait Dom {
    fn root(&self) -> ElementId;
    fn parent(&self, el: ElementId) -> Option<ElementId>;
    fn is_attached(&self, el: ElementId) -> bool;
    /// First element matching `selector` in document order.
    fn query(&self, selector: &str) -> Option<ElementId>;
    /// Nearest inclusive ancestor of `from` matching `selector`.
    fn closest(&self, from: ElementId, selector: &str) -> Option<ElementId>;

    fn binding(&self, el: ElementId) -> Option<InstanceId>;
    /// Returns a fresh id for `el`.
    fn bind(&self, el: ElementId) -> InstanceId;
    fn unbind(&self, el: ElementId);
}

/// Read-only layout measurements.
pub trait Layout {
    /// Border box relative to the page.
    fn offsets(&self, el: ElementId) -> Rect;
    fn paddings(&self, el: ElementId) -> Sides;
    fn page_scroll(&self) -> Point;
    /// Inline `transform` style, empty when unset.
    fn transform(&self, el: ElementId) -> String;
}

/// Style mutations.
pub trait Styles {
    fn set_transform(&self, el: ElementId, transform: &str);
    fn set_transition(&self, el: ElementId, transition: Option<&str>);
    fn set_selectable(&self, el: ElementId, selectable: bool);
    fn set_cursor(&self, el: ElementId, cursor: Option<&str>);
}

/// Bubbling DOM event dispatch.
pub trait Dispatch {
    fn dispatch(&self, el: ElementId, name: &str);
}

pub trait Attributes {
    fn attribute(&self, el: ElementId, name: &str) -> Option<String>;
}

pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Everything a draggable instance talks to.
pub trait Host: Dom + Layout + Styles + Dispatch + Attributes + Clock {}

impl<T: Dom + Layout + Styles + Dispatch + Attributes + Clock> Host for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Leave,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
}

/// A mouse or touch event as delivered by the host event loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub target: ElementId,
    /// Viewport coordinates of the pointer.
    pub client: Point,
    /// Pointer position inside `target`, when the platform reports it.
    pub offset: Option<Point>,
    /// Active touch points on the target, first one wins.
    pub touches: Vec<Point>,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, target: ElementId, client: Point) -> Self {
        Self {
            kind,
            target,
            client,
            offset: None,
            touches: Vec::new(),
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_offset(mut self, offset: Point) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_touches(mut self, touches: Vec<Point>) -> Self {
        self.touches = touches;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Pointer coordinates, preferring the first active touch.
    pub fn client_point(&self) -> Point {
        self.touches.first().copied().unwrap_or(self.client)
    }
}

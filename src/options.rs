//! Draggable options: raw overrides, attribute parsing and normalization.
//!
//! Every option goes through the same pipeline: a raw value (caller override,
//! then element attribute, then default) is normalized by its setter into the
//! [`Config`] field the state machine reads.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use thiserror::Error;

use crate::host::ElementId;

pub const DEFAULT_VELOCITY: f64 = 2000.0;
pub const DEFAULT_PRECISION: f64 = 1.0;
pub const DEFAULT_SNIPER_SPEED: f64 = 0.15;

#[derive(Debug, Error, PartialEq)]
pub enum OptionError {
    #[error("pin must have 2 or 4 components, got {0}")]
    PinLength(usize),
    #[error("option '{name}' must be a finite number, got {value}")]
    InvalidNumber { name: &'static str, value: f64 },
    #[error("attribute '{name}' has invalid value '{value}': {reason}")]
    InvalidAttribute {
        name: &'static str,
        value: String,
        reason: String,
    },
}

// ---------- within ----------

/// Reference to the restricting container.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "RawWithin")]
pub enum Within {
    /// The element's parent node.
    #[default]
    Parent,
    /// No container: limits stay wide open.
    None,
    Element(ElementId),
    /// Document-wide selector lookup.
    Selector(String),
    /// Nearest ancestor matching the selector.
    Closest(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawWithin {
    Flag(bool),
    Name(String),
}

impl From<RawWithin> for Within {
    fn from(raw: RawWithin) -> Self {
        match raw {
            RawWithin::Flag(true) => Within::Parent,
            RawWithin::Flag(false) => Within::None,
            RawWithin::Name(s) => Within::parse(&s),
        }
    }
}

impl Within {
    /// `""`/`parent` → parent, `none` → no container, `closest <sel>` → ancestor
    /// lookup, anything else is a selector.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s {
            "" | "parent" => Within::Parent,
            "none" | "false" => Within::None,
            _ => match s.strip_prefix("closest ") {
                Some(sel) => Within::Closest(sel.trim().to_string()),
                None => Within::Selector(s.to_string()),
            },
        }
    }
}

// ---------- pin ----------

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "RawPin")]
pub enum PinValue {
    /// Falsy input: the element's own box, measured at read time.
    #[default]
    Auto,
    Uniform(f64),
    Seq(Vec<f64>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPin {
    Flag(bool),
    Number(f64),
    Seq(Vec<f64>),
}

impl From<RawPin> for PinValue {
    fn from(raw: RawPin) -> Self {
        match raw {
            RawPin::Flag(_) => PinValue::Auto,
            RawPin::Number(n) => PinValue::Uniform(n),
            RawPin::Seq(v) => PinValue::Seq(v),
        }
    }
}

impl From<f64> for PinValue {
    fn from(v: f64) -> Self {
        PinValue::Uniform(v)
    }
}

impl From<[f64; 2]> for PinValue {
    fn from(v: [f64; 2]) -> Self {
        PinValue::Seq(v.to_vec())
    }
}

impl From<[f64; 4]> for PinValue {
    fn from(v: [f64; 4]) -> Self {
        PinValue::Seq(v.to_vec())
    }
}

/// Expand a pin into `[left, top, right, bottom]`; `None` means "use the
/// element's own size".
pub fn normalize_pin(value: &PinValue) -> Result<Option<[f64; 4]>, OptionError> {
    match value {
        PinValue::Auto => Ok(None),
        PinValue::Uniform(n) => Ok(Some([*n; 4])),
        PinValue::Seq(v) => match v.as_slice() {
            [x, y] => Ok(Some([*x, *y, *x, *y])),
            [l, t, r, b] => Ok(Some([*l, *t, *r, *b])),
            other => Err(OptionError::PinLength(other.len())),
        },
    }
}

// ---------- threshold ----------

pub type ThresholdFn = Rc<dyn Fn() -> [f64; 4]>;

#[derive(Clone, Deserialize)]
#[serde(from = "RawThreshold")]
pub enum ThresholdValue {
    Scalar(f64),
    Seq(Vec<f64>),
    Dynamic(ThresholdFn),
    /// Unrecognized input; normalizes to a zero rectangle.
    Other,
}

impl Default for ThresholdValue {
    fn default() -> Self {
        ThresholdValue::Scalar(0.0)
    }
}

impl fmt::Debug for ThresholdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdValue::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            ThresholdValue::Seq(v) => f.debug_tuple("Seq").field(v).finish(),
            ThresholdValue::Dynamic(_) => f.write_str("Dynamic(..)"),
            ThresholdValue::Other => f.write_str("Other"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawThreshold {
    Number(f64),
    Seq(Vec<f64>),
    Other(IgnoredAny),
}

impl From<RawThreshold> for ThresholdValue {
    fn from(raw: RawThreshold) -> Self {
        match raw {
            RawThreshold::Number(n) => ThresholdValue::Scalar(n),
            RawThreshold::Seq(v) => ThresholdValue::Seq(v),
            RawThreshold::Other(_) => ThresholdValue::Other,
        }
    }
}

impl From<f64> for ThresholdValue {
    fn from(v: f64) -> Self {
        ThresholdValue::Scalar(v)
    }
}

impl From<[f64; 2]> for ThresholdValue {
    fn from(v: [f64; 2]) -> Self {
        ThresholdValue::Seq(v.to_vec())
    }
}

impl From<[f64; 4]> for ThresholdValue {
    fn from(v: [f64; 4]) -> Self {
        ThresholdValue::Seq(v.to_vec())
    }
}

/// Normalized dead zone `[x1, y1, x2, y2]` around the pointer-down point.
#[derive(Clone)]
pub enum Threshold {
    Rect([f64; 4]),
    Dynamic(ThresholdFn),
}

impl fmt::Debug for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Rect(r) => f.debug_tuple("Rect").field(r).finish(),
            Threshold::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl Threshold {
    /// Current rectangle; dynamic thresholds are evaluated on every read.
    pub fn rect(&self) -> [f64; 4] {
        match self {
            Threshold::Rect(r) => *r,
            Threshold::Dynamic(f) => f(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.rect().iter().all(|v| *v == 0.0)
    }
}

pub fn normalize_threshold(value: &ThresholdValue) -> Threshold {
    match value {
        ThresholdValue::Scalar(v) => Threshold::Rect([-v * 0.5, -v * 0.5, v * 0.5, v * 0.5]),
        ThresholdValue::Seq(v) => match v.as_slice() {
            [w, h] => Threshold::Rect([-w * 0.5, -h * 0.5, w * 0.5, h * 0.5]),
            [x1, y1, x2, y2] => Threshold::Rect([*x1, *y1, *x2, *y2]),
            _ => Threshold::Rect([0.0; 4]),
        },
        ThresholdValue::Dynamic(f) => Threshold::Dynamic(f.clone()),
        ThresholdValue::Other => Threshold::Rect([0.0; 4]),
    }
}

// ---------- axis ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Axis {
    #[default]
    Both,
    X,
    Y,
}

impl From<String> for Axis {
    fn from(s: String) -> Self {
        Axis::parse(&s)
    }
}

/// Setter overrides selected by the axis option. `None` keeps the regular
/// clamp-and-round setter.
#[derive(Clone, Copy)]
pub struct AxisCase {
    pub set_x: Option<fn(f64) -> f64>,
    pub set_y: Option<fn(f64) -> f64>,
}

fn locked(_: f64) -> f64 {
    0.0
}

impl Axis {
    /// Unknown names fall back to unrestricted movement.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "x" => Axis::X,
            "y" => Axis::Y,
            _ => Axis::Both,
        }
    }

    pub fn case(self) -> AxisCase {
        match self {
            Axis::X => AxisCase {
                set_x: None,
                set_y: Some(locked),
            },
            Axis::Y => AxisCase {
                set_x: Some(locked),
                set_y: None,
            },
            Axis::Both => AxisCase {
                set_x: None,
                set_y: None,
            },
        }
    }
}

// ---------- repeat ----------

/// Raw repeat input; resolved against the axis by [`Repeat::resolve`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum RepeatValue {
    #[default]
    Off,
    Flag(bool),
    Pair(Vec<bool>),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    None,
    Both,
    X,
    Y,
}

impl Repeat {
    /// Named cases map directly, everything else goes through the fallback
    /// transformer.
    pub fn resolve(value: &RepeatValue, axis: Axis) -> Self {
        match value {
            RepeatValue::Name(s) => match s.as_str() {
                "both" => Repeat::Both,
                "x" => Repeat::X,
                "y" => Repeat::Y,
                _ => Repeat::None,
            },
            RepeatValue::Pair(v) => match (v.first().copied(), v.get(1).copied()) {
                (Some(true), Some(true)) => Repeat::Both,
                (Some(true), _) => Repeat::X,
                (_, Some(true)) => Repeat::Y,
                _ => Repeat::None,
            },
            RepeatValue::Flag(true) => match axis {
                Axis::Both => Repeat::Both,
                Axis::X => Repeat::X,
                Axis::Y => Repeat::Y,
            },
            RepeatValue::Flag(false) | RepeatValue::Off => Repeat::None,
        }
    }

    pub fn x(self) -> bool {
        matches!(self, Repeat::Both | Repeat::X)
    }

    pub fn y(self) -> bool {
        matches!(self, Repeat::Both | Repeat::Y)
    }
}

// ---------- release ----------

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ReleaseValue {
    Flag(bool),
    Millis(f64),
}

fn normalize_release(value: Option<ReleaseValue>) -> Option<f64> {
    match value {
        Some(ReleaseValue::Millis(ms)) if ms > 0.0 => Some(ms),
        _ => None,
    }
}

// ---------- raw overrides ----------

/// Caller-supplied overrides. Unset fields are read from element attributes,
/// then from defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub within: Option<Within>,
    pub pin: Option<PinValue>,
    pub threshold: Option<ThresholdValue>,
    pub velocity: Option<f64>,
    pub max_velocity: Option<f64>,
    pub release: Option<ReleaseValue>,
    pub precision: Option<f64>,
    pub axis: Option<Axis>,
    pub repeat: Option<RepeatValue>,
    pub hide_cursor: Option<bool>,
    pub sniper: Option<bool>,
    pub sniper_speed: Option<f64>,
    pub freeze: Option<bool>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Options {
    /// Fill every unset option from the attribute reader.
    pub fn fill_from_attributes(
        &mut self,
        read: impl Fn(&str) -> Option<String>,
    ) -> Result<(), OptionError> {
        from_attribute(&mut self.within, "within", &read)?;
        from_attribute(&mut self.pin, "pin", &read)?;
        from_attribute(&mut self.threshold, "threshold", &read)?;
        from_attribute(&mut self.velocity, "velocity", &read)?;
        from_attribute(&mut self.max_velocity, "max-velocity", &read)?;
        from_attribute(&mut self.release, "release", &read)?;
        from_attribute(&mut self.precision, "precision", &read)?;
        from_attribute(&mut self.axis, "axis", &read)?;
        from_attribute(&mut self.repeat, "repeat", &read)?;
        from_attribute(&mut self.hide_cursor, "hide-cursor", &read)?;
        from_attribute(&mut self.sniper, "sniper", &read)?;
        from_attribute(&mut self.sniper_speed, "sniper-speed", &read)?;
        from_attribute(&mut self.freeze, "freeze", &read)?;
        from_attribute(&mut self.x, "x", &read)?;
        from_attribute(&mut self.y, "y", &read)?;
        Ok(())
    }
}

fn from_attribute<T: DeserializeOwned>(
    slot: &mut Option<T>,
    name: &'static str,
    read: &impl Fn(&str) -> Option<String>,
) -> Result<(), OptionError> {
    if slot.is_some() {
        return Ok(());
    }
    let Some(raw) = read(name) else {
        return Ok(());
    };
    let value = parse_attribute_value(&raw);
    let parsed = value
        .try_into::<T>()
        .map_err(|e| OptionError::InvalidAttribute {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        })?;
    *slot = Some(parsed);
    Ok(())
}

/// Attribute text as a TOML value (`10`, `[1, 2]`, `true`), or a bare string.
pub fn parse_attribute_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.trim().to_string()))
}

// ---------- normalized config ----------

/// Validated configuration held by an instance.
#[derive(Debug, Clone)]
pub struct Config {
    pub within: Option<ElementId>,
    pub pin: Option<[f64; 4]>,
    pub threshold: Threshold,
    pub velocity: f64,
    pub max_velocity: Option<f64>,
    pub release: Option<f64>,
    pub precision: f64,
    pub axis: Axis,
    pub repeat_value: RepeatValue,
    pub repeat: Repeat,
    pub hide_cursor: bool,
    pub sniper: bool,
    pub sniper_speed: f64,
    pub freeze: bool,
}

pub fn finite(name: &'static str, value: f64) -> Result<f64, OptionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(OptionError::InvalidNumber { name, value })
    }
}

impl Config {
    /// Normalize every option into a fresh config. `resolve` maps the container
    /// reference onto a concrete element.
    pub fn build(
        options: &Options,
        resolve: impl FnOnce(&Within) -> Option<ElementId>,
    ) -> Result<Self, OptionError> {
        let pin = normalize_pin(options.pin.as_ref().unwrap_or(&PinValue::Auto))?;
        let threshold = normalize_threshold(&options.threshold.clone().unwrap_or_default());
        let velocity = finite("velocity", options.velocity.unwrap_or(DEFAULT_VELOCITY))?;
        let max_velocity = options
            .max_velocity
            .map(|v| finite("max_velocity", v))
            .transpose()?;
        let precision = finite("precision", options.precision.unwrap_or(DEFAULT_PRECISION))?;
        let sniper_speed = finite(
            "sniper_speed",
            options.sniper_speed.unwrap_or(DEFAULT_SNIPER_SPEED),
        )?;
        let axis = options.axis.unwrap_or_default();
        let repeat_value = options.repeat.clone().unwrap_or_default();
        let repeat = Repeat::resolve(&repeat_value, axis);
        let within = resolve(options.within.as_ref().unwrap_or(&Within::Parent));

        Ok(Self {
            within,
            pin,
            threshold,
            velocity,
            max_velocity,
            release: normalize_release(options.release),
            precision,
            axis,
            repeat_value,
            repeat,
            hide_cursor: options.hide_cursor.unwrap_or(false),
            sniper: options.sniper.unwrap_or(true),
            sniper_speed,
            freeze: options.freeze.unwrap_or(false),
        })
    }
}

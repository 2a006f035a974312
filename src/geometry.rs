//! Geometry primitives, transform parsing and the limits calculator.

use serde::{Deserialize, Serialize};

/// Half-extent of the unconstrained limits rectangle.
pub const OPEN_LIMIT: f64 = 9999.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box relative to the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Per-side lengths, e.g. container padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sides {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub left: f64,
}

impl Sides {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

/// Allowed range of the element position, in container-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Limits {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self::open()
    }
}

impl Limits {
    pub fn open() -> Self {
        Self {
            top: -OPEN_LIMIT,
            bottom: OPEN_LIMIT,
            left: -OPEN_LIMIT,
            right: OPEN_LIMIT,
        }
    }

    /// Limits for an element whose zero-translation offset from the container's
    /// border box is `init_offset`.
    ///
    /// `pin` is `[left, top, right, bottom]`; the pinned area must stay inside the
    /// container's content box.
    pub fn within(container: Rect, padding: Sides, pin: [f64; 4], init_offset: Point) -> Self {
        Self {
            left: -pin[0] - init_offset.x + padding.left,
            top: -pin[1] - init_offset.y + padding.top,
            right: -init_offset.x + container.width - pin[2] - padding.right,
            bottom: -init_offset.y + container.height - pin[3] - padding.bottom,
        }
    }
}

/// Recover the translation of an inline transform such as
/// `translate3d(10px, -4.5px, 0)`.
///
/// Takes the first two numbers that start on a word boundary. Anything missing
/// or unparsable reads as 0.
pub fn parse_translation(transform: &str) -> Point {
    let mut numbers = NumberTokens::new(transform);
    let tx = numbers.next().unwrap_or(0.0);
    let ty = numbers.next().unwrap_or(0.0);
    Point::new(tx, ty)
}

struct NumberTokens<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> NumberTokens<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            bytes: s.as_bytes(),
            pos: 0,
        }
    }
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

impl Iterator for NumberTokens<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let b = self.bytes;
        while self.pos < b.len() {
            let i = self.pos;
            let at_boundary = i == 0 || !is_word(b[i - 1]);
            if b[i].is_ascii_digit() && at_boundary {
                let negative = i > 0 && b[i - 1] == b'-';
                let mut end = i;
                while end < b.len() && (b[end].is_ascii_digit() || b[end] == b'.') {
                    end += 1;
                }
                self.pos = end;
                let token = std::str::from_utf8(&b[i..end]).unwrap_or("");
                let value = parse_float_prefix(token);
                return Some(if negative { -value } else { value });
            }
            self.pos += 1;
        }
        None
    }
}

/// Longest numeric prefix of `token` (so `1.2.3` reads as `1.2`), 0 if none.
fn parse_float_prefix(token: &str) -> f64 {
    let mut seen_dot = false;
    let mut end = 0;
    for (i, c) in token.char_indices() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        } else if !c.is_ascii_digit() {
            break;
        }
        end = i + c.len_utf8();
    }
    token[..end].parse().unwrap_or(0.0)
}

pub fn format_translate(x: f64, y: f64) -> String {
    format!("translate3d({x}px, {y}px, 0)")
}

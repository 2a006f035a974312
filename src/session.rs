//! Per-gesture bookkeeping.

use serde::Serialize;

use crate::geometry::Point;
use crate::tracker::Kinetics;

/// Transient state of one drag gesture, reset at every session start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DragParams {
    /// Element position at zero translation, relative to the container.
    pub init_offset: Point,
    /// Where inside the element the pointer grabbed it.
    pub inner_offset: Point,
    /// Pointer position when the session (re)started.
    pub init_client: Point,
    /// Pointer position at the last processed move.
    pub prev_client: Point,
    /// Container position relative to the page.
    pub container_offset: Point,
    pub kinetics: Kinetics,
}

impl DragParams {
    /// Pointer displacement since the session origin, as `origin - current`.
    pub fn displacement(&self, client: Point) -> Point {
        Point::new(self.init_client.x - client.x, self.init_client.y - client.y)
    }

    /// Whether `client` left the dead zone `[x1, y1, x2, y2]`.
    pub fn exceeds(&self, client: Point, threshold: [f64; 4]) -> bool {
        let d = self.displacement(client);
        d.x < threshold[0] || d.x > threshold[2] || d.y < threshold[1] || d.y > threshold[3]
    }
}

//! Typed notifications fired by a draggable and their subscribers.

use serde::Serialize;

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Idle,
    Threshold,
    DragStart,
    Drag,
    DragEnd,
    Release,
}

impl NoticeKind {
    /// DOM event name, for the kinds that are also dispatched on the element.
    pub fn dom_name(self) -> Option<&'static str> {
        match self {
            NoticeKind::DragStart => Some("dragstart"),
            NoticeKind::Drag => Some("drag"),
            NoticeKind::DragEnd => Some("dragend"),
            _ => None,
        }
    }
}

/// Payload handed to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    /// Element position when the notice fired.
    pub position: Point,
}

type Handler = Box<dyn FnMut(&Notice)>;

#[derive(Default)]
pub struct Listeners {
    handlers: Vec<(NoticeKind, Handler)>,
}

impl Listeners {
    pub fn on(&mut self, kind: NoticeKind, handler: impl FnMut(&Notice) + 'static) {
        self.handlers.push((kind, Box::new(handler)));
    }

    pub fn off(&mut self, kind: NoticeKind) {
        self.handlers.retain(|(k, _)| *k != kind);
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn emit(&mut self, notice: &Notice) {
        for (kind, handler) in self.handlers.iter_mut() {
            if *kind == notice.kind {
                handler(notice);
            }
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.handlers.len())
            .finish()
    }
}

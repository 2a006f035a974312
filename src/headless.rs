//! In-memory document implementing every host capability.
//!
//! Elements have an untransformed layout box; measured offsets add the inline
//! translation of the element and its ancestors, the way a browser's bounding
//! box does. Style writes and dispatched events are recorded for inspection.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::geometry::{Point, Rect, Sides, parse_translation};
use crate::host::{Attributes, Clock, Dispatch, Dom, ElementId, InstanceId, Layout, Styles};

#[derive(Debug, Clone, Default)]
struct Node {
    name: String,
    classes: Vec<String>,
    parent: Option<ElementId>,
    layout: Rect,
    padding: Sides,
    transform: String,
    transition: Option<String>,
    selectable: bool,
    cursor: Option<String>,
    attributes: HashMap<String, String>,
    binding: Option<InstanceId>,
    detached: bool,
}

#[derive(Debug)]
pub struct HeadlessDom {
    nodes: RefCell<Vec<Node>>,
    dispatched: RefCell<Vec<(ElementId, String)>>,
    now: Cell<f64>,
    scroll: Cell<Point>,
    next_instance: Cell<u32>,
}

impl Default for HeadlessDom {
    fn default() -> Self {
        Self::new(Rect::new(0.0, 0.0, 1024.0, 768.0))
    }
}

impl HeadlessDom {
    /// A document whose root element covers `viewport`.
    pub fn new(viewport: Rect) -> Self {
        let root = Node {
            name: "root".into(),
            layout: viewport,
            selectable: true,
            ..Default::default()
        };
        Self {
            nodes: RefCell::new(vec![root]),
            dispatched: RefCell::new(Vec::new()),
            now: Cell::new(0.0),
            scroll: Cell::new(Point::ZERO),
            next_instance: Cell::new(0),
        }
    }

    /// Append an element under `parent` with the given page-relative layout box.
    pub fn add(&self, parent: ElementId, name: &str, layout: Rect) -> ElementId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(Node {
            name: name.to_string(),
            parent: Some(parent),
            layout,
            selectable: true,
            ..Default::default()
        });
        ElementId((nodes.len() - 1) as u32)
    }

    fn with_node<T>(&self, el: ElementId, f: impl FnOnce(&Node) -> T) -> Option<T> {
        self.nodes.borrow().get(el.0 as usize).map(f)
    }

    fn update(&self, el: ElementId, f: impl FnOnce(&mut Node)) {
        if let Some(node) = self.nodes.borrow_mut().get_mut(el.0 as usize) {
            f(node);
        }
    }

    pub fn set_padding(&self, el: ElementId, padding: Sides) {
        self.update(el, |n| n.padding = padding);
    }

    pub fn set_layout(&self, el: ElementId, layout: Rect) {
        self.update(el, |n| n.layout = layout);
    }

    pub fn add_class(&self, el: ElementId, class: &str) {
        self.update(el, |n| n.classes.push(class.to_string()));
    }

    pub fn set_attribute(&self, el: ElementId, name: &str, value: &str) {
        self.update(el, |n| {
            n.attributes.insert(name.to_string(), value.to_string());
        });
    }

    pub fn detach(&self, el: ElementId) {
        self.update(el, |n| n.detached = true);
    }

    pub fn attach(&self, el: ElementId) {
        self.update(el, |n| n.detached = false);
    }

    pub fn element(&self, name: &str) -> Option<ElementId> {
        self.nodes
            .borrow()
            .iter()
            .position(|n| n.name == name)
            .map(|i| ElementId(i as u32))
    }

    pub fn name(&self, el: ElementId) -> String {
        self.with_node(el, |n| n.name.clone()).unwrap_or_default()
    }

    pub fn set_time(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn scroll_to(&self, scroll: Point) {
        self.scroll.set(scroll);
    }

    pub fn transition(&self, el: ElementId) -> Option<String> {
        self.with_node(el, |n| n.transition.clone()).flatten()
    }

    pub fn is_selectable(&self, el: ElementId) -> bool {
        self.with_node(el, |n| n.selectable).unwrap_or(false)
    }

    pub fn cursor(&self, el: ElementId) -> Option<String> {
        self.with_node(el, |n| n.cursor.clone()).flatten()
    }

    /// Events dispatched so far, in order.
    pub fn dispatched(&self) -> Vec<(ElementId, String)> {
        self.dispatched.borrow().clone()
    }

    pub fn take_dispatched(&self) -> Vec<(ElementId, String)> {
        std::mem::take(&mut *self.dispatched.borrow_mut())
    }

    fn matches(node: &Node, selector: &str) -> bool {
        if let Some(id) = selector.strip_prefix('#') {
            node.name == id
        } else if let Some(class) = selector.strip_prefix('.') {
            node.classes.iter().any(|c| c == class)
        } else {
            node.name == selector
        }
    }
}

impl Dom for HeadlessDom {
    fn root(&self) -> ElementId {
        ElementId(0)
    }

    fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.with_node(el, |n| n.parent).flatten()
    }

    fn is_attached(&self, el: ElementId) -> bool {
        let mut cur = Some(el);
        while let Some(id) = cur {
            match self.with_node(id, |n| (n.detached, n.parent)) {
                None | Some((true, _)) => return false,
                Some((false, parent)) => cur = parent,
            }
        }
        true
    }

    fn query(&self, selector: &str) -> Option<ElementId> {
        self.nodes
            .borrow()
            .iter()
            .position(|n| Self::matches(n, selector))
            .map(|i| ElementId(i as u32))
    }

    fn closest(&self, from: ElementId, selector: &str) -> Option<ElementId> {
        let mut cur = Some(from);
        while let Some(id) = cur {
            if self.with_node(id, |n| Self::matches(n, selector))? {
                return Some(id);
            }
            cur = self.parent(id);
        }
        None
    }

    fn binding(&self, el: ElementId) -> Option<InstanceId> {
        self.with_node(el, |n| n.binding).flatten()
    }

    fn bind(&self, el: ElementId) -> InstanceId {
        let id = InstanceId(self.next_instance.get() + 1);
        self.next_instance.set(id.0);
        self.update(el, |n| n.binding = Some(id));
        id
    }

    fn unbind(&self, el: ElementId) {
        self.update(el, |n| n.binding = None);
    }
}

impl Layout for HeadlessDom {
    fn offsets(&self, el: ElementId) -> Rect {
        let Some(mut rect) = self.with_node(el, |n| n.layout) else {
            return Rect::default();
        };
        let mut cur = Some(el);
        while let Some(id) = cur {
            let Some((transform, parent)) = self.with_node(id, |n| (n.transform.clone(), n.parent))
            else {
                break;
            };
            let t = parse_translation(&transform);
            rect.left += t.x;
            rect.top += t.y;
            cur = parent;
        }
        rect
    }

    fn paddings(&self, el: ElementId) -> Sides {
        self.with_node(el, |n| n.padding).unwrap_or_default()
    }

    fn page_scroll(&self) -> Point {
        self.scroll.get()
    }

    fn transform(&self, el: ElementId) -> String {
        self.with_node(el, |n| n.transform.clone())
            .unwrap_or_default()
    }
}

impl Styles for HeadlessDom {
    fn set_transform(&self, el: ElementId, transform: &str) {
        self.update(el, |n| n.transform = transform.to_string());
    }

    fn set_transition(&self, el: ElementId, transition: Option<&str>) {
        self.update(el, |n| n.transition = transition.map(str::to_string));
    }

    fn set_selectable(&self, el: ElementId, selectable: bool) {
        self.update(el, |n| n.selectable = selectable);
    }

    fn set_cursor(&self, el: ElementId, cursor: Option<&str>) {
        self.update(el, |n| n.cursor = cursor.map(str::to_string));
    }
}

impl Dispatch for HeadlessDom {
    fn dispatch(&self, el: ElementId, name: &str) {
        self.dispatched.borrow_mut().push((el, name.to_string()));
    }
}

impl Attributes for HeadlessDom {
    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.with_node(el, |n| n.attributes.get(name).cloned())
            .flatten()
    }
}

impl Clock for HeadlessDom {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

//! Scene files: a headless document, the draggables bound in it and a pointer
//! script to replay against them.
//!
//! ```toml
//! [[element]]
//! id = "board"
//! rect = { left = 0, top = 0, width = 400, height = 400 }
//!
//! [[element]]
//! id = "card"
//! parent = "board"
//! rect = { left = 0, top = 0, width = 100, height = 100 }
//!
//! [[draggable]]
//! element = "card"
//! options = { release = 200 }
//!
//! [[event]]
//! at = 0
//! kind = "down"
//! target = "card"
//! client = [50, 50]
//! offset = [50, 50]
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::draggable::{DragState, Draggable};
use crate::geometry::{Limits, Point, Rect, Sides};
use crate::headless::HeadlessDom;
use crate::host::{Clock, Dom, ElementId, Modifiers, PointerEvent, PointerKind, Styles};
use crate::notify::NoticeKind;
use crate::options::Options;

const DEFAULT_SETTLE_MS: f64 = 1000.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    #[serde(default = "default_viewport")]
    pub viewport: Rect,
    /// How long to keep running timers after the last event.
    #[serde(default = "default_settle")]
    pub settle: f64,
    #[serde(default)]
    pub scroll: Option<[f64; 2]>,
    #[serde(default, rename = "element")]
    pub elements: Vec<ElementSpec>,
    #[serde(default, rename = "draggable")]
    pub draggables: Vec<DraggableSpec>,
    #[serde(default, rename = "event")]
    pub events: Vec<EventSpec>,
}

fn default_viewport() -> Rect {
    Rect::new(0.0, 0.0, 1024.0, 768.0)
}

fn default_settle() -> f64 {
    DEFAULT_SETTLE_MS
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementSpec {
    pub id: String,
    pub parent: Option<String>,
    pub rect: Rect,
    #[serde(default)]
    pub padding: Sides,
    pub transform: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub detached: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DraggableSpec {
    pub element: String,
    #[serde(default)]
    pub options: Options,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Down,
    Move,
    Up,
    Leave,
    /// Only advance the clock.
    Wait,
    /// External stop signal to every draggable.
    Stop,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventSpec {
    pub at: f64,
    pub kind: StepKind,
    pub target: Option<String>,
    pub client: Option<[f64; 2]>,
    pub offset: Option<[f64; 2]>,
    #[serde(default)]
    pub touches: Vec<[f64; 2]>,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        let scene = Self::parse(&txt)
            .with_context(|| format!("invalid scene {}", path.display()))?;
        Ok(scene)
    }

    pub fn parse(txt: &str) -> Result<Self> {
        let scene: Scene = toml::from_str(txt).map_err(|e| anyhow!("failed to parse scene: {e}"))?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn validate(&self) -> Result<()> {
        let mut known: HashSet<&str> = HashSet::from(["root"]);
        for el in &self.elements {
            if el.id.trim().is_empty() {
                return Err(anyhow!("element with empty id"));
            }
            if let Some(parent) = &el.parent {
                if !known.contains(parent.as_str()) {
                    return Err(anyhow!(
                        "element '{}' refers to parent '{}' before it is defined",
                        el.id,
                        parent
                    ));
                }
            }
            if !known.insert(el.id.as_str()) {
                return Err(anyhow!("duplicate element id '{}'", el.id));
            }
        }

        let mut bound = HashSet::new();
        for d in &self.draggables {
            if !known.contains(d.element.as_str()) {
                return Err(anyhow!("draggable refers to unknown element '{}'", d.element));
            }
            if !bound.insert(d.element.as_str()) {
                return Err(anyhow!("element '{}' is made draggable twice", d.element));
            }
        }

        let mut last = f64::NEG_INFINITY;
        for (i, ev) in self.events.iter().enumerate() {
            if ev.at < last {
                return Err(anyhow!("event #{i} at {}ms is earlier than {}ms", ev.at, last));
            }
            last = ev.at;
            if let Some(target) = &ev.target {
                if !known.contains(target.as_str()) {
                    return Err(anyhow!("event #{i} targets unknown element '{target}'"));
                }
            }
            let pointer = matches!(
                ev.kind,
                StepKind::Down | StepKind::Move | StepKind::Up | StepKind::Leave
            );
            if pointer && ev.client.is_none() && ev.touches.is_empty() {
                return Err(anyhow!("event #{i} ({:?}) needs client or touches", ev.kind));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    pub at: f64,
    pub element: String,
    pub event: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalState {
    pub element: String,
    pub state: DragState,
    pub x: f64,
    pub y: f64,
    pub limits: Limits,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub notices: Vec<TraceEntry>,
    pub dom_events: Vec<(String, String)>,
    pub consumed: usize,
    pub finals: Vec<FinalState>,
}

/// A scene materialized into a live headless document.
pub struct Replay {
    pub dom: Rc<HeadlessDom>,
    pub draggables: Vec<Draggable<HeadlessDom>>,
    ids: HashMap<String, ElementId>,
    log: Rc<RefCell<Vec<TraceEntry>>>,
    consumed: usize,
}

const ALL_NOTICES: [NoticeKind; 6] = [
    NoticeKind::Idle,
    NoticeKind::Threshold,
    NoticeKind::DragStart,
    NoticeKind::Drag,
    NoticeKind::DragEnd,
    NoticeKind::Release,
];

impl Replay {
    pub fn build(scene: &Scene) -> Result<Self> {
        let dom = Rc::new(HeadlessDom::new(scene.viewport));
        let mut ids = HashMap::from([("root".to_string(), dom.root())]);
        if let Some([x, y]) = scene.scroll {
            dom.scroll_to(Point::new(x, y));
        }

        for spec in &scene.elements {
            let parent = match &spec.parent {
                Some(p) => *ids
                    .get(p.as_str())
                    .ok_or_else(|| anyhow!("unknown parent '{p}' of '{}'", spec.id))?,
                None => dom.root(),
            };
            let el = dom.add(parent, &spec.id, spec.rect);
            dom.set_padding(el, spec.padding);
            for class in &spec.classes {
                dom.add_class(el, class);
            }
            for (k, v) in &spec.attributes {
                dom.set_attribute(el, k, v);
            }
            if let Some(t) = &spec.transform {
                dom.set_transform(el, t);
            }
            if spec.detached {
                dom.detach(el);
            }
            ids.insert(spec.id.clone(), el);
        }

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut draggables = Vec::new();
        for spec in &scene.draggables {
            let el = *ids
                .get(spec.element.as_str())
                .ok_or_else(|| anyhow!("unknown draggable element '{}'", spec.element))?;
            let mut d = Draggable::new(dom.clone(), el, spec.options.clone())
                .with_context(|| format!("cannot make '{}' draggable", spec.element))?;
            for kind in ALL_NOTICES {
                let log = log.clone();
                let clock = dom.clone();
                let name = spec.element.clone();
                d.on(kind, move |n| {
                    log.borrow_mut().push(TraceEntry {
                        at: clock.now_ms(),
                        element: name.clone(),
                        event: format!("{:?}", n.kind).to_lowercase(),
                        x: n.position.x,
                        y: n.position.y,
                    });
                });
            }
            debug!("scene: '{}' is draggable", spec.element);
            draggables.push(d);
        }

        Ok(Self {
            dom,
            draggables,
            ids,
            log,
            consumed: 0,
        })
    }

    pub fn element(&self, name: &str) -> Option<ElementId> {
        self.ids.get(name).copied()
    }

    /// Run timers up to `at`, in due order across all draggables.
    pub fn advance_to(&mut self, at: f64) {
        loop {
            let next = self
                .draggables
                .iter()
                .filter_map(|d| d.next_timer_due())
                .reduce(f64::min);
            match next {
                Some(due) if due <= at => {
                    self.dom.set_time(due.max(self.dom.now_ms()));
                    for d in self.draggables.iter_mut() {
                        d.poll_timers();
                    }
                }
                _ => break,
            }
        }
        self.dom.set_time(at.max(self.dom.now_ms()));
    }

    pub fn step(&mut self, ev: &EventSpec) {
        self.advance_to(ev.at);
        let kind = match ev.kind {
            StepKind::Down => PointerKind::Down,
            StepKind::Move => PointerKind::Move,
            StepKind::Up => PointerKind::Up,
            StepKind::Leave => PointerKind::Leave,
            StepKind::Wait => return,
            StepKind::Stop => {
                for d in self.draggables.iter_mut() {
                    d.stop();
                }
                return;
            }
        };

        let target = ev
            .target
            .as_deref()
            .and_then(|t| self.element(t))
            .unwrap_or_else(|| self.dom.root());
        let [cx, cy] = ev.client.or(ev.touches.first().copied()).unwrap_or([0.0, 0.0]);
        let mut event = PointerEvent::new(kind, target, Point::new(cx, cy))
            .with_touches(ev.touches.iter().map(|[x, y]| Point::new(*x, *y)).collect())
            .with_modifiers(Modifiers {
                ctrl: ev.ctrl,
                meta: ev.meta,
            });
        if let Some([ox, oy]) = ev.offset {
            event = event.with_offset(Point::new(ox, oy));
        }

        for d in self.draggables.iter_mut() {
            if d.handle(&event) {
                self.consumed += 1;
            }
        }
    }

    pub fn finish(self) -> Trace {
        let finals = self
            .draggables
            .iter()
            .map(|d| FinalState {
                element: self.dom.name(d.element()),
                state: d.state(),
                x: d.x(),
                y: d.y(),
                limits: d.limits(),
            })
            .collect();
        let dom_events = self
            .dom
            .dispatched()
            .into_iter()
            .map(|(el, name)| (self.dom.name(el), name))
            .collect();
        let notices = self.log.borrow().clone();
        Trace {
            notices,
            dom_events,
            consumed: self.consumed,
            finals,
        }
    }
}

/// Replay a whole scene and collect what happened.
pub fn run(scene: &Scene) -> Result<Trace> {
    let mut replay = Replay::build(scene)?;
    let mut last = 0.0;
    for ev in &scene.events {
        replay.step(ev);
        last = ev.at;
    }
    replay.advance_to(last + scene.settle);
    let trace = replay.finish();
    info!(
        "replayed {} events, {} notices",
        scene.events.len(),
        trace.notices.len()
    );
    Ok(trace)
}

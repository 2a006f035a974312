//! The drag state machine and the public instance API.
//!
//! A [`Draggable`] is driven entirely by its host: pointer events go through
//! [`Draggable::handle`], and the host event loop calls
//! [`Draggable::poll_timers`] so kinetic sampling and the release timer can run.
//! Every state is a [`StateCase`] record looked up from an explicit table;
//! transitions run the old state's exit hook, store the new state, then run
//! the new state's enter hook, which may redirect once more.

use std::rc::Rc;

use log::{debug, warn};
use serde::Serialize;

use crate::geometry::{Limits, Point, format_translate, parse_translation};
use crate::host::{ElementId, Host, InstanceId, PointerEvent, PointerKind};
use crate::notify::{Listeners, Notice, NoticeKind};
use crate::options::{
    self, Axis, Config, OptionError, Options, PinValue, RepeatValue, Repeat, ThresholdValue,
    Within,
};
use crate::position::{Position, constrain, round_to};
use crate::session::DragParams;
use crate::timers::{TimerId, TimerKind, Timers};
use crate::tracker::TRACK_INTERVAL_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DragState {
    #[default]
    Idle,
    Threshold,
    Drag,
    Release,
}

/// Hooks of one state.
struct StateCase<H: Host> {
    /// Runs after the state is stored; may redirect to another state.
    enter: fn(&mut Draggable<H>) -> Option<DragState>,
    exit: fn(&mut Draggable<H>),
    /// Returns whether the event was consumed.
    input: fn(&mut Draggable<H>, &PointerEvent) -> bool,
}

pub struct Draggable<H: Host> {
    host: Rc<H>,
    element: ElementId,
    id: InstanceId,
    config: Config,
    limits: Limits,
    position: Position,
    state: DragState,
    params: DragParams,
    timers: Timers,
    track_timer: Option<TimerId>,
    stop_timer: Option<TimerId>,
    /// Threshold was empty when the current press started.
    snap: bool,
    listeners: Listeners,
}

impl<H: Host> std::fmt::Debug for Draggable<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Draggable")
            .field("element", &self.element)
            .field("id", &self.id)
            .field("state", &self.state)
            .field("position", &self.position)
            .field("limits", &self.limits)
            .finish()
    }
}

fn resolve_within<H: Host>(host: &H, el: ElementId, within: &Within) -> Option<ElementId> {
    let found = match within {
        Within::None => return None,
        Within::Parent => host.parent(el).or(Some(host.root())),
        Within::Element(id) => Some(*id),
        Within::Selector(sel) if sel == "document" || sel == ":root" => Some(host.root()),
        Within::Selector(sel) => host.query(sel),
        Within::Closest(sel) => host.closest(el, sel),
    };
    if found.is_none() {
        warn!("container {within:?} not found for {el:?}; limits stay open");
    }
    found
}

impl<H: Host> Draggable<H> {
    /// Bind a draggable to `element`. Options missing from `options` are read
    /// from the element's attributes, then defaulted.
    pub fn new(host: Rc<H>, element: ElementId, mut options: Options) -> Result<Self, OptionError> {
        options.fill_from_attributes(|name| host.attribute(element, name))?;
        let config = Config::build(&options, |w| resolve_within(&*host, element, w))?;

        // nothing below can fail: side effects start here
        let id = host.bind(element);
        let current = parse_translation(&host.transform(element));
        let mut this = Self {
            host,
            element,
            id,
            config,
            limits: Limits::open(),
            position: Position::default(),
            state: DragState::Idle,
            params: DragParams::default(),
            timers: Timers::new(),
            track_timer: None,
            stop_timer: None,
            snap: false,
            listeners: Listeners::default(),
        };

        if this.host.is_attached(element) {
            this.measure_limits();
        }
        let x = options.x.unwrap_or(current.x);
        let y = options.y.unwrap_or(current.y);
        this.position = this.constrained(x, y);
        this.render();
        this.idle_enter();
        debug!("draggable {:?} bound to {:?}", this.id, this.element);
        Ok(this)
    }

    fn case(state: DragState) -> StateCase<H> {
        match state {
            DragState::Idle => StateCase {
                enter: Self::idle_enter,
                exit: Self::idle_exit,
                input: Self::idle_input,
            },
            DragState::Threshold => StateCase {
                enter: Self::threshold_enter,
                exit: Self::threshold_exit,
                input: Self::threshold_input,
            },
            DragState::Drag => StateCase {
                enter: Self::drag_enter,
                exit: Self::drag_exit,
                input: Self::drag_input,
            },
            DragState::Release => StateCase {
                enter: Self::release_enter,
                exit: Self::release_exit,
                input: Self::release_input,
            },
        }
    }

    fn set_state(&mut self, next: DragState) {
        if next == self.state {
            return;
        }
        let prev = self.state;
        (Self::case(prev).exit)(self);
        self.state = next;
        debug!("draggable {:?}: {prev:?} -> {next:?}", self.id);
        if let Some(redirect) = (Self::case(next).enter)(self) {
            self.set_state(redirect);
        }
    }

    // ---------- idle ----------

    fn idle_enter(&mut self) -> Option<DragState> {
        self.stop_tracking();
        self.notify(NoticeKind::Idle);
        let root = self.host.root();
        self.host.set_selectable(root, true);
        if self.config.hide_cursor {
            self.host.set_cursor(root, None);
        }
        if self.config.release.is_some() {
            self.reset_kinetics();
        }
        None
    }

    fn idle_exit(&mut self) {
        self.reset_kinetics();
    }

    fn idle_input(&mut self, event: &PointerEvent) -> bool {
        if event.kind != PointerKind::Down || !self.owns(event.target) {
            return false;
        }
        self.init_drag_params(event);
        // read once: a dynamic threshold may change between calls
        self.snap = self.config.threshold.is_zero();
        self.set_state(DragState::Threshold);
        // a zero threshold snaps straight to the pointer
        if self.snap {
            self.do_drag(event);
        }
        true
    }

    // ---------- threshold ----------

    fn threshold_enter(&mut self) -> Option<DragState> {
        self.notify(NoticeKind::Threshold);
        let root = self.host.root();
        self.host.set_selectable(root, false);
        if self.config.hide_cursor {
            self.host.set_cursor(root, Some("none"));
        }
        self.start_tracking();
        self.snap.then_some(DragState::Drag)
    }

    // Root stays unselectable and the cursor hidden until idle entry, so
    // leaving for drag or release must not undo them here.
    fn threshold_exit(&mut self) {}

    fn threshold_input(&mut self, event: &PointerEvent) -> bool {
        match event.kind {
            PointerKind::Move => {
                let client = event.client_point();
                if self.params.exceeds(client, self.config.threshold.rect()) {
                    self.init_drag_params(event);
                    self.set_state(DragState::Drag);
                }
                true
            }
            PointerKind::Up | PointerKind::Leave => {
                self.set_state(DragState::Idle);
                true
            }
            PointerKind::Down => false,
        }
    }

    // ---------- drag ----------

    fn drag_enter(&mut self) -> Option<DragState> {
        self.host.set_selectable(self.element, false);
        self.start_tracking();
        self.notify(NoticeKind::DragStart);
        self.notify(NoticeKind::Drag);
        None
    }

    fn drag_exit(&mut self) {
        self.host.set_selectable(self.element, true);
        self.notify(NoticeKind::DragEnd);
    }

    fn drag_input(&mut self, event: &PointerEvent) -> bool {
        match event.kind {
            PointerKind::Move => {
                self.do_drag(event);
                true
            }
            PointerKind::Up | PointerKind::Leave => {
                let fast = self.config.release.is_some() && self.params.kinetics.is_fast();
                let next = if fast {
                    DragState::Release
                } else {
                    DragState::Idle
                };
                self.set_state(next);
                true
            }
            PointerKind::Down => false,
        }
    }

    // ---------- release ----------

    fn release_enter(&mut self) -> Option<DragState> {
        self.stop_tracking();
        self.notify(NoticeKind::Release);
        if let Some(ms) = self.config.release {
            let transition = format!("{ms}ms ease-out transform");
            self.host.set_transition(self.element, Some(&transition));
        }

        let offset = self
            .params
            .kinetics
            .release_offset(self.config.max_velocity);
        self.set_position(self.position.x + offset.x, self.position.y + offset.y);
        debug!(
            "draggable {:?}: release by ({:.1}, {:.1})",
            self.id, offset.x, offset.y
        );

        match self.config.release {
            Some(ms) => {
                let due = self.host.now_ms() + ms;
                self.stop_timer = Some(self.timers.schedule(due, TimerKind::Stop));
                None
            }
            None => Some(DragState::Idle),
        }
    }

    fn release_exit(&mut self) {
        self.host.set_transition(self.element, None);
        if let Some(id) = self.stop_timer.take() {
            self.timers.cancel(id);
        }
    }

    fn release_input(&mut self, _event: &PointerEvent) -> bool {
        false
    }

    // ---------- session ----------

    /// Whether this instance should react to a pointer-down on `target`: the
    /// nearest bound ancestor must be our element.
    fn owns(&self, target: ElementId) -> bool {
        let mut cur = Some(target);
        while let Some(el) = cur {
            if let Some(bound) = self.host.binding(el) {
                return bound == self.id;
            }
            cur = self.host.parent(el);
        }
        false
    }

    /// Start (or restart) a drag session at the event's pointer position.
    fn init_drag_params(&mut self, event: &PointerEvent) {
        self.update_limits();

        let client = event.client_point();
        self.params.prev_client = client;
        self.params.inner_offset = match event.offset {
            Some(offset) if event.target == self.element && event.touches.is_empty() => offset,
            _ => {
                let rect = self.host.offsets(self.element);
                let scroll = self.host.page_scroll();
                Point::new(
                    client.x - (rect.left - scroll.x),
                    client.y - (rect.top - scroll.y),
                )
            }
        };
        self.params.init_client = client;
    }

    /// Move the element under the pointer.
    fn do_drag(&mut self, event: &PointerEvent) {
        let client = event.client_point();
        let sniping = self.config.sniper && (event.modifiers.ctrl || event.modifiers.meta);
        if sniping {
            // absorb the unscaled part into the grab offset so letting go of
            // the modifier does not jump
            let k = 1.0 - self.config.sniper_speed;
            self.params.inner_offset.x += (client.x - self.params.prev_client.x) * k;
            self.params.inner_offset.y += (client.y - self.params.prev_client.y) * k;
        }

        let scroll = self.host.page_scroll();
        let p = &self.params;
        let x = client.x + scroll.x - p.init_offset.x - p.inner_offset.x - p.container_offset.x;
        let y = client.y + scroll.y - p.init_offset.y - p.inner_offset.y - p.container_offset.y;
        self.set_position(x, y);

        self.params.prev_client = client;
        self.notify(NoticeKind::Drag);
    }

    /// Recompute container offsets and limits from the current layout, then
    /// pull the position back inside them.
    pub fn update_limits(&mut self) {
        self.measure_limits();
        self.set_position(self.position.x, self.position.y);
    }

    fn measure_limits(&mut self) {
        let translation = parse_translation(&self.host.transform(self.element));
        let own = self.host.offsets(self.element);
        let mut init = Point::new(own.left - translation.x, own.top - translation.y);

        let Some(container) = self.config.within else {
            self.params.init_offset = init;
            self.params.container_offset = Point::ZERO;
            self.limits = Limits::open();
            return;
        };

        let rect = self.host.offsets(container);
        let padding = self.host.paddings(container);
        self.params.container_offset = Point::new(rect.left, rect.top);
        init.x -= rect.left;
        init.y -= rect.top;
        self.params.init_offset = init;
        self.limits = Limits::within(rect, padding, self.pin(), init);
        debug!("draggable {:?}: limits {:?}", self.id, self.limits);
    }

    // ---------- kinetics ----------

    fn reset_kinetics(&mut self) {
        let now = self.host.now_ms();
        let frame = self.params.prev_client;
        self.params.kinetics.reset(frame, now);
    }

    /// Kinetics are only sampled when a release phase can use them.
    fn start_tracking(&mut self) {
        if self.config.release.is_none() {
            return;
        }
        let running = self.track_timer.is_some_and(|id| self.timers.is_pending(id));
        if !running {
            let due = self.host.now_ms() + TRACK_INTERVAL_MS;
            self.track_timer = Some(self.timers.schedule(due, TimerKind::Track));
        }
    }

    fn stop_tracking(&mut self) {
        if let Some(id) = self.track_timer.take() {
            self.timers.cancel(id);
        }
    }

    fn track(&mut self) {
        if !matches!(self.state, DragState::Threshold | DragState::Drag) {
            return;
        }
        let now = self.host.now_ms();
        let (pointer, origin) = (self.params.prev_client, self.params.init_client);
        self.params
            .kinetics
            .sample(pointer, origin, now, self.config.velocity);
        self.start_tracking();
    }

    /// Fire every timer that is due by the host clock. Returns how many fired.
    pub fn poll_timers(&mut self) -> usize {
        let now = self.host.now_ms();
        let mut fired = 0;
        while let Some((id, kind)) = self.timers.pop_due(now) {
            fired += 1;
            match kind {
                TimerKind::Track => {
                    if self.track_timer == Some(id) {
                        self.track_timer = None;
                    }
                    self.track();
                }
                TimerKind::Stop => {
                    if self.stop_timer == Some(id) {
                        self.stop_timer = None;
                    }
                    self.stop();
                }
            }
        }
        fired
    }

    /// Earliest pending timer, for hosts that sleep between events.
    pub fn next_timer_due(&self) -> Option<f64> {
        self.timers.next_due()
    }

    // ---------- public surface ----------

    /// Feed one pointer event. Returns true when the event was consumed and
    /// the host should suppress its default action.
    pub fn handle(&mut self, event: &PointerEvent) -> bool {
        (Self::case(self.state).input)(self, event)
    }

    /// End a release phase early. Ignored in other states.
    pub fn stop(&mut self) -> bool {
        if self.state != DragState::Release {
            return false;
        }
        self.set_state(DragState::Idle);
        true
    }

    pub fn on(&mut self, kind: NoticeKind, handler: impl FnMut(&Notice) + 'static) {
        self.listeners.on(kind, handler);
    }

    pub fn off(&mut self, kind: NoticeKind) {
        self.listeners.off(kind);
    }

    fn notify(&mut self, kind: NoticeKind) {
        if let Some(name) = kind.dom_name() {
            self.host.dispatch(self.element, name);
        }
        let notice = Notice {
            kind,
            position: Point::new(self.position.x, self.position.y),
        };
        self.listeners.emit(&notice);
    }

    /// Release the element: back to idle, timers cancelled, listeners dropped,
    /// binding removed.
    pub fn destroy(mut self) {
        self.set_state(DragState::Idle);
        self.timers.cancel_all();
        self.track_timer = None;
        self.listeners.clear();
        debug!("draggable {:?} destroyed", self.id);
        // binding goes away in Drop
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn params(&self) -> &DragParams {
        &self.params
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn pending_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    // ---------- position ----------

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_x(&mut self, x: f64) {
        self.set_position(x, self.position.y);
    }

    pub fn set_y(&mut self, y: f64) {
        self.set_position(self.position.x, y);
    }

    /// Assign both coordinates, then update the transform once if anything
    /// changed.
    pub fn set_position(&mut self, x: f64, y: f64) {
        let next = self.constrained(x, y);
        if next != self.position {
            self.position = next;
            self.render();
        }
    }

    fn constrained(&self, x: f64, y: f64) -> Position {
        let case = self.config.axis.case();
        let l = self.limits;
        let x = match case.set_x {
            Some(set) => set(x),
            None => round_to(
                constrain(x, l.left, l.right, self.config.repeat.x()),
                self.config.precision,
            ),
        };
        let y = match case.set_y {
            Some(set) => set(y),
            None => round_to(
                constrain(y, l.top, l.bottom, self.config.repeat.y()),
                self.config.precision,
            ),
        };
        Position { x, y }
    }

    fn render(&self) {
        if self.config.freeze {
            return;
        }
        let transform = format_translate(self.position.x, self.position.y);
        self.host.set_transform(self.element, &transform);
    }

    // ---------- options ----------

    /// Effective pin; an unset pin covers the element's own box.
    pub fn pin(&self) -> [f64; 4] {
        self.config.pin.unwrap_or_else(|| {
            let own = self.host.offsets(self.element);
            [0.0, 0.0, own.width, own.height]
        })
    }

    /// Current threshold rectangle.
    pub fn threshold(&self) -> [f64; 4] {
        self.config.threshold.rect()
    }

    pub fn within(&self) -> Option<ElementId> {
        self.config.within
    }

    fn refresh_limits(&mut self) {
        if self.host.is_attached(self.element) {
            self.update_limits();
        }
    }

    /// Hosts call this when the element is inserted into the document.
    pub fn attached(&mut self) {
        self.refresh_limits();
    }

    pub fn set_within(&mut self, within: Within) {
        self.config.within = resolve_within(&*self.host, self.element, &within);
        self.refresh_limits();
    }

    pub fn set_pin(&mut self, pin: impl Into<PinValue>) -> Result<(), OptionError> {
        self.config.pin = options::normalize_pin(&pin.into())?;
        self.refresh_limits();
        Ok(())
    }

    pub fn set_threshold(&mut self, threshold: impl Into<ThresholdValue>) {
        self.config.threshold = options::normalize_threshold(&threshold.into());
    }

    /// Threshold computed on every read.
    pub fn set_threshold_fn(&mut self, f: impl Fn() -> [f64; 4] + 'static) {
        self.set_threshold(ThresholdValue::Dynamic(Rc::new(f)));
    }

    pub fn set_velocity(&mut self, velocity: f64) -> Result<(), OptionError> {
        self.config.velocity = options::finite("velocity", velocity)?;
        Ok(())
    }

    pub fn set_max_velocity(&mut self, max: Option<f64>) -> Result<(), OptionError> {
        self.config.max_velocity = max.map(|v| options::finite("max_velocity", v)).transpose()?;
        Ok(())
    }

    /// Release duration in ms; `None` or zero disables the release phase.
    pub fn set_release(&mut self, ms: Option<f64>) {
        self.config.release = ms.filter(|ms| *ms > 0.0);
    }

    pub fn set_precision(&mut self, precision: f64) -> Result<(), OptionError> {
        self.config.precision = options::finite("precision", precision)?;
        self.set_position(self.position.x, self.position.y);
        Ok(())
    }

    pub fn set_axis(&mut self, axis: Axis) {
        self.config.axis = axis;
        self.config.repeat = Repeat::resolve(&self.config.repeat_value, axis);
        self.set_position(self.position.x, self.position.y);
    }

    pub fn set_repeat(&mut self, repeat: RepeatValue) {
        self.config.repeat = Repeat::resolve(&repeat, self.config.axis);
        self.config.repeat_value = repeat;
    }

    pub fn set_hide_cursor(&mut self, hide: bool) {
        self.config.hide_cursor = hide;
    }

    pub fn set_sniper(&mut self, sniper: bool) {
        self.config.sniper = sniper;
    }

    pub fn set_sniper_speed(&mut self, speed: f64) -> Result<(), OptionError> {
        self.config.sniper_speed = options::finite("sniper_speed", speed)?;
        Ok(())
    }

    /// Frozen instances keep tracking position without touching the transform.
    pub fn set_freeze(&mut self, freeze: bool) {
        let thawed = self.config.freeze && !freeze;
        self.config.freeze = freeze;
        if thawed {
            self.render();
        }
    }
}

impl<H: Host> Drop for Draggable<H> {
    fn drop(&mut self) {
        // an abandoned gesture must not leave the page unselectable
        if self.state != DragState::Idle {
            self.listeners.clear();
            self.set_state(DragState::Idle);
        }
        if self.host.binding(self.element) == Some(self.id) {
            self.host.unbind(self.element);
        }
    }
}

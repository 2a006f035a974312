//! Explicit timer handles owned by a draggable instance.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Next kinetic sample.
    Track,
    /// End of the release phase.
    Stop,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: TimerId,
    due: f64,
    kind: TimerKind,
}

/// Pending callbacks, fired by the host loop in due order.
#[derive(Debug, Default)]
pub struct Timers {
    next_id: u64,
    pending: Vec<Entry>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: f64, kind: TimerKind) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push(Entry { id, due, kind });
        id
    }

    /// Returns whether the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|e| e.id != id);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|e| e.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest due time, if anything is pending.
    pub fn next_due(&self) -> Option<f64> {
        self.pending.iter().map(|e| e.due).reduce(f64::min)
    }

    /// Remove and return the earliest timer due at or before `now`. Ties fire in
    /// scheduling order.
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerId, TimerKind)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.0.cmp(&b.id.0)))
            .map(|(i, _)| i)?;
        let entry = self.pending.remove(idx);
        Some((entry.id, entry.kind))
    }
}

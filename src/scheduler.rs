//! Virtual-clock timer queue.
//!
//! All waiting in the engine is modelled as scheduled resumption. Timers
//! carry a plain payload describing what should happen; the owner pops due
//! timers one at a time and dispatches them, which keeps the simulation
//! deterministic and lets tests advance time instantly.

/// Unique timer identifier within one scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A pending timer.
#[derive(Debug, Clone)]
struct PendingTimer<T> {
    id: TimerId,
    /// Virtual millisecond at which this timer fires.
    fire_at: u64,
    /// For tickers: interval between firings.
    interval: Option<u64>,
    payload: T,
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub at: u64,
    pub payload: T,
    /// True if the timer stays armed for another round.
    pub repeating: bool,
}

/// Cooperative scheduler over a virtual millisecond clock.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: u64,
    next_id: u64,
    timers: Vec<PendingTimer<T>>,
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 1,
            timers: Vec::new(),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    fn push(&mut self, delay_ms: u64, interval: Option<u64>, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(PendingTimer {
            id,
            fire_at: self.now.saturating_add(delay_ms),
            interval,
            payload,
        });
        id
    }

    /// Schedule a one-shot timer `delay_ms` from now.
    pub fn schedule_once(&mut self, delay_ms: u64, payload: T) -> TimerId {
        self.push(delay_ms, None, payload)
    }

    /// Schedule a ticker. A zero interval would never let the clock move,
    /// so such timers fire exactly once.
    pub fn schedule_repeating(&mut self, delay_ms: u64, interval_ms: u64, payload: T) -> TimerId {
        if interval_ms == 0 {
            tracing::warn!("refusing zero-interval ticker, scheduling once");
            return self.push(delay_ms, None, payload);
        }
        self.push(delay_ms, Some(interval_ms), payload)
    }

    /// Cancel a timer. Unknown or already-finished ids are ignored.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        before != self.timers.len()
    }

    /// Drop every pending timer.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.timers.len();
        self.timers.clear();
        n
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Fire time of the earliest pending timer.
    pub fn next_fire_at(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.fire_at).min()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its fire time. Ties resolve in scheduling order. Tickers are re-armed
    /// one interval after their fire time before being returned.
    pub fn pop_due(&mut self, until: u64) -> Option<Fired<T>> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.fire_at <= until)
            .min_by_key(|(_, t)| (t.fire_at, t.id))
            .map(|(i, _)| i)?;

        let at = self.timers[index].fire_at;
        if at > self.now {
            self.now = at;
        }

        let timer = &mut self.timers[index];
        let fired = Fired {
            id: timer.id,
            at,
            payload: timer.payload.clone(),
            repeating: timer.interval.is_some(),
        };
        match timer.interval {
            Some(interval) => timer.fire_at = at.saturating_add(interval),
            None => {
                self.timers.swap_remove(index);
            }
        }
        Some(fired)
    }

    /// Move the clock forward to `t` once nothing else is due before it.
    pub fn settle(&mut self, t: u64) {
        if t > self.now {
            self.now = t;
        }
    }
}

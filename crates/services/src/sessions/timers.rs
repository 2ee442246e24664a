use std::collections::BTreeMap;

/// Handle returned by [`Timers::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Move past question `index` once its result has been shown.
    AutoAdvance { index: usize },
    /// One second of the speed countdown.
    CountdownTick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub at_ms: u64,
    pub event: TimerEvent,
}

/// Cancellable one-shot timers on a virtual millisecond clock.
///
/// Nothing fires on its own: the owner advances time and drains due timers
/// with [`Timers::pop_due`], so tests drive time explicitly. Timers due at the
/// same instant fire in scheduling order.
#[derive(Debug, Default)]
pub struct Timers {
    now_ms: u64,
    next_id: u64,
    queue: BTreeMap<(u64, TimerId), TimerEvent>,
}

impl Timers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Fire `event` after `delay_ms` of virtual time.
    pub fn schedule(&mut self, delay_ms: u64, event: TimerEvent) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue
            .insert((self.now_ms.saturating_add(delay_ms), id), event);
        id
    }

    /// Cancel one timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let key = self.queue.keys().find(|(_, queued)| *queued == id).copied();
        key.is_some_and(|key| self.queue.remove(&key).is_some())
    }

    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    /// Remove and return the earliest timer due at or before `deadline_ms`,
    /// moving the clock to its due time.
    pub fn pop_due(&mut self, deadline_ms: u64) -> Option<FiredTimer> {
        let (&(at_ms, id), _) = self.queue.first_key_value()?;
        if at_ms > deadline_ms {
            return None;
        }
        let event = self.queue.remove(&(at_ms, id))?;
        self.now_ms = self.now_ms.max(at_ms);
        Some(FiredTimer { id, at_ms, event })
    }

    /// Move the clock forward to `deadline_ms` without firing anything.
    ///
    /// Callers drain [`Timers::pop_due`] first.
    pub fn settle(&mut self, deadline_ms: u64) {
        self.now_ms = self.now_ms.max(deadline_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(timers: &mut Timers, deadline: u64) -> Vec<FiredTimer> {
        let mut fired = Vec::new();
        while let Some(timer) = timers.pop_due(deadline) {
            fired.push(timer);
        }
        timers.settle(deadline);
        fired
    }

    #[test]
    fn fires_in_due_order() {
        let mut timers = Timers::new();
        timers.schedule(2_000, TimerEvent::AutoAdvance { index: 0 });
        timers.schedule(1_000, TimerEvent::CountdownTick);

        let fired = drain(&mut timers, 2_500);
        let events: Vec<_> = fired.iter().map(|t| t.event).collect();
        assert_eq!(
            events,
            vec![
                TimerEvent::CountdownTick,
                TimerEvent::AutoAdvance { index: 0 }
            ]
        );
        assert_eq!(fired[0].at_ms, 1_000);
        assert_eq!(timers.now_ms(), 2_500);
        assert!(timers.is_idle());
    }

    #[test]
    fn nothing_fires_before_due() {
        let mut timers = Timers::new();
        timers.schedule(2_000, TimerEvent::AutoAdvance { index: 3 });

        assert!(drain(&mut timers, 1_999).is_empty());
        assert_eq!(timers.pending(), 1);
        assert_eq!(drain(&mut timers, 2_000).len(), 1);
    }

    #[test]
    fn delays_are_relative_to_virtual_now() {
        let mut timers = Timers::new();
        timers.settle(5_000);
        timers.schedule(1_000, TimerEvent::CountdownTick);

        assert!(timers.pop_due(5_999).is_none());
        assert_eq!(timers.pop_due(6_000).map(|t| t.at_ms), Some(6_000));
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut timers = Timers::new();
        let advance = timers.schedule(2_000, TimerEvent::AutoAdvance { index: 0 });
        timers.schedule(1_000, TimerEvent::CountdownTick);

        assert!(timers.cancel(advance));
        assert!(!timers.cancel(advance));
        let fired = drain(&mut timers, 10_000);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].event, TimerEvent::CountdownTick);
    }

    #[test]
    fn cancel_all_empties_the_queue() {
        let mut timers = Timers::new();
        timers.schedule(1_000, TimerEvent::CountdownTick);
        timers.schedule(2_000, TimerEvent::AutoAdvance { index: 0 });
        assert_eq!(timers.pending(), 2);

        timers.cancel_all();
        assert!(drain(&mut timers, u64::MAX).is_empty());
    }

    #[test]
    fn same_instant_fires_in_schedule_order() {
        let mut timers = Timers::new();
        timers.schedule(1_000, TimerEvent::AutoAdvance { index: 7 });
        timers.schedule(1_000, TimerEvent::CountdownTick);

        let fired = drain(&mut timers, 1_000);
        assert_eq!(fired[0].event, TimerEvent::AutoAdvance { index: 7 });
        assert_eq!(fired[1].event, TimerEvent::CountdownTick);
    }
}

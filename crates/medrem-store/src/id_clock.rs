//! Timestamp-derived reminder ids.
//!
//! Ids are millisecond Unix timestamps.  [`IdClock`] never hands out the same
//! value twice: if the wall clock has not advanced past the last issued id
//! (two adds in the same millisecond, or the clock stepped backwards) the
//! next id is `last + 1`.  Once `i64::MAX` has been issued or observed the
//! clock is exhausted and [`IdClock::next`] returns `None`.

use chrono::Utc;
use medrem_types::ReminderId;

/// Monotonic id source for a single store.
#[derive(Debug, Default, Clone)]
pub struct IdClock {
    last: Option<i64>,
}

impl IdClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids are strictly greater than `id`.  Non-numeric ids
    /// are ignored.
    pub fn observe(&mut self, id: &ReminderId) {
        if let Some(ms) = id.as_millis() {
            self.last = Some(self.last.map_or(ms, |last| last.max(ms)));
        }
    }

    /// Issue an id based on the current wall-clock time, or `None` when no
    /// id greater than the last one exists.
    pub fn next(&mut self) -> Option<ReminderId> {
        self.next_at(Utc::now().timestamp_millis())
    }

    pub(crate) fn next_at(&mut self, now_ms: i64) -> Option<ReminderId> {
        let ms = match self.last {
            Some(last) if now_ms <= last => last.checked_add(1)?,
            _ => now_ms,
        };
        self.last = Some(ms);
        Some(ReminderId::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_wall_clock_when_it_advances() {
        let mut clock = IdClock::new();
        assert_eq!(clock.next_at(100).unwrap().as_millis(), Some(100));
        assert_eq!(clock.next_at(250).unwrap().as_millis(), Some(250));
    }

    #[test]
    fn same_millisecond_yields_distinct_ids() {
        let mut clock = IdClock::new();
        let a = clock.next_at(500).unwrap();
        let b = clock.next_at(500).unwrap();
        let c = clock.next_at(500).unwrap();
        assert_eq!(a.as_millis(), Some(500));
        assert_eq!(b.as_millis(), Some(501));
        assert_eq!(c.as_millis(), Some(502));
    }

    #[test]
    fn clock_stepping_backwards_keeps_increasing() {
        let mut clock = IdClock::new();
        clock.next_at(1_000);
        assert_eq!(clock.next_at(10).unwrap().as_millis(), Some(1_001));
    }

    #[test]
    fn observed_ids_are_never_reissued() {
        let mut clock = IdClock::new();
        clock.observe(&ReminderId::from_millis(9_000));
        clock.observe(&ReminderId::from_millis(3_000));
        clock.observe(&ReminderId::from("legacy-id"));
        assert_eq!(clock.next_at(5_000).unwrap().as_millis(), Some(9_001));
    }

    #[test]
    fn next_uses_current_time() {
        let mut clock = IdClock::new();
        let before = Utc::now().timestamp_millis();
        let id = clock.next().unwrap().as_millis().unwrap();
        assert!(id >= before);
    }

    #[test]
    fn exhausted_after_max_id() {
        let mut clock = IdClock::new();
        clock.observe(&ReminderId::from_millis(i64::MAX));
        assert!(clock.next_at(5_000).is_none());
        assert!(clock.next().is_none());
    }

    #[test]
    fn max_id_can_be_issued_once() {
        let mut clock = IdClock::new();
        clock.observe(&ReminderId::from_millis(i64::MAX - 1));
        assert_eq!(clock.next_at(0).unwrap().as_millis(), Some(i64::MAX));
        assert!(clock.next_at(0).is_none());
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Timer queue ordered by due time, then by scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    entries: BTreeMap<(DateTime<Utc>, u64), T>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn schedule(&mut self, due: DateTime<Utc>, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert((due, seq), item);
    }

    /// Removes and returns the earliest entry due at or before `now`.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, T)> {
        let (&(due, _), _) = self.entries.first_key_value()?;
        if due > now {
            return None;
        }
        self.entries
            .pop_first()
            .map(|((due, _), item)| (due, item))
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

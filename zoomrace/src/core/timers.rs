use crate::core::racer::RacerId;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// TimerKey identifies a timer. There is at most one scheduled timer per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKey {
    Countdown,
    Racing,
    BoostExpiry(RacerId),
}

/// DueTimer is a timer taken out of the set because its deadline passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTimer {
    pub key: TimerKey,
    pub deadline_ms: u64,
    // race epoch the timer was scheduled for
    pub epoch: u64,
    // boost token for boost expiries, 0 otherwise
    pub token: u64,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    deadline_ms: u64,
    seq: u64,
    epoch: u64,
    token: u64,
}

/// TimerSet is a set of one-shot timers on a millisecond timeline. Scheduling a key that is
/// already scheduled replaces the old timer. Timers fire in (deadline, scheduling) order.
///
/// Replaced timers stay in the heap and are skipped when they reach the top.
#[derive(Debug, Default)]
pub struct TimerSet {
    queue: BinaryHeap<Reverse<(u64, u64, TimerKey)>>,
    scheduled: HashMap<TimerKey, Scheduled>,
    next_seq: u64,
}

impl TimerSet {
    pub fn new() -> TimerSet {
        TimerSet::default()
    }

    pub fn schedule(&mut self, key: TimerKey, deadline_ms: u64, epoch: u64, token: u64) {
        self.next_seq += 1;
        let seq = self.next_seq;

        self.scheduled.insert(
            key.clone(),
            Scheduled {
                deadline_ms,
                seq,
                epoch,
                token,
            },
        );
        self.queue.push(Reverse((deadline_ms, seq, key)));
    }

    /// clear drops every timer.
    pub fn clear(&mut self) {
        self.scheduled.clear();
        self.queue.clear();
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduled.values().map(|timer| timer.deadline_ms).min()
    }

    /// pop_due removes and returns the earliest timer whose deadline is not after now_ms.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<DueTimer> {
        while let Some(Reverse((deadline_ms, seq, key))) = self.queue.peek().cloned() {
            if deadline_ms > now_ms {
                return None;
            }
            self.queue.pop();

            // skip replaced entries
            let is_current = matches!(self.scheduled.get(&key), Some(timer) if timer.seq == seq);
            if !is_current {
                continue;
            }

            if let Some(timer) = self.scheduled.remove(&key) {
                return Some(DueTimer {
                    key,
                    deadline_ms: timer.deadline_ms,
                    epoch: timer.epoch,
                    token: timer.token,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_deadline_order() {
        let mut timers = TimerSet::new();
        timers.schedule(TimerKey::Racing, 180, 1, 0);
        timers.schedule(TimerKey::BoostExpiry(RacerId::from("turbo-turtle")), 100, 1, 5);
        timers.schedule(TimerKey::Countdown, 180, 1, 0);

        assert_eq!(timers.next_deadline(), Some(100));
        assert_eq!(timers.pop_due(99), None);

        let first = timers.pop_due(200).unwrap();
        assert_eq!(first.key, TimerKey::BoostExpiry(RacerId::from("turbo-turtle")));
        assert_eq!(first.token, 5);
        // equal deadlines fire in scheduling order
        assert_eq!(timers.pop_due(200).unwrap().key, TimerKey::Racing);
        assert_eq!(timers.pop_due(200).unwrap().key, TimerKey::Countdown);
        assert_eq!(timers.pop_due(200), None);
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn rescheduling_replaces_previous_timer() {
        let mut timers = TimerSet::new();
        let key = TimerKey::BoostExpiry(RacerId::from("dizzy-dino"));
        timers.schedule(key.clone(), 1600, 1, 1);
        timers.schedule(key.clone(), 2000, 1, 2);
        assert_eq!(timers.next_deadline(), Some(2000));

        assert_eq!(timers.pop_due(1700), None);
        let due = timers.pop_due(2000).unwrap();
        assert_eq!((due.deadline_ms, due.token), (2000, 2));
        assert_eq!(timers.pop_due(5000), None);
    }

    #[test]
    fn clear_drops_every_timer() {
        let mut timers = TimerSet::new();
        timers.schedule(TimerKey::Racing, 180, 1, 0);
        timers.schedule(TimerKey::Countdown, 1000, 1, 0);
        assert_eq!(timers.next_deadline(), Some(180));

        timers.clear();
        assert_eq!(timers.pop_due(5000), None);
        assert_eq!(timers.next_deadline(), None);
    }
}

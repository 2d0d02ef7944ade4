use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;

/// A detected discontinuity in a publisher's sqNum sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceGap {
    pub publisher_id: String,
    pub expected: u32,
    pub actual: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceCheck {
    /// First message seen from this publisher.
    Baseline,
    /// sqNum went back to 0: the publisher restarted or changed state.
    Restart,
    Continuous,
    Gap(SequenceGap),
}

impl SequenceCheck {
    pub fn gap(&self) -> Option<&SequenceGap> {
        match self {
            SequenceCheck::Gap(gap) => Some(gap),
            _ => None,
        }
    }
}

/// Last sqNum per goID for the lifetime of a capture session.
///
/// The map is sharded (DashMap), so workers sharing one tracker only contend
/// when they touch the same publisher.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    last_seen: DashMap<String, u32>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `sq_num` for `publisher_id` and classify it against the
    /// previous value. The new value always becomes the baseline.
    pub fn gap_check(&self, publisher_id: &str, sq_num: u32) -> SequenceCheck {
        match self.last_seen.entry(publisher_id.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(sq_num);
                SequenceCheck::Baseline
            }
            Entry::Occupied(mut entry) => {
                let previous = entry.insert(sq_num);
                let expected = previous.wrapping_add(1);
                if sq_num == 0 {
                    SequenceCheck::Restart
                } else if sq_num != expected {
                    SequenceCheck::Gap(SequenceGap {
                        publisher_id: publisher_id.to_string(),
                        expected,
                        actual: sq_num,
                    })
                } else {
                    SequenceCheck::Continuous
                }
            }
        }
    }

    pub fn last_seen(&self, publisher_id: &str) -> Option<u32> {
        self.last_seen.get(publisher_id).map(|v| *v)
    }

    /// Number of publishers seen so far.
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }

    pub fn reset(&self) {
        self.last_seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn gaps(tracker: &SequenceTracker, id: &str, seq: &[u32]) -> Vec<SequenceGap> {
        seq.iter()
            .filter_map(|sq| tracker.gap_check(id, *sq).gap().cloned())
            .collect()
    }

    #[test]
    fn consecutive_sequence_has_no_gaps() {
        let tracker = SequenceTracker::new();
        assert!(gaps(&tracker, "P1", &[5, 6, 7]).is_empty());
        assert_eq!(tracker.last_seen("P1"), Some(7));
    }

    #[test]
    fn skipped_number_reports_one_gap() {
        let tracker = SequenceTracker::new();
        assert_eq!(
            gaps(&tracker, "P1", &[5, 7]),
            vec![SequenceGap {
                publisher_id: "P1".to_string(),
                expected: 6,
                actual: 7
            }]
        );
        // the gap value becomes the new baseline
        assert_eq!(tracker.gap_check("P1", 8), SequenceCheck::Continuous);
    }

    #[test]
    fn zero_is_a_restart() {
        let tracker = SequenceTracker::new();
        assert_eq!(tracker.gap_check("P1", 5), SequenceCheck::Baseline);
        assert_eq!(tracker.gap_check("P1", 0), SequenceCheck::Restart);
        assert_eq!(tracker.gap_check("P1", 1), SequenceCheck::Continuous);
    }

    #[test]
    fn first_message_is_baseline() {
        let tracker = SequenceTracker::new();
        assert_eq!(tracker.gap_check("P1", 42), SequenceCheck::Baseline);
        assert_eq!(tracker.gap_check("P2", 9), SequenceCheck::Baseline);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn repeated_and_backwards_numbers_are_gaps() {
        let tracker = SequenceTracker::new();
        tracker.gap_check("P1", 5);
        assert!(tracker.gap_check("P1", 5).gap().is_some());
        assert!(tracker.gap_check("P1", 3).gap().is_some());
    }

    #[test]
    fn publishers_are_independent() {
        let tracker = SequenceTracker::new();
        tracker.gap_check("P1", 1);
        tracker.gap_check("P2", 10);
        assert_eq!(tracker.gap_check("P1", 2), SequenceCheck::Continuous);
        assert_eq!(tracker.gap_check("P2", 11), SequenceCheck::Continuous);
    }

    #[test]
    fn reset_forgets_publishers() {
        let tracker = SequenceTracker::new();
        tracker.gap_check("P1", 1);
        tracker.reset();
        assert!(tracker.is_empty());
        assert_eq!(tracker.gap_check("P1", 9), SequenceCheck::Baseline);
    }

    #[test]
    fn shared_between_threads() {
        let tracker = Arc::new(SequenceTracker::new());
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    let id = format!("P{}", n);
                    gaps(&tracker, &id, &[1, 2, 3, 4]).len()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 0);
        }
        assert_eq!(tracker.len(), 4);
    }
}

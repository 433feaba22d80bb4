use serde::{Deserialize, Serialize};

/// Running totals of prediction outcomes
///
/// `total == real + deepfake` holds after every `record`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub real: u64,
    pub deepfake: u64,
    pub total: u64,
}

impl AggregateStats {
    /// Count one prediction
    pub fn record(&mut self, is_fake: bool) {
        if is_fake {
            self.deepfake += 1;
        } else {
            self.real += 1;
        }
        self.total = self.real + self.deepfake;
    }

    /// Whether the stored counters are self-consistent
    pub fn is_consistent(&self) -> bool {
        self.total == self.real + self.deepfake
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_zero() {
        let mut stats = AggregateStats::default();
        stats.record(true);
        stats.record(false);

        assert_eq!(
            stats,
            AggregateStats {
                real: 1,
                deepfake: 1,
                total: 2
            }
        );
    }

    #[test]
    fn test_record_keeps_total_consistent() {
        let mut stats = AggregateStats::default();
        for i in 0..7 {
            stats.record(i % 3 == 0);
            assert!(stats.is_consistent());
        }
        assert_eq!(stats.deepfake, 3);
        assert_eq!(stats.real, 4);
    }
}

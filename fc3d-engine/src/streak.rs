use serde::Serialize;

use crate::dimension::Dimension;
use crate::gap::ChronologicalGapTable;

/// Per-bucket aggregates over one gap table, stored as four parallel rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub dimension: Dimension,
    pub window: usize,
    pub hit_counts: Vec<u32>,
    pub avg_gaps: Vec<u32>,
    pub max_gaps: Vec<u32>,
    pub max_streaks: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketStats {
    pub bucket: usize,
    pub hit_count: u32,
    pub avg_gap: u32,
    pub max_gap: u32,
    pub max_streak: u32,
}

/// Summarizes a table using its own length as the window.
pub fn summarize(table: &ChronologicalGapTable) -> StreakSummary {
    summarize_with_window(table, table.len())
}

/// One chronological pass computing hit count, max gap and max streak;
/// the average gap is `round(window / hits)`, or `window` when a bucket never hit.
pub fn summarize_with_window(table: &ChronologicalGapTable, window: usize) -> StreakSummary {
    let k = table.bucket_count();
    let mut hit_counts = vec![0u32; k];
    let mut max_gaps = vec![0u32; k];
    let mut max_streaks = vec![0u32; k];
    let mut current = vec![0u32; k];

    for row in table.rows() {
        for (bucket, cell) in row.iter().enumerate() {
            if cell.is_hit {
                hit_counts[bucket] += 1;
                current[bucket] += 1;
                max_streaks[bucket] = max_streaks[bucket].max(current[bucket]);
            } else {
                current[bucket] = 0;
                max_gaps[bucket] = max_gaps[bucket].max(cell.gap);
            }
        }
    }

    let avg_gaps = hit_counts
        .iter()
        .map(|&hits| {
            if hits == 0 {
                window as u32
            } else {
                (window as f64 / hits as f64).round() as u32
            }
        })
        .collect();

    StreakSummary {
        dimension: table.dimension(),
        window,
        hit_counts,
        avg_gaps,
        max_gaps,
        max_streaks,
    }
}

impl StreakSummary {
    pub fn bucket(&self, bucket: usize) -> Option<BucketStats> {
        Some(BucketStats {
            bucket,
            hit_count: *self.hit_counts.get(bucket)?,
            avg_gap: self.avg_gaps[bucket],
            max_gap: self.max_gaps[bucket],
            max_streak: self.max_streaks[bucket],
        })
    }

    pub fn total_hits(&self) -> u32 {
        self.hit_counts.iter().sum()
    }

    /// Buckets with at least one hit, by hit count descending, then bucket index ascending.
    pub fn frequency_ranking(&self) -> Vec<usize> {
        let mut ranked: Vec<usize> = (0..self.hit_counts.len())
            .filter(|&b| self.hit_counts[b] > 0)
            .collect();
        ranked.sort_by(|&a, &b| self.hit_counts[b].cmp(&self.hit_counts[a]).then(a.cmp(&b)));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Position;
    use crate::window::{history_from_digits, make_test_history};
    use proptest::prelude::*;

    fn hundreds_summary(newest_first: &[[u8; 3]]) -> StreakSummary {
        let history = history_from_digits(newest_first);
        let table = ChronologicalGapTable::build(
            &history.all().chronological(),
            Dimension::Digit(Position::Hundreds),
        );
        summarize(&table)
    }

    #[test]
    fn test_streak_and_counts() {
        // chronological hundreds: 1, 1, 1, 2, 1
        let summary = hundreds_summary(&[[1, 0, 0], [2, 0, 0], [1, 0, 0], [1, 0, 0], [1, 0, 0]]);
        assert_eq!(summary.window, 5);
        assert_eq!(summary.hit_counts[1], 4);
        assert_eq!(summary.max_streaks[1], 3);
        assert_eq!(summary.max_gaps[1], 1);
        assert_eq!(summary.avg_gaps[1], 1); // round(5 / 4)
        assert_eq!(summary.hit_counts[2], 1);
        assert_eq!(summary.max_streaks[2], 1);
        assert_eq!(summary.max_gaps[2], 3); // unseen for the first three steps
        assert_eq!(summary.avg_gaps[2], 5);
    }

    #[test]
    fn test_never_hit_bucket_uses_window() {
        let summary = hundreds_summary(&[[1, 0, 0], [1, 0, 0], [1, 0, 0]]);
        assert_eq!(summary.hit_counts[7], 0);
        assert_eq!(summary.avg_gaps[7], 3);
        assert_eq!(summary.max_gaps[7], 3);
        assert_eq!(summary.max_streaks[7], 0);
    }

    #[test]
    fn test_empty_table() {
        let summary = hundreds_summary(&[]);
        assert_eq!(summary.window, 0);
        assert!(summary.hit_counts.iter().all(|&h| h == 0));
        assert!(summary.avg_gaps.iter().all(|&g| g == 0));
        assert!(summary.frequency_ranking().is_empty());
    }

    #[test]
    fn test_frequency_ranking_tie_break() {
        // hundreds newest first: 1, 1, 4, 7, 0
        let summary = hundreds_summary(&[[1, 2, 3], [1, 2, 3], [4, 5, 6], [7, 8, 8], [0, 0, 0]]);
        assert_eq!(summary.frequency_ranking(), vec![1, 0, 4, 7]);
    }

    #[test]
    fn test_bucket_accessor() {
        let summary = hundreds_summary(&[[3, 0, 0], [3, 0, 0]]);
        let stats = summary.bucket(3).unwrap();
        assert_eq!(stats.hit_count, 2);
        assert_eq!(stats.max_streak, 2);
        assert!(summary.bucket(10).is_none());
    }

    #[test]
    fn test_hits_sum_to_window_for_every_dimension() {
        let history = make_test_history(40);
        let window = history.all().chronological();
        for dim in Dimension::all() {
            let summary = summarize(&ChronologicalGapTable::build(&window, dim));
            assert_eq!(summary.total_hits(), 40, "{:?}", dim);
        }
    }

    proptest! {
        #[test]
        fn prop_hits_sum_to_window(
            digits in proptest::collection::vec((0u8..10, 0u8..10, 0u8..10), 0..60)
        ) {
            let triples: Vec<[u8; 3]> = digits.iter().map(|&(a, b, c)| [a, b, c]).collect();
            let history = history_from_digits(&triples);
            let window = history.all().chronological();
            for dim in Dimension::all() {
                let summary = summarize(&ChronologicalGapTable::build(&window, dim));
                prop_assert_eq!(summary.total_hits() as usize, triples.len());
                for b in 0..dim.bucket_count() {
                    prop_assert!(summary.max_streaks[b] <= summary.hit_counts[b]);
                }
            }
        }

        #[test]
        fn prop_summary_is_idempotent(
            digits in proptest::collection::vec((0u8..10, 0u8..10, 0u8..10), 0..40)
        ) {
            let triples: Vec<[u8; 3]> = digits.iter().map(|&(a, b, c)| [a, b, c]).collect();
            let history = history_from_digits(&triples);
            let table = ChronologicalGapTable::build(&history.all().chronological(), Dimension::Sum);
            prop_assert_eq!(summarize(&table), summarize(&table));
        }
    }
}

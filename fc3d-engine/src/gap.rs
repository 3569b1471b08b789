use serde::Serialize;

use crate::dimension::Dimension;
use crate::window::ChronologicalWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GapCell {
    pub is_hit: bool,
    pub gap: u32,
}

impl GapCell {
    pub const HIT: GapCell = GapCell { is_hit: true, gap: 0 };

    pub fn miss(gap: u32) -> Self {
        Self { is_hit: false, gap }
    }
}

/// Core gap tracker. `steps` must be oldest first; `bucket_of` names the
/// bucket matched at each step.
///
/// A bucket that has not hit yet reports `step + 1`, i.e. the distance from
/// the start of the window, never a sentinel.
pub fn track_gaps<T, F>(steps: &[T], bucket_count: usize, mut bucket_of: F) -> Vec<Vec<GapCell>>
where
    F: FnMut(&T) -> usize,
{
    let mut last_seen: Vec<Option<usize>> = vec![None; bucket_count];
    let mut rows = Vec::with_capacity(steps.len());

    for (i, step) in steps.iter().enumerate() {
        let matched = bucket_of(step);
        let row: Vec<GapCell> = (0..bucket_count)
            .map(|bucket| {
                if bucket == matched {
                    last_seen[bucket] = Some(i);
                    GapCell::HIT
                } else {
                    let gap = match last_seen[bucket] {
                        Some(seen) => i - seen,
                        None => i + 1,
                    };
                    GapCell::miss(gap as u32)
                }
            })
            .collect();
        rows.push(row);
    }

    rows
}

/// Gap table in chronological order (row 0 = oldest draw of the window).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChronologicalGapTable {
    dimension: Dimension,
    periods: Vec<String>,
    rows: Vec<Vec<GapCell>>,
}

impl ChronologicalGapTable {
    pub fn build(window: &ChronologicalWindow<'_>, dimension: Dimension) -> Self {
        let records: Vec<_> = window.iter().collect();
        let rows = track_gaps(&records, dimension.bucket_count(), |r| dimension.bucket_of(r));
        let periods = records.iter().map(|r| r.period.clone()).collect();
        log::debug!("gap table {} built over {} steps", dimension.key(), rows.len());
        Self { dimension, periods, rows }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.dimension.bucket_count()
    }

    pub fn rows(&self) -> &[Vec<GapCell>] {
        &self.rows
    }

    /// Row of the newest draw, i.e. the current gap of every bucket.
    pub fn latest_row(&self) -> Option<&[GapCell]> {
        self.rows.last().map(|r| r.as_slice())
    }

    /// Current gap per bucket; zeros when the window is empty.
    pub fn current_gaps(&self) -> Vec<u32> {
        match self.latest_row() {
            Some(row) => row.iter().map(|c| c.gap).collect(),
            None => vec![0; self.bucket_count()],
        }
    }

    pub fn into_presentation(self) -> GapTable {
        let mut periods = self.periods;
        let mut rows = self.rows;
        periods.reverse();
        rows.reverse();
        GapTable {
            dimension: self.dimension,
            bucket_labels: self.dimension.bucket_labels(),
            periods,
            rows,
        }
    }
}

/// Gap table as handed to presentation: row 0 = newest draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GapTable {
    pub dimension: Dimension,
    pub bucket_labels: Vec<String>,
    pub periods: Vec<String>,
    pub rows: Vec<Vec<GapCell>>,
}

impl GapTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn newest_row(&self) -> Option<&[GapCell]> {
        self.rows.first().map(|r| r.as_slice())
    }

    pub fn into_chronological(self) -> ChronologicalGapTable {
        let mut periods = self.periods;
        let mut rows = self.rows;
        periods.reverse();
        rows.reverse();
        ChronologicalGapTable {
            dimension: self.dimension,
            periods,
            rows,
        }
    }
}

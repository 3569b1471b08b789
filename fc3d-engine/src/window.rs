use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Result};

use fc3d_db::models::RawDraw;
use crate::features::{derive_record, DrawRecord};

/// Immutable draw history, newest first. Cloning shares the underlying records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawHistory {
    records: Arc<[DrawRecord]>,
}

impl DrawHistory {
    /// Validates, derives and orders raw draws (period descending).
    /// Duplicate periods are rejected.
    pub fn new(raw: Vec<RawDraw>) -> Result<Self> {
        let mut records = Vec::with_capacity(raw.len());
        for draw in &raw {
            draw.validate()?;
            records.push(DrawRecord::from_raw(draw));
        }
        Self::from_records(records)
    }

    pub fn from_records(mut records: Vec<DrawRecord>) -> Result<Self> {
        {
            let mut seen = HashSet::with_capacity(records.len());
            for r in &records {
                if !seen.insert(r.period.as_str()) {
                    bail!("Duplicate period {}", r.period);
                }
            }
        }
        records.sort_by(|a, b| b.period.cmp(&a.period));
        log::debug!("history built with {} draws", records.len());
        Ok(Self { records: records.into() })
    }

    pub fn empty() -> Self {
        Self { records: Arc::from(Vec::new()) }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn latest_record(&self) -> Option<&DrawRecord> {
        self.records.first()
    }

    pub fn latest_period(&self) -> Option<&str> {
        self.latest_record().map(|r| r.period.as_str())
    }

    pub fn all(&self) -> PresentationWindow<'_> {
        PresentationWindow { records: &self.records }
    }

    /// The newest `n` draws (fewer if the history is shorter).
    pub fn latest(&self, n: usize) -> PresentationWindow<'_> {
        self.all().latest(n)
    }
}

/// Newest-first view, the order handed to presentation collaborators.
#[derive(Debug, Clone, Copy)]
pub struct PresentationWindow<'a> {
    records: &'a [DrawRecord],
}

impl<'a> PresentationWindow<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &'a [DrawRecord] {
        self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'a, DrawRecord> {
        self.records.iter()
    }

    pub fn newest(&self) -> Option<&'a DrawRecord> {
        self.records.first()
    }

    pub fn latest(&self, n: usize) -> PresentationWindow<'a> {
        PresentationWindow { records: &self.records[..n.min(self.records.len())] }
    }

    pub fn chronological(&self) -> ChronologicalWindow<'a> {
        ChronologicalWindow { records: self.records.iter().rev().collect() }
    }
}

/// Oldest-first view. Gap and streak computations only accept this type.
#[derive(Debug, Clone)]
pub struct ChronologicalWindow<'a> {
    records: Vec<&'a DrawRecord>,
}

impl<'a> ChronologicalWindow<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a DrawRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn get(&self, step: usize) -> Option<&'a DrawRecord> {
        self.records.get(step).copied()
    }
}

/// Builds a history from newest-first digit triples, numbering periods so the
/// first entry gets the highest one.
pub fn history_from_digits(digits: &[[u8; 3]]) -> DrawHistory {
    let n = digits.len();
    let records = digits
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let period = format!("2024{:04}", n - i);
            let date = format!("2024-{:02}-{:02}", ((n - i) / 28) % 12 + 1, (n - i) % 28 + 1);
            derive_record(&period, &date, *d)
        })
        .collect();
    DrawHistory::from_records(records).unwrap_or_else(|_| DrawHistory::empty())
}

pub fn make_test_history(n: usize) -> DrawHistory {
    let digits: Vec<[u8; 3]> = (0..n)
        .map(|i| {
            [
                ((i * 7 + 3) % 10) as u8,
                ((i * 3 + i / 4) % 10) as u8,
                ((i * 9 + 1) % 10) as u8,
            ]
        })
        .collect();
    history_from_digits(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_sorted_newest_first() {
        let raw = vec![
            RawDraw::new("2024001", "2024-01-01", [1, 1, 1]),
            RawDraw::new("2024003", "2024-01-03", [3, 3, 3]),
            RawDraw::new("2024002", "2024-01-02", [2, 2, 2]),
        ];
        let history = DrawHistory::new(raw).unwrap();
        assert_eq!(history.latest_period(), Some("2024003"));
        let periods: Vec<&str> = history.all().iter().map(|r| r.period.as_str()).collect();
        assert_eq!(periods, vec!["2024003", "2024002", "2024001"]);
    }

    #[test]
    fn test_duplicate_period_rejected() {
        let raw = vec![
            RawDraw::new("2024001", "2024-01-01", [1, 1, 1]),
            RawDraw::new("2024001", "2024-01-01", [2, 2, 2]),
        ];
        assert!(DrawHistory::new(raw).is_err());
    }

    #[test]
    fn test_invalid_digit_rejected() {
        let raw = vec![RawDraw::new("2024001", "2024-01-01", [1, 10, 1])];
        assert!(DrawHistory::new(raw).is_err());
    }

    #[test]
    fn test_chronological_reverses() {
        let history = history_from_digits(&[[3, 3, 3], [2, 2, 2], [1, 1, 1]]);
        let chrono = history.all().chronological();
        let firsts: Vec<u8> = chrono.iter().map(|r| r.digits[0]).collect();
        assert_eq!(firsts, vec![1, 2, 3]);
        assert_eq!(chrono.get(0).map(|r| r.digits[0]), Some(1));
    }

    #[test]
    fn test_latest_truncates() {
        let history = make_test_history(12);
        assert_eq!(history.latest(5).len(), 5);
        assert_eq!(history.latest(50).len(), 12);
        assert_eq!(history.latest(5).newest(), history.latest_record());
    }

    #[test]
    fn test_history_from_digits_periods() {
        let history = history_from_digits(&[[1, 2, 3], [4, 5, 6]]);
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest_record().unwrap().digits, [1, 2, 3]);
    }

    #[test]
    fn test_clone_shares_records() {
        let history = make_test_history(3);
        let copy = history.clone();
        assert!(Arc::ptr_eq(&history.records, &copy.records));
    }
}

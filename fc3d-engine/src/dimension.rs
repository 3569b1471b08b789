use std::str::FromStr;

use anyhow::{bail, Error};
use serde::Serialize;

use crate::features::{
    DrawRecord, PatternFamily, Position, DIGIT_BUCKETS, PATTERN_BUCKETS, ROAD_BUCKETS, SUM_BUCKETS,
};

/// A classification dimension: a closed, ordered bucket set plus the rule
/// assigning each draw to exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dimension {
    Digit(Position),
    Sum,
    Span,
    SumTail,
    Pattern(PatternFamily),
    Road(Position),
}

impl Dimension {
    pub fn all() -> Vec<Dimension> {
        let mut dims: Vec<Dimension> = Position::ALL.iter().map(|&p| Dimension::Digit(p)).collect();
        dims.extend([Dimension::Sum, Dimension::Span, Dimension::SumTail]);
        dims.extend(PatternFamily::ALL.iter().map(|&f| Dimension::Pattern(f)));
        dims.extend(Position::ALL.iter().map(|&p| Dimension::Road(p)));
        dims
    }

    pub fn bucket_count(&self) -> usize {
        match self {
            Dimension::Digit(_) | Dimension::Span | Dimension::SumTail => DIGIT_BUCKETS,
            Dimension::Sum => SUM_BUCKETS,
            Dimension::Pattern(_) => PATTERN_BUCKETS,
            Dimension::Road(_) => ROAD_BUCKETS,
        }
    }

    pub fn bucket_of(&self, record: &DrawRecord) -> usize {
        match self {
            Dimension::Digit(p) => record.digit(*p) as usize,
            Dimension::Sum => record.sum as usize,
            Dimension::Span => record.span as usize,
            Dimension::SumTail => record.sum_tail as usize,
            Dimension::Pattern(f) => f.bucket_of(&record.digits),
            Dimension::Road(p) => record.road[p.index()] as usize,
        }
    }

    pub fn bucket_labels(&self) -> Vec<String> {
        match self {
            Dimension::Pattern(f) => f.bucket_labels(),
            Dimension::Road(_) => (0..ROAD_BUCKETS).map(|r| format!("{r}路")).collect(),
            _ => (0..self.bucket_count()).map(|b| b.to_string()).collect(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Dimension::Digit(p) => p.label().to_string(),
            Dimension::Sum => "和值".to_string(),
            Dimension::Span => "跨度".to_string(),
            Dimension::SumTail => "和尾".to_string(),
            Dimension::Pattern(f) => f.label().to_string(),
            Dimension::Road(p) => format!("{}012路", p.label()),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Dimension::Digit(Position::Hundreds) => "hundreds",
            Dimension::Digit(Position::Tens) => "tens",
            Dimension::Digit(Position::Units) => "units",
            Dimension::Sum => "sum",
            Dimension::Span => "span",
            Dimension::SumTail => "sum-tail",
            Dimension::Pattern(PatternFamily::BigSmall) => "big-small",
            Dimension::Pattern(PatternFamily::OddEven) => "odd-even",
            Dimension::Pattern(PatternFamily::PrimeComposite) => "prime-composite",
            Dimension::Road(Position::Hundreds) => "road-hundreds",
            Dimension::Road(Position::Tens) => "road-tens",
            Dimension::Road(Position::Units) => "road-units",
        }
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        match Dimension::all().into_iter().find(|d| d.key() == key) {
            Some(d) => Ok(d),
            None => bail!("Unknown dimension '{}'", s),
        }
    }
}

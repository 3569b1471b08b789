pub mod compute;

use serde::Serialize;

use fc3d_db::models::RawDraw;

pub use compute::derive_record;

pub const DIGIT_BUCKETS: usize = 10;
pub const SUM_BUCKETS: usize = 28;
pub const ROAD_BUCKETS: usize = 3;
pub const PATTERN_BUCKETS: usize = 8;
pub const PRIME_DIGITS: [u8; 5] = [1, 2, 3, 5, 7];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Position {
    Hundreds,
    Tens,
    Units,
}

impl Position {
    pub const ALL: [Position; 3] = [Position::Hundreds, Position::Tens, Position::Units];

    pub fn index(&self) -> usize {
        match self {
            Position::Hundreds => 0,
            Position::Tens => 1,
            Position::Units => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Position::Hundreds => "百位",
            Position::Tens => "十位",
            Position::Units => "个位",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Group {
    /// All three digits equal.
    Triplet,
    /// Exactly two digits equal.
    Pair,
    /// All digits distinct.
    Six,
}

impl Group {
    pub const ALL: [Group; 3] = [Group::Triplet, Group::Pair, Group::Six];

    pub fn index(&self) -> usize {
        match self {
            Group::Triplet => 0,
            Group::Pair => 1,
            Group::Six => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Group::Triplet => "豹子",
            Group::Pair => "组三",
            Group::Six => "组六",
        }
    }
}

/// Two-symbol classification applied to every position, giving a 3-symbol pattern string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PatternFamily {
    BigSmall,
    OddEven,
    PrimeComposite,
}

impl PatternFamily {
    pub const ALL: [PatternFamily; 3] = [
        PatternFamily::BigSmall,
        PatternFamily::OddEven,
        PatternFamily::PrimeComposite,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PatternFamily::BigSmall => "大小形态",
            PatternFamily::OddEven => "奇偶形态",
            PatternFamily::PrimeComposite => "质合形态",
        }
    }

    /// (symbol when the predicate holds, symbol otherwise)
    pub fn symbols(&self) -> (char, char) {
        match self {
            PatternFamily::BigSmall => ('大', '小'),
            PatternFamily::OddEven => ('奇', '偶'),
            PatternFamily::PrimeComposite => ('质', '合'),
        }
    }

    pub fn holds(&self, digit: u8) -> bool {
        match self {
            PatternFamily::BigSmall => digit >= 5,
            PatternFamily::OddEven => digit % 2 == 1,
            PatternFamily::PrimeComposite => PRIME_DIGITS.contains(&digit),
        }
    }

    /// Bucket index of a digit triple: the hundreds digit is the high bit and
    /// a digit where the predicate holds contributes 0, so index 0 is e.g.
    /// "大大大" and index 7 is "小小小".
    pub fn bucket_of(&self, digits: &[u8; 3]) -> usize {
        digits
            .iter()
            .fold(0usize, |acc, &d| (acc << 1) | usize::from(!self.holds(d)))
    }

    pub fn bucket_labels(&self) -> Vec<String> {
        let (yes, no) = self.symbols();
        (0..PATTERN_BUCKETS)
            .map(|idx| {
                (0..3)
                    .map(|bit| if idx & (0b100 >> bit) == 0 { yes } else { no })
                    .collect()
            })
            .collect()
    }
}

/// A draw together with every field derived from its three digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawRecord {
    pub period: String,
    pub date: String,
    pub digits: [u8; 3],
    pub sum: u8,
    pub span: u8,
    pub sum_tail: u8,
    pub odd_count: u8,
    pub even_count: u8,
    pub big_count: u8,
    pub small_count: u8,
    pub group: Group,
    pub is_sequence: bool,
    pub big_small: String,
    pub odd_even: String,
    pub prime_composite: String,
    pub road: [u8; 3],
}

impl DrawRecord {
    pub fn from_raw(raw: &RawDraw) -> Self {
        derive_record(&raw.period, &raw.date, raw.digits)
    }

    pub fn digit(&self, position: Position) -> u8 {
        self.digits[position.index()]
    }

    pub fn pattern(&self, family: PatternFamily) -> &str {
        match family {
            PatternFamily::BigSmall => &self.big_small,
            PatternFamily::OddEven => &self.odd_even,
            PatternFamily::PrimeComposite => &self.prime_composite,
        }
    }

    pub fn digits_label(&self) -> String {
        self.digits.iter().map(|d| d.to_string()).collect()
    }
}

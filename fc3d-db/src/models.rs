use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub const DIGIT_COUNT: usize = 3;

/// One draw as delivered by the loader, before any derived field exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDraw {
    pub period: String,
    pub date: String,
    pub digits: [u8; DIGIT_COUNT],
}

impl RawDraw {
    pub fn new(period: impl Into<String>, date: impl Into<String>, digits: [u8; DIGIT_COUNT]) -> Self {
        Self {
            period: period.into(),
            date: date.into(),
            digits,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.period.trim().is_empty() {
            bail!("Period identifier is empty");
        }
        validate_digits(&self.digits)
    }

    /// Builds a draw from loosely typed fields, rejecting wrong arity or out-of-range values.
    pub fn from_parts(period: &str, date: &str, digits: &[i64]) -> Result<Self> {
        if digits.len() != DIGIT_COUNT {
            bail!("Expected {} digits, got {}", DIGIT_COUNT, digits.len());
        }
        let mut out = [0u8; DIGIT_COUNT];
        for (slot, &d) in out.iter_mut().zip(digits) {
            if !(0..=9).contains(&d) {
                bail!("Digit {} out of range (0-9)", d);
            }
            *slot = d as u8;
        }
        let draw = RawDraw::new(period.trim(), date.trim(), out);
        draw.validate()?;
        Ok(draw)
    }
}

pub fn validate_digits(digits: &[u8; DIGIT_COUNT]) -> Result<()> {
    for &d in digits {
        if d > 9 {
            bail!("Digit {} out of range (0-9)", d);
        }
    }
    Ok(())
}

/// Parses a compact "358" or spaced "3 5 8" digit string.
pub fn parse_digits(input: &str) -> Result<[u8; DIGIT_COUNT]> {
    let cleaned: Vec<char> = input.chars().filter(|c| !c.is_whitespace() && *c != ',').collect();
    if cleaned.len() != DIGIT_COUNT {
        bail!("Expected {} digits in '{}'", DIGIT_COUNT, input);
    }
    let mut out = [0u8; DIGIT_COUNT];
    for (slot, c) in out.iter_mut().zip(cleaned) {
        match c.to_digit(10) {
            Some(d) => *slot = d as u8,
            None => bail!("Invalid digit '{}' in '{}'", c, input),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_digits_ok() {
        assert!(validate_digits(&[0, 5, 9]).is_ok());
        assert!(validate_digits(&[9, 9, 9]).is_ok());
    }

    #[test]
    fn test_validate_digits_out_of_range() {
        assert!(validate_digits(&[10, 0, 0]).is_err());
        assert!(validate_digits(&[0, 0, 255]).is_err());
    }

    #[test]
    fn test_validate_empty_period() {
        let draw = RawDraw::new("  ", "2024-01-01", [1, 2, 3]);
        assert!(draw.validate().is_err());
    }

    #[test]
    fn test_from_parts_arity() {
        assert!(RawDraw::from_parts("2024001", "2024-01-01", &[1, 2]).is_err());
        assert!(RawDraw::from_parts("2024001", "2024-01-01", &[1, 2, 3, 4]).is_err());
        assert!(RawDraw::from_parts("2024001", "2024-01-01", &[1, -2, 3]).is_err());
        let draw = RawDraw::from_parts(" 2024001 ", "2024-01-01", &[1, 2, 3]).unwrap();
        assert_eq!(draw.period, "2024001");
        assert_eq!(draw.digits, [1, 2, 3]);
    }

    #[test]
    fn test_parse_digits() {
        assert_eq!(parse_digits("358").unwrap(), [3, 5, 8]);
        assert_eq!(parse_digits("3 5 8").unwrap(), [3, 5, 8]);
        assert_eq!(parse_digits("3,5,8").unwrap(), [3, 5, 8]);
        assert!(parse_digits("35").is_err());
        assert!(parse_digits("3a8").is_err());
    }
}

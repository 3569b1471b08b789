use super::{DrawRecord, Group, PatternFamily};

/// Derives the full record from three validated digits. Pure: no field is
/// computed from anything other than `digits`.
pub fn derive_record(period: &str, date: &str, digits: [u8; 3]) -> DrawRecord {
    let sum = digit_sum(&digits);
    let odd_count = digits.iter().filter(|&&d| PatternFamily::OddEven.holds(d)).count() as u8;
    let big_count = digits.iter().filter(|&&d| PatternFamily::BigSmall.holds(d)).count() as u8;

    DrawRecord {
        period: period.to_string(),
        date: date.to_string(),
        digits,
        sum,
        span: digit_span(&digits),
        sum_tail: sum % 10,
        odd_count,
        even_count: 3 - odd_count,
        big_count,
        small_count: 3 - big_count,
        group: classify_group(&digits),
        is_sequence: is_sequence(&digits),
        big_small: pattern_string(&digits, PatternFamily::BigSmall),
        odd_even: pattern_string(&digits, PatternFamily::OddEven),
        prime_composite: pattern_string(&digits, PatternFamily::PrimeComposite),
        road: road_triple(&digits),
    }
}

pub fn digit_sum(digits: &[u8; 3]) -> u8 {
    digits.iter().sum()
}

pub fn digit_span(digits: &[u8; 3]) -> u8 {
    let max = digits.iter().copied().max().unwrap_or(0);
    let min = digits.iter().copied().min().unwrap_or(0);
    max - min
}

pub fn classify_group(digits: &[u8; 3]) -> Group {
    let [a, b, c] = *digits;
    if a == b && b == c {
        Group::Triplet
    } else if a == b || b == c || a == c {
        Group::Pair
    } else {
        Group::Six
    }
}

/// Sorted digits form a run of consecutive integers (0-1-2 … 7-8-9, no wrap).
pub fn is_sequence(digits: &[u8; 3]) -> bool {
    let mut sorted = *digits;
    sorted.sort_unstable();
    sorted[1] == sorted[0] + 1 && sorted[2] == sorted[1] + 1
}

pub fn pattern_string(digits: &[u8; 3], family: PatternFamily) -> String {
    let (yes, no) = family.symbols();
    digits
        .iter()
        .map(|&d| if family.holds(d) { yes } else { no })
        .collect()
}

pub fn road_triple(digits: &[u8; 3]) -> [u8; 3] {
    digits.map(|d| d % 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_basic_fields() {
        let r = derive_record("2024001", "2024-01-01", [3, 5, 8]);
        assert_eq!(r.sum, 16);
        assert_eq!(r.span, 5);
        assert_eq!(r.sum_tail, 6);
        assert_eq!(r.odd_count, 2);
        assert_eq!(r.even_count, 1);
        assert_eq!(r.big_count, 2);
        assert_eq!(r.small_count, 1);
        assert_eq!(r.group, Group::Six);
        assert!(!r.is_sequence);
        assert_eq!(r.big_small, "小大大");
        assert_eq!(r.odd_even, "奇奇偶");
        assert_eq!(r.prime_composite, "质质合");
        assert_eq!(r.road, [0, 2, 2]);
    }

    #[test]
    fn test_extremes() {
        let low = derive_record("p", "d", [0, 0, 0]);
        assert_eq!(low.sum, 0);
        assert_eq!(low.span, 0);
        assert_eq!(low.group, Group::Triplet);
        assert_eq!(low.prime_composite, "合合合");

        let high = derive_record("p", "d", [9, 9, 9]);
        assert_eq!(high.sum, 27);
        assert_eq!(high.sum_tail, 7);
        assert_eq!(high.big_small, "大大大");
        assert_eq!(high.road, [0, 0, 0]);
    }

    #[test]
    fn test_group_classification() {
        assert_eq!(classify_group(&[7, 7, 7]), Group::Triplet);
        assert_eq!(classify_group(&[7, 1, 7]), Group::Pair);
        assert_eq!(classify_group(&[1, 7, 7]), Group::Pair);
        assert_eq!(classify_group(&[1, 2, 7]), Group::Six);
    }

    #[test]
    fn test_sequence_detection() {
        assert!(is_sequence(&[3, 1, 2]));
        assert!(is_sequence(&[7, 8, 9]));
        assert!(!is_sequence(&[8, 9, 0]));
        assert!(!is_sequence(&[1, 1, 2]));
        assert!(!is_sequence(&[1, 3, 5]));
    }

    #[test]
    fn test_counts_always_sum_to_three() {
        for a in 0..10u8 {
            for b in 0..10u8 {
                for c in 0..10u8 {
                    let r = derive_record("p", "d", [a, b, c]);
                    assert_eq!(r.odd_count + r.even_count, 3);
                    assert_eq!(r.big_count + r.small_count, 3);
                    assert!(r.sum <= 27);
                    assert!(r.span <= 9);
                    assert!(r.road.iter().all(|&x| x < 3));
                }
            }
        }
    }

    #[test]
    fn test_derivation_is_deterministic() {
        assert_eq!(derive_record("p", "d", [4, 0, 9]), derive_record("p", "d", [4, 0, 9]));
    }
}

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::dimension::Dimension;
use crate::features::{PatternFamily, Position, DIGIT_BUCKETS};
use crate::gap::ChronologicalGapTable;
use crate::streak::summarize;
use crate::window::{ChronologicalWindow, DrawHistory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecommendation {
    pub position: Position,
    pub label: String,
    pub recommended_digits: Vec<u8>,
    pub hot_digits: Vec<u8>,
    pub cold_digits: Vec<u8>,
    pub reasons: BTreeMap<u8, String>,
    /// Hit count per digit over the recommendation window.
    pub frequencies: Vec<u32>,
    /// Current gap per digit over the full history.
    pub current_gaps: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub average: f64,
    pub min: u8,
    pub max: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternCount {
    pub pattern: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternAffinity {
    pub family: PatternFamily,
    pub label: String,
    pub patterns: Vec<PatternCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub window: usize,
    pub positions: Vec<PositionRecommendation>,
    pub sum_range: ValueRange,
    pub span_range: ValueRange,
    pub pattern_affinities: Vec<PatternAffinity>,
}

/// Deterministic heuristic over the trailing window; frequencies come from the
/// window, current gaps from the full history.
pub fn recommend(history: &DrawHistory, config: &AnalysisConfig) -> Recommendation {
    let window = history.latest(config.recommend_window);
    let window_chrono = window.chronological();
    let full_chrono = history.all().chronological();

    let positions = Position::ALL
        .iter()
        .map(|&p| recommend_position(p, &window_chrono, &full_chrono, config))
        .collect();

    let sum_range = reference_range(window.iter().map(|r| r.sum), config.sum_offset, 27);
    let span_range = reference_range(window.iter().map(|r| r.span), config.span_offset, 9);

    let pattern_affinities = PatternFamily::ALL
        .iter()
        .map(|&family| pattern_affinity(family, &window_chrono, config.pattern_affinity_count))
        .collect();

    log::debug!("recommendation built over {} draws", window.len());

    Recommendation {
        window: window.len(),
        positions,
        sum_range,
        span_range,
        pattern_affinities,
    }
}

fn recommend_position(
    position: Position,
    window: &ChronologicalWindow<'_>,
    full: &ChronologicalWindow<'_>,
    config: &AnalysisConfig,
) -> PositionRecommendation {
    let dim = Dimension::Digit(position);
    let summary = summarize(&ChronologicalGapTable::build(window, dim));
    let gaps = ChronologicalGapTable::build(full, dim).current_gaps();
    let ranking: Vec<u8> = summary.frequency_ranking().into_iter().map(|d| d as u8).collect();

    let hot: Vec<u8> = ranking.iter().copied().take(config.hot_count).collect();

    let mut cold: Vec<u8> = (0..DIGIT_BUCKETS as u8)
        .filter(|&d| gaps[d as usize] > config.cold_gap_threshold)
        .collect();
    cold.sort_by(|&a, &b| gaps[b as usize].cmp(&gaps[a as usize]).then(a.cmp(&b)));
    cold.truncate(config.max_cold);

    let mut recommended: Vec<u8> = Vec::with_capacity(config.max_recommended);
    for &d in hot.iter().take(config.max_hot_in_recommendation) {
        push_unique(&mut recommended, d);
    }
    for &d in &cold {
        if recommended.len() >= config.max_recommended {
            break;
        }
        push_unique(&mut recommended, d);
    }
    for &d in &ranking {
        if recommended.len() >= config.min_recommended {
            break;
        }
        push_unique(&mut recommended, d);
    }

    let window_len = window.len();
    let reasons = recommended
        .iter()
        .map(|&d| {
            let freq = summary.hit_counts[d as usize];
            let gap = gaps[d as usize];
            let reason = if gap > config.cold_gap_threshold {
                format!("遗漏{}期，超过{}期阈值，回补候选", gap, config.cold_gap_threshold)
            } else if hot.contains(&d) {
                format!("近{}期出现{}次，高频号码", window_len, freq)
            } else {
                format!("近{}期出现{}次，当前遗漏{}期", window_len, freq, gap)
            };
            (d, reason)
        })
        .collect();

    PositionRecommendation {
        position,
        label: position.label().to_string(),
        recommended_digits: recommended,
        hot_digits: hot,
        cold_digits: cold,
        reasons,
        frequencies: summary.hit_counts,
        current_gaps: gaps,
    }
}

fn push_unique(list: &mut Vec<u8>, digit: u8) {
    if !list.contains(&digit) {
        list.push(digit);
    }
}

/// Window average ± offset, clamped to [0, domain_max]. An empty window yields the whole domain.
fn reference_range(values: impl Iterator<Item = u8>, offset: u8, domain_max: u8) -> ValueRange {
    let values: Vec<u8> = values.collect();
    if values.is_empty() {
        return ValueRange { average: 0.0, min: 0, max: domain_max };
    }
    let average = values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64;
    let center = average.round() as u8;
    ValueRange {
        average,
        min: center.saturating_sub(offset),
        max: center.saturating_add(offset).min(domain_max),
    }
}

fn pattern_affinity(family: PatternFamily, window: &ChronologicalWindow<'_>, count: usize) -> PatternAffinity {
    let summary = summarize(&ChronologicalGapTable::build(window, Dimension::Pattern(family)));
    let labels = family.bucket_labels();
    let patterns = summary
        .frequency_ranking()
        .into_iter()
        .take(count)
        .map(|b| PatternCount {
            pattern: labels[b].clone(),
            count: summary.hit_counts[b],
        })
        .collect();
    PatternAffinity {
        family,
        label: family.label().to_string(),
        patterns,
    }
}

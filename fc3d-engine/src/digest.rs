//! Plain-text digest of the current history, one fact per line. The windows
//! match the chart builders so both views quote the same numbers.

use crate::chart::windows;
use crate::config::AnalysisConfig;
use crate::features::Group;
use crate::recommend::{recommend, PatternCount, ValueRange};
use crate::window::DrawHistory;

pub fn build_digest(history: &DrawHistory, config: &AnalysisConfig) -> Vec<String> {
    let Some(latest) = history.latest_record() else {
        return vec!["暂无开奖数据".to_string()];
    };

    let mut lines = Vec::new();
    lines.push(format!(
        "最新一期 {}（{}）：{}，和值{}，跨度{}，{}",
        latest.period,
        latest.date,
        latest.digits_label(),
        latest.sum,
        latest.span,
        latest.group.label()
    ));

    let recent = history.latest(windows::RECENT);
    lines.push(format!("近{}期开奖：", recent.len()));
    for r in recent.iter() {
        lines.push(format!(
            "  {} {} 和值{} 跨度{} {} {} {}",
            r.period,
            r.digits_label(),
            r.sum,
            r.span,
            r.big_small,
            r.odd_even,
            r.group.label()
        ));
    }

    let rec = recommend(history, config);
    for p in &rec.positions {
        let gaps: Vec<String> = p
            .current_gaps
            .iter()
            .enumerate()
            .map(|(d, g)| format!("{d}:{g}"))
            .collect();
        lines.push(format!(
            "{}：近{}期热号 {}，冷号 {}，当前遗漏 {}",
            p.label,
            rec.window,
            join_digits(&p.hot_digits),
            join_digits(&p.cold_digits),
            gaps.join(" ")
        ));
    }

    let line = history.latest(windows::LINE);
    let n = line.len() as f64;
    lines.push(format!(
        "近{}期平均和值{:.1}，平均跨度{:.1}",
        line.len(),
        line.iter().map(|r| r.sum as f64).sum::<f64>() / n,
        line.iter().map(|r| r.span as f64).sum::<f64>() / n
    ));

    for affinity in &rec.pattern_affinities {
        lines.push(format!(
            "近{}期{}常见：{}",
            rec.window,
            affinity.label,
            join_patterns(&affinity.patterns)
        ));
    }

    let group_window = history.latest(windows::GROUP);
    let mut counts = [0u32; 3];
    for r in group_window.iter() {
        counts[r.group.index()] += 1;
    }
    let mix: Vec<String> = Group::ALL
        .iter()
        .map(|g| format!("{}{}次", g.label(), counts[g.index()]))
        .collect();
    lines.push(format!("近{}期组选：{}", group_window.len(), mix.join("，")));

    for p in &rec.positions {
        let reasons: Vec<String> = p
            .recommended_digits
            .iter()
            .filter_map(|d| p.reasons.get(d).map(|r| format!("{d}（{r}）")))
            .collect();
        lines.push(format!("推荐{}：{}", p.label, reasons.join("；")));
    }
    lines.push(format!("和值参考范围 {}", format_range(&rec.sum_range)));
    lines.push(format!("跨度参考范围 {}", format_range(&rec.span_range)));

    lines
}

fn join_digits(digits: &[u8]) -> String {
    if digits.is_empty() {
        return "无".to_string();
    }
    digits.iter().map(|d| d.to_string()).collect::<Vec<_>>().join("、")
}

fn join_patterns(patterns: &[PatternCount]) -> String {
    if patterns.is_empty() {
        return "无".to_string();
    }
    patterns
        .iter()
        .map(|p| format!("{}（{}次）", p.pattern, p.count))
        .collect::<Vec<_>>()
        .join("、")
}

fn format_range(range: &ValueRange) -> String {
    format!("{}-{}（均值{:.1}）", range.min, range.max, range.average)
}

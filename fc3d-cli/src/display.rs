use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};
use textplots::Plot;

use crate::import::ImportResult;
use fc3d_engine::chart::{ChartBundle, ChartData, ChartKind, SummaryCard};
use fc3d_engine::features::DrawRecord;
use fc3d_engine::gap::GapTable;
use fc3d_engine::recommend::Recommendation;
use fc3d_engine::streak::StreakSummary;

fn new_table(header: Vec<String>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_draws(draws: &[DrawRecord]) {
    if draws.is_empty() {
        println!("没有可显示的开奖记录。");
        return;
    }

    let header = ["期号", "日期", "号码", "和值", "跨度", "大小", "奇偶", "质合", "组选"];
    let mut table = new_table(header.iter().map(|s| s.to_string()).collect());

    for draw in draws {
        let group = if draw.is_sequence {
            format!("{} 顺子", draw.group.label())
        } else {
            draw.group.label().to_string()
        };
        table.add_row(vec![
            draw.period.clone(),
            draw.date.clone(),
            draw.digits.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(" "),
            draw.sum.to_string(),
            draw.span.to_string(),
            draw.big_small.clone(),
            draw.odd_even.clone(),
            draw.prime_composite.clone(),
            group,
        ]);
    }

    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("导入完成：");
    println!("  读取行数   : {}", result.total_records);
    println!("  新增       : {}", result.inserted);
    println!("  重复跳过   : {}", result.skipped);
    if result.errors > 0 {
        println!("  错误       : {}", result.errors);
    }
}

/// Hit cells show the bucket label in red, misses show the running gap.
pub fn display_gap_table(table_data: &GapTable, last: usize) {
    let shown = last.min(table_data.len());
    println!("\n── {} 遗漏表（近{}期）──\n", table_data.dimension.label(), shown);
    if table_data.is_empty() {
        println!("  (无数据)");
        return;
    }

    let mut header = vec!["期号".to_string()];
    header.extend(table_data.bucket_labels.iter().cloned());
    let mut table = new_table(header);

    for (period, row) in table_data.periods.iter().zip(&table_data.rows).take(shown) {
        let mut cells = vec![Cell::new(period)];
        for (label, cell) in table_data.bucket_labels.iter().zip(row) {
            if cell.is_hit {
                cells.push(Cell::new(label).fg(Color::Red));
            } else {
                cells.push(Cell::new(cell.gap));
            }
        }
        table.add_row(cells);
    }
    println!("{table}");
}

pub fn display_streaks(summary: &StreakSummary) {
    println!("\n── {} 统计（近{}期）──\n", summary.dimension.label(), summary.window);

    let header = ["分类", "出现次数", "平均遗漏", "最大遗漏", "最大连出"];
    let mut table = new_table(header.iter().map(|s| s.to_string()).collect());
    let labels = summary.dimension.bucket_labels();
    let ranking = summary.frequency_ranking();

    for (b, label) in labels.iter().enumerate() {
        let Some(stats) = summary.bucket(b) else { continue };
        let color = if ranking.iter().take(3).any(|&r| r == b) {
            Color::Green
        } else if stats.hit_count == 0 {
            Color::Red
        } else {
            Color::White
        };
        table.add_row(vec![
            Cell::new(label).fg(color),
            Cell::new(stats.hit_count),
            Cell::new(stats.avg_gap),
            Cell::new(stats.max_gap),
            Cell::new(stats.max_streak),
        ]);
    }
    println!("{table}");
}

fn join_digits(digits: &[u8]) -> String {
    if digits.is_empty() {
        return "-".to_string();
    }
    digits.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(" ")
}

pub fn display_recommendation(rec: &Recommendation) {
    println!("\n🎯 号码推荐（近{}期）\n", rec.window);

    let header = ["位置", "推荐", "热号", "冷号", "理由"];
    let mut table = new_table(header.iter().map(|s| s.to_string()).collect());
    for p in &rec.positions {
        let reasons = p
            .recommended_digits
            .iter()
            .filter_map(|d| p.reasons.get(d).map(|r| format!("{d}: {r}")))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            Cell::new(&p.label),
            Cell::new(join_digits(&p.recommended_digits)).fg(Color::Green),
            Cell::new(join_digits(&p.hot_digits)),
            Cell::new(join_digits(&p.cold_digits)),
            Cell::new(reasons),
        ]);
    }
    println!("{table}");

    println!(
        "  和值参考范围 : {}-{}（均值 {:.1}）",
        rec.sum_range.min, rec.sum_range.max, rec.sum_range.average
    );
    println!(
        "  跨度参考范围 : {}-{}（均值 {:.1}）",
        rec.span_range.min, rec.span_range.max, rec.span_range.average
    );
    for affinity in &rec.pattern_affinities {
        let patterns = affinity
            .patterns
            .iter()
            .map(|p| format!("{}({})", p.pattern, p.count))
            .collect::<Vec<_>>()
            .join("、");
        println!("  {}常见 : {}", affinity.label, patterns);
    }
}

fn display_cards(cards: &[SummaryCard]) {
    if cards.is_empty() {
        return;
    }
    let header = ["指标", "数值", "趋势", "说明"];
    let mut table = new_table(header.iter().map(|s| s.to_string()).collect());
    for card in cards {
        table.add_row(vec![
            card.label.clone(),
            card.value.clone(),
            card.trend_direction.map(|t| t.arrow().to_string()).unwrap_or_default(),
            card.note.clone().unwrap_or_default(),
        ]);
    }
    println!("{table}");
}

fn display_line_chart(chart: &ChartData) {
    let all: Vec<f64> = chart.series.iter().flat_map(|s| s.values.iter().copied()).collect();
    if all.is_empty() {
        println!("  (无数据)");
        return;
    }
    let y_min = all.iter().copied().fold(f64::INFINITY, f64::min) as f32 - 1.0;
    let y_max = all.iter().copied().fold(f64::NEG_INFINITY, f64::max) as f32 + 1.0;
    let x_max = chart.category_labels.len().saturating_sub(1).max(1) as f32;

    if let (Some(first), Some(last)) = (chart.category_labels.first(), chart.category_labels.last()) {
        println!("  {} → {}", first, last);
    }
    for series in &chart.series {
        let points: Vec<(f32, f32)> = series
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f32, *v as f32))
            .collect();
        println!("  {} :", series.name);
        let shape = textplots::Shape::Lines(&points);
        let mut plot = textplots::Chart::new_with_y_range(120, 40, 0.0, x_max, y_min, y_max);
        println!("{}", plot.lineplot(&shape));
    }
}

/// Bars and pies both render as a category table with a proportional bar.
fn display_category_chart(chart: &ChartData) {
    let mut header = vec!["分类".to_string()];
    header.extend(chart.series.iter().map(|s| s.name.clone()));
    let single = chart.series.len() == 1;
    if single {
        header.push(if chart.kind == ChartKind::Pie { "占比" } else { "分布" }.to_string());
    }
    let mut table = new_table(header);

    let total: f64 = chart.series.first().map(|s| s.values.iter().sum()).unwrap_or(0.0);
    let max = chart
        .series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .fold(0.0, f64::max);

    for (i, category) in chart.category_labels.iter().enumerate() {
        let mut row = vec![category.clone()];
        for series in &chart.series {
            row.push(format!("{}", series.values.get(i).copied().unwrap_or(0.0)));
        }
        if single {
            let v = chart.series[0].values.get(i).copied().unwrap_or(0.0);
            let extra = match chart.kind {
                ChartKind::Pie if total > 0.0 => format!("{:.1}%", v / total * 100.0),
                ChartKind::Pie => "-".to_string(),
                _ if max > 0.0 => "█".repeat((v / max * 30.0).round() as usize),
                _ => String::new(),
            };
            row.push(extra);
        }
        table.add_row(row);
    }
    println!("{table}");
}

pub fn display_bundle(bundle: &ChartBundle) {
    println!("\n📊 {}\n", bundle.intent.label());
    for chart in &bundle.charts {
        println!("── {} ──", chart.title);
        match chart.kind {
            ChartKind::Line => display_line_chart(chart),
            ChartKind::Bar | ChartKind::Pie => display_category_chart(chart),
        }
        println!();
    }
    display_cards(&bundle.cards);
    if let Some(rec) = &bundle.recommendation {
        display_recommendation(rec);
    }
}

pub fn display_digest(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::dimension::Dimension;
use crate::features::{DrawRecord, Group, PatternFamily, Position, DIGIT_BUCKETS};
use crate::gap::ChronologicalGapTable;
use crate::intent::{classify, QueryIntent};
use crate::recommend::{recommend, Recommendation};
use crate::streak::{summarize, StreakSummary};
use crate::window::{DrawHistory, PresentationWindow};

/// Fixed windows per intent. The text digest quotes the same numbers, so
/// these must stay in sync with it.
pub mod windows {
    pub const PREDICTION: usize = 50;
    pub const FREQUENCY: usize = 100;
    pub const LINE: usize = 30;
    pub const DISTRIBUTION: usize = 100;
    pub const TREND: usize = 20;
    pub const HOT_COLD: usize = 15;
    pub const PATTERN: usize = 50;
    pub const ROAD: usize = 30;
    pub const GROUP: usize = 100;
    pub const RECENT: usize = 10;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub title: String,
    pub kind: ChartKind,
    pub category_labels: Vec<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl TrendDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            TrendDirection::Up => "↑",
            TrendDirection::Down => "↓",
            TrendDirection::Flat => "→",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCard {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_direction: Option<TrendDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SummaryCard {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            trend_direction: None,
            note: None,
        }
    }

    pub fn with_trend(mut self, trend: Option<TrendDirection>) -> Self {
        self.trend_direction = trend;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// One variant per intent, carrying the windows that intent is built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "kebab-case")]
pub enum ChartRequest {
    Prediction { window: usize },
    Frequency { window: usize },
    Missing,
    #[serde(rename_all = "camelCase")]
    Sum { line_window: usize, distribution_window: usize },
    #[serde(rename_all = "camelCase")]
    Span { line_window: usize, distribution_window: usize },
    Trend { window: usize },
    HotCold { window: usize },
    Pattern { window: usize },
    Road { window: usize },
    Group { window: usize },
}

impl ChartRequest {
    pub fn for_intent(intent: QueryIntent) -> Self {
        match intent {
            QueryIntent::Prediction => ChartRequest::Prediction { window: windows::PREDICTION },
            QueryIntent::Frequency => ChartRequest::Frequency { window: windows::FREQUENCY },
            QueryIntent::Missing => ChartRequest::Missing,
            QueryIntent::Sum => ChartRequest::Sum {
                line_window: windows::LINE,
                distribution_window: windows::DISTRIBUTION,
            },
            QueryIntent::Span => ChartRequest::Span {
                line_window: windows::LINE,
                distribution_window: windows::DISTRIBUTION,
            },
            QueryIntent::Trend => ChartRequest::Trend { window: windows::TREND },
            QueryIntent::HotCold => ChartRequest::HotCold { window: windows::HOT_COLD },
            QueryIntent::Pattern => ChartRequest::Pattern { window: windows::PATTERN },
            QueryIntent::Road => ChartRequest::Road { window: windows::ROAD },
            QueryIntent::Group => ChartRequest::Group { window: windows::GROUP },
        }
    }

    pub fn intent(&self) -> QueryIntent {
        match self {
            ChartRequest::Prediction { .. } => QueryIntent::Prediction,
            ChartRequest::Frequency { .. } => QueryIntent::Frequency,
            ChartRequest::Missing => QueryIntent::Missing,
            ChartRequest::Sum { .. } => QueryIntent::Sum,
            ChartRequest::Span { .. } => QueryIntent::Span,
            ChartRequest::Trend { .. } => QueryIntent::Trend,
            ChartRequest::HotCold { .. } => QueryIntent::HotCold,
            ChartRequest::Pattern { .. } => QueryIntent::Pattern,
            ChartRequest::Road { .. } => QueryIntent::Road,
            ChartRequest::Group { .. } => QueryIntent::Group,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBundle {
    pub intent: QueryIntent,
    pub request: ChartRequest,
    pub charts: Vec<ChartData>,
    pub cards: Vec<SummaryCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

pub fn build_for_query(query: &str, history: &DrawHistory, config: &AnalysisConfig) -> ChartBundle {
    build_chart(ChartRequest::for_intent(classify(query)), history, config)
}

pub fn build_chart(request: ChartRequest, history: &DrawHistory, config: &AnalysisConfig) -> ChartBundle {
    let mut recommendation = None;
    let (charts, cards) = match request {
        ChartRequest::Prediction { window } => {
            recommendation = Some(recommend(history, config));
            prediction(history, window)
        }
        ChartRequest::Frequency { window } => frequency(history, window),
        ChartRequest::Missing => missing(history),
        ChartRequest::Sum { line_window, distribution_window } => {
            value_analysis(history, ValueKind::Sum, line_window, distribution_window)
        }
        ChartRequest::Span { line_window, distribution_window } => {
            value_analysis(history, ValueKind::Span, line_window, distribution_window)
        }
        ChartRequest::Trend { window } => trend(history, window),
        ChartRequest::HotCold { window } => hot_cold(history, window),
        ChartRequest::Pattern { window } => pattern(history, window),
        ChartRequest::Road { window } => road(history, window),
        ChartRequest::Group { window } => group(history, window),
    };
    log::debug!("chart bundle {} built: {} charts, {} cards", request.intent(), charts.len(), cards.len());

    ChartBundle {
        intent: request.intent(),
        request,
        charts,
        cards,
        recommendation,
    }
}

type Built = (Vec<ChartData>, Vec<SummaryCard>);

fn window_summary(window: PresentationWindow<'_>, dim: Dimension) -> StreakSummary {
    summarize(&ChronologicalGapTable::build(&window.chronological(), dim))
}

/// Full-history gap table per position, built once per builder call.
fn position_tables(history: &DrawHistory, dim: fn(Position) -> Dimension) -> Vec<ChronologicalGapTable> {
    let chrono = history.all().chronological();
    Position::ALL
        .iter()
        .map(|&p| ChronologicalGapTable::build(&chrono, dim(p)))
        .collect()
}

fn position_gaps(tables: &[ChronologicalGapTable]) -> Vec<Vec<u32>> {
    tables.iter().map(|t| t.current_gaps()).collect()
}

fn digit_categories() -> Vec<String> {
    (0..DIGIT_BUCKETS).map(|d| d.to_string()).collect()
}

fn to_values(counts: &[u32]) -> Vec<f64> {
    counts.iter().map(|&c| c as f64).collect()
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Short-window average against the long-window average.
fn trend_between(short: Option<f64>, long: Option<f64>) -> Option<TrendDirection> {
    let (s, l) = (short?, long?);
    let diff = s - l;
    Some(if diff > 0.5 {
        TrendDirection::Up
    } else if diff < -0.5 {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    })
}

fn frequency_chart(title: &str, window: PresentationWindow<'_>) -> (ChartData, Vec<StreakSummary>) {
    let summaries: Vec<StreakSummary> = Position::ALL
        .iter()
        .map(|&p| window_summary(window, Dimension::Digit(p)))
        .collect();
    let series = Position::ALL
        .iter()
        .zip(&summaries)
        .map(|(p, s)| Series { name: p.label().to_string(), values: to_values(&s.hit_counts) })
        .collect();
    let chart = ChartData {
        title: format!("{}（近{}期）", title, window.len()),
        kind: ChartKind::Bar,
        category_labels: digit_categories(),
        series,
    };
    (chart, summaries)
}

fn dominant_bucket(summary: &StreakSummary) -> Option<(usize, u32)> {
    summary
        .frequency_ranking()
        .first()
        .map(|&b| (b, summary.hit_counts[b]))
}

fn prediction(history: &DrawHistory, window_len: usize) -> Built {
    let window = history.latest(window_len);
    let (chart, _) = frequency_chart("各位号码出现次数", window);

    let sums: Vec<f64> = window.iter().map(|r| r.sum as f64).collect();
    let spans: Vec<f64> = window.iter().map(|r| r.span as f64).collect();
    let recent = window.latest(windows::RECENT);
    let recent_sums: Vec<f64> = recent.iter().map(|r| r.sum as f64).collect();
    let recent_spans: Vec<f64> = recent.iter().map(|r| r.span as f64).collect();

    let mut cards = vec![
        SummaryCard::new("平均和值", format_average(average(&sums)))
            .with_trend(trend_between(average(&recent_sums), average(&sums))),
        SummaryCard::new("平均跨度", format_average(average(&spans)))
            .with_trend(trend_between(average(&recent_spans), average(&spans))),
    ];

    let gaps = position_gaps(&position_tables(history, Dimension::Digit));
    if let Some((position, digit, gap)) = longest_gaps(&gaps, 1).into_iter().next() {
        cards.push(
            SummaryCard::new("最大遗漏", format!("{} {}", position.label(), digit))
                .with_note(format!("已遗漏{}期", gap)),
        );
    }

    let bs = window_summary(window, Dimension::Pattern(PatternFamily::BigSmall));
    if let Some((bucket, count)) = dominant_bucket(&bs) {
        cards.push(
            SummaryCard::new("主流形态", PatternFamily::BigSmall.bucket_labels()[bucket].clone())
                .with_note(format!("近{}期出现{}次", window.len(), count)),
        );
    }

    (vec![chart], cards)
}

fn frequency(history: &DrawHistory, window_len: usize) -> Built {
    let window = history.latest(window_len);
    let (chart, summaries) = frequency_chart("各位号码出现次数", window);
    let cards = Position::ALL
        .iter()
        .zip(&summaries)
        .map(|(p, s)| match dominant_bucket(s) {
            Some((digit, count)) => SummaryCard::new(format!("{}最热", p.label()), digit.to_string())
                .with_note(format!("近{}期出现{}次", window.len(), count)),
            None => SummaryCard::new(format!("{}最热", p.label()), "-"),
        })
        .collect();
    (vec![chart], cards)
}

/// (position, digit, current gap) sorted by gap descending, then position, then digit.
/// `gaps` holds one row per position; an all-zero table means no history.
fn longest_gaps(gaps: &[Vec<u32>], limit: usize) -> Vec<(Position, u8, u32)> {
    if gaps.iter().flatten().all(|&g| g == 0) {
        return Vec::new();
    }
    let mut entries: Vec<(Position, u8, u32)> = Position::ALL
        .iter()
        .zip(gaps)
        .flat_map(|(&p, row)| {
            row.iter()
                .enumerate()
                .map(move |(d, &gap)| (p, d as u8, gap))
        })
        .collect();
    entries.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));
    entries.truncate(limit);
    entries
}

fn missing(history: &DrawHistory) -> Built {
    let tables = position_tables(history, Dimension::Digit);
    let gaps = position_gaps(&tables);
    let summaries: Vec<StreakSummary> = tables.iter().map(summarize).collect();

    let series = Position::ALL
        .iter()
        .zip(&gaps)
        .map(|(p, row)| Series {
            name: p.label().to_string(),
            values: to_values(row),
        })
        .collect();
    let chart = ChartData {
        title: "各位号码当前遗漏".to_string(),
        kind: ChartKind::Bar,
        category_labels: digit_categories(),
        series,
    };

    let cards = longest_gaps(&gaps, 3)
        .into_iter()
        .map(|(position, digit, gap)| {
            let summary = &summaries[position.index()];
            SummaryCard::new(format!("{} {}", position.label(), digit), format!("{}期", gap))
                .with_note(format!("平均遗漏{}期，最大遗漏{}期", summary.avg_gaps[digit as usize], summary.max_gaps[digit as usize]))
        })
        .collect();

    (vec![chart], cards)
}

#[derive(Debug, Clone, Copy)]
enum ValueKind {
    Sum,
    Span,
}

impl ValueKind {
    fn dimension(&self) -> Dimension {
        match self {
            ValueKind::Sum => Dimension::Sum,
            ValueKind::Span => Dimension::Span,
        }
    }

    fn value(&self, record: &DrawRecord) -> u8 {
        match self {
            ValueKind::Sum => record.sum,
            ValueKind::Span => record.span,
        }
    }
}

fn value_analysis(history: &DrawHistory, kind: ValueKind, line_window: usize, distribution_window: usize) -> Built {
    let dim = kind.dimension();
    let name = dim.label();

    let line = history.latest(line_window);
    let chrono = line.chronological();
    let line_chart = ChartData {
        title: format!("{}走势（近{}期）", name, line.len()),
        kind: ChartKind::Line,
        category_labels: chrono.iter().map(|r| r.period.clone()).collect(),
        series: vec![Series {
            name: name.clone(),
            values: chrono.iter().map(|r| kind.value(r) as f64).collect(),
        }],
    };

    let distribution = history.latest(distribution_window);
    let dist_summary = window_summary(distribution, dim);
    let dist_chart = ChartData {
        title: format!("{}分布（近{}期）", name, distribution.len()),
        kind: ChartKind::Bar,
        category_labels: dim.bucket_labels(),
        series: vec![Series { name: "出现次数".to_string(), values: to_values(&dist_summary.hit_counts) }],
    };

    let values: Vec<u8> = line.iter().map(|r| kind.value(r)).collect();
    let mut cards = Vec::new();
    if !values.is_empty() {
        let as_f64: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        let recent: Vec<f64> = line.latest(windows::RECENT).iter().map(|r| kind.value(r) as f64).collect();
        let avg = average(&as_f64).unwrap_or(0.0);
        let min = values.iter().copied().min().unwrap_or(0);
        let max = values.iter().copied().max().unwrap_or(0);
        let line_summary = window_summary(line, dim);

        cards.push(
            SummaryCard::new(format!("平均{}", name), format!("{}", avg.round() as u32))
                .with_trend(trend_between(average(&recent), Some(avg))),
        );
        cards.push(SummaryCard::new(format!("最小{}", name), min.to_string()));
        cards.push(SummaryCard::new(format!("最大{}", name), max.to_string()));
        if let Some((mode, count)) = dominant_bucket(&line_summary) {
            cards.push(
                SummaryCard::new(format!("最常见{}", name), mode.to_string())
                    .with_note(format!("近{}期出现{}次", line.len(), count)),
            );
        }
    }

    (vec![line_chart, dist_chart], cards)
}

fn trend(history: &DrawHistory, window_len: usize) -> Built {
    let window = history.latest(window_len);
    let chrono = window.chronological();
    let series = Position::ALL
        .iter()
        .map(|&p| Series {
            name: p.label().to_string(),
            values: chrono.iter().map(|r| r.digit(p) as f64).collect(),
        })
        .collect();
    let chart = ChartData {
        title: format!("各位号码走势（近{}期）", window.len()),
        kind: ChartKind::Line,
        category_labels: chrono.iter().map(|r| r.period.clone()).collect(),
        series,
    };

    let mut cards = Vec::new();
    if let Some(latest) = window.newest() {
        cards.push(SummaryCard::new("最新开奖", latest.digits_label()).with_note(latest.period.clone()));
    }
    let recent = window.latest(windows::RECENT);
    for p in Position::ALL {
        let short: Vec<f64> = recent.iter().map(|r| r.digit(p) as f64).collect();
        let long: Vec<f64> = window.iter().map(|r| r.digit(p) as f64).collect();
        if let Some(avg) = average(&long) {
            cards.push(
                SummaryCard::new(format!("{}均值", p.label()), format!("{:.1}", avg))
                    .with_trend(trend_between(average(&short), Some(avg))),
            );
        }
    }

    (vec![chart], cards)
}

fn hot_cold(history: &DrawHistory, window_len: usize) -> Built {
    let window = history.latest(window_len);
    let (chart, summaries) = frequency_chart("冷热号码", window);

    let mut cards = Vec::new();
    if window.is_empty() {
        return (vec![chart], cards);
    }
    let all_gaps = position_gaps(&position_tables(history, Dimension::Digit));
    for ((&p, summary), gaps) in Position::ALL.iter().zip(&summaries).zip(&all_gaps) {
        if let Some((digit, count)) = dominant_bucket(summary) {
            cards.push(
                SummaryCard::new(format!("{}热号", p.label()), digit.to_string())
                    .with_note(format!("近{}期出现{}次", window.len(), count)),
            );
        }

        // lowest count, then longest gap, then smallest digit
        let coldest = (0..DIGIT_BUCKETS)
            .min_by(|&a, &b| {
                summary.hit_counts[a]
                    .cmp(&summary.hit_counts[b])
                    .then(gaps[b].cmp(&gaps[a]))
                    .then(a.cmp(&b))
            })
            .unwrap_or(0);
        cards.push(
            SummaryCard::new(format!("{}冷号", p.label()), coldest.to_string())
                .with_note(format!("近{}期出现{}次", window.len(), summary.hit_counts[coldest])),
        );

        let longest = (0..DIGIT_BUCKETS)
            .max_by(|&a, &b| gaps[a].cmp(&gaps[b]).then(b.cmp(&a)))
            .unwrap_or(0);
        cards.push(
            SummaryCard::new(format!("{}最大遗漏", p.label()), longest.to_string())
                .with_note(format!("已遗漏{}期", gaps[longest])),
        );
    }

    (vec![chart], cards)
}

fn pattern(history: &DrawHistory, window_len: usize) -> Built {
    let window = history.latest(window_len);
    let mut charts = Vec::new();
    let mut cards = Vec::new();

    for family in PatternFamily::ALL {
        let summary = window_summary(window, Dimension::Pattern(family));
        let labels = family.bucket_labels();
        charts.push(ChartData {
            title: format!("{}分布（近{}期）", family.label(), window.len()),
            kind: ChartKind::Pie,
            category_labels: labels.clone(),
            series: vec![Series { name: family.label().to_string(), values: to_values(&summary.hit_counts) }],
        });
        if let Some((bucket, count)) = dominant_bucket(&summary) {
            cards.push(
                SummaryCard::new(format!("{}主流", family.label()), labels[bucket].clone())
                    .with_note(format!("近{}期出现{}次", window.len(), count)),
            );
        }
    }

    (charts, cards)
}

fn road(history: &DrawHistory, window_len: usize) -> Built {
    let window = history.latest(window_len);
    let summaries: Vec<StreakSummary> = Position::ALL
        .iter()
        .map(|&p| window_summary(window, Dimension::Road(p)))
        .collect();
    let chart = ChartData {
        title: format!("各位012路分布（近{}期）", window.len()),
        kind: ChartKind::Bar,
        category_labels: Dimension::Road(Position::Hundreds).bucket_labels(),
        series: Position::ALL
            .iter()
            .zip(&summaries)
            .map(|(p, s)| Series { name: p.label().to_string(), values: to_values(&s.hit_counts) })
            .collect(),
    };

    let all_gaps = position_gaps(&position_tables(history, Dimension::Road));
    let cards = Position::ALL
        .iter()
        .zip(&summaries)
        .zip(&all_gaps)
        .filter_map(|((&p, s), gaps)| {
            let (bucket, count) = dominant_bucket(s)?;
            let weakest = (0..gaps.len()).max_by(|&a, &b| gaps[a].cmp(&gaps[b]).then(b.cmp(&a)))?;
            Some(
                SummaryCard::new(format!("{}主流路数", p.label()), format!("{}路", bucket))
                    .with_note(format!("近{}期出现{}次，{}路已遗漏{}期", window.len(), count, weakest, gaps[weakest])),
            )
        })
        .collect();

    (vec![chart], cards)
}

fn group(history: &DrawHistory, window_len: usize) -> Built {
    let window = history.latest(window_len);
    let mut counts = [0u32; 3];
    for r in window.iter() {
        counts[r.group.index()] += 1;
    }
    let chart = ChartData {
        title: format!("组选分布（近{}期）", window.len()),
        kind: ChartKind::Pie,
        category_labels: Group::ALL.iter().map(|g| g.label().to_string()).collect(),
        series: vec![Series { name: "出现次数".to_string(), values: to_values(&counts) }],
    };

    let mut cards = Vec::new();
    if !window.is_empty() {
        // ties resolve to the earlier group in Group::ALL
        let dominant = Group::ALL
            .iter()
            .copied()
            .max_by(|a, b| counts[a.index()].cmp(&counts[b.index()]).then(b.index().cmp(&a.index())))
            .unwrap_or(Group::Six);
        cards.push(
            SummaryCard::new("主流组选", dominant.label())
                .with_note(format!("近{}期出现{}次", window.len(), counts[dominant.index()])),
        );
        let sequences = window.iter().filter(|r| r.is_sequence).count();
        cards.push(SummaryCard::new("顺子", format!("{}次", sequences)));
        for g in [Group::Triplet, Group::Pair] {
            let gap = history
                .all()
                .iter()
                .position(|r| r.group == g)
                .unwrap_or(history.len());
            cards.push(SummaryCard::new(format!("{}遗漏", g.label()), format!("{}期", gap)));
        }
    }

    (vec![chart], cards)
}

fn format_average(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "-".to_string(),
    }
}

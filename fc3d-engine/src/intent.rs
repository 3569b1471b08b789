use std::str::FromStr;

use anyhow::{bail, Error};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryIntent {
    Prediction,
    HotCold,
    Frequency,
    Missing,
    Sum,
    Span,
    Trend,
    Pattern,
    Road,
    Group,
}

/// Ordered (keywords, intent) table. The first row with a keyword contained in
/// the lower-cased query wins, so the order decides ambiguous queries.
/// "杀号" routes to `Prediction`.
const KEYWORD_TABLE: &[(&[&str], QueryIntent)] = &[
    (&["预测", "推荐", "下期", "杀号", "胆码", "predict", "recommend"], QueryIntent::Prediction),
    (&["冷热", "热号", "冷号", "hot", "cold"], QueryIntent::HotCold),
    (&["频率", "次数", "出现最多", "frequency"], QueryIntent::Frequency),
    (&["遗漏", "多久没", "没出", "missing", "gap"], QueryIntent::Missing),
    (&["和值", "sum"], QueryIntent::Sum),
    (&["跨度", "span"], QueryIntent::Span),
    (&["走势", "趋势", "trend"], QueryIntent::Trend),
    (&["形态", "大小", "奇偶", "质合", "pattern"], QueryIntent::Pattern),
    (&["012路", "路数", "road"], QueryIntent::Road),
    (&["组三", "组六", "豹子", "组选", "group"], QueryIntent::Group),
];

pub const DEFAULT_INTENT: QueryIntent = QueryIntent::Prediction;

pub fn classify(query: &str) -> QueryIntent {
    let q = query.to_lowercase();
    KEYWORD_TABLE
        .iter()
        .find(|(keywords, _)| contains_any(&q, keywords))
        .map(|(_, intent)| *intent)
        .unwrap_or(DEFAULT_INTENT)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

impl QueryIntent {
    pub const ALL: [QueryIntent; 10] = [
        QueryIntent::Prediction,
        QueryIntent::HotCold,
        QueryIntent::Frequency,
        QueryIntent::Missing,
        QueryIntent::Sum,
        QueryIntent::Span,
        QueryIntent::Trend,
        QueryIntent::Pattern,
        QueryIntent::Road,
        QueryIntent::Group,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            QueryIntent::Prediction => "prediction",
            QueryIntent::HotCold => "hot-cold",
            QueryIntent::Frequency => "frequency",
            QueryIntent::Missing => "missing",
            QueryIntent::Sum => "sum",
            QueryIntent::Span => "span",
            QueryIntent::Trend => "trend",
            QueryIntent::Pattern => "pattern",
            QueryIntent::Road => "road",
            QueryIntent::Group => "group",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueryIntent::Prediction => "综合预测",
            QueryIntent::HotCold => "冷热分析",
            QueryIntent::Frequency => "频率统计",
            QueryIntent::Missing => "遗漏分析",
            QueryIntent::Sum => "和值分析",
            QueryIntent::Span => "跨度分析",
            QueryIntent::Trend => "走势分析",
            QueryIntent::Pattern => "形态分析",
            QueryIntent::Road => "012路分析",
            QueryIntent::Group => "组选分析",
        }
    }
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for QueryIntent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        match QueryIntent::ALL.iter().find(|i| i.key() == key) {
            Some(i) => Ok(*i),
            None => bail!("Unknown intent '{}'", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_intent() {
        assert_eq!(classify("预测一下下期号码"), QueryIntent::Prediction);
        assert_eq!(classify("最近的冷热号"), QueryIntent::HotCold);
        assert_eq!(classify("百位出现频率"), QueryIntent::Frequency);
        assert_eq!(classify("哪个号码遗漏最久"), QueryIntent::Missing);
        assert_eq!(classify("和值分布"), QueryIntent::Sum);
        assert_eq!(classify("跨度怎么样"), QueryIntent::Span);
        assert_eq!(classify("最近走势"), QueryIntent::Trend);
        assert_eq!(classify("奇偶比例"), QueryIntent::Pattern);
        assert_eq!(classify("012路分析"), QueryIntent::Road);
        assert_eq!(classify("组三多吗"), QueryIntent::Group);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("Show me the TREND"), QueryIntent::Trend);
        assert_eq!(classify("SPAN please"), QueryIntent::Span);
    }

    #[test]
    fn test_default_is_prediction() {
        assert_eq!(classify("你好"), QueryIntent::Prediction);
        assert_eq!(classify(""), QueryIntent::Prediction);
    }

    #[test]
    fn test_first_matching_row_wins() {
        // both "杀号" and "频率" present: the prediction row comes first
        assert_eq!(classify("杀号看频率"), QueryIntent::Prediction);
        // "冷号" sits in the hot-cold row, ahead of the missing row
        assert_eq!(classify("冷号遗漏"), QueryIntent::HotCold);
    }

    #[test]
    fn test_kill_request_on_sum_is_current_behavior() {
        // Documented current behavior: only the literal "杀号" routes to
        // prediction; "杀" alone does not, so this lands on the sum row.
        assert_eq!(classify("帮我杀几个和值"), QueryIntent::Sum);
        assert_eq!(classify("帮我杀号"), QueryIntent::Prediction);
    }

    #[test]
    fn test_intent_keys_roundtrip() {
        for intent in QueryIntent::ALL {
            assert_eq!(intent.key().parse::<QueryIntent>().unwrap(), intent);
        }
        assert!("weather".parse::<QueryIntent>().is_err());
    }
}

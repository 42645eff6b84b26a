use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Breakdown and split value used when no splitting dimension applies.
pub const TOTAL: &str = "total";

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})(?:-(\d{2}))?(?:[T ].*)?$").unwrap());

/// Parses `YYYY-MM`, `YYYY-MM-DD` or an ISO timestamp into a date.
/// Month-only input resolves to the first day of that month.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(input.trim())?;
    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let month = caps.get(2)?.as_str().parse::<u32>().ok()?;
    let day = match caps.get(3) {
        Some(day) => day.as_str().parse::<u32>().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw:?}")))
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw:?}"))),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub label: String,
}

impl Note {
    pub fn new(title: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevantBreakdown {
    pub dimension: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Annotation as authored, before filtering and expansion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnnotation {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<Note>,
    #[serde(default)]
    pub relevant_breakdowns: Option<Vec<RelevantBreakdown>>,
}

impl RawAnnotation {
    pub fn new(date: NaiveDate, title: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            date: Some(date),
            note: Some(Note::new(title, label)),
            relevant_breakdowns: None,
        }
    }

    pub fn with_breakdown(mut self, dimension: &str, values: &[&str]) -> Self {
        self.relevant_breakdowns
            .get_or_insert_with(Vec::new)
            .push(RelevantBreakdown {
                dimension: dimension.to_string(),
                values: values.iter().map(|v| v.to_string()).collect(),
            });
        self
    }

    pub(crate) fn label(&self) -> &str {
        self.note.as_ref().map(|n| n.label.as_str()).unwrap_or("")
    }
}

/// One expanded copy of a raw annotation, scoped to a single
/// `(breakdown, split_value)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub date: NaiveDate,
    pub note: Note,
    pub breakdown: String,
    pub split_value: String,
    pub value: Option<f64>,
    pub group_size: usize,
    pub x: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPoint {
    #[serde(deserialize_with = "deserialize_date")]
    pub month: NaiveDate,
    #[serde(default)]
    pub total: BTreeMap<String, f64>,
}

impl GraphPoint {
    pub fn new(month: NaiveDate, values: &[(&str, f64)]) -> Self {
        Self {
            month,
            total: values
                .iter()
                .map(|(key, value)| (key.to_string(), *value))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionValue {
    pub key: String,
    #[serde(default)]
    pub on: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub key: String,
    #[serde(default)]
    pub splitting: bool,
    #[serde(default)]
    pub values: Vec<DimensionValue>,
}

impl Dimension {
    pub fn new(key: &str, splitting: bool, values: &[(&str, bool)]) -> Self {
        Self {
            key: key.to_string(),
            splitting,
            values: values
                .iter()
                .map(|(key, on)| DimensionValue {
                    key: key.to_string(),
                    on: *on,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphModel {
    #[serde(default)]
    pub graph_data: Vec<GraphPoint>,
    #[serde(default)]
    pub dimensions: Option<Vec<Dimension>>,
}

impl GraphModel {
    pub fn splitting_dimension(&self) -> Option<&Dimension> {
        self.dimensions.as_ref()?.iter().find(|d| d.splitting)
    }

    /// First and last month of the series, if any.
    pub fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.graph_data.first()?;
        let last = self.graph_data.last()?;
        Some((first.month, last.month))
    }
}

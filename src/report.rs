//! Typed view over the loosely-structured audit report.
//!
//! The backend owns the report schema. The client reads four well-known keys,
//! substitutes defaults when they are absent, and otherwise treats the mapping
//! as opaque display data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const AVALANCHE_KEY: &str = "Avalanche Score";
pub const SPEED_KEY: &str = "Encryption Speed (ms)";
pub const MEMORY_KEY: &str = "Peak Memory (KB)";
pub const ATTACK_KEY: &str = "Attack Status";

pub const DEFAULT_AVALANCHE: &str = "0%";
pub const DEFAULT_SPEED: &str = "0 ms";
pub const DEFAULT_MEMORY: &str = "0 KB";
pub const DEFAULT_ATTACK: &str = "Not Run";

/// Ideal avalanche percentage: half the output bits flip.
pub const AVALANCHE_TARGET: f64 = 50.0;
/// Maximum distance from the target, exclusive, still graded as good.
pub const AVALANCHE_TOLERANCE: f64 = 5.0;

/// Metric label to display value, in the order the backend sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditReport(Map<String, Value>);

impl AuditReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(label.into(), value.into());
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        self.0.get(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(label, value)| (label.as_str(), value))
    }

    /// Display text for `label`, or `None` when the key is missing, null or blank.
    pub fn display_value(&self, label: &str) -> Option<String> {
        match self.0.get(label)? {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Pretty-printed JSON of the full mapping.
    pub fn raw_dump(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary::from_report(self)
    }
}

impl From<Map<String, Value>> for AuditReport {
    fn from(map: Map<String, Value>) -> Self {
        AuditReport(map)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvalancheGrade {
    Good,
    Bad,
}

impl AvalancheGrade {
    pub fn classify(percent: Option<f64>) -> Self {
        match percent {
            Some(value) if (value - AVALANCHE_TARGET).abs() < AVALANCHE_TOLERANCE => {
                AvalancheGrade::Good
            }
            _ => AvalancheGrade::Bad,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AvalancheGrade::Good => "good",
            AvalancheGrade::Bad => "bad",
        }
    }
}

/// The four headline metrics, extracted once with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub avalanche: String,
    pub avalanche_percent: Option<f64>,
    pub grade: AvalancheGrade,
    pub speed: String,
    pub memory: String,
    pub attack_status: String,
}

impl ReportSummary {
    pub fn from_report(report: &AuditReport) -> Self {
        let avalanche = report
            .display_value(AVALANCHE_KEY)
            .unwrap_or_else(|| DEFAULT_AVALANCHE.to_string());
        let avalanche_percent = parse_percent(&avalanche);
        ReportSummary {
            grade: AvalancheGrade::classify(avalanche_percent),
            avalanche_percent,
            avalanche,
            speed: report
                .display_value(SPEED_KEY)
                .unwrap_or_else(|| DEFAULT_SPEED.to_string()),
            memory: report
                .display_value(MEMORY_KEY)
                .unwrap_or_else(|| DEFAULT_MEMORY.to_string()),
            attack_status: report
                .display_value(ATTACK_KEY)
                .unwrap_or_else(|| DEFAULT_ATTACK.to_string()),
        }
    }

    /// Observed percentage clamped to `[0, 100]` for bar widths; unparseable reads as 0.
    pub fn bar_percent(&self) -> f64 {
        self.avalanche_percent.unwrap_or(0.0).clamp(0.0, 100.0)
    }
}

/// Reads the leading decimal number of strings like `"49.87%"` or `" 50 %"`.
pub fn parse_percent(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let end = trimmed
        .char_indices()
        .find(|&(idx, ch)| {
            !(ch.is_ascii_digit() || ch == '.' || ((ch == '-' || ch == '+') && idx == 0))
        })
        .map(|(idx, _)| idx)
        .unwrap_or(trimmed.len());
    let value: f64 = trimmed[..end].parse().ok()?;
    value.is_finite().then_some(value)
}

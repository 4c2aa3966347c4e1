// 📦 Data Model - Entities, Periods, Stat Records
// Records are values: produced by a StatSource and never edited afterwards

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Wire key carrying the season a record was resolved to
pub const PERIOD_KEY: &str = "SEASON_ID";

/// Wire key carrying the seasons a player has stats for
pub const AVAILABLE_PERIODS_KEY: &str = "available_seasons";

// ============================================================================
// ENTITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A selectable player. Replaced, never mutated, when the selection changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: PlayerId,

    #[serde(alias = "full_name")]
    pub display_name: String,
}

impl Entity {
    pub fn new(id: u32, display_name: impl Into<String>) -> Self {
        Entity {
            id: PlayerId(id),
            display_name: display_name.into(),
        }
    }
}

// ============================================================================
// PERIOD
// ============================================================================

/// Season qualifier for a stat request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    /// Let the source pick its default (most recent) season
    #[default]
    Unspecified,
    Season(String),
}

impl Period {
    pub fn season(label: impl Into<String>) -> Self {
        Period::Season(label.into())
    }

    /// Empty input and the literal "unspecified" map to `Unspecified`
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unspecified") {
            Period::Unspecified
        } else {
            Period::Season(trimmed.to_string())
        }
    }

    pub fn as_season(&self) -> Option<&str> {
        match self {
            Period::Unspecified => None,
            Period::Season(s) => Some(s.as_str()),
        }
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, Period::Unspecified)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Unspecified => write!(f, "unspecified"),
            Period::Season(s) => write!(f, "{}", s),
        }
    }
}

// ============================================================================
// STAT VALUE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

impl StatValue {
    /// Finite numbers only. NaN and infinities count as non-numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            StatValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Parse a raw cell: numeric text becomes a number, blank becomes None
    pub fn from_cell(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<f64>() {
            Ok(n) => Some(StatValue::Number(n)),
            Err(_) => Some(StatValue::Text(trimmed.to_string())),
        }
    }
}

impl From<f64> for StatValue {
    fn from(n: f64) -> Self {
        StatValue::Number(n)
    }
}

impl From<&str> for StatValue {
    fn from(s: &str) -> Self {
        StatValue::Text(s.to_string())
    }
}

// ============================================================================
// STAT RECORD
// ============================================================================

/// StatRecord - measured values for one player in one season
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatRecord {
    /// Season the source actually resolved the request to
    pub period: Option<String>,

    /// Seasons the source can serve for this player, oldest first
    pub available_periods: Vec<String>,

    pub fields: BTreeMap<String, StatValue>,
}

impl StatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a field
    pub fn with(mut self, key: impl Into<String>, value: impl Into<StatValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Builder: set the resolved season
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }

    /// Builder: set the available seasons
    pub fn with_available_periods<I, S>(mut self, periods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_periods = periods.into_iter().map(Into::into).collect();
        self
    }

    pub fn get(&self, key: &str) -> Option<&StatValue> {
        self.fields.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(StatValue::as_number)
    }

    /// Lenient decode of the source's JSON shape.
    ///
    /// Never fails: a non-object payload yields an empty record, and values
    /// that are neither numbers nor strings are dropped, so a malformed
    /// response degrades to "missing" field by field.
    pub fn from_json(value: &Value) -> Self {
        let mut record = StatRecord::new();
        let Some(obj) = value.as_object() else {
            return record;
        };

        for (key, raw) in obj {
            match key.as_str() {
                PERIOD_KEY => {
                    record.period = raw.as_str().map(str::to_string);
                }
                AVAILABLE_PERIODS_KEY => {
                    if let Some(items) = raw.as_array() {
                        record.available_periods = items
                            .iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect();
                    }
                }
                _ => match raw {
                    Value::Number(n) => {
                        if let Some(f) = n.as_f64() {
                            record.fields.insert(key.clone(), StatValue::Number(f));
                        }
                    }
                    Value::String(s) => {
                        record.fields.insert(key.clone(), StatValue::Text(s.clone()));
                    }
                    _ => {}
                },
            }
        }

        record
    }

    /// Encode back into the source's JSON shape
    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        for (key, value) in &self.fields {
            let json = match value {
                StatValue::Number(n) => serde_json::Number::from_f64(*n)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                StatValue::Text(s) => Value::String(s.clone()),
            };
            obj.insert(key.clone(), json);
        }
        if let Some(period) = &self.period {
            obj.insert(PERIOD_KEY.to_string(), Value::String(period.clone()));
        }
        obj.insert(
            AVAILABLE_PERIODS_KEY.to_string(),
            Value::Array(
                self.available_periods
                    .iter()
                    .map(|p| Value::String(p.clone()))
                    .collect(),
            ),
        );
        Value::Object(obj)
    }
}

// ============================================================================
// NEWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,

    #[serde(alias = "published")]
    pub published_at: DateTime<Utc>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_period_parse() {
        assert_eq!(Period::parse(""), Period::Unspecified);
        assert_eq!(Period::parse("  "), Period::Unspecified);
        assert_eq!(Period::parse("Unspecified"), Period::Unspecified);
        assert_eq!(Period::parse("2019-20"), Period::season("2019-20"));
        assert_eq!(Period::season("2020-21").as_season(), Some("2020-21"));
    }

    #[test]
    fn test_from_json_reads_wire_shape() {
        let record = StatRecord::from_json(&json!({
            "SEASON_ID": "2022-23",
            "available_seasons": ["2021-22", "2022-23"],
            "PPG": 28.4,
            "GP": 55,
            "TEAM_ABBREVIATION": "LAL",
            "PLAYER_AGE": null
        }));

        assert_eq!(record.period.as_deref(), Some("2022-23"));
        assert_eq!(record.available_periods, vec!["2021-22", "2022-23"]);
        assert_eq!(record.number("PPG"), Some(28.4));
        assert_eq!(record.number("GP"), Some(55.0));
        assert_eq!(record.get("TEAM_ABBREVIATION"), Some(&StatValue::from("LAL")));
        assert!(record.get("PLAYER_AGE").is_none(), "null should be dropped");
    }

    #[test]
    fn test_from_json_malformed_is_empty() {
        let record = StatRecord::from_json(&json!(["not", "an", "object"]));
        assert!(record.fields.is_empty());
        assert!(record.period.is_none());

        let record = StatRecord::from_json(&json!({"available_seasons": "2020"}));
        assert!(record.available_periods.is_empty());
    }

    #[test]
    fn test_non_finite_is_not_numeric() {
        assert_eq!(StatValue::Number(f64::NAN).as_number(), None);
        assert_eq!(StatValue::Number(f64::INFINITY).as_number(), None);
        assert_eq!(StatValue::from("N/A").as_number(), None);
    }

    #[test]
    fn test_from_cell() {
        assert_eq!(StatValue::from_cell(" 0.471 "), Some(StatValue::Number(0.471)));
        assert_eq!(StatValue::from_cell(""), None);
        assert_eq!(StatValue::from_cell("DNP"), Some(StatValue::from("DNP")));
    }

    #[test]
    fn test_json_roundtrip_keeps_period_metadata() {
        let record = StatRecord::new()
            .with("PPG", 20.0)
            .with_period("2020-21")
            .with_available_periods(["2019-20", "2020-21"]);

        let back = StatRecord::from_json(&record.to_json());
        assert_eq!(back, record);
    }

    #[test]
    fn test_entity_accepts_full_name() {
        let entity: Entity =
            serde_json::from_value(json!({"id": 2544, "full_name": "LeBron James"})).unwrap();
        assert_eq!(entity, Entity::new(2544, "LeBron James"));
    }
}

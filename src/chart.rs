// 📈 Chart Series Builder - One data law, many renderings
// Raw stat fields → bounded, chart-ready series with an exact inverse for tooltips

use crate::fields::{FieldRegistry, ScaleLaw, TrackedField};
use crate::record::StatRecord;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Default top of the shared chart axis
pub const DEFAULT_MAX_AXIS: f64 = 50.0;

const PERCENT_FACTOR: f64 = 50.0;
const SCORING_FACTOR: f64 = 1.5;
const GENERIC_FACTOR: f64 = 2.0;

// ============================================================================
// SCALE LAW
// ============================================================================

impl ScaleLaw {
    /// Raw source value → chart axis
    pub fn scale(&self, raw: f64) -> f64 {
        match self {
            ScaleLaw::Percentage => raw * PERCENT_FACTOR,
            ScaleLaw::Scoring => raw * SCORING_FACTOR,
            ScaleLaw::Generic => raw * GENERIC_FACTOR,
        }
    }

    /// Chart axis → natural display unit.
    ///
    /// Percentages come back as percent (0.47 → 23.5 → 47.0), not as the
    /// source fraction.
    pub fn inverse(&self, scaled: f64) -> f64 {
        match self {
            ScaleLaw::Percentage => scaled * (100.0 / PERCENT_FACTOR),
            ScaleLaw::Scoring => scaled / SCORING_FACTOR,
            ScaleLaw::Generic => scaled / GENERIC_FACTOR,
        }
    }

    /// Tooltip text: one decimal, `%` suffix for percentages
    pub fn format_scaled(&self, scaled: f64) -> String {
        let value = self.inverse(scaled);
        match self {
            ScaleLaw::Percentage => format!("{:.1}%", value),
            ScaleLaw::Scoring | ScaleLaw::Generic => format!("{:.1}", value),
        }
    }
}

/// Tooltip line for one plotted point, e.g. "Stephen Curry: 42.7%"
pub fn tooltip(series_label: &str, field: &TrackedField, scaled: f64) -> String {
    if series_label.is_empty() {
        field.scale.format_scaled(scaled)
    } else {
        format!("{}: {}", series_label, field.scale.format_scaled(scaled))
    }
}

// ============================================================================
// SERIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub field: &'static TrackedField,
    pub scaled: f64,
}

/// ChartSeries - one entity's scaled values, aligned to registry order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<SeriesPoint>,
}

impl ChartSeries {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.scaled).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn tooltip(&self, index: usize) -> Option<String> {
        self.points
            .get(index)
            .map(|p| tooltip(&self.label, p.field, p.scaled))
    }

    pub fn is_all_zero(&self) -> bool {
        self.points.iter().all(|p| p.scaled == 0.0)
    }
}

/// Build a series over the standard registry.
///
/// Always full length: an absent record or a missing/non-numeric field
/// contributes 0.0, so two series stay pairwise comparable.
pub fn build_series(label: impl Into<String>, record: Option<&StatRecord>) -> ChartSeries {
    build_series_with(&FieldRegistry::standard(), label, record)
}

pub fn build_series_with(
    registry: &FieldRegistry,
    label: impl Into<String>,
    record: Option<&StatRecord>,
) -> ChartSeries {
    let points = registry
        .iter()
        .map(|field| {
            let scaled = record
                .and_then(|r| r.number(field.key))
                .map(|raw| field.scale.scale(raw))
                .unwrap_or(0.0);
            SeriesPoint { field, scaled }
        })
        .collect();

    ChartSeries {
        label: label.into(),
        points,
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMode {
    /// Radar: one spoke per field
    #[default]
    Radial,
    /// Line/bar: fields along x
    Cartesian,
}

impl ChartMode {
    pub fn toggle(self) -> Self {
        match self {
            ChartMode::Radial => ChartMode::Cartesian,
            ChartMode::Cartesian => ChartMode::Radial,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChartMode::Radial => "radial",
            ChartMode::Cartesian => "cartesian",
        }
    }
}

impl std::str::FromStr for ChartMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "radial" | "radar" => Ok(ChartMode::Radial),
            "cartesian" | "line" | "bar" => Ok(ChartMode::Cartesian),
            other => Err(format!("unknown chart mode: {}", other)),
        }
    }
}

/// Presentation geometry. Never changes the series, only where it lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartGeometry {
    pub mode: ChartMode,
    pub max_axis: f64,
    pub size_factor: f64,
}

impl Default for ChartGeometry {
    fn default() -> Self {
        ChartGeometry {
            mode: ChartMode::Radial,
            max_axis: DEFAULT_MAX_AXIS,
            size_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    /// Unclamped series value, what tooltips invert
    pub scaled: f64,
}

impl ChartGeometry {
    pub fn new(mode: ChartMode, max_axis: f64, size_factor: f64) -> Self {
        ChartGeometry {
            mode,
            max_axis,
            size_factor,
        }
    }

    /// Largest coordinate magnitude a projected point can have
    pub fn extent(&self) -> f64 {
        self.max_axis * self.size_factor
    }

    /// Plotted length of a value: clamped to 0..=max_axis, then sized.
    ///
    /// A negative or non-finite axis plots everything at the origin.
    pub fn plotted(&self, scaled: f64) -> f64 {
        let top = if self.max_axis.is_finite() {
            self.max_axis.max(0.0)
        } else {
            0.0
        };
        scaled.max(0.0).min(top) * self.size_factor
    }

    /// Direction of spoke `index` out of `count`, starting at 12 o'clock, clockwise
    pub fn spoke_angle(index: usize, count: usize) -> f64 {
        if count == 0 {
            return FRAC_PI_2;
        }
        FRAC_PI_2 - TAU * index as f64 / count as f64
    }

    pub fn project(&self, series: &ChartSeries) -> Vec<PlotPoint> {
        let count = series.points.len();
        series
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let length = self.plotted(p.scaled);
                let (x, y) = match self.mode {
                    ChartMode::Radial => {
                        let angle = Self::spoke_angle(i, count);
                        (length * angle.cos(), length * angle.sin())
                    }
                    ChartMode::Cartesian => (i as f64, length),
                };
                PlotPoint {
                    x,
                    y,
                    scaled: p.scaled,
                }
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

// Player Compare - Core Library
// Comparative stats engine used by the CLI and the terminal UI

pub mod fields;      // Tracked field registry (shared by table + chart)
pub mod record;      // Entities, periods, stat records
pub mod source;      // StatSource contract
pub mod dataset;     // CSV-backed StatSource
pub mod selection;   // Two-slot selection state
pub mod coordinator; // Staleness-guarded fetches
pub mod comparison;  // Field-by-field comparison
pub mod chart;       // Scaled chart series + inverse formatting
pub mod config;

// Re-export commonly used types
pub use fields::{FieldKind, FieldRegistry, ScaleLaw, TrackedField, TRACKED_FIELDS};
pub use record::{Entity, NewsItem, Period, PlayerId, StatRecord, StatValue};
pub use source::{SourceError, SourceResult, StatSource, MIN_SEARCH_LEN, SEARCH_LIMIT};
pub use dataset::CsvStatSource;
pub use selection::{SelectionSnapshot, SelectionState, Slot, SlotSelection};
pub use coordinator::{
    fetch, spawn_fetch, CommitOutcome, FetchCompletion, FetchRequest, StatFetchCoordinator,
};
pub use comparison::{compare, compare_with, ComparisonRow, Winner};
pub use chart::{
    build_series, build_series_with, tooltip, ChartGeometry, ChartMode, ChartSeries, PlotPoint,
    SeriesPoint, DEFAULT_MAX_AXIS,
};
pub use config::{AppConfig, ConfigOverrides};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

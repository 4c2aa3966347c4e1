// 🏷️ Tracked Field Registry
// One ordered table shared by the comparison table and the chart

use serde::Serialize;

// ============================================================================
// FIELD TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    /// Plain numeric value (per-game averages, counts)
    Numeric,
    /// Fraction in 0.0 - 1.0 delivered by the source
    Percentage,
}

/// Scale law used to place a field on the shared chart axis.
///
/// The law is part of the field definition, not a per-call option, so the
/// series builder and the tooltip formatter can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScaleLaw {
    /// `scaled = fraction * 50`, shown as `scaled * 2` with a `%` suffix
    Percentage,
    /// Primary scoring field: `scaled = raw * 1.5`
    Scoring,
    /// Everything else: `scaled = raw * 2`
    Generic,
}

// ============================================================================
// TRACKED FIELD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackedField {
    /// Key in the stat record (e.g., "FG_PCT")
    pub key: &'static str,

    /// Label shown in table rows and chart axes (e.g., "FG%")
    pub label: &'static str,

    pub kind: FieldKind,

    /// When false the comparison inverts (lower value wins)
    pub higher_is_better: bool,

    pub scale: ScaleLaw,
}

impl TrackedField {
    pub const fn new(
        key: &'static str,
        label: &'static str,
        kind: FieldKind,
        higher_is_better: bool,
        scale: ScaleLaw,
    ) -> Self {
        TrackedField {
            key,
            label,
            kind,
            higher_is_better,
            scale,
        }
    }

    pub fn is_percentage(&self) -> bool {
        self.kind == FieldKind::Percentage
    }
}

/// Canonical field order: PPG, RPG, APG, GP, FG%, 3P%, FT%
pub const TRACKED_FIELDS: [TrackedField; 7] = [
    TrackedField::new("PPG", "PPG", FieldKind::Numeric, true, ScaleLaw::Scoring),
    TrackedField::new("RPG", "RPG", FieldKind::Numeric, true, ScaleLaw::Generic),
    TrackedField::new("APG", "APG", FieldKind::Numeric, true, ScaleLaw::Generic),
    TrackedField::new("GP", "GP", FieldKind::Numeric, true, ScaleLaw::Generic),
    TrackedField::new("FG_PCT", "FG%", FieldKind::Percentage, true, ScaleLaw::Percentage),
    TrackedField::new("FG3_PCT", "3P%", FieldKind::Percentage, true, ScaleLaw::Percentage),
    TrackedField::new("FT_PCT", "FT%", FieldKind::Percentage, true, ScaleLaw::Percentage),
];

// ============================================================================
// FIELD REGISTRY
// ============================================================================

/// FieldRegistry - ordered, immutable view over a field table
///
/// `FieldRegistry::standard()` is what the app uses everywhere. A custom
/// table is only useful for exercising rules the standard set doesn't hit
/// (e.g. a lower-is-better field).
#[derive(Debug, Clone, Copy)]
pub struct FieldRegistry {
    fields: &'static [TrackedField],
}

impl FieldRegistry {
    pub const fn standard() -> Self {
        FieldRegistry {
            fields: &TRACKED_FIELDS,
        }
    }

    pub const fn from_fields(fields: &'static [TrackedField]) -> Self {
        FieldRegistry { fields }
    }

    pub fn fields(&self) -> &'static [TrackedField] {
        self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static TrackedField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get field by record key
    pub fn get(&self, key: &str) -> Option<&'static TrackedField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Get field by display label
    pub fn get_by_label(&self, label: &str) -> Option<&'static TrackedField> {
        self.fields.iter().find(|f| f.label == label)
    }

    /// Registry index of a key, used to align chart points with table rows
    pub fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.key == key)
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.label).collect()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let registry = FieldRegistry::standard();
        let keys: Vec<&str> = registry.iter().map(|f| f.key).collect();

        assert_eq!(
            keys,
            vec!["PPG", "RPG", "APG", "GP", "FG_PCT", "FG3_PCT", "FT_PCT"]
        );
        assert_eq!(
            registry.labels(),
            vec!["PPG", "RPG", "APG", "GP", "FG%", "3P%", "FT%"]
        );
    }

    #[test]
    fn test_lookup_by_key_and_label() {
        let registry = FieldRegistry::standard();

        let fg3 = registry.get("FG3_PCT").expect("Should find 3P% field");
        assert_eq!(fg3.label, "3P%");
        assert!(fg3.is_percentage());

        let ft = registry.get_by_label("FT%").expect("Should find FT% by label");
        assert_eq!(ft.key, "FT_PCT");

        assert!(registry.get("BLK").is_none());
    }

    #[test]
    fn test_scale_laws_assigned() {
        let registry = FieldRegistry::standard();

        assert_eq!(registry.get("PPG").unwrap().scale, ScaleLaw::Scoring);
        assert_eq!(registry.get("RPG").unwrap().scale, ScaleLaw::Generic);
        assert_eq!(registry.get("GP").unwrap().scale, ScaleLaw::Generic);
        assert_eq!(registry.get("FG_PCT").unwrap().scale, ScaleLaw::Percentage);
    }

    #[test]
    fn test_all_standard_fields_higher_is_better() {
        assert!(FieldRegistry::standard().iter().all(|f| f.higher_is_better));
    }

    #[test]
    fn test_position() {
        let registry = FieldRegistry::standard();
        assert_eq!(registry.position("PPG"), Some(0));
        assert_eq!(registry.position("FT_PCT"), Some(6));
        assert_eq!(registry.position("TOV"), None);
        assert_eq!(registry.len(), 7);
    }
}

// ⚖️ Comparison Engine - Field-by-field head-to-head
// Total over optional/partial input: a missing record or field never aborts the table

use crate::fields::{FieldRegistry, TrackedField};
use crate::record::{StatRecord, StatValue};
use serde::Serialize;
use std::cmp::Ordering;

// ============================================================================
// WINNER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Winner {
    Left,
    Right,
    Tie,
    /// One side missing or non-numeric; nothing is highlighted
    Unavailable,
}

// ============================================================================
// COMPARISON ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub field: &'static TrackedField,

    /// `None` when the record is absent or lacks the key
    pub left: Option<StatValue>,

    pub right: Option<StatValue>,

    pub winner: Winner,
}

impl ComparisonRow {
    pub fn label(&self) -> &'static str {
        self.field.label
    }

    pub fn display_left(&self) -> String {
        display_value(self.field, self.left.as_ref())
    }

    pub fn display_right(&self) -> String {
        display_value(self.field, self.right.as_ref())
    }
}

/// Table cell text. Unavailable renders as "-".
pub fn display_value(field: &TrackedField, value: Option<&StatValue>) -> String {
    match value {
        None => "-".to_string(),
        Some(StatValue::Text(s)) => s.clone(),
        Some(StatValue::Number(n)) if !n.is_finite() => "-".to_string(),
        Some(StatValue::Number(n)) => {
            if field.is_percentage() {
                format!("{:.3}", n)
            } else if n.fract() == 0.0 {
                format!("{:.0}", n)
            } else {
                format!("{:.1}", n)
            }
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Compare two optional records over the standard field registry.
///
/// Always returns one row per tracked field, in registry order.
pub fn compare(left: Option<&StatRecord>, right: Option<&StatRecord>) -> Vec<ComparisonRow> {
    compare_with(&FieldRegistry::standard(), left, right)
}

pub fn compare_with(
    registry: &FieldRegistry,
    left: Option<&StatRecord>,
    right: Option<&StatRecord>,
) -> Vec<ComparisonRow> {
    registry
        .iter()
        .map(|field| {
            let left_value = left.and_then(|r| r.get(field.key)).cloned();
            let right_value = right.and_then(|r| r.get(field.key)).cloned();
            let winner = decide(field, left_value.as_ref(), right_value.as_ref());

            ComparisonRow {
                field,
                left: left_value,
                right: right_value,
                winner,
            }
        })
        .collect()
}

fn decide(field: &TrackedField, left: Option<&StatValue>, right: Option<&StatValue>) -> Winner {
    let (Some(a), Some(b)) = (
        left.and_then(StatValue::as_number),
        right.and_then(StatValue::as_number),
    ) else {
        return Winner::Unavailable;
    };

    // Both finite, so partial_cmp is total here
    let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    let ordering = if field.higher_is_better {
        ordering
    } else {
        ordering.reverse()
    };

    match ordering {
        Ordering::Greater => Winner::Left,
        Ordering::Less => Winner::Right,
        Ordering::Equal => Winner::Tie,
    }
}

/// Tally of rows won by each side, ignoring ties and unavailable rows
pub fn score(rows: &[ComparisonRow]) -> (usize, usize) {
    rows.iter().fold((0, 0), |(l, r), row| match row.winner {
        Winner::Left => (l + 1, r),
        Winner::Right => (l, r + 1),
        _ => (l, r),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldKind, ScaleLaw, TRACKED_FIELDS};

    fn scenario_left() -> StatRecord {
        StatRecord::new()
            .with("PPG", 25.3)
            .with("RPG", 10.1)
            .with("APG", 5.0)
            .with("FG_PCT", 0.47)
            .with("FG3_PCT", 0.35)
            .with("FT_PCT", 0.8)
    }

    fn scenario_right() -> StatRecord {
        StatRecord::new()
            .with("PPG", 28.0)
            .with("RPG", 7.2)
            .with("APG", 6.1)
            .with("FG_PCT", 0.50)
            .with("FG3_PCT", 0.40)
            .with("FT_PCT", 0.75)
    }

    fn winner_of<'a>(rows: &'a [ComparisonRow], key: &str) -> &'a ComparisonRow {
        rows.iter().find(|r| r.field.key == key).expect("row should exist")
    }

    #[test]
    fn test_row_count_and_order_for_all_presence_combinations() {
        let l = scenario_left();
        let r = scenario_right();
        let cases = [
            (None, None),
            (Some(&l), None),
            (None, Some(&r)),
            (Some(&l), Some(&r)),
        ];

        for (left, right) in cases {
            let rows = compare(left, right);
            assert_eq!(rows.len(), TRACKED_FIELDS.len());
            for (row, field) in rows.iter().zip(TRACKED_FIELDS.iter()) {
                assert_eq!(row.field.key, field.key);
            }
        }
    }

    #[test]
    fn test_scenario_a_winners() {
        let rows = compare(Some(&scenario_left()), Some(&scenario_right()));

        assert_eq!(winner_of(&rows, "PPG").winner, Winner::Right);
        assert_eq!(winner_of(&rows, "RPG").winner, Winner::Left);
        assert_eq!(winner_of(&rows, "APG").winner, Winner::Right);
        assert_eq!(winner_of(&rows, "FG_PCT").winner, Winner::Right);
        assert_eq!(winner_of(&rows, "FG3_PCT").winner, Winner::Right);
        assert_eq!(winner_of(&rows, "FT_PCT").winner, Winner::Left);
        // GP absent on both sides
        assert_eq!(winner_of(&rows, "GP").winner, Winner::Unavailable);
    }

    #[test]
    fn test_scenario_b_one_sided() {
        let right = StatRecord::new().with("PPG", 20.0).with("RPG", 4.0).with("GP", 70.0);
        let rows = compare(None, Some(&right));

        for row in &rows {
            assert!(row.left.is_none());
            assert_eq!(row.winner, Winner::Unavailable);
            assert_eq!(row.display_left(), "-");
        }
        assert_eq!(winner_of(&rows, "PPG").right, Some(StatValue::Number(20.0)));
        assert_eq!(winner_of(&rows, "PPG").display_right(), "20");
    }

    #[test]
    fn test_equal_values_tie() {
        let a = StatRecord::new().with("APG", 6.1);
        let b = StatRecord::new().with("APG", 6.1);
        let rows = compare(Some(&a), Some(&b));
        assert_eq!(winner_of(&rows, "APG").winner, Winner::Tie);
    }

    #[test]
    fn test_non_numeric_is_unavailable() {
        let a = StatRecord::new().with("PPG", "DNP").with("RPG", f64::NAN);
        let b = StatRecord::new().with("PPG", 12.0).with("RPG", 3.0);
        let rows = compare(Some(&a), Some(&b));

        assert_eq!(winner_of(&rows, "PPG").winner, Winner::Unavailable);
        assert_eq!(winner_of(&rows, "PPG").display_left(), "DNP");
        assert_eq!(winner_of(&rows, "RPG").winner, Winner::Unavailable);
    }

    #[test]
    fn test_lower_is_better_inverts() {
        static FIELDS: [TrackedField; 1] = [TrackedField::new(
            "TOV",
            "TOV",
            FieldKind::Numeric,
            false,
            ScaleLaw::Generic,
        )];
        let registry = FieldRegistry::from_fields(&FIELDS);

        let a = StatRecord::new().with("TOV", 2.1);
        let b = StatRecord::new().with("TOV", 3.4);
        let rows = compare_with(&registry, Some(&a), Some(&b));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].winner, Winner::Left);
    }

    #[test]
    fn test_display_formats() {
        let rows = compare(
            Some(&StatRecord::new().with("PPG", 25.26).with("FG_PCT", 0.5).with("GP", 82.0)),
            None,
        );
        assert_eq!(winner_of(&rows, "PPG").display_left(), "25.3");
        assert_eq!(winner_of(&rows, "FG_PCT").display_left(), "0.500");
        assert_eq!(winner_of(&rows, "GP").display_left(), "82");
    }

    #[test]
    fn test_score_tally() {
        let rows = compare(Some(&scenario_left()), Some(&scenario_right()));
        assert_eq!(score(&rows), (2, 4));
    }
}

// 🎯 Selection State - Two independent slots, published as immutable snapshots

use crate::record::{Entity, Period};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

// ============================================================================
// SLOT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Slot {
    Left,
    Right,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::Left, Slot::Right];

    pub fn index(&self) -> usize {
        match self {
            Slot::Left => 0,
            Slot::Right => 1,
        }
    }

    pub fn other(&self) -> Slot {
        match self {
            Slot::Left => Slot::Right,
            Slot::Right => Slot::Left,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Slot::Left => "Player 1",
            Slot::Right => "Player 2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SlotSelection {
    pub entity: Option<Entity>,
    pub period: Period,
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// SelectionSnapshot - the whole selection at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SelectionSnapshot {
    /// Bumped on every effective mutation
    pub version: u64,
    pub left: SlotSelection,
    pub right: SlotSelection,
}

impl SelectionSnapshot {
    pub fn slot(&self, slot: Slot) -> &SlotSelection {
        match slot {
            Slot::Left => &self.left,
            Slot::Right => &self.right,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut SlotSelection {
        match slot {
            Slot::Left => &mut self.left,
            Slot::Right => &mut self.right,
        }
    }

    /// Slots whose (entity, period) differ from `previous`
    pub fn changed_slots(&self, previous: &SelectionSnapshot) -> Vec<Slot> {
        Slot::ALL
            .into_iter()
            .filter(|s| self.slot(*s) != previous.slot(*s))
            .collect()
    }
}

// ============================================================================
// SELECTION STATE
// ============================================================================

/// SelectionState - owner of the two slots
///
/// Mutations never edit a published snapshot: each one builds the next
/// snapshot and sends it through a watch channel. No-op mutations publish
/// nothing.
pub struct SelectionState {
    current: Arc<SelectionSnapshot>,
    tx: watch::Sender<Arc<SelectionSnapshot>>,
}

impl SelectionState {
    pub fn new() -> Self {
        let current = Arc::new(SelectionSnapshot::default());
        let (tx, _rx) = watch::channel(current.clone());
        SelectionState { current, tx }
    }

    pub fn snapshot(&self) -> Arc<SelectionSnapshot> {
        self.current.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<SelectionSnapshot>> {
        self.tx.subscribe()
    }

    /// Select a player, or clear the slot with `None`.
    ///
    /// Picking a new player keeps the slot's period; clearing resets it to
    /// `Unspecified`.
    pub fn set_entity(&mut self, slot: Slot, entity: Option<Entity>) -> bool {
        let mut next = (*self.current).clone();
        let target = next.slot_mut(slot);
        match entity {
            Some(e) => target.entity = Some(e),
            None => {
                target.entity = None;
                target.period = Period::Unspecified;
            }
        }
        self.publish(next)
    }

    /// Select a fresh player and reset the period to the source default
    pub fn select(&mut self, slot: Slot, entity: Entity) -> bool {
        let mut next = (*self.current).clone();
        *next.slot_mut(slot) = SlotSelection {
            entity: Some(entity),
            period: Period::Unspecified,
        };
        self.publish(next)
    }

    pub fn clear(&mut self, slot: Slot) -> bool {
        self.set_entity(slot, None)
    }

    /// Ignored (returns false) when the slot has no player
    pub fn set_period(&mut self, slot: Slot, period: Period) -> bool {
        if self.current.slot(slot).entity.is_none() {
            debug!(?slot, %period, "period change without player ignored");
            return false;
        }
        let mut next = (*self.current).clone();
        next.slot_mut(slot).period = period;
        self.publish(next)
    }

    fn publish(&mut self, mut next: SelectionSnapshot) -> bool {
        next.version = self.current.version;
        if next == *self.current {
            return false;
        }
        next.version += 1;

        let next = Arc::new(next);
        self.current = next.clone();
        // No receivers is fine; the snapshot is still current
        self.tx.send_replace(next);
        true
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lebron() -> Entity {
        Entity::new(2544, "LeBron James")
    }

    #[test]
    fn test_slots_are_independent() {
        let mut state = SelectionState::new();
        state.set_entity(Slot::Left, Some(lebron()));
        let before = state.snapshot();

        state.set_entity(Slot::Right, Some(Entity::new(201939, "Stephen Curry")));
        let after = state.snapshot();

        assert_eq!(after.changed_slots(&before), vec![Slot::Right]);
        assert_eq!(after.left, before.left);
    }

    #[test]
    fn test_period_without_entity_is_ignored() {
        let mut state = SelectionState::new();
        assert!(!state.set_period(Slot::Left, Period::season("2019-20")));
        assert_eq!(state.snapshot().version, 0);
        assert_eq!(state.snapshot().left.period, Period::Unspecified);
    }

    #[test]
    fn test_clearing_resets_period() {
        let mut state = SelectionState::new();
        state.set_entity(Slot::Left, Some(lebron()));
        state.set_period(Slot::Left, Period::season("2019-20"));
        assert_eq!(state.snapshot().left.period, Period::season("2019-20"));

        state.clear(Slot::Left);
        let snap = state.snapshot();
        assert!(snap.left.entity.is_none());
        assert_eq!(snap.left.period, Period::Unspecified);
    }

    #[test]
    fn test_snapshots_are_not_edited_in_place() {
        let mut state = SelectionState::new();
        let first = state.snapshot();
        state.set_entity(Slot::Left, Some(lebron()));

        assert!(first.left.entity.is_none(), "old snapshot must stay as it was");
        assert_eq!(state.snapshot().version, 1);
    }

    #[test]
    fn test_noop_mutation_publishes_nothing() {
        let mut state = SelectionState::new();
        assert!(state.set_entity(Slot::Left, Some(lebron())));
        assert!(!state.set_entity(Slot::Left, Some(lebron())));
        assert!(!state.clear(Slot::Right));
        assert_eq!(state.snapshot().version, 1);
    }

    #[test]
    fn test_select_resets_period() {
        let mut state = SelectionState::new();
        state.set_entity(Slot::Right, Some(lebron()));
        state.set_period(Slot::Right, Period::season("2019-20"));
        state.select(Slot::Right, Entity::new(201939, "Stephen Curry"));
        assert_eq!(state.snapshot().right.period, Period::Unspecified);
    }

    #[tokio::test]
    async fn test_subscribers_see_each_snapshot() {
        let mut state = SelectionState::new();
        let mut rx = state.subscribe();

        state.set_entity(Slot::Left, Some(lebron()));
        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.version, 1);
        assert_eq!(seen.left.entity, Some(lebron()));
    }
}

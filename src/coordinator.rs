// 🔄 Stat Fetch Coordinator - One fetch per slot change, last issued wins
//
// Every request carries a per-slot token. A completion is committed only if
// its token is still the slot's current one; anything older is dropped on
// arrival. Requests in flight are never aborted, just ignored.

use crate::chart::{build_series, ChartSeries};
use crate::comparison::{compare, ComparisonRow};
use crate::record::{Entity, Period, PlayerId, StatRecord};
use crate::selection::{SelectionSnapshot, Slot, SlotSelection};
use crate::source::{SourceError, SourceResult, StatSource};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// ============================================================================
// REQUEST / COMPLETION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub slot: Slot,
    pub token: u64,
    pub entity: Entity,
    pub period: Period,
}

#[derive(Debug, Clone)]
pub struct FetchCompletion {
    pub slot: Slot,
    pub token: u64,
    pub period: Period,
    pub result: SourceResult<StatRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed,
    /// Superseded by a newer request; silently dropped
    Stale,
    /// Current request failed; last good record kept
    Failed(SourceError),
}

// ============================================================================
// PER-SLOT STATE
// ============================================================================

#[derive(Debug, Default)]
struct SlotFetchState {
    token: u64,
    /// Player the current token was issued for
    requested: Option<PlayerId>,
    record: Option<StatRecord>,
    /// Player the committed record belongs to
    owner: Option<PlayerId>,
    pending: bool,
    last_error: Option<SourceError>,
}

// ============================================================================
// COORDINATOR
// ============================================================================

/// StatFetchCoordinator - owns the committed record of each slot
///
/// Lives on the UI/event-loop side. Fetches themselves run elsewhere and
/// come back as `FetchCompletion`s through `commit`.
#[derive(Debug, Default)]
pub struct StatFetchCoordinator {
    slots: [SlotFetchState; 2],
}

impl StatFetchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self, slot: Slot) -> &SlotFetchState {
        &self.slots[slot.index()]
    }

    fn state_mut(&mut self, slot: Slot) -> &mut SlotFetchState {
        &mut self.slots[slot.index()]
    }

    /// Start a new request epoch for `slot`.
    ///
    /// Any request still in flight for the slot becomes stale. With no
    /// player selected the slot's record is cleared and nothing is fetched.
    pub fn issue(&mut self, slot: Slot, selection: &SlotSelection) -> Option<FetchRequest> {
        let state = self.state_mut(slot);
        state.token += 1;

        let Some(entity) = selection.entity.clone() else {
            state.requested = None;
            state.record = None;
            state.owner = None;
            state.pending = false;
            state.last_error = None;
            debug!(?slot, token = state.token, "slot cleared");
            return None;
        };

        state.requested = Some(entity.id);
        state.pending = true;
        info!(
            ?slot,
            token = state.token,
            player = %entity.id,
            period = %selection.period,
            "fetch issued"
        );
        Some(FetchRequest {
            slot,
            token: state.token,
            entity,
            period: selection.period.clone(),
        })
    }

    /// Issue requests for the slots that changed between two snapshots
    pub fn sync(
        &mut self,
        previous: &SelectionSnapshot,
        next: &SelectionSnapshot,
    ) -> Vec<FetchRequest> {
        next.changed_slots(previous)
            .into_iter()
            .filter_map(|slot| self.issue(slot, next.slot(slot)))
            .collect()
    }

    /// Apply a completion if it answers the slot's latest request
    pub fn commit(&mut self, completion: FetchCompletion) -> CommitOutcome {
        let slot = completion.slot;
        let state = self.state_mut(slot);

        if completion.token != state.token {
            debug!(
                ?slot,
                token = completion.token,
                current = state.token,
                "stale response dropped"
            );
            return CommitOutcome::Stale;
        }

        state.pending = false;
        match completion.result {
            Ok(record) => {
                info!(
                    ?slot,
                    token = completion.token,
                    period = record.period.as_deref().unwrap_or("-"),
                    "stats committed"
                );
                state.record = Some(record);
                state.owner = state.requested;
                state.last_error = None;
                CommitOutcome::Committed
            }
            Err(err) => {
                warn!(?slot, token = completion.token, error = %err, "fetch failed, keeping last record");
                state.last_error = Some(err.clone());
                CommitOutcome::Failed(err)
            }
        }
    }

    pub fn record(&self, slot: Slot) -> Option<&StatRecord> {
        self.state(slot).record.as_ref()
    }

    /// The committed record, only if it was fetched for `player`.
    ///
    /// After switching players the slot keeps showing the previous
    /// player's record until the new one lands (or forever, if it fails).
    pub fn record_for(&self, slot: Slot, player: PlayerId) -> Option<&StatRecord> {
        let state = self.state(slot);
        match state.owner {
            Some(owner) if owner == player => state.record.as_ref(),
            _ => None,
        }
    }

    pub fn is_pending(&self, slot: Slot) -> bool {
        self.state(slot).pending
    }

    pub fn last_error(&self, slot: Slot) -> Option<&SourceError> {
        self.state(slot).last_error.as_ref()
    }

    pub fn token(&self, slot: Slot) -> u64 {
        self.state(slot).token
    }

    /// Table rows for the committed records
    pub fn comparison(&self) -> Vec<ComparisonRow> {
        compare(self.record(Slot::Left), self.record(Slot::Right))
    }

    /// Chart series for the committed records, labelled per slot
    pub fn series(&self, left_label: &str, right_label: &str) -> (ChartSeries, ChartSeries) {
        (
            build_series(left_label, self.record(Slot::Left)),
            build_series(right_label, self.record(Slot::Right)),
        )
    }
}

// ============================================================================
// ASYNC FETCH
// ============================================================================

/// Run one request against the source
pub async fn fetch<S: StatSource>(source: &S, request: FetchRequest) -> FetchCompletion {
    let result = source.get_stats(request.entity.id, &request.period).await;
    FetchCompletion {
        slot: request.slot,
        token: request.token,
        period: request.period,
        result,
    }
}

/// Run a request on the tokio runtime and hand the completion back over `tx`.
///
/// Must be called from within a runtime context.
pub fn spawn_fetch<S: StatSource>(
    source: Arc<S>,
    request: FetchRequest,
    tx: mpsc::UnboundedSender<FetchCompletion>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let completion = fetch(source.as_ref(), request).await;
        // Receiver gone means the app is shutting down
        let _ = tx.send(completion);
    })
}

// ============================================================================
// TESTS
// ============================================================================

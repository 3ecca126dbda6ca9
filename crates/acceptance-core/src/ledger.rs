use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::error::AcceptanceError;
use crate::payment::{IntentStatus, PaymentIntent};

/// Storage for payment intents and the processed-event table.
///
/// Implementations must be thread-safe (`Send + Sync`). Status writes are
/// unconditional here; transition rules belong to the processor.
pub trait Ledger: Send + Sync {
    /// Store or overwrite an intent by ID.
    fn save_payment_intent(&self, intent: PaymentIntent);

    fn get_payment_intent(&self, id: &str) -> Result<PaymentIntent, AcceptanceError>;

    fn update_intent_status(&self, id: &str, status: IntentStatus) -> Result<(), AcceptanceError>;

    /// True only once the event has been fully processed. An in-flight claim
    /// does not count.
    fn has_event_been_processed(&self, event_id: &str) -> bool;

    /// Record an event as processed. Idempotent; upgrades an existing claim.
    fn mark_event_processed(&self, event_id: &str);

    /// Atomically check that the event is unknown and claim it if so.
    /// Returns `true` if this caller now owns the event, `false` if it was
    /// already claimed or processed.
    fn try_claim_event(&self, event_id: &str) -> bool;

    /// Drop an in-flight claim so a redelivery can try again. A processed
    /// mark is never removed.
    fn release_event_claim(&self, event_id: &str);

    /// Mark the event processed and the intent settled as one unit.
    ///
    /// The default composes the primitive operations and is only as atomic as
    /// they are; [`InMemoryLedger`] overrides it with a single write lock.
    fn commit_settlement(&self, event_id: &str, intent_id: &str) -> Result<(), AcceptanceError> {
        self.get_payment_intent(intent_id)?;
        self.mark_event_processed(event_id);
        self.update_intent_status(intent_id, IntentStatus::Settled)
    }

    fn intent_count(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventMark {
    Claimed(DateTime<Utc>),
    Processed(DateTime<Utc>),
}

#[derive(Default)]
struct LedgerState {
    intents: HashMap<String, PaymentIntent>,
    events: HashMap<String, EventMark>,
}

/// Process-lifetime ledger. One reader/writer lock guards both tables so the
/// intent map and the event table can be updated together.
#[derive(Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // Every write is a single map operation, so a poisoned lock still guards
    // consistent data.
    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(|poisoned| {
            tracing::error!("ledger lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(|poisoned| {
            tracing::error!("ledger lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Number of events currently claimed but not yet processed.
    pub fn in_flight_count(&self) -> usize {
        self.read()
            .events
            .values()
            .filter(|mark| matches!(mark, EventMark::Claimed(_)))
            .count()
    }
}

impl Ledger for InMemoryLedger {
    fn save_payment_intent(&self, intent: PaymentIntent) {
        self.write().intents.insert(intent.id.clone(), intent);
    }

    fn get_payment_intent(&self, id: &str) -> Result<PaymentIntent, AcceptanceError> {
        self.read()
            .intents
            .get(id)
            .cloned()
            .ok_or_else(|| AcceptanceError::IntentNotFound(id.to_string()))
    }

    fn update_intent_status(&self, id: &str, status: IntentStatus) -> Result<(), AcceptanceError> {
        match self.write().intents.get_mut(id) {
            Some(intent) => {
                intent.status = status;
                Ok(())
            }
            None => Err(AcceptanceError::IntentNotFound(id.to_string())),
        }
    }

    fn has_event_been_processed(&self, event_id: &str) -> bool {
        matches!(
            self.read().events.get(event_id),
            Some(EventMark::Processed(_))
        )
    }

    fn mark_event_processed(&self, event_id: &str) {
        self.write()
            .events
            .insert(event_id.to_string(), EventMark::Processed(Utc::now()));
    }

    fn try_claim_event(&self, event_id: &str) -> bool {
        use std::collections::hash_map::Entry;
        match self.write().events.entry(event_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(EventMark::Claimed(Utc::now()));
                true
            }
        }
    }

    fn release_event_claim(&self, event_id: &str) {
        let mut state = self.write();
        if let Some(EventMark::Claimed(claimed_at)) = state.events.get(event_id).copied() {
            state.events.remove(event_id);
            tracing::debug!(
                event_id = %event_id,
                claimed_at = %claimed_at,
                "released event claim"
            );
        }
    }

    fn commit_settlement(&self, event_id: &str, intent_id: &str) -> Result<(), AcceptanceError> {
        let mut state = self.write();
        let LedgerState { intents, events } = &mut *state;
        let intent = intents
            .get_mut(intent_id)
            .ok_or_else(|| AcceptanceError::IntentNotFound(intent_id.to_string()))?;
        intent.status = IntentStatus::Settled;
        events.insert(event_id.to_string(), EventMark::Processed(Utc::now()));
        Ok(())
    }

    fn intent_count(&self) -> usize {
        self.read().intents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::Amount;
    use std::sync::Arc;
    use std::thread;

    fn intent() -> PaymentIntent {
        PaymentIntent::new("m1", Amount::new("5.50".parse().unwrap(), "EUR"))
    }

    #[test]
    fn save_then_get_returns_intent() {
        let ledger = InMemoryLedger::new();
        let intent = intent();
        ledger.save_payment_intent(intent.clone());
        assert_eq!(ledger.get_payment_intent(&intent.id).unwrap(), intent);
        assert_eq!(ledger.intent_count(), 1);
    }

    #[test]
    fn save_overwrites_by_id() {
        let ledger = InMemoryLedger::new();
        let mut intent = intent();
        ledger.save_payment_intent(intent.clone());
        intent.merchant_id = "m2".to_string();
        ledger.save_payment_intent(intent.clone());
        assert_eq!(ledger.get_payment_intent(&intent.id).unwrap().merchant_id, "m2");
        assert_eq!(ledger.intent_count(), 1);
    }

    #[test]
    fn missing_intent_is_not_found() {
        let ledger = InMemoryLedger::new();
        assert!(matches!(
            ledger.get_payment_intent("pi_missing"),
            Err(AcceptanceError::IntentNotFound(id)) if id == "pi_missing"
        ));
        assert!(matches!(
            ledger.update_intent_status("pi_missing", IntentStatus::Settled),
            Err(AcceptanceError::IntentNotFound(_))
        ));
    }

    #[test]
    fn status_update_is_unconditional() {
        let ledger = InMemoryLedger::new();
        let intent = intent();
        ledger.save_payment_intent(intent.clone());
        ledger
            .update_intent_status(&intent.id, IntentStatus::Settled)
            .unwrap();
        ledger
            .update_intent_status(&intent.id, IntentStatus::Created)
            .unwrap();
        assert_eq!(
            ledger.get_payment_intent(&intent.id).unwrap().status,
            IntentStatus::Created
        );
    }

    #[test]
    fn mark_processed_is_idempotent() {
        let ledger = InMemoryLedger::new();
        assert!(!ledger.has_event_been_processed("evt_1"));
        ledger.mark_event_processed("evt_1");
        ledger.mark_event_processed("evt_1");
        assert!(ledger.has_event_been_processed("evt_1"));
        assert!(!ledger.has_event_been_processed("evt_2"));
    }

    #[test]
    fn claim_is_exclusive_and_not_processed() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.try_claim_event("evt_1"));
        assert!(!ledger.try_claim_event("evt_1"));
        assert!(!ledger.has_event_been_processed("evt_1"));
        assert_eq!(ledger.in_flight_count(), 1);
    }

    #[test]
    fn release_allows_reclaim() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.try_claim_event("evt_1"));
        ledger.release_event_claim("evt_1");
        assert_eq!(ledger.in_flight_count(), 0);
        assert!(ledger.try_claim_event("evt_1"));
    }

    #[test]
    fn release_never_drops_processed_mark() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.try_claim_event("evt_1"));
        ledger.mark_event_processed("evt_1");
        ledger.release_event_claim("evt_1");
        assert!(ledger.has_event_been_processed("evt_1"));
        assert!(!ledger.try_claim_event("evt_1"));
    }

    #[test]
    fn commit_marks_both_or_neither() {
        let ledger = InMemoryLedger::new();
        let intent = intent();
        ledger.save_payment_intent(intent.clone());

        assert!(ledger.try_claim_event("evt_1"));
        ledger.commit_settlement("evt_1", &intent.id).unwrap();
        assert!(ledger.has_event_been_processed("evt_1"));
        assert_eq!(
            ledger.get_payment_intent(&intent.id).unwrap().status,
            IntentStatus::Settled
        );

        assert!(ledger.commit_settlement("evt_2", "pi_missing").is_err());
        assert!(!ledger.has_event_been_processed("evt_2"));
    }

    #[test]
    fn concurrent_claims_have_single_winner() {
        let ledger = Arc::new(InMemoryLedger::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || ledger.try_claim_event("evt_race"))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::constants::{DEFAULT_DISPATCH_TIMEOUT, INSTRUCTION_ID_PREFIX};
use crate::conversion::{ConversionPolicy, StaticRateTable};
use crate::error::AcceptanceError;
use crate::ledger::Ledger;
use crate::liquidity::LiquidityGateway;
use crate::notify::NotificationSink;
use crate::payment::{generate_id, FiatConfirmationEvent, IntentStatus, PaymentIntent};
use crate::settlement::{ProcessOutcome, SettlementInstruction, SettlementReceipt};
use crate::wallet::{StaticWalletDirectory, WalletDirectory};

/// Turns PSP confirmation events into at most one settlement per event and
/// per intent.
///
/// Each event is claimed in the ledger before anything is dispatched, so
/// duplicate deliveries racing each other cannot both reach the gateway.
/// Distinct events for the same intent are serialized on a per-intent mutex;
/// no ledger lock is ever held across the gateway call.
pub struct ConfirmationProcessor<G> {
    ledger: Arc<dyn Ledger>,
    gateway: G,
    notifiers: Vec<Arc<dyn NotificationSink>>,
    conversion: Arc<dyn ConversionPolicy>,
    wallets: Arc<dyn WalletDirectory>,
    /// Per-intent mutex so two events for one intent cannot both dispatch.
    intent_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    dispatch_timeout: Duration,
}

impl<G> ConfirmationProcessor<G> {
    /// Processor with the default rate table, no merchant wallets, no
    /// notifiers and a 30 second dispatch deadline.
    pub fn new(ledger: Arc<dyn Ledger>, gateway: G) -> Self {
        Self {
            ledger,
            gateway,
            notifiers: Vec::new(),
            conversion: Arc::new(StaticRateTable::default()),
            wallets: Arc::new(StaticWalletDirectory::default()),
            intent_locks: Arc::new(DashMap::new()),
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    pub fn with_notifier(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifiers.push(sink);
        self
    }

    pub fn with_conversion_policy(mut self, policy: Arc<dyn ConversionPolicy>) -> Self {
        self.conversion = policy;
        self
    }

    pub fn with_wallet_directory(mut self, wallets: Arc<dyn WalletDirectory>) -> Self {
        self.wallets = wallets;
        self
    }

    /// Deadline for a single gateway call. Exceeding it is a dispatch failure.
    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn dispatch_timeout(&self) -> Duration {
        self.dispatch_timeout
    }

    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }

    /// Maximum number of live per-intent locks.
    const MAX_INTENT_LOCKS: usize = 100_000;

    /// Start a background task that drops idle per-intent locks every 60 seconds.
    pub fn start_lock_cleanup(&self) {
        let intent_locks = Arc::clone(&self.intent_locks);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                // A lock is idle when nobody holds a clone and nobody holds the guard.
                let before = intent_locks.len();
                intent_locks.retain(|_, lock| Arc::strong_count(lock) > 1 || lock.try_lock().is_err());
                let removed = before - intent_locks.len();
                if removed > 0 {
                    tracing::info!(removed, "cleaned up idle intent locks");
                }
            }
        });
    }

    fn intent_lock(&self, intent_id: &str) -> Result<Arc<Mutex<()>>, AcceptanceError> {
        if self.intent_locks.len() >= Self::MAX_INTENT_LOCKS
            && !self.intent_locks.contains_key(intent_id)
        {
            return Err(AcceptanceError::Dispatch(
                "too many concurrent settlements, try again later".to_string(),
            ));
        }
        Ok(self
            .intent_locks
            .entry(intent_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    fn build_instruction(
        &self,
        event: &FiatConfirmationEvent,
        intent: &PaymentIntent,
    ) -> Result<SettlementInstruction, AcceptanceError> {
        let recipient = self.wallets.resolve_recipient(&intent.merchant_id)?;
        let payout = self.conversion.convert(&event.settled_amount)?;
        let deadline = chrono::Utc::now()
            + chrono::Duration::from_std(self.dispatch_timeout)
                .unwrap_or_else(|_| chrono::Duration::seconds(30));

        Ok(SettlementInstruction {
            instruction_id: generate_id(INSTRUCTION_ID_PREFIX),
            trigger_event_id: event.event_id.clone(),
            recipient,
            payout,
            deadline,
        })
    }

    fn notify(&self, intent_id: &str, message: &str) {
        for sink in &self.notifiers {
            sink.notify_receipt(intent_id, message);
        }
    }
}

/// Releases an event claim unless the settlement was committed.
struct ClaimGuard<'a> {
    ledger: &'a dyn Ledger,
    event_id: &'a str,
    armed: bool,
}

impl ClaimGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.ledger.release_event_claim(self.event_id);
            tracing::warn!(
                event_id = %self.event_id,
                "confirmation not committed, claim released for redelivery"
            );
        }
    }
}

impl<G> ConfirmationProcessor<G>
where
    G: LiquidityGateway,
{
    /// Process one PSP confirmation.
    ///
    /// Duplicate deliveries and already-settled intents succeed without side
    /// effects. On any error the event is left unprocessed and the intent
    /// untouched, so the PSP can redeliver.
    pub async fn process_fiat_confirmation(
        &self,
        event: &FiatConfirmationEvent,
    ) -> Result<ProcessOutcome, AcceptanceError> {
        if self.ledger.has_event_been_processed(&event.event_id) {
            tracing::info!(event_id = %event.event_id, "event already processed, skipping");
            return Ok(ProcessOutcome::AlreadyProcessed);
        }

        tracing::info!(
            event_id = %event.event_id,
            intent_id = %event.related_payment_intent,
            amount = %event.settled_amount,
            "processing fiat confirmation"
        );

        let intent = self.ledger.get_payment_intent(&event.related_payment_intent)?;
        if intent.status == IntentStatus::Settled {
            tracing::info!(intent_id = %intent.id, event_id = %event.event_id, "intent already settled");
            return Ok(ProcessOutcome::AlreadySettled);
        }

        if !self.ledger.try_claim_event(&event.event_id) {
            tracing::info!(event_id = %event.event_id, "event claimed by a concurrent delivery");
            return Ok(ProcessOutcome::InFlight);
        }

        // Released on error and when this future is dropped before commit.
        let claim = ClaimGuard {
            ledger: self.ledger.as_ref(),
            event_id: &event.event_id,
            armed: true,
        };
        let result = self.settle_claimed(event).await;
        match &result {
            Ok(_) => claim.disarm(),
            Err(e) => {
                tracing::warn!(event_id = %event.event_id, error = %e, "confirmation failed");
            }
        }
        result
    }

    /// Steps after the event claim: re-check under the intent lock, build,
    /// dispatch, commit, notify.
    async fn settle_claimed(
        &self,
        event: &FiatConfirmationEvent,
    ) -> Result<ProcessOutcome, AcceptanceError> {
        let lock = self.intent_lock(&event.related_payment_intent)?;
        let guard = lock.lock().await;

        let intent = self.ledger.get_payment_intent(&event.related_payment_intent)?;
        if intent.status == IntentStatus::Settled {
            // Settled by a different event while we waited; this one is done too.
            self.ledger.mark_event_processed(&event.event_id);
            tracing::info!(intent_id = %intent.id, event_id = %event.event_id, "intent settled by another event");
            return Ok(ProcessOutcome::AlreadySettled);
        }
        if !intent.status.is_settleable() {
            return Err(AcceptanceError::Validation(format!(
                "payment intent {} is {} and cannot be settled",
                intent.id, intent.status
            )));
        }

        if event.amount_differs_from(&intent) {
            tracing::warn!(
                intent_id = %intent.id,
                requested = %intent.amount,
                confirmed = %event.settled_amount,
                "confirmed amount differs from intent, paying out confirmed amount"
            );
        }

        let instruction = self.build_instruction(event, &intent)?;
        let instruction_id = instruction.instruction_id.clone();
        let chain = instruction.recipient.chain.clone();

        let receipt = self.dispatch(instruction).await?;

        self.ledger.commit_settlement(&event.event_id, &intent.id)?;
        drop(guard);

        tracing::info!(
            intent_id = %intent.id,
            event_id = %event.event_id,
            instruction_id = %instruction_id,
            tx = %receipt.transaction,
            "payment intent settled"
        );

        self.notify(
            &intent.id,
            &format!("Payment settled via {chain} (tx {})", receipt.transaction),
        );

        Ok(ProcessOutcome::Settled {
            instruction_id,
            transaction: receipt.transaction,
        })
    }

    async fn dispatch(
        &self,
        instruction: SettlementInstruction,
    ) -> Result<SettlementReceipt, AcceptanceError> {
        let instruction_id = instruction.instruction_id.clone();
        match tokio::time::timeout(
            self.dispatch_timeout,
            self.gateway.request_settlement(instruction),
        )
        .await
        {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(e)) => {
                tracing::error!(instruction_id = %instruction_id, error = %e, "settlement request failed");
                Err(e)
            }
            Err(_) => {
                tracing::error!(
                    instruction_id = %instruction_id,
                    timeout = ?self.dispatch_timeout,
                    "settlement request exceeded its deadline"
                );
                Err(AcceptanceError::DispatchTimeout(self.dispatch_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use crate::payment::Amount;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Counts dispatches; optionally waits and/or fails.
    #[derive(Clone, Default)]
    struct CountingGateway {
        calls: Arc<AtomicUsize>,
        delay: Duration,
        fail: Arc<std::sync::atomic::AtomicBool>,
    }

    impl CountingGateway {
        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }
    }

    impl LiquidityGateway for CountingGateway {
        async fn request_settlement(
            &self,
            instruction: SettlementInstruction,
        ) -> Result<SettlementReceipt, AcceptanceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(AcceptanceError::Dispatch("insufficient liquidity".to_string()));
            }
            Ok(SettlementReceipt {
                transaction: format!("0xtest_{}", instruction.instruction_id),
                instruction_id: instruction.instruction_id,
            })
        }
    }

    /// Ledger wrapper that counts mutating calls.
    #[derive(Default)]
    struct CountingLedger {
        inner: InMemoryLedger,
        writes: AtomicUsize,
    }

    impl CountingLedger {
        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn bump(&self) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Ledger for CountingLedger {
        fn save_payment_intent(&self, intent: PaymentIntent) {
            self.bump();
            self.inner.save_payment_intent(intent)
        }
        fn get_payment_intent(&self, id: &str) -> Result<PaymentIntent, AcceptanceError> {
            self.inner.get_payment_intent(id)
        }
        fn update_intent_status(&self, id: &str, status: IntentStatus) -> Result<(), AcceptanceError> {
            self.bump();
            self.inner.update_intent_status(id, status)
        }
        fn has_event_been_processed(&self, event_id: &str) -> bool {
            self.inner.has_event_been_processed(event_id)
        }
        fn mark_event_processed(&self, event_id: &str) {
            self.bump();
            self.inner.mark_event_processed(event_id)
        }
        fn try_claim_event(&self, event_id: &str) -> bool {
            self.bump();
            self.inner.try_claim_event(event_id)
        }
        fn release_event_claim(&self, event_id: &str) {
            self.bump();
            self.inner.release_event_claim(event_id)
        }
        fn commit_settlement(&self, event_id: &str, intent_id: &str) -> Result<(), AcceptanceError> {
            self.bump();
            self.inner.commit_settlement(event_id, intent_id)
        }
        fn intent_count(&self) -> usize {
            self.inner.intent_count()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        receipts: StdMutex<Vec<(String, String)>>,
    }

    impl NotificationSink for RecordingSink {
        fn notify_receipt(&self, intent_id: &str, message: &str) {
            self.receipts
                .lock()
                .unwrap()
                .push((intent_id.to_string(), message.to_string()));
        }
    }

    fn wallets() -> Arc<dyn WalletDirectory> {
        Arc::new(
            StaticWalletDirectory::default()
                .with_fallback(crate::constants::SANDBOX_PAYOUT_ADDRESS)
                .unwrap(),
        )
    }

    fn seeded(ledger: &dyn Ledger) -> PaymentIntent {
        let intent = PaymentIntent::new("m1", Amount::new("5.50".parse().unwrap(), "EUR"));
        ledger.save_payment_intent(intent.clone());
        intent
    }

    fn event(event_id: &str, intent_id: &str) -> FiatConfirmationEvent {
        FiatConfirmationEvent {
            event_type: "FIAT_CONFIRMATION".to_string(),
            event_id: event_id.to_string(),
            related_payment_intent: intent_id.to_string(),
            source: "stripe_sandbox".to_string(),
            status: "CAPTURED".to_string(),
            settled_amount: Amount::new("5.50".parse().unwrap(), "EUR"),
            effective_time: chrono::Utc::now(),
        }
    }

    fn processor(
        ledger: Arc<dyn Ledger>,
        gateway: CountingGateway,
    ) -> ConfirmationProcessor<CountingGateway> {
        ConfirmationProcessor::new(ledger, gateway).with_wallet_directory(wallets())
    }

    #[tokio::test]
    async fn first_delivery_settles_intent() {
        let ledger = Arc::new(InMemoryLedger::new());
        let intent = seeded(ledger.as_ref());
        let gateway = CountingGateway::default();
        let sink = Arc::new(RecordingSink::default());
        let processor = processor(ledger.clone(), gateway.clone()).with_notifier(sink.clone());

        let outcome = processor
            .process_fiat_confirmation(&event("evt_1", &intent.id))
            .await
            .unwrap();

        assert!(outcome.dispatched());
        assert_eq!(gateway.calls(), 1);
        assert!(ledger.has_event_been_processed("evt_1"));
        assert_eq!(
            ledger.get_payment_intent(&intent.id).unwrap().status,
            IntentStatus::Settled
        );
        let receipts = sink.receipts.lock().unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].0, intent.id);
        assert!(receipts[0].1.contains("world_chain"));
    }

    #[tokio::test]
    async fn redelivery_has_no_side_effects() {
        let ledger = Arc::new(CountingLedger::default());
        let intent = seeded(ledger.as_ref());
        let gateway = CountingGateway::default();
        let processor = processor(ledger.clone(), gateway.clone());
        let evt = event("evt_1", &intent.id);

        processor.process_fiat_confirmation(&evt).await.unwrap();
        let writes_after_first = ledger.writes();

        for _ in 0..5 {
            let outcome = processor.process_fiat_confirmation(&evt).await.unwrap();
            assert_eq!(outcome, ProcessOutcome::AlreadyProcessed);
        }
        assert_eq!(gateway.calls(), 1);
        assert_eq!(ledger.writes(), writes_after_first);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicates_dispatch_once() {
        let ledger = Arc::new(InMemoryLedger::new());
        let intent = seeded(ledger.as_ref());
        let gateway = CountingGateway::slow(Duration::from_millis(50));
        let processor = Arc::new(processor(ledger.clone(), gateway.clone()));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let processor = Arc::clone(&processor);
                let evt = event("evt_dup", &intent.id);
                tokio::spawn(async move { processor.process_fiat_confirmation(&evt).await })
            })
            .collect();

        let mut settled = 0;
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            if outcome.dispatched() {
                settled += 1;
            }
        }

        assert_eq!(settled, 1);
        assert_eq!(gateway.calls(), 1);
        assert_eq!(
            ledger.get_payment_intent(&intent.id).unwrap().status,
            IntentStatus::Settled
        );
    }

    #[tokio::test]
    async fn settled_intent_ignores_new_event() {
        let ledger = Arc::new(InMemoryLedger::new());
        let intent = seeded(ledger.as_ref());
        let gateway = CountingGateway::default();
        let processor = processor(ledger.clone(), gateway.clone());

        processor
            .process_fiat_confirmation(&event("evt_1", &intent.id))
            .await
            .unwrap();
        let outcome = processor
            .process_fiat_confirmation(&event("evt_2", &intent.id))
            .await
            .unwrap();

        assert_eq!(outcome, ProcessOutcome::AlreadySettled);
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_distinct_events_settle_intent_once() {
        let ledger = Arc::new(InMemoryLedger::new());
        let intent = seeded(ledger.as_ref());
        let gateway = CountingGateway::slow(Duration::from_millis(50));
        let processor = Arc::new(processor(ledger.clone(), gateway.clone()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let processor = Arc::clone(&processor);
                let evt = event(&format!("evt_{i}"), &intent.id);
                tokio::spawn(async move { processor.process_fiat_confirmation(&evt).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_intent_is_not_found_without_dispatch() {
        let ledger = Arc::new(InMemoryLedger::new());
        let gateway = CountingGateway::default();
        let processor = processor(ledger.clone(), gateway.clone());

        let err = processor
            .process_fiat_confirmation(&event("evt_1", "pi_missing"))
            .await
            .unwrap_err();

        assert!(matches!(err, AcceptanceError::IntentNotFound(_)));
        assert_eq!(gateway.calls(), 0);
        assert!(ledger.try_claim_event("evt_1"));
    }

    #[tokio::test]
    async fn dispatch_failure_leaves_state_untouched_and_retry_succeeds() {
        let ledger = Arc::new(InMemoryLedger::new());
        let intent = seeded(ledger.as_ref());
        let gateway = CountingGateway::default();
        gateway.set_failing(true);
        let processor = processor(ledger.clone(), gateway.clone());
        let evt = event("evt_1", &intent.id);

        let err = processor.process_fiat_confirmation(&evt).await.unwrap_err();
        assert!(err.is_dispatch_failure());
        assert!(!ledger.has_event_been_processed("evt_1"));
        assert_eq!(ledger.in_flight_count(), 0);
        assert_eq!(
            ledger.get_payment_intent(&intent.id).unwrap().status,
            IntentStatus::Created
        );

        gateway.set_failing(false);
        let outcome = processor.process_fiat_confirmation(&evt).await.unwrap();
        assert!(outcome.dispatched());
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn abandoned_delivery_releases_claim_for_redelivery() {
        let ledger = Arc::new(InMemoryLedger::new());
        let intent = seeded(ledger.as_ref());
        let gateway = CountingGateway::slow(Duration::from_millis(200));
        let processor = processor(ledger.clone(), gateway.clone());
        let evt = event("evt_1", &intent.id);

        // Caller gives up while the gateway call is in flight.
        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), processor.process_fiat_confirmation(&evt))
                .await;
        assert!(abandoned.is_err());
        assert_eq!(gateway.calls(), 1);
        assert_eq!(ledger.in_flight_count(), 0);
        assert!(!ledger.has_event_been_processed("evt_1"));
        assert_eq!(
            ledger.get_payment_intent(&intent.id).unwrap().status,
            IntentStatus::Created
        );

        let outcome = processor.process_fiat_confirmation(&evt).await.unwrap();
        assert!(outcome.dispatched());
        assert_eq!(gateway.calls(), 2);
        assert!(ledger.has_event_been_processed("evt_1"));
        assert_eq!(
            ledger.get_payment_intent(&intent.id).unwrap().status,
            IntentStatus::Settled
        );
    }

    #[tokio::test]
    async fn slow_gateway_times_out_as_dispatch_failure() {
        let ledger = Arc::new(InMemoryLedger::new());
        let intent = seeded(ledger.as_ref());
        let gateway = CountingGateway::slow(Duration::from_millis(500));
        let processor =
            processor(ledger.clone(), gateway.clone()).with_dispatch_timeout(Duration::from_millis(20));

        let err = processor
            .process_fiat_confirmation(&event("evt_1", &intent.id))
            .await
            .unwrap_err();

        assert!(matches!(err, AcceptanceError::DispatchTimeout(_)));
        assert!(!ledger.has_event_been_processed("evt_1"));
        assert_eq!(
            ledger.get_payment_intent(&intent.id).unwrap().status,
            IntentStatus::Created
        );
    }

    #[tokio::test]
    async fn unsupported_currency_fails_before_dispatch() {
        let ledger = Arc::new(InMemoryLedger::new());
        let intent = seeded(ledger.as_ref());
        let gateway = CountingGateway::default();
        let processor = processor(ledger.clone(), gateway.clone());
        let mut evt = event("evt_1", &intent.id);
        evt.settled_amount = Amount::new(Decimal::from(700), "JPY");

        let err = processor.process_fiat_confirmation(&evt).await.unwrap_err();

        assert!(matches!(err, AcceptanceError::UnsupportedCurrency(_)));
        assert_eq!(gateway.calls(), 0);
        assert!(ledger.try_claim_event("evt_1"));
    }

    #[tokio::test]
    async fn missing_wallet_propagates() {
        let ledger = Arc::new(InMemoryLedger::new());
        let intent = seeded(ledger.as_ref());
        let gateway = CountingGateway::default();
        let processor = ConfirmationProcessor::new(ledger.clone(), gateway.clone());

        let err = processor
            .process_fiat_confirmation(&event("evt_1", &intent.id))
            .await
            .unwrap_err();

        assert!(matches!(err, AcceptanceError::WalletNotFound(m) if m == "m1"));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn failed_intent_is_not_settled() {
        let ledger = Arc::new(InMemoryLedger::new());
        let intent = seeded(ledger.as_ref());
        ledger
            .update_intent_status(&intent.id, IntentStatus::Failed)
            .unwrap();
        let gateway = CountingGateway::default();
        let processor = processor(ledger.clone(), gateway.clone());

        let err = processor
            .process_fiat_confirmation(&event("evt_1", &intent.id))
            .await
            .unwrap_err();

        assert!(matches!(err, AcceptanceError::Validation(_)));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn funded_intent_is_settleable() {
        let ledger = Arc::new(InMemoryLedger::new());
        let intent = seeded(ledger.as_ref());
        ledger
            .update_intent_status(&intent.id, IntentStatus::Funded)
            .unwrap();
        let gateway = CountingGateway::default();
        let processor = processor(ledger.clone(), gateway.clone());

        let outcome = processor
            .process_fiat_confirmation(&event("evt_1", &intent.id))
            .await
            .unwrap();
        assert!(outcome.dispatched());
    }
}

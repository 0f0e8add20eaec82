//! Client state synchronizer.
//!
//! Mirrors the available and selected pools in memory, keeps a persisted local
//! copy, and talks to the backend with optimistic updates: every mutation is
//! applied and published first, then sent, and rolled back if the call fails.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::api::{ApiError, CardsApi};
use super::errors::ErrorReporter;
use super::order::{RoundOutcome, TargetOrder, Verdict};
use super::storage::{LocalStore, Persistence};
use crate::config::ClientConfig;
use crate::model::{contains_id, Card};

/// Published view of the client state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardsSnapshot {
    pub available: Vec<Card>,
    pub selected: Vec<Card>,
    /// Set between a win and its scheduled reset.
    pub summoned: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("Error fetching available cards.")]
    LoadAvailable(#[source] ApiError),
    #[error("Error fetching user cards.")]
    LoadSelected(#[source] ApiError),
    #[error("Failed to select card.")]
    Select(#[source] ApiError),
    #[error("Failed to unselect card.")]
    Deselect(#[source] ApiError),
    #[error("Failed to reset cards.")]
    Reset(#[source] ApiError),
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub target: TargetOrder,
    pub win_reset_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { target: TargetOrder::default(), win_reset_delay: Duration::from_millis(4000) }
    }
}

impl From<&ClientConfig> for SyncOptions {
    fn from(config: &ClientConfig) -> Self {
        Self { win_reset_delay: config.win_reset_delay, ..Self::default() }
    }
}

/// Moves `card` from `from` to `to`, at `index` or the end if `to` is shorter.
/// Only this card is touched, so concurrent moves of other cards survive.
fn move_back(card: &Card, from: &mut Vec<Card>, to: &mut Vec<Card>, index: usize) {
    from.retain(|c| c.id != card.id);
    if !contains_id(to, &card.id) {
        to.insert(index.min(to.len()), card.clone());
    }
}

struct Inner {
    api: Arc<dyn CardsApi>,
    local: LocalStore,
    errors: Arc<dyn ErrorReporter>,
    options: SyncOptions,
    state: Mutex<CardsSnapshot>,
    updates: watch::Sender<CardsSnapshot>,
    shutdown: CancellationToken,
    // Child of `shutdown`, replaced whenever a round ends or a reset is scheduled.
    round: Mutex<CancellationToken>,
}

#[derive(Clone)]
pub struct CardsService {
    inner: Arc<Inner>,
}

impl CardsService {
    /// Builds the service and restores whatever pools the local store holds.
    /// No network traffic happens until [`CardsService::bootstrap`] or a loader runs.
    pub fn new(
        api: Arc<dyn CardsApi>,
        storage: Arc<dyn Persistence>,
        errors: Arc<dyn ErrorReporter>,
        options: SyncOptions,
    ) -> Self {
        let local = LocalStore::new(storage);
        let restored = local.restore();
        let initial = CardsSnapshot {
            available: restored.available.unwrap_or_default(),
            selected: restored.selected.unwrap_or_default(),
            summoned: false,
        };
        debug!(available = initial.available.len(), selected = initial.selected.len(), "restored local pools");
        let (updates, _) = watch::channel(initial.clone());
        let shutdown = CancellationToken::new();
        Self {
            inner: Arc::new(Inner {
                api,
                local,
                errors,
                options,
                state: Mutex::new(initial),
                updates,
                round: Mutex::new(shutdown.child_token()),
                shutdown,
            }),
        }
    }

    pub fn snapshot(&self) -> CardsSnapshot {
        self.inner.state.lock().clone()
    }

    pub fn available(&self) -> Vec<Card> {
        self.inner.state.lock().available.clone()
    }

    pub fn selected(&self) -> Vec<Card> {
        self.inner.state.lock().selected.clone()
    }

    pub fn is_summoned(&self) -> bool {
        self.inner.state.lock().summoned
    }

    /// Receives a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<CardsSnapshot> {
        self.inner.updates.subscribe()
    }

    /// Startup sync. Runs a backend reset if one was requested, otherwise
    /// reloads both pools. On failure the restored pools stay as they were.
    pub async fn bootstrap(&self) -> Result<(), SyncError> {
        if self.inner.local.reset_required() {
            info!("reset requested, resetting backend selection");
            self.reset_remote().await?;
            self.inner.local.set_reset_required(false);
            return Ok(());
        }
        self.load_all().await
    }

    /// Ask the next [`CardsService::bootstrap`] to reset the backend.
    pub fn request_reset(&self) {
        self.inner.local.set_reset_required(true);
    }

    /// Fetches the catalog and publishes it minus the current selection.
    pub async fn load_available(&self) -> Result<Vec<Card>, SyncError> {
        let catalog = self.inner.api.catalog().await.map_err(|e| self.fail(SyncError::LoadAvailable(e)))?;
        Ok(self.update(|state| {
            let mut available = catalog;
            retain_unselected(&mut available, &state.selected);
            state.available = available.clone();
            available
        }))
    }

    /// Fetches the selection and filters it out of the *currently published*
    /// available pool. Without a prior catalog load that pool may be stale or
    /// empty; use [`CardsService::load_all`] for a consistent view.
    pub async fn load_selected(&self) -> Result<Vec<Card>, SyncError> {
        let selection = self.inner.api.selection().await.map_err(|e| self.fail(SyncError::LoadSelected(e)))?;
        Ok(self.update(|state| {
            state.selected = selection;
            retain_unselected(&mut state.available, &state.selected);
            state.selected.clone()
        }))
    }

    /// Catalog first, then selection, then one publish of both pools.
    pub async fn load_all(&self) -> Result<(), SyncError> {
        let catalog = self.inner.api.catalog().await.map_err(|e| self.fail(SyncError::LoadAvailable(e)))?;
        let selection = self.inner.api.selection().await.map_err(|e| self.fail(SyncError::LoadSelected(e)))?;
        self.update(|state| {
            let mut available = catalog;
            retain_unselected(&mut available, &selection);
            state.available = available;
            state.selected = selection;
        });
        Ok(())
    }

    /// Moves `card` into the selection. Already selected cards are left alone.
    pub async fn select(&self, card: &Card) -> Result<RoundOutcome, SyncError> {
        let Some(from) = self.try_update(|state| {
            if contains_id(&state.selected, &card.id) {
                return None;
            }
            let from = state.available.iter().position(|c| c.id == card.id).unwrap_or(state.available.len());
            state.selected.push(card.clone());
            state.available.retain(|c| c.id != card.id);
            Some(from)
        }) else {
            debug!(card_id = %card.id, "card already selected");
            return Ok(RoundOutcome::Pending);
        };

        if let Err(err) = self.inner.api.add(&card.id).await {
            self.update(|state| move_back(card, &mut state.selected, &mut state.available, from));
            return Err(self.fail(SyncError::Select(err)));
        }
        debug!(card_id = %card.id, title = %card.title, "card selected");
        Ok(self.judge_round().await)
    }

    /// Moves `card` back to the available pool. Unknown cards only log a warning.
    pub async fn deselect(&self, card: &Card) -> Result<(), SyncError> {
        let Some(from) = self.try_update(|state| {
            let index = state.selected.iter().position(|c| c.id == card.id)?;
            let removed = state.selected.remove(index);
            state.available.push(removed);
            Some(index)
        }) else {
            warn!(card_id = %card.id, "card not found in selection");
            return Ok(());
        };

        if let Err(err) = self.inner.api.remove(&card.id).await {
            self.update(|state| move_back(card, &mut state.available, &mut state.selected, from));
            return Err(self.fail(SyncError::Deselect(err)));
        }
        debug!(card_id = %card.id, "card deselected");
        Ok(())
    }

    /// Moves every selected card to the end of the available pool. Local only.
    pub fn reset_local(&self) {
        self.update(|state| {
            let selected = std::mem::take(&mut state.selected);
            state.available.extend(selected);
        });
    }

    /// Clears the backend selection and adopts the catalog it returns.
    pub async fn reset_remote(&self) -> Result<(), SyncError> {
        let catalog = self.inner.api.reset().await.map_err(|e| self.fail(SyncError::Reset(e)))?;
        self.update(|state| {
            state.available = catalog;
            state.selected.clear();
        });
        Ok(())
    }

    /// Cancels a pending post-win reset for good. In-flight requests are not aborted.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    async fn judge_round(&self) -> RoundOutcome {
        let selected = self.selected();
        match self.inner.options.target.judge(&selected) {
            Verdict::Incomplete => RoundOutcome::Pending,
            Verdict::Match => {
                info!("Exodia summoned");
                self.update(|state| state.summoned = true);
                self.schedule_round_reset();
                RoundOutcome::Won
            }
            Verdict::Mismatch => {
                info!(picked = selected.len(), "Exodia refuses this order");
                self.reset_round().await;
                RoundOutcome::Lost
            }
        }
    }

    fn schedule_round_reset(&self) {
        let service = self.clone();
        let round = self.next_round();
        let delay = self.inner.options.win_reset_delay;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = round.cancelled() => debug!("scheduled reset cancelled"),
                _ = tokio::time::sleep(delay) => service.reset_round().await,
            }
        });
    }

    /// Cancels any reset scheduled for the current round and opens the next one.
    fn next_round(&self) -> CancellationToken {
        let mut round = self.inner.round.lock();
        round.cancel();
        *round = self.inner.shutdown.child_token();
        round.clone()
    }

    /// End of a round: empty the selection, via the backend when it answers.
    async fn reset_round(&self) {
        self.next_round();
        if self.reset_remote().await.is_err() {
            self.reset_local();
        }
        self.update(|state| state.summoned = false);
    }

    fn fail(&self, err: SyncError) -> SyncError {
        self.inner.errors.report(&err.to_string());
        err
    }

    fn update<R>(&self, f: impl FnOnce(&mut CardsSnapshot) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.inner.state.lock();
            let result = f(&mut *state);
            (result, state.clone())
        };
        self.publish(snapshot);
        result
    }

    /// Like `update`, but publishes only when `f` returns `Some`.
    fn try_update<R>(&self, f: impl FnOnce(&mut CardsSnapshot) -> Option<R>) -> Option<R> {
        let (result, snapshot) = {
            let mut state = self.inner.state.lock();
            let result = f(&mut *state)?;
            (result, state.clone())
        };
        self.publish(snapshot);
        Some(result)
    }

    fn publish(&self, snapshot: CardsSnapshot) {
        self.inner.local.persist(&snapshot.available, &snapshot.selected);
        self.inner.updates.send_replace(snapshot);
    }
}

fn retain_unselected(cards: &mut Vec<Card>, selected: &[Card]) {
    let ids: HashSet<&str> = selected.iter().map(|c| c.id.as_str()).collect();
    cards.retain(|c| !ids.contains(c.id.as_str()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use crate::client::errors::ErrorLog;
    use crate::client::order::EXODIA_ORDER;
    use crate::client::storage::{MemoryStorage, RESET_REQUIRED_KEY};

    fn catalog() -> Vec<Card> {
        let mut cards: Vec<Card> = EXODIA_ORDER
            .iter()
            .enumerate()
            .map(|(i, title)| Card::new(format!("e{}", i + 1), *title, format!("exodia-{}.png", i + 1)))
            .collect();
        cards.push(Card::new("k", "Kuriboh", "kuriboh.png"));
        cards
    }

    fn card(id: &str) -> Card {
        catalog().into_iter().find(|c| c.id == id).expect("card in catalog")
    }

    #[derive(Default)]
    struct FakeApi {
        selection: Mutex<Vec<Card>>,
        offline: AtomicBool,
        resets: Mutex<usize>,
        // Ids whose add/remove fails after a delay.
        slow_failures: Mutex<HashSet<String>>,
    }

    impl FakeApi {
        fn go_offline(&self) { self.offline.store(true, Ordering::SeqCst); }

        fn fail_slowly(&self, card_id: &str) { self.slow_failures.lock().insert(card_id.to_string()); }

        async fn check_card(&self, card_id: &str) -> Result<(), ApiError> {
            let slow = self.slow_failures.lock().contains(card_id);
            if slow {
                tokio::time::sleep(Duration::from_millis(100)).await;
                return Err(ApiError::Status { url: "fake".into(), status: 500, message: "boom".into() });
            }
            self.check()
        }

        fn check(&self) -> Result<(), ApiError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(ApiError::Status { url: "fake".into(), status: 503, message: "offline".into() });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CardsApi for FakeApi {
        async fn catalog(&self) -> Result<Vec<Card>, ApiError> {
            self.check()?;
            Ok(catalog())
        }

        async fn selection(&self) -> Result<Vec<Card>, ApiError> {
            self.check()?;
            Ok(self.selection.lock().clone())
        }

        async fn add(&self, card_id: &str) -> Result<Vec<Card>, ApiError> {
            self.check_card(card_id).await?;
            let mut selection = self.selection.lock();
            if !contains_id(&selection, card_id) {
                selection.push(card(card_id));
            }
            Ok(selection.clone())
        }

        async fn remove(&self, card_id: &str) -> Result<Vec<Card>, ApiError> {
            self.check_card(card_id).await?;
            let mut selection = self.selection.lock();
            selection.retain(|c| c.id != card_id);
            Ok(selection.clone())
        }

        async fn reset(&self) -> Result<Vec<Card>, ApiError> {
            self.check()?;
            self.selection.lock().clear();
            *self.resets.lock() += 1;
            Ok(catalog())
        }
    }

    struct Harness {
        api: Arc<FakeApi>,
        storage: Arc<MemoryStorage>,
        errors: Arc<ErrorLog>,
        service: CardsService,
    }

    impl Harness {
        fn new() -> Self {
            let api = Arc::new(FakeApi::default());
            let storage = Arc::new(MemoryStorage::new());
            let errors = Arc::new(ErrorLog::new());
            let service = CardsService::new(api.clone(), storage.clone(), errors.clone(), SyncOptions::default());
            Self { api, storage, errors, service }
        }

        async fn loaded() -> Self {
            let h = Self::new();
            h.service.load_all().await.expect("initial load");
            h
        }

        fn reopen(&self) -> CardsService {
            CardsService::new(self.api.clone(), self.storage.clone(), self.errors.clone(), SyncOptions::default())
        }
    }

    fn ids(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn select_moves_card_exactly_once() {
        let h = Harness::loaded().await;
        h.service.select(&card("e3")).await.unwrap();
        h.service.select(&card("e3")).await.unwrap();

        let snap = h.service.snapshot();
        assert_eq!(ids(&snap.selected), ["e3"]);
        assert!(!contains_id(&snap.available, "e3"));
        assert_eq!(ids(&h.api.selection.lock()), ["e3"]);
    }

    #[tokio::test]
    async fn deselect_moves_card_back_exactly_once() {
        let h = Harness::loaded().await;
        h.service.select(&card("k")).await.unwrap();
        h.service.deselect(&card("k")).await.unwrap();

        let snap = h.service.snapshot();
        assert!(snap.selected.is_empty());
        assert_eq!(snap.available.iter().filter(|c| c.id == "k").count(), 1);
        assert_eq!(snap.available.last().map(|c| c.id.as_str()), Some("k"));
    }

    #[tokio::test]
    async fn deselect_of_unselected_card_is_a_no_op() {
        let h = Harness::loaded().await;
        let before = h.service.snapshot();
        h.service.deselect(&card("e1")).await.unwrap();
        assert_eq!(h.service.snapshot(), before);
        assert!(h.errors.all().is_empty());
    }

    #[tokio::test]
    async fn failed_select_rolls_back_and_reports() {
        let h = Harness::loaded().await;
        h.service.select(&card("e1")).await.unwrap();
        let before = h.service.snapshot();

        h.api.go_offline();
        let err = h.service.select(&card("e2")).await.unwrap_err();
        assert!(matches!(err, SyncError::Select(_)));
        assert_eq!(h.service.snapshot(), before);
        assert_eq!(h.errors.latest().as_deref(), Some("Failed to select card."));

        let persisted = h.reopen().snapshot();
        assert_eq!(persisted.selected, before.selected);
        assert_eq!(persisted.available, before.available);
    }

    #[tokio::test]
    async fn failed_deselect_rolls_back_and_reports() {
        let h = Harness::loaded().await;
        h.service.select(&card("e1")).await.unwrap();
        let before = h.service.snapshot();

        h.api.go_offline();
        assert!(matches!(h.service.deselect(&card("e1")).await, Err(SyncError::Deselect(_))));
        assert_eq!(h.service.snapshot(), before);
        assert_eq!(h.errors.latest().as_deref(), Some("Failed to unselect card."));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_select_keeps_concurrent_successful_select() {
        let h = Harness::loaded().await;
        h.api.fail_slowly("e1");

        let (c1, c2) = (card("e1"), card("e2"));
        let (first, second) = tokio::join!(h.service.select(&c1), h.service.select(&c2));
        assert!(matches!(first, Err(SyncError::Select(_))));
        assert_eq!(second.unwrap(), RoundOutcome::Pending);

        let snap = h.service.snapshot();
        assert_eq!(ids(&snap.selected), ["e2"]);
        assert_eq!(ids(&snap.available), ["e1", "e3", "e4", "e5", "k"]);
        assert_eq!(ids(&h.api.selection.lock()), ["e2"]);
        assert_eq!(h.errors.latest().as_deref(), Some("Failed to select card."));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_deselect_keeps_concurrent_successful_deselect() {
        let h = Harness::loaded().await;
        for id in ["e1", "e2", "e3"] {
            h.service.select(&card(id)).await.unwrap();
        }
        h.api.fail_slowly("e1");

        let (c1, c3) = (card("e1"), card("e3"));
        let (first, second) = tokio::join!(h.service.deselect(&c1), h.service.deselect(&c3));
        assert!(matches!(first, Err(SyncError::Deselect(_))));
        second.unwrap();

        let snap = h.service.snapshot();
        assert_eq!(ids(&snap.selected), ["e1", "e2"]);
        assert_eq!(ids(&snap.available), ["e4", "e5", "k", "e3"]);
        assert_eq!(ids(&h.api.selection.lock()), ["e1", "e2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn target_order_wins_then_resets_after_delay() {
        let h = Harness::loaded().await;
        let mut outcomes = Vec::new();
        for n in 1..=5 {
            outcomes.push(h.service.select(&card(&format!("e{n}"))).await.unwrap());
        }
        assert_eq!(&outcomes[..4], &[RoundOutcome::Pending; 4]);
        assert_eq!(outcomes[4], RoundOutcome::Won);
        assert!(h.service.is_summoned());
        assert_eq!(h.service.selected().len(), 5);

        tokio::time::sleep(Duration::from_millis(3900)).await;
        assert!(h.service.is_summoned());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let snap = h.service.snapshot();
        assert!(!snap.summoned);
        assert!(snap.selected.is_empty());
        assert_eq!(snap.available, catalog());
        assert_eq!(*h.api.resets.lock(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_scheduled_reset() {
        let h = Harness::loaded().await;
        for n in 1..=5 {
            h.service.select(&card(&format!("e{n}"))).await.unwrap();
        }
        h.service.shutdown();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(h.service.is_summoned());
        assert_eq!(*h.api.resets.lock(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn loss_after_win_cancels_the_pending_reset() {
        let h = Harness::loaded().await;
        for n in 1..=5 {
            h.service.select(&card(&format!("e{n}"))).await.unwrap();
        }
        assert_eq!(h.service.select(&card("k")).await.unwrap(), RoundOutcome::Lost);
        assert!(!h.service.is_summoned());
        assert_eq!(*h.api.resets.lock(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        h.service.select(&card("e1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(ids(&h.service.selected()), ["e1"]);
        assert_eq!(ids(&h.api.selection.lock()), ["e1"]);
        assert_eq!(*h.api.resets.lock(), 1);
    }

    #[tokio::test]
    async fn wrong_order_loses_and_resets_immediately() {
        let h = Harness::loaded().await;
        let mut last = RoundOutcome::Pending;
        for id in ["e2", "e1", "e3", "e4", "e5"] {
            last = h.service.select(&card(id)).await.unwrap();
        }
        assert_eq!(last, RoundOutcome::Lost);
        let snap = h.service.snapshot();
        assert!(snap.selected.is_empty());
        assert!(!snap.summoned);
        assert_eq!(snap.available, catalog());
        assert!(h.api.selection.lock().is_empty());
    }

    #[tokio::test]
    async fn five_picks_with_a_decoy_lose() {
        let h = Harness::loaded().await;
        let mut last = RoundOutcome::Pending;
        for id in ["e1", "e2", "e3", "e4", "k"] {
            last = h.service.select(&card(id)).await.unwrap();
        }
        assert_eq!(last, RoundOutcome::Lost);
        assert!(h.service.selected().is_empty());
    }

    #[tokio::test]
    async fn reset_local_matches_deselecting_everything() {
        let a = Harness::loaded().await;
        let b = Harness::loaded().await;
        for id in ["k", "e4", "e2"] {
            a.service.select(&card(id)).await.unwrap();
            b.service.select(&card(id)).await.unwrap();
        }

        a.service.reset_local();
        for picked in b.service.selected() {
            b.service.deselect(&picked).await.unwrap();
        }
        assert_eq!(a.service.snapshot(), b.service.snapshot());
        assert!(a.service.selected().is_empty());
    }

    #[tokio::test]
    async fn failed_remote_reset_leaves_state_untouched() {
        let h = Harness::loaded().await;
        h.service.select(&card("e1")).await.unwrap();
        let before = h.service.snapshot();
        h.api.go_offline();
        assert!(matches!(h.service.reset_remote().await, Err(SyncError::Reset(_))));
        assert_eq!(h.service.snapshot(), before);
        assert_eq!(h.errors.latest().as_deref(), Some("Failed to reset cards."));
    }

    #[tokio::test]
    async fn persisted_pools_are_restored_by_a_new_service() {
        let h = Harness::loaded().await;
        h.service.select(&card("e5")).await.unwrap();
        h.service.select(&card("k")).await.unwrap();

        let reopened = h.reopen().snapshot();
        let current = h.service.snapshot();
        assert_eq!(reopened.available, current.available);
        assert_eq!(reopened.selected, current.selected);
    }

    #[tokio::test]
    async fn load_available_excludes_selected_cards() {
        let h = Harness::new();
        h.api.selection.lock().push(card("e2"));
        h.service.load_selected().await.unwrap();
        let available = h.service.load_available().await.unwrap();
        assert_eq!(available.len(), catalog().len() - 1);
        assert!(!contains_id(&available, "e2"));
    }

    #[tokio::test]
    async fn load_selected_filters_only_the_published_pool() {
        let h = Harness::new();
        h.api.selection.lock().push(card("e2"));
        h.service.load_selected().await.unwrap();
        // Nothing was loaded into the available pool yet, so it stays empty.
        assert!(h.service.available().is_empty());
        assert_eq!(ids(&h.service.selected()), ["e2"]);
    }

    #[tokio::test]
    async fn failed_load_available_reports_and_keeps_pools() {
        let h = Harness::loaded().await;
        h.service.select(&card("e3")).await.unwrap();
        let before = h.service.snapshot();

        h.api.go_offline();
        let err = h.service.load_available().await.unwrap_err();
        assert!(matches!(err, SyncError::LoadAvailable(_)));
        assert_eq!(h.errors.all(), ["Error fetching available cards."]);
        assert_eq!(h.service.snapshot(), before);
    }

    #[tokio::test]
    async fn failed_load_selected_reports_and_keeps_pools() {
        let h = Harness::loaded().await;
        h.service.select(&card("e3")).await.unwrap();
        let before = h.service.snapshot();

        h.api.go_offline();
        let err = h.service.load_selected().await.unwrap_err();
        assert!(matches!(err, SyncError::LoadSelected(_)));
        assert_eq!(h.errors.all(), ["Error fetching user cards."]);
        assert_eq!(h.service.snapshot(), before);
    }

    #[tokio::test]
    async fn failed_load_reports_and_keeps_restored_pools() {
        let h = Harness::loaded().await;
        h.service.select(&card("e1")).await.unwrap();
        h.api.go_offline();
        let reopened = h.reopen();
        let err = reopened.bootstrap().await.unwrap_err();
        assert!(matches!(err, SyncError::LoadAvailable(_)));
        assert_eq!(ids(&reopened.selected()), ["e1"]);
        assert_eq!(h.errors.latest().as_deref(), Some("Error fetching available cards."));
    }

    #[tokio::test]
    async fn bootstrap_with_nothing_stored_and_backend_down_is_empty() {
        let h = Harness::new();
        h.api.go_offline();
        assert!(h.service.bootstrap().await.is_err());
        assert_eq!(h.service.snapshot(), CardsSnapshot::default());
    }

    #[tokio::test]
    async fn bootstrap_honours_reset_request() {
        let h = Harness::loaded().await;
        h.service.select(&card("e1")).await.unwrap();
        h.service.request_reset();

        let reopened = h.reopen();
        reopened.bootstrap().await.unwrap();
        assert!(reopened.selected().is_empty());
        assert_eq!(reopened.available(), catalog());
        assert_eq!(*h.api.resets.lock(), 1);
        assert_eq!(h.storage.load(RESET_REQUIRED_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn subscribers_see_each_change() {
        let h = Harness::loaded().await;
        let mut rx = h.service.subscribe();
        h.service.select(&card("e1")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(ids(&rx.borrow_and_update().selected), ["e1"]);
    }
}

//! # Save guard
//!
//! `PickController` owns everything the picker screen shows: the current
//! unsaved set, the guard state and the history list. State only changes
//! through [`PickController::mount`], [`PickController::generate`],
//! [`PickController::save`] and [`PickController::refresh_history`];
//! readers get [`PickSnapshot`] copies.
//!
//! The guard checks the store before writing, so one instance saves at most
//! once per period. Two instances can both pass that check; the store's
//! conditional append decides the winner and the loser gets
//! [`GuardError::RaceLost`].

use crate::clock::Clock;
use crate::numbers::generate_numbers;
use crate::period::{DrawPeriod, classify_at};
use crate::store::{AppendOutcome, HistoryStore, StoreError};
use crate::types::{Entry, NumberSet};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "period", rename_all = "snake_case")]
pub enum GuardState {
    /// Not yet checked against the store, or the last check failed.
    Unchecked,
    /// The current moment is outside every draw period.
    Disabled,
    CheckedUnsaved(DrawPeriod),
    Saved(DrawPeriod),
}

impl GuardState {
    fn checked_period(self) -> Option<DrawPeriod> {
        match self {
            GuardState::CheckedUnsaved(p) | GuardState::Saved(p) => Some(p),
            GuardState::Unchecked | GuardState::Disabled => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("history store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("another pick was already saved for {period}")]
    RaceLost { period: DrawPeriod },
}

/// What a call to [`PickController::save`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "entry", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved(Entry),
    AlreadySaved,
    NothingGenerated,
    OutsideDrawPeriod,
}

impl SaveOutcome {
    /// Message for the user when nothing was written.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            SaveOutcome::Saved(_) => None,
            SaveOutcome::AlreadySaved => Some("A pick is already saved for this draw."),
            SaveOutcome::NothingGenerated => Some("Generate numbers before saving."),
            SaveOutcome::OutsideDrawPeriod => Some("It is not time to save numbers."),
        }
    }
}

/// Read-only view of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickSnapshot {
    /// Period the clock is in right now.
    pub period: Option<DrawPeriod>,
    pub guard: GuardState,
    pub can_save: bool,
    pub current: Option<NumberSet>,
    pub history: Vec<Entry>,
}

pub struct PickController<S> {
    store: S,
    clock: Arc<dyn Clock>,
    rng: Pcg32,
    state: GuardState,
    current: Option<NumberSet>,
    history: Vec<Entry>,
}

impl<S: HistoryStore> PickController<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            rng: Pcg32::from_rng(&mut rand::rng()),
            state: GuardState::Unchecked,
            current: None,
            history: Vec::new(),
        }
    }

    /// Replace the entropy-seeded generator with a deterministic one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Pcg32::seed_from_u64(seed);
        self
    }

    /// Load history and check the guard. Safe to call again after a failure.
    ///
    /// History is read before the guard moves, so a failed mount leaves the
    /// state as it was.
    pub async fn mount(&mut self) -> Result<GuardState, GuardError> {
        let history = self.store.list().await?;
        let state = self.check().await?;
        self.history = history;
        Ok(state)
    }

    /// Re-evaluate the guard for the current moment.
    pub async fn check(&mut self) -> Result<GuardState, GuardError> {
        let period = classify_at(&self.clock.now());
        self.check_period(period).await
    }

    async fn check_period(&mut self, period: Option<DrawPeriod>) -> Result<GuardState, GuardError> {
        let Some(period) = period else {
            self.state = GuardState::Disabled;
            info!("⏸ Outside every draw period, saving disabled");
            return Ok(self.state);
        };

        self.state = if self.store.exists(period).await? {
            GuardState::Saved(period)
        } else {
            GuardState::CheckedUnsaved(period)
        };
        info!("🎰 Guard checked for {}: {:?}", period, self.state);
        Ok(self.state)
    }

    /// Draw a new set, replacing any unsaved one.
    pub fn generate(&mut self) -> NumberSet {
        let set = generate_numbers(&mut self.rng);
        self.current = Some(set);
        set
    }

    /// Save the current set for the current period, at most once per period.
    ///
    /// Store failures leave the guard untouched so the call can be retried.
    pub async fn save(&mut self) -> Result<SaveOutcome, GuardError> {
        let period = match classify_at(&self.clock.now()) {
            Some(period) => period,
            None => {
                self.state = GuardState::Disabled;
                return Ok(SaveOutcome::OutsideDrawPeriod);
            }
        };

        // The period may have rolled over since mount, or mount may have failed.
        if self.state.checked_period() != Some(period) {
            self.check_period(Some(period)).await?;
        }

        if self.state == GuardState::Saved(period) {
            return Ok(SaveOutcome::AlreadySaved);
        }
        let Some(numbers) = self.current else {
            return Ok(SaveOutcome::NothingGenerated);
        };

        match self.store.append(&numbers, period).await? {
            AppendOutcome::Inserted(entry) => {
                self.state = GuardState::Saved(period);
                info!("💾 Saved pick {} for {}", entry.id, period);
                if let Err(e) = self.refresh_history().await {
                    warn!("History refresh after save failed: {}", e);
                }
                Ok(SaveOutcome::Saved(entry))
            }
            AppendOutcome::PeriodTaken => {
                self.state = GuardState::Saved(period);
                warn!("Lost save race for {}", period);
                if let Err(e) = self.refresh_history().await {
                    warn!("History refresh after lost race failed: {}", e);
                }
                Err(GuardError::RaceLost { period })
            }
        }
    }

    pub async fn refresh_history(&mut self) -> Result<&[Entry], GuardError> {
        self.history = self.store.list().await?;
        Ok(&self.history)
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn current(&self) -> Option<&NumberSet> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[Entry] {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshot(&self) -> PickSnapshot {
        let period = classify_at(&self.clock.now());
        let can_save = self.current.is_some()
            && period.is_some_and(|p| self.state == GuardState::CheckedUnsaved(p));
        PickSnapshot {
            period,
            guard: self.state,
            can_save,
            current: self.current,
            history: self.history.clone(),
        }
    }
}

//! # History store
//!
//! Storage seam between the save guard and wherever picks are persisted.
//! The guard only needs three calls: an existence check per period, a
//! single append, and an ordered scan for the history list.

use crate::period::DrawPeriod;
use crate::types::{Entry, NumberSet};
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt pick {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

/// Result of an append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The pick was written; the entry carries its store-assigned timestamp.
    Inserted(Entry),
    /// A pick for the period already exists, nothing was written.
    PeriodTaken,
}

pub trait HistoryStore: Send + Sync {
    /// All picks, newest first.
    fn list(&self) -> impl Future<Output = Result<Vec<Entry>, StoreError>> + Send;

    /// Whether a pick tagged with `period` exists.
    fn exists(&self, period: DrawPeriod) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Persist a pick for `period`, stamping it at write time.
    ///
    /// Must not write when the period already has a pick.
    fn append(
        &self,
        numbers: &NumberSet,
        period: DrawPeriod,
    ) -> impl Future<Output = Result<AppendOutcome, StoreError>> + Send;
}

impl<S: HistoryStore> HistoryStore for Arc<S> {
    fn list(&self) -> impl Future<Output = Result<Vec<Entry>, StoreError>> + Send {
        (**self).list()
    }

    fn exists(&self, period: DrawPeriod) -> impl Future<Output = Result<bool, StoreError>> + Send {
        (**self).exists(period)
    }

    fn append(
        &self,
        numbers: &NumberSet,
        period: DrawPeriod,
    ) -> impl Future<Output = Result<AppendOutcome, StoreError>> + Send {
        (**self).append(numbers, period)
    }
}

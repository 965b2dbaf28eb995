pub mod clock;
pub mod config;
pub mod database;
pub mod guard;
pub mod numbers;
pub mod period;
pub mod store;
pub mod types;
pub mod utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use database::SqliteStore;
pub use guard::{GuardError, GuardState, PickController, PickSnapshot, SaveOutcome};
pub use numbers::generate_numbers;
pub use period::{DrawPeriod, classify, classify_at};
pub use store::{AppendOutcome, HistoryStore, StoreError};
pub use types::{Entry, NumberSet};

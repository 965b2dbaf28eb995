use anyhow::Result;
use baloto::{
    GuardError, HistoryStore, PickController, SaveOutcome, classify_at, utils::format_numbers,
};
use chrono::DateTime;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A tool was called with arguments it cannot accept.
#[derive(Debug, thiserror::Error)]
#[error("Invalid params: {0}")]
pub struct InvalidParams(pub String);

fn invalid(message: impl Into<String>) -> anyhow::Error {
    InvalidParams(message.into()).into()
}

/// Tool-facing wrapper around one shared pick controller.
///
/// Every call takes the controller lock for its whole duration, so a save
/// in flight holds off other commands.
pub struct PickUseCase<S> {
    controller: Arc<Mutex<PickController<S>>>,
}

impl<S: HistoryStore> PickUseCase<S> {
    pub fn new(controller: Arc<Mutex<PickController<S>>>) -> Self {
        Self { controller }
    }

    pub async fn get_draw_period(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let period = match arguments.get("at") {
            None | Some(Value::Null) => self.controller.lock().await.snapshot().period,
            Some(Value::String(at)) => {
                let when = DateTime::parse_from_rfc3339(at)
                    .map_err(|e| invalid(format!("at is not an RFC 3339 timestamp: {}", e)))?;
                classify_at(&when)
            }
            Some(other) => return Err(invalid(format!("at must be a string, got {}", other))),
        };

        Ok(json!({
            "success": true,
            "period": period,
            "open": period.is_some()
        })
        .to_string())
    }

    pub async fn get_status(&self, _arguments: &HashMap<String, Value>) -> Result<String> {
        let snapshot = self.controller.lock().await.snapshot();

        Ok(json!({
            "success": true,
            "period": snapshot.period,
            "guard": snapshot.guard,
            "can_save": snapshot.can_save,
            "current": snapshot.current,
            "history_count": snapshot.history.len()
        })
        .to_string())
    }

    pub async fn check_guard(&self, _arguments: &HashMap<String, Value>) -> Result<String> {
        let mut controller = self.controller.lock().await;
        let state = controller
            .mount()
            .await
            .map_err(|e| anyhow::anyhow!("Guard check failed, try again: {}", e))?;

        Ok(json!({
            "success": true,
            "guard": state
        })
        .to_string())
    }

    pub async fn generate_numbers(&self, _arguments: &HashMap<String, Value>) -> Result<String> {
        let mut controller = self.controller.lock().await;
        let numbers = controller.generate();
        let snapshot = controller.snapshot();

        Ok(json!({
            "success": true,
            "numbers": numbers,
            "display": format_numbers(&numbers),
            "can_save": snapshot.can_save
        })
        .to_string())
    }

    pub async fn save_numbers(&self, _arguments: &HashMap<String, Value>) -> Result<String> {
        let mut controller = self.controller.lock().await;
        let outcome = controller.save().await.map_err(|e| match e {
            GuardError::RaceLost { period } => {
                anyhow::anyhow!("Another pick was saved for {} first", period)
            }
            GuardError::StoreUnavailable(e) => {
                anyhow::anyhow!("Could not save, try again: {}", e)
            }
        })?;

        let response = match outcome {
            SaveOutcome::Saved(entry) => json!({
                "success": true,
                "saved": true,
                "entry": entry
            }),
            other => json!({
                "success": false,
                "saved": false,
                "notice": other.notice()
            }),
        };
        Ok(response.to_string())
    }

    pub async fn get_history(&self, arguments: &HashMap<String, Value>) -> Result<String> {
        let limit = match arguments.get("limit") {
            None | Some(Value::Null) => None,
            Some(value) => {
                let limit = value.as_u64().ok_or_else(|| {
                    invalid(format!("limit must be a non-negative integer, got {}", value))
                })?;
                let limit = usize::try_from(limit)
                    .map_err(|_| invalid(format!("limit {} is too large", limit)))?;
                Some(limit)
            }
        };

        let mut controller = self.controller.lock().await;
        let history = controller.refresh_history().await?;
        let results: Vec<_> = match limit {
            Some(limit) => history.iter().take(limit).collect(),
            None => history.iter().collect(),
        };

        Ok(json!({
            "success": true,
            "results": results
        })
        .to_string())
    }
}

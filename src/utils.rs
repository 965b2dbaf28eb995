use crate::guard::GuardState;
use crate::period::DrawPeriod;
use crate::types::{Entry, NumberSet};

pub fn format_numbers(set: &NumberSet) -> String {
    let mains = set
        .numbers()
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} + {}", mains, set.super_ball())
}

/// One history line: save date (day/month/year, UTC), period tag and numbers.
pub fn format_entry(entry: &Entry) -> String {
    format!(
        "{} | {} | {}",
        entry.created_at.format("%d/%m/%Y"),
        entry.period,
        format_numbers(&entry.numbers)
    )
}

pub fn describe_period(period: Option<DrawPeriod>) -> String {
    match period {
        Some(period) => period.to_string(),
        None => "no draw period".to_string(),
    }
}

pub fn describe_guard(state: GuardState) -> String {
    match state {
        GuardState::Unchecked => "not checked yet".to_string(),
        GuardState::Disabled => "saving closed".to_string(),
        GuardState::CheckedUnsaved(p) => format!("ready to save for {}", p),
        GuardState::Saved(p) => format!("already saved for {}", p),
    }
}

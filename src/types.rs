use crate::period::DrawPeriod;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const MAIN_COUNT: usize = 5;
pub const MAIN_MAX: u8 = 43;
pub const SUPER_MAX: u8 = 16;

/// Five main numbers in `1..=43` plus the superbalota in `1..=16`.
///
/// Main numbers may repeat. A set is never modified after it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberSet {
    numbers: [u8; MAIN_COUNT],
    super_ball: u8,
}

impl NumberSet {
    /// Returns `None` when any value is out of range.
    pub fn new(numbers: [u8; MAIN_COUNT], super_ball: u8) -> Option<Self> {
        let mains_ok = numbers.iter().all(|n| (1..=MAIN_MAX).contains(n));
        if mains_ok && (1..=SUPER_MAX).contains(&super_ball) {
            Some(Self {
                numbers,
                super_ball,
            })
        } else {
            None
        }
    }

    pub(crate) fn from_parts_unchecked(numbers: [u8; MAIN_COUNT], super_ball: u8) -> Self {
        Self {
            numbers,
            super_ball,
        }
    }

    pub fn numbers(&self) -> &[u8; MAIN_COUNT] {
        &self.numbers
    }

    pub fn super_ball(&self) -> u8 {
        self.super_ball
    }
}

/// A saved pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub id: i64,
    pub numbers: NumberSet,
    pub period: DrawPeriod,
    /// Assigned by the store when the row is written.
    pub created_at: DateTime<Utc>,
}

/// Raw `picks` row before validation.
#[derive(Debug)]
pub struct PickRow {
    pub id: i64,
    pub draw_period: String,
    pub numbers: [u8; MAIN_COUNT],
    pub super_ball: u8,
    pub created_at: i64,
}

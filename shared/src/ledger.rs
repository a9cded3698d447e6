//! Attendance ledger: read-modify-write of one member's month record.
//!
//! Storage layout (shared with earlier deployments of the bot):
//! - `{group_id}:{user_id}:{YYYY-MM}` → attendance string, see [`DayMask`]
//! - `display_name:{user_id}` → last seen display name
//!
//! Updates are not serialised. Two check-ins racing on the same key each
//! read the old string and the second write wins, dropping the first mark.
//! The record and display name are written together through
//! [`KeyValueStore::mset`].

use std::sync::Arc;

use tracing::info;

use crate::day_mask::{DayMask, Mark};
use crate::month::YearMonth;
use crate::store::KeyValueStore;
use crate::Result;

const DISPLAY_NAME_PREFIX: &str = "display_name:";

pub fn record_key(group_id: &str, user_id: &str, month: YearMonth) -> String {
    format!("{}:{}:{}", group_id, user_id, month)
}

pub fn display_name_key(user_id: &str) -> String {
    format!("{}{}", DISPLAY_NAME_PREFIX, user_id)
}

/// Identity of a stored attendance record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKey {
    pub group_id: String,
    pub user_id: String,
    pub month: YearMonth,
}

impl RecordKey {
    /// Parse a store key back into its parts. Display-name keys and anything
    /// else that does not end in a `YYYY-MM` segment yields `None`.
    pub fn parse(key: &str) -> Option<Self> {
        if key.starts_with(DISPLAY_NAME_PREFIX) {
            return None;
        }
        let (rest, month) = key.rsplit_once(':')?;
        let (group_id, user_id) = rest.rsplit_once(':')?;
        if group_id.is_empty() || user_id.is_empty() {
            return None;
        }
        let parsed: YearMonth = month.parse().ok()?;
        // Only the canonical zero-padded form is ever written
        if parsed.to_string() != month {
            return None;
        }
        Some(Self {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            month: parsed,
        })
    }
}

/// One member's attendance for one month in one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub group_id: String,
    pub user_id: String,
    pub month: YearMonth,
    pub days: DayMask,
}

impl AttendanceRecord {
    /// All-absent record sized for `month`.
    pub fn empty(group_id: &str, user_id: &str, month: YearMonth) -> Self {
        Self {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            month,
            days: DayMask::absent(month.days_in_month()),
        }
    }

    pub fn key(&self) -> String {
        record_key(&self.group_id, &self.user_id, self.month)
    }

    pub fn present_count(&self) -> usize {
        self.days.count_present()
    }
}

/// Result of a check-in or cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInOutcome {
    pub record: AttendanceRecord,
    pub present_count: usize,
}

pub struct Ledger<S> {
    store: Arc<S>,
}

impl<S: KeyValueStore> Ledger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Stored record, or `None` if the member has not checked in this month.
    pub async fn load(
        &self,
        group_id: &str,
        user_id: &str,
        month: YearMonth,
    ) -> Result<Option<AttendanceRecord>> {
        let key = record_key(group_id, user_id, month);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        let days = DayMask::decode(Some(&raw), month.days_in_month()).map_err(|e| e.at(&key))?;
        Ok(Some(AttendanceRecord {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            month,
            days,
        }))
    }

    /// Stored record or an all-absent default. The default is not written.
    pub async fn load_or_default(
        &self,
        group_id: &str,
        user_id: &str,
        month: YearMonth,
    ) -> Result<AttendanceRecord> {
        Ok(self
            .load(group_id, user_id, month)
            .await?
            .unwrap_or_else(|| AttendanceRecord::empty(group_id, user_id, month)))
    }

    /// Mark `day` of `month` present (or absent when `present` is false) and
    /// persist the record together with the member's display name.
    pub async fn check_in(
        &self,
        group_id: &str,
        user_id: &str,
        display_name: &str,
        month: YearMonth,
        day: u32,
        present: bool,
    ) -> Result<CheckInOutcome> {
        month.check_day(day)?;

        let mut record = self.load_or_default(group_id, user_id, month).await?;
        record.days.set(day as usize - 1, Mark::from(present));

        self.store
            .mset(&[
                (record.key(), record.days.encode()),
                (display_name_key(user_id), display_name.to_string()),
            ])
            .await?;

        let present_count = record.present_count();
        info!(
            group_id,
            user_id,
            month = %month,
            day,
            present,
            present_count,
            "Recorded attendance"
        );

        Ok(CheckInOutcome {
            record,
            present_count,
        })
    }

    pub async fn display_name(&self, user_id: &str) -> Result<Option<String>> {
        self.store.get(&display_name_key(user_id)).await
    }
}

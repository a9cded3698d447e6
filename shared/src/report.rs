//! Same-month aggregates over every stored attendance record.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::day_mask::DayMask;
use crate::ledger::{display_name_key, RecordKey};
use crate::month::YearMonth;
use crate::profile::UNKNOWN_DISPLAY_NAME;
use crate::store::KeyValueStore;
use crate::Result;

/// Today's check-ins for one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupTally {
    pub present_today: usize,
    pub members: usize,
}

impl GroupTally {
    pub fn ratio(&self) -> f64 {
        if self.members == 0 {
            0.0
        } else {
            self.present_today as f64 / self.members as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub user_id: String,
    pub display_name: String,
    #[serde(serialize_with = "serialize_mask")]
    pub days: DayMask,
}

fn serialize_mask<S: serde::Serializer>(days: &DayMask, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&days.encode())
}

/// Every member with a record for one group and month. Never empty; a group
/// with no records is reported as `None` by [`Reporter::table_for_group`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMonthTable {
    pub group_id: String,
    pub month: YearMonth,
    pub rows: Vec<TableRow>,
}

pub struct Reporter<S> {
    store: Arc<S>,
}

impl<S: KeyValueStore> Reporter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Read the records for `month` among keys starting with `prefix`.
    /// Unreadable records are logged and skipped.
    async fn records(&self, prefix: &str, month: YearMonth) -> Result<Vec<(RecordKey, DayMask)>> {
        let mut records = Vec::new();
        for key in self.store.scan(prefix).await? {
            let Some(parsed) = RecordKey::parse(&key) else {
                continue;
            };
            if parsed.month != month {
                continue;
            }
            let Some(raw) = self.store.get(&key).await? else {
                continue;
            };
            match DayMask::decode(Some(&raw), month.days_in_month()) {
                Ok(days) => records.push((parsed, days)),
                Err(e) => warn!(key = %key, "Skipping unreadable record: {}", e),
            }
        }
        Ok(records)
    }

    /// Per-group count of members present on `today` out of all members with
    /// a record this month.
    pub async fn summarize_all(&self, today: NaiveDate) -> Result<BTreeMap<String, GroupTally>> {
        let records = self.records("", YearMonth::of(today)).await?;
        Ok(tally(records, today.day()))
    }

    /// [`Reporter::summarize_all`] restricted to one group.
    pub async fn summarize_group(&self, group_id: &str, today: NaiveDate) -> Result<GroupTally> {
        let records = self
            .records(&format!("{}:", group_id), YearMonth::of(today))
            .await?
            .into_iter()
            .filter(|(key, _)| key.group_id == group_id)
            .collect();
        Ok(tally(records, today.day())
            .remove(group_id)
            .unwrap_or(GroupTally {
                present_today: 0,
                members: 0,
            }))
    }

    pub async fn table_for_group(
        &self,
        group_id: &str,
        month: YearMonth,
    ) -> Result<Option<GroupMonthTable>> {
        let mut rows = Vec::new();
        for (key, days) in self.records(&format!("{}:", group_id), month).await? {
            if key.group_id != group_id {
                continue;
            }
            let display_name = self
                .store
                .get(&display_name_key(&key.user_id))
                .await?
                .unwrap_or_else(|| UNKNOWN_DISPLAY_NAME.to_string());
            rows.push(TableRow {
                user_id: key.user_id,
                display_name,
                days,
            });
        }

        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(GroupMonthTable {
            group_id: group_id.to_string(),
            month,
            rows,
        }))
    }
}

fn tally(records: Vec<(RecordKey, DayMask)>, day: u32) -> BTreeMap<String, GroupTally> {
    let mut groups: BTreeMap<String, GroupTally> = BTreeMap::new();
    for (key, days) in records {
        let entry = groups.entry(key.group_id).or_insert(GroupTally {
            present_today: 0,
            members: 0,
        });
        entry.members += 1;
        if days.is_present(day) {
            entry.present_today += 1;
        }
    }
    groups
}

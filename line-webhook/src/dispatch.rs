//! Runs a parsed command against the ledger and builds the reply.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use shared::grid::{self, GridStyle};
use shared::{
    lookup_display_name, ChatSource, Error, HolidayCache, HolidaySource, KeyValueStore, Ledger,
    ProfileResolver, Reporter, Result, YearMonth, UNKNOWN_DISPLAY_NAME,
};
use tracing::info;

use crate::command::Command;
use crate::flex;

pub struct Services<S, H> {
    pub ledger: Ledger<S>,
    pub reporter: Reporter<S>,
    pub holidays: HolidayCache<H>,
    pub style: GridStyle,
}

impl<S: KeyValueStore, H: HolidaySource> Services<S, H> {
    pub fn new(store: Arc<S>, holidays: HolidayCache<H>) -> Self {
        Self {
            ledger: Ledger::new(Arc::clone(&store)),
            reporter: Reporter::new(store),
            holidays,
            style: GridStyle::default(),
        }
    }

    /// Reply messages for `command`. `Leave` is handled by the caller since
    /// it has no reply.
    pub async fn execute<P: ProfileResolver>(
        &self,
        command: Command,
        source: &ChatSource,
        today: NaiveDate,
        profiles: &P,
    ) -> Result<Vec<Value>> {
        match command {
            Command::CheckIn { day } => self.mark(source, today, day, true, profiles).await,
            Command::Cancel { day } => self.mark(source, today, day, false, profiles).await,
            Command::Report => self.report(source, today).await,
            Command::Leave => Ok(Vec::new()),
        }
    }

    async fn mark<P: ProfileResolver>(
        &self,
        source: &ChatSource,
        today: NaiveDate,
        day: Option<u32>,
        present: bool,
        profiles: &P,
    ) -> Result<Vec<Value>> {
        let month = YearMonth::of(today);
        let day = day.unwrap_or(today.day());
        month.check_day(day)?;

        let display_name = self.display_name(source, profiles).await?;
        let outcome = self
            .ledger
            .check_in(source.group_id(), source.user_id(), &display_name, month, day, present)
            .await?;

        let holidays = self.holidays.get_holidays(month).await;
        let calendar = grid::build(&outcome.record.days, month.first_weekday(), &holidays, &self.style)?;

        Ok(vec![flex::check_in_message(
            &display_name,
            outcome.present_count,
            &calendar,
        )])
    }

    /// Fresh profile name, else the last stored one. The placeholder is only
    /// used for members never resolved before.
    async fn display_name<P: ProfileResolver>(
        &self,
        source: &ChatSource,
        profiles: &P,
    ) -> Result<String> {
        if let Some(name) = lookup_display_name(profiles, source).await {
            return Ok(name);
        }
        Ok(self
            .ledger
            .display_name(source.user_id())
            .await?
            .unwrap_or_else(|| UNKNOWN_DISPLAY_NAME.to_string()))
    }

    async fn report(&self, source: &ChatSource, today: NaiveDate) -> Result<Vec<Value>> {
        let group_id = source.group_id();
        let tally = self.reporter.summarize_group(group_id, today).await?;
        let table = self
            .reporter
            .table_for_group(group_id, YearMonth::of(today))
            .await?;
        info!(group_id, members = tally.members, "Built group report");
        Ok(vec![flex::report_message(today, tally, table.as_ref())])
    }
}

/// User-facing text for a failed command.
pub fn failure_message(error: &Error) -> Value {
    let text = match error {
        Error::InvalidArgument(_) => "날짜를 확인해주세요. 예) #인증 12",
        _ => "기록하지 못했어요. 잠시 후 다시 시도해주세요.",
    };
    flex::text_message(text)
}

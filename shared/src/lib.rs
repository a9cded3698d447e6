//! Shared library for the attendance bot Lambda functions.
//!
//! Holds the attendance ledger, the calendar grid builder, the holiday cache
//! and the month aggregates, plus the configuration, secrets and storage
//! plumbing used by every function.

pub mod config;
pub mod day_mask;
pub mod db;
pub mod error;
pub mod grid;
pub mod holidays;
pub mod http;
pub mod ledger;
pub mod models;
pub mod month;
pub mod profile;
pub mod report;
pub mod secrets;
pub mod store;

pub use config::Config;
pub use day_mask::{DayMask, Mark};
pub use error::{Error, Result};
pub use grid::{CalendarGrid, Cell, GridStyle};
pub use holidays::{HolidayCache, HolidaySet, HolidaySource, HttpHolidaySource};
pub use ledger::{AttendanceRecord, CheckInOutcome, Ledger};
pub use month::YearMonth;
pub use profile::{lookup_display_name, ChatSource, ProfileResolver, UNKNOWN_DISPLAY_NAME};
pub use report::{GroupMonthTable, GroupTally, Reporter, TableRow};
pub use secrets::{get_database_credentials, get_line_credentials, get_secret, DatabaseCredentials, LineCredentials};
pub use store::{KeyValueStore, MemoryStore, PgStore};

//! Shared response payloads.

use serde::Serialize;

use crate::grid::CalendarGrid;
use crate::month::YearMonth;
use crate::report::GroupTally;

/// One group's line in the daily summary.
#[derive(Debug, Serialize)]
pub struct GroupSummary {
    pub group_id: String,
    pub present_today: usize,
    pub members: usize,
    pub ratio: f64,
}

impl GroupSummary {
    pub fn new(group_id: String, tally: GroupTally) -> Self {
        Self {
            group_id,
            present_today: tally.present_today,
            members: tally.members,
            ratio: tally.ratio(),
        }
    }
}

/// Daily summary across every group.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub date: String,
    pub groups: Vec<GroupSummary>,
}

/// A member's rendered month.
#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub group_id: String,
    pub user_id: String,
    pub display_name: String,
    pub month: YearMonth,
    pub present_count: usize,
    pub header: String,
    pub grid: CalendarGrid,
}

/// Header line shown above a calendar, e.g. `5회 달성!`.
pub fn count_text(present_count: usize) -> String {
    format!("{}회 달성!", present_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_summary_ratio() {
        let summary = GroupSummary::new(
            "A".to_string(),
            GroupTally {
                present_today: 1,
                members: 4,
            },
        );
        assert_eq!(summary.ratio, 0.25);
        assert_eq!(count_text(3), "3회 달성!");
    }
}

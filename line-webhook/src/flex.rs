//! Reply message rendering.

use chrono::NaiveDate;
use serde_json::{json, Value};
use shared::models::count_text;
use shared::{CalendarGrid, Cell, GroupMonthTable, GroupTally};

const CHECK_MARK: &str = "✅";

fn cell_component(cell: &Cell) -> Value {
    match cell {
        Cell::Filler => json!({ "type": "filler" }),
        Cell::Check => json!({
            "type": "text",
            "text": CHECK_MARK,
            "size": "sm",
            "align": "center",
            "flex": 1,
        }),
        Cell::DayLabel { day, color } => {
            let mut text = json!({
                "type": "text",
                "text": day.to_string(),
                "size": "sm",
                "align": "center",
                "flex": 1,
            });
            if let Some(color) = color {
                text["color"] = json!(color);
            }
            text
        }
    }
}

fn row_component(row: &[Cell]) -> Value {
    json!({
        "type": "box",
        "layout": "horizontal",
        "spacing": "sm",
        "contents": row.iter().map(cell_component).collect::<Vec<_>>(),
    })
}

/// Flex bubble with the member's name, running count and calendar.
pub fn check_in_message(display_name: &str, present_count: usize, grid: &CalendarGrid) -> Value {
    let header = count_text(present_count);
    json!({
        "type": "flex",
        "altText": header,
        "contents": {
            "type": "bubble",
            "header": {
                "type": "box",
                "layout": "vertical",
                "contents": [
                    { "type": "text", "text": display_name, "weight": "bold", "size": "md" },
                    { "type": "text", "text": header, "size": "xl", "weight": "bold" },
                ],
            },
            "body": {
                "type": "box",
                "layout": "vertical",
                "spacing": "md",
                "contents": grid.rows.iter().map(|row| row_component(row)).collect::<Vec<_>>(),
            },
        },
    })
}

pub fn text_message(text: impl Into<String>) -> Value {
    json!({ "type": "text", "text": text.into() })
}

/// Plain-text month table with today's ratio on top.
pub fn report_message(today: NaiveDate, tally: GroupTally, table: Option<&GroupMonthTable>) -> Value {
    let Some(table) = table else {
        return text_message(format!("{} 인증 기록이 없습니다.", today.format("%Y-%m")));
    };

    let mut lines = vec![
        format!("📊 {} 현황", table.month),
        format!(
            "오늘 인증 {}/{} ({:.0}%)",
            tally.present_today,
            tally.members,
            tally.ratio() * 100.0
        ),
    ];
    for row in &table.rows {
        lines.push(format!(
            "{} {}회 {}",
            row.display_name,
            row.days.count_present(),
            row.days.encode()
        ));
    }
    text_message(lines.join("\n"))
}

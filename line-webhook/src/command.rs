//! Chat commands recognised in message text.

const CHECK_IN: &str = "#인증";
const CANCEL: &str = "#인증취소";
const REPORT: &str = "#현황";
const LEAVE: &str = "@bye";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Mark a day present; `None` means today
    CheckIn { day: Option<u32> },
    /// Clear a day; `None` means today
    Cancel { day: Option<u32> },
    Report,
    Leave,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        if text.trim() == LEAVE {
            return Some(Command::Leave);
        }
        // CANCEL contains CHECK_IN, so it is matched first
        if let Some((_, rest)) = text.split_once(CANCEL) {
            return Some(Command::Cancel {
                day: day_argument(rest),
            });
        }
        if let Some((_, rest)) = text.split_once(CHECK_IN) {
            return Some(Command::CheckIn {
                day: day_argument(rest),
            });
        }
        if text.contains(REPORT) {
            return Some(Command::Report);
        }
        None
    }
}

/// Leading day number after a keyword, e.g. `" 12 done"` → `12`. Numbers
/// too large for `u32` saturate so they fail day validation later.
fn day_argument(rest: &str) -> Option<u32> {
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse().unwrap_or(u32::MAX))
}

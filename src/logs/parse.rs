use std::sync::LazyLock;

use regex::Regex;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// One parsed line of historical chat log text.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRecord {
    pub timestamp: OffsetDateTime,
    pub channel: String,
    /// Lowercase handle.
    pub username: String,
    /// The handle as it appeared in the log line.
    pub display_name: String,
    pub message: String,
}

// Format: "[2026-01-13 00:00:18] #zoil mrsmalvic: Hello world"
static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\] #(\w+) (\w+): (.+)$")
        .expect("log line regex")
});

static TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Parses one log line, or rejects it with `None`. Malformed lines never
/// error. The raw timestamp carries no zone; it is read as UTC by fiat.
pub fn parse_line(line: &str) -> Option<ChatRecord> {
    let caps = LINE_RE.captures(line)?;
    let naive = PrimitiveDateTime::parse(&caps[1], TIMESTAMP_FORMAT).ok()?;

    Some(ChatRecord {
        timestamp: naive.assume_utc(),
        channel: caps[2].to_owned(),
        username: caps[3].to_lowercase(),
        display_name: caps[3].to_owned(),
        message: caps[4].to_owned(),
    })
}

/// Parses a whole day's log text. Handles both `\n` and `\r\n`, skips blank
/// lines, drops lines that do not match the grammar, preserves input order.
/// Total: empty input yields an empty vec.
pub fn parse_log(text: &str) -> Vec<ChatRecord> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_line)
        .collect()
}

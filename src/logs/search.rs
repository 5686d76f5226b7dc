use futures_util::future::join_all;
use serde::Serialize;
use time::Date;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::bots::is_bot;
use crate::{AppError, AppResult, DEFAULT_COLOR, Persona};

use super::fetch::DayFetch;
use super::parse::{ChatRecord, parse_log};

/// Inclusive day-count ceiling for a range search.
pub const MAX_RANGE_DAYS: i64 = 365;

/// How many day-fetches may be in flight at once. Batches run to completion
/// before the next batch starts.
const BATCH_SIZE: usize = 10;

pub const DEFAULT_SEARCH_LIMIT: usize = 1000;
pub const DEFAULT_RECENT_LIMIT: usize = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub total: usize,
    pub returned: usize,
    pub days_searched: usize,
    pub records: Vec<RecordOut>,
}

#[derive(Debug, Serialize)]
pub struct RecordOut {
    pub id: String,
    pub message: String,
    pub sender: Persona,
    pub timestamp: String,
}

/// Enumerates every calendar day in `[from, to]`, validating the range
/// first. Fails before any fetch is attempted.
pub fn enumerate_days(from: Date, to: Date) -> AppResult<Vec<Date>> {
    let span = (to - from).whole_days() + 1;
    if span < 1 {
        return Err(AppError::Validation(
            "from date must be before to date".to_owned(),
        ));
    }
    if span > MAX_RANGE_DAYS {
        return Err(AppError::Validation(format!(
            "date range cannot exceed {MAX_RANGE_DAYS} days"
        )));
    }

    let mut days = Vec::with_capacity(span as usize);
    let mut day = from;
    while day <= to {
        days.push(day);
        let Some(next) = day.next_day() else { break };
        day = next;
    }
    Ok(days)
}

/// Fetches and parses every day in batches of [`BATCH_SIZE`]. A failed day
/// contributes nothing and does not count as searched; one day's failure
/// never cancels its siblings.
pub async fn fetch_days<F: DayFetch>(source: &F, days: &[Date]) -> (Vec<ChatRecord>, usize) {
    let mut records = Vec::new();
    let mut days_searched = 0;

    for batch in days.chunks(BATCH_SIZE) {
        let outcomes = join_all(batch.iter().map(|day| source.fetch_day(*day))).await;

        for (day, outcome) in batch.iter().zip(outcomes) {
            match outcome {
                Ok(text) => {
                    records.extend(parse_log(&text));
                    days_searched += 1;
                }
                Err(err) => debug!("no log data for {day}: {err}"),
            }
        }
    }

    (records, days_searched)
}

/// Filter order: exact username match, then message substring, then bot
/// exclusion; finally a stable sort newest-first.
pub fn filter_and_sort(
    mut records: Vec<ChatRecord>,
    query: Option<&str>,
    user: Option<&str>,
) -> Vec<ChatRecord> {
    if let Some(user) = user {
        let target = user.to_lowercase();
        records.retain(|r| r.username == target);
    }

    if let Some(query) = query {
        let needle = query.to_lowercase();
        records.retain(|r| r.message.to_lowercase().contains(&needle));
    }

    records.retain(|r| !is_bot(&r.username));

    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records
}

/// Truncates to `limit` and maps to the client shape. Historical records
/// carry no color or badge provenance, so senders get the placeholder color
/// and an empty badge set.
pub fn into_outcome(
    records: Vec<ChatRecord>,
    days_searched: usize,
    limit: usize,
) -> AppResult<SearchOutcome> {
    let total = records.len();

    let records = records
        .into_iter()
        .take(limit)
        .map(|r| {
            let timestamp = r.timestamp.format(&Rfc3339)?;
            Ok(RecordOut {
                id: format!("{}-{}", timestamp, r.username),
                message: r.message,
                sender: Persona {
                    name: r.display_name,
                    color: DEFAULT_COLOR.to_owned(),
                    badges: Default::default(),
                },
                timestamp,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(SearchOutcome {
        total,
        returned: records.len(),
        days_searched,
        records,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use time::macros::date;

    use super::*;

    struct FakeSource(HashMap<Date, String>);

    #[async_trait]
    impl DayFetch for FakeSource {
        async fn fetch_day(&self, date: Date) -> anyhow::Result<String> {
            self.0
                .get(&date)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("day not available"))
        }
    }

    fn line(ts: &str, user: &str, msg: &str) -> String {
        format!("[{ts}] #zoil {user}: {msg}\n")
    }

    #[test]
    fn enumerates_inclusive_range() {
        let days = enumerate_days(date!(2024 - 01 - 01), date!(2024 - 01 - 03)).unwrap();
        assert_eq!(
            days,
            vec![
                date!(2024 - 01 - 01),
                date!(2024 - 01 - 02),
                date!(2024 - 01 - 03)
            ]
        );

        let single = enumerate_days(date!(2024 - 02 - 29), date!(2024 - 02 - 29)).unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn rejects_inverted_range() {
        let err = enumerate_days(date!(2024 - 01 - 02), date!(2024 - 01 - 01)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_range_over_365_days() {
        // 368 inclusive days
        let err = enumerate_days(date!(2024 - 01 - 01), date!(2025 - 01 - 02)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // exactly 365 is fine
        assert!(enumerate_days(date!(2024 - 01 - 02), date!(2025 - 01 - 01)).is_ok());
    }

    #[tokio::test]
    async fn failed_day_contributes_nothing_and_is_not_counted() {
        let day_a = date!(2024 - 06 - 01);
        let day_b = date!(2024 - 06 - 02);

        let mut text = String::new();
        for i in 0..5 {
            text += &line(&format!("2024-06-01 10:00:0{i}"), "alice", "hello");
        }
        let source = FakeSource(HashMap::from([(day_a, text)]));

        let (records, days_searched) = fetch_days(&source, &[day_a, day_b]).await;
        assert_eq!(days_searched, 1);
        assert_eq!(records.len(), 5);
    }

    #[tokio::test]
    async fn all_days_failed_is_empty_not_an_error() {
        let source = FakeSource(HashMap::new());
        let days = enumerate_days(date!(2024 - 06 - 01), date!(2024 - 06 - 03)).unwrap();

        let (records, days_searched) = fetch_days(&source, &days).await;
        assert!(records.is_empty());
        assert_eq!(days_searched, 0);

        let outcome = into_outcome(records, days_searched, DEFAULT_SEARCH_LIMIT).unwrap();
        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.days_searched, 0);
    }

    #[test]
    fn filters_apply_in_order_and_bots_are_always_excluded() {
        let text = line("2024-06-01 10:00:00", "alice", "good morning chat")
            + &line("2024-06-01 10:00:01", "bob", "morning Alice")
            + &line("2024-06-01 10:00:02", "nightbot", "morning commands")
            + &line("2024-06-01 10:00:03", "alice", "unrelated");
        let records = parse_log(&text);

        let by_user = filter_and_sort(records.clone(), None, Some("ALICE"));
        assert_eq!(by_user.len(), 2);

        let by_query = filter_and_sort(records.clone(), Some("MORNING"), None);
        assert_eq!(by_query.len(), 2); // nightbot dropped despite matching

        let both = filter_and_sort(records, Some("morning"), Some("alice"));
        assert_eq!(both.len(), 1);
    }

    #[test]
    fn sorts_newest_first_with_stable_ties() {
        let text = line("2024-06-01 09:00:00", "alice", "first")
            + &line("2024-06-01 11:00:00", "bob", "tie-early")
            + &line("2024-06-01 11:00:00", "carol", "tie-late")
            + &line("2024-06-01 10:00:00", "dave", "middle");
        let sorted = filter_and_sort(parse_log(&text), None, None);

        let messages: Vec<&str> = sorted.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["tie-early", "tie-late", "middle", "first"]);
    }

    #[test]
    fn truncates_to_limit_and_maps_the_client_shape() {
        let text = line("2024-06-01 10:00:00", "Alice", "one")
            + &line("2024-06-01 10:00:01", "Alice", "two")
            + &line("2024-06-01 10:00:02", "Alice", "three");
        let records = filter_and_sort(parse_log(&text), None, None);

        let outcome = into_outcome(records, 1, 2).unwrap();
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.returned, 2);
        assert_eq!(outcome.days_searched, 1);

        let first = &outcome.records[0];
        assert_eq!(first.id, "2024-06-01T10:00:02Z-alice");
        assert_eq!(first.sender.name, "Alice");
        assert_eq!(first.sender.color, DEFAULT_COLOR);
        assert!(first.sender.badges.is_empty());
    }
}

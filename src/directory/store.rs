use std::collections::HashMap;

use sqlx::SqlitePool;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::AppResult;
use crate::bots::is_bot;

/// One row of the participant directory, keyed by the platform's stable
/// user id. The lowercase handle is derived from events, not authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub color: String,
    pub badges: HashMap<String, String>,
    pub last_seen: String,
    pub message_count: i64,
}

/// The mutable attributes applied on every sighting.
#[derive(Debug, Clone)]
pub struct ProfilePatch {
    pub username: String,
    pub display_name: String,
    pub color: String,
    pub badges: HashMap<String, String>,
    pub last_seen: OffsetDateTime,
}

const PROFILE_COLS: &str = "user_id,username,display_name,color,badges,last_seen,message_count";

type ProfileRow = (String, String, String, String, String, String, i64);

fn from_row(row: ProfileRow) -> AppResult<Profile> {
    let (user_id, username, display_name, color, badges, last_seen, message_count) = row;
    Ok(Profile {
        user_id,
        username,
        display_name,
        color,
        badges: serde_json::from_str(&badges)?,
        last_seen,
        message_count,
    })
}

/// Create-or-update with a message-count increment. The single upsert
/// statement is the serialization point: two concurrent first-sightings of
/// the same id collapse into one create and one update, never an error.
pub async fn upsert(pool: &SqlitePool, user_id: &str, patch: ProfilePatch) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO chatters (user_id,username,display_name,color,badges,last_seen,message_count)
         VALUES (?,?,?,?,?,?,1)
         ON CONFLICT(user_id) DO UPDATE SET
            username = excluded.username,
            display_name = excluded.display_name,
            color = excluded.color,
            badges = excluded.badges,
            last_seen = excluded.last_seen,
            message_count = chatters.message_count + 1",
    )
    .bind(user_id)
    .bind(&patch.username)
    .bind(&patch.display_name)
    .bind(&patch.color)
    .bind(serde_json::to_string(&patch.badges)?)
    .bind(patch.last_seen.format(&Rfc3339)?)
    .execute(pool)
    .await?;

    Ok(())
}

/// Random sample of profiles, excluding the given handles and bots. Order
/// unspecified, no duplicates; returns fewer than `count` only when the
/// eligible population is too small.
pub async fn sample_excluding(
    pool: &SqlitePool,
    excluded: &[String],
    count: usize,
) -> AppResult<Vec<Profile>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    // Each pass draws a fresh random page; the budget doubles until the
    // filtered sample fills or the table runs out.
    let mut budget = count + excluded.len();
    loop {
        let rows: Vec<ProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLS} FROM chatters ORDER BY RANDOM() LIMIT ?"
        ))
        .bind(budget as i64)
        .fetch_all(pool)
        .await?;
        let exhausted = rows.len() < budget;

        let mut profiles = Vec::with_capacity(count);
        for row in rows {
            let profile = from_row(row)?;
            if excluded.contains(&profile.username) || is_bot(&profile.username) {
                continue;
            }
            profiles.push(profile);
            if profiles.len() == count {
                return Ok(profiles);
            }
        }

        if exhausted {
            return Ok(profiles);
        }
        budget *= 2;
    }
}

/// Case-insensitive substring match on the handle. Queries shorter than two
/// characters match nothing by contract.
pub async fn search_handles(
    pool: &SqlitePool,
    query: &str,
    excluded: &[String],
    limit: usize,
) -> AppResult<Vec<Profile>> {
    if query.len() < 2 {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", escape_like(query));

    // Over-fetch past rows the post-filter will drop, widening until the
    // result fills or the matches run out.
    let mut budget = limit + excluded.len();
    loop {
        let rows: Vec<ProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLS} FROM chatters WHERE username LIKE ? ESCAPE '\\'
             ORDER BY username LIMIT ?"
        ))
        .bind(&pattern)
        .bind(budget as i64)
        .fetch_all(pool)
        .await?;
        let exhausted = rows.len() < budget;

        let mut profiles = Vec::with_capacity(limit);
        for row in rows {
            let profile = from_row(row)?;
            if excluded.contains(&profile.username) || is_bot(&profile.username) {
                continue;
            }
            profiles.push(profile);
            if profiles.len() == limit {
                return Ok(profiles);
            }
        }

        if exhausted {
            return Ok(profiles);
        }
        budget *= 2;
    }
}

pub async fn find_by_handle(pool: &SqlitePool, handle: &str) -> AppResult<Option<Profile>> {
    let row: Option<ProfileRow> = sqlx::query_as(&format!(
        "SELECT {PROFILE_COLS} FROM chatters WHERE username = ?"
    ))
    .bind(handle.to_lowercase())
    .fetch_optional(pool)
    .await?;

    row.map(from_row).transpose()
}

pub async fn count(pool: &SqlitePool) -> AppResult<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chatters")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

use sqlx::SqlitePool;

/// Creates the schema if it is missing. Badge sets and question lists live
/// in JSON text columns; everything that needs an index gets its own column.
pub async fn init(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS chatters (
            user_id       TEXT PRIMARY KEY,
            username      TEXT NOT NULL,
            display_name  TEXT NOT NULL,
            color         TEXT NOT NULL,
            badges        TEXT NOT NULL,
            last_seen     TEXT NOT NULL,
            message_count INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chatters_username ON chatters (username)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chatters_last_seen ON chatters (last_seen)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS quizzes (
            uuid        TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT,
            emote_url   TEXT,
            questions   TEXT NOT NULL,
            is_active   INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_quizzes_active ON quizzes (is_active)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS feedback (
            id           INTEGER PRIMARY KEY CHECK (id = 1),
            likes        INTEGER NOT NULL DEFAULT 0,
            dislikes     INTEGER NOT NULL DEFAULT 0,
            last_updated TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

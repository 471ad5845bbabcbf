use chrono::NaiveDateTime;
use sqlx::{FromRow, SqlitePool};
use tracing::warn;

use crate::error::AppError;
use crate::models::{NewReminder, Reminder, format_remind_at, parse_remind_at};

#[derive(Debug, FromRow)]
struct ReminderRow {
    id: i64,
    chat_id: String,
    text: String,
    remind_at: String,
    repeat: String,
    done: bool,
    sent: bool,
}

impl TryFrom<ReminderRow> for Reminder {
    type Error = AppError;

    fn try_from(row: ReminderRow) -> Result<Self, Self::Error> {
        Ok(Reminder {
            id: row.id,
            text: row.text,
            remind_at: parse_remind_at(&row.remind_at)?,
            repeat: row.repeat.parse()?,
            done: row.done,
            sent: row.sent,
        })
    }
}

/// A reminder picked up by the delivery pass, with the mailbox it goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub chat_id: String,
    pub reminder: Reminder,
}

const SELECT_COLUMNS: &str = "SELECT id, chat_id, text, remind_at, repeat, done, sent FROM reminders";

pub async fn fetch_reminders(db: &SqlitePool, chat_id: &str) -> Result<Vec<Reminder>, AppError> {
    let rows = sqlx::query_as::<_, ReminderRow>(&format!(
        "{} WHERE chat_id = ? ORDER BY remind_at ASC, id ASC",
        SELECT_COLUMNS
    ))
    .bind(chat_id)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().filter_map(decode_row).collect())
}

/// Rows that no longer decode are logged and left out rather than failing the list.
fn decode_row(row: ReminderRow) -> Option<Reminder> {
    let id = row.id;
    match Reminder::try_from(row) {
        Ok(reminder) => Some(reminder),
        Err(e) => {
            warn!("Skipping undecodable reminder row {}: {}", id, e);
            None
        }
    }
}

pub async fn find_reminder(db: &SqlitePool, chat_id: &str, id: i64) -> Result<Option<Reminder>, AppError> {
    let row = sqlx::query_as::<_, ReminderRow>(&format!("{} WHERE id = ? AND chat_id = ?", SELECT_COLUMNS))
        .bind(id)
        .bind(chat_id)
        .fetch_optional(db)
        .await?;

    row.map(Reminder::try_from).transpose()
}

pub async fn insert_reminder(db: &SqlitePool, chat_id: &str, req: &NewReminder) -> Result<i64, AppError> {
    let id = sqlx::query(
        r#"
        INSERT INTO reminders (chat_id, text, remind_at, repeat, done, sent)
        VALUES (?1, ?2, ?3, ?4, 0, 0)
        "#,
    )
    .bind(chat_id)
    .bind(req.text.trim())
    .bind(format_remind_at(&req.remind_at))
    .bind(req.repeat.as_str())
    .execute(db)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn set_done(db: &SqlitePool, chat_id: &str, id: i64, done: bool) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE reminders SET done = ?1 WHERE id = ?2 AND chat_id = ?3")
        .bind(done)
        .bind(id)
        .bind(chat_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn delete_reminder(db: &SqlitePool, chat_id: &str, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM reminders WHERE id = ?1 AND chat_id = ?2")
        .bind(id)
        .bind(chat_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

/// Open, unsent reminders whose due moment is at or before `now`, oldest first.
pub async fn fetch_due(db: &SqlitePool, now: NaiveDateTime, limit: i64) -> Result<Vec<DueReminder>, AppError> {
    let rows = sqlx::query_as::<_, ReminderRow>(&format!(
        "{} WHERE sent = 0 AND done = 0 AND remind_at <= ? ORDER BY remind_at ASC, id ASC LIMIT ?",
        SELECT_COLUMNS
    ))
    .bind(format_remind_at(&now))
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let chat_id = row.chat_id.clone();
            decode_row(row).map(|reminder| DueReminder { chat_id, reminder })
        })
        .collect())
}

pub async fn mark_sent(db: &SqlitePool, id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE reminders SET sent = 1 WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Moves a recurring reminder to its next due moment and re-arms it.
pub async fn reschedule(db: &SqlitePool, id: i64, next: NaiveDateTime) -> Result<(), AppError> {
    sqlx::query("UPDATE reminders SET remind_at = ?1, sent = 0 WHERE id = ?2")
        .bind(format_remind_at(&next))
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::models::Repeat;

    fn new_reminder(text: &str, remind_at: &str, repeat: Repeat) -> NewReminder {
        NewReminder {
            text: text.to_string(),
            remind_at: parse_remind_at(remind_at).unwrap(),
            repeat,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_in_due_order() {
        let pool = connect_in_memory().await.expect("Failed to create test db");

        insert_reminder(&pool, "42", &new_reminder("Send report", "2026-02-21T18:00:00", Repeat::Weekly))
            .await
            .unwrap();
        insert_reminder(&pool, "42", &new_reminder("Drink water", "2026-02-21T09:00:00", Repeat::Daily))
            .await
            .unwrap();
        insert_reminder(&pool, "7", &new_reminder("Other mailbox", "2026-02-20T09:00:00", Repeat::Once))
            .await
            .unwrap();

        let reminders = fetch_reminders(&pool, "42").await.unwrap();
        let texts: Vec<&str> = reminders.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Drink water", "Send report"]);
        assert!(reminders.iter().all(|r| !r.done && !r.sent));
    }

    #[tokio::test]
    async fn test_set_done_is_scoped_by_mailbox() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let id = insert_reminder(&pool, "42", &new_reminder("Call Ivan", "2026-02-22T10:00:00", Repeat::Once))
            .await
            .unwrap();

        assert!(!set_done(&pool, "7", id, true).await.unwrap());
        assert!(set_done(&pool, "42", id, true).await.unwrap());

        let reminder = find_reminder(&pool, "42", id).await.unwrap().expect("reminder exists");
        assert!(reminder.done);
    }

    #[tokio::test]
    async fn test_delete_reports_whether_a_row_went_away() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let id = insert_reminder(&pool, "42", &new_reminder("Call Ivan", "2026-02-22T10:00:00", Repeat::Once))
            .await
            .unwrap();

        assert!(delete_reminder(&pool, "42", id).await.unwrap());
        assert!(!delete_reminder(&pool, "42", id).await.unwrap());
        assert!(fetch_reminders(&pool, "42").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_due_skips_done_sent_and_future() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let due = insert_reminder(&pool, "42", &new_reminder("Due", "2026-02-21T09:00:00", Repeat::Daily))
            .await
            .unwrap();
        let done = insert_reminder(&pool, "42", &new_reminder("Done", "2026-02-21T08:00:00", Repeat::Once))
            .await
            .unwrap();
        let sent = insert_reminder(&pool, "42", &new_reminder("Sent", "2026-02-21T07:00:00", Repeat::Once))
            .await
            .unwrap();
        insert_reminder(&pool, "42", &new_reminder("Future", "2026-02-21T09:00:01", Repeat::Once))
            .await
            .unwrap();
        set_done(&pool, "42", done, true).await.unwrap();
        mark_sent(&pool, sent).await.unwrap();

        let now = parse_remind_at("2026-02-21T09:00:00").unwrap();
        let picked = fetch_due(&pool, now, 50).await.unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].reminder.id, due);
        assert_eq!(picked[0].chat_id, "42");
    }

    #[tokio::test]
    async fn test_reschedule_rearms() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let id = insert_reminder(&pool, "42", &new_reminder("Drink water", "2026-02-21T09:00:00", Repeat::Daily))
            .await
            .unwrap();
        mark_sent(&pool, id).await.unwrap();

        let next = parse_remind_at("2026-02-22T09:00:00").unwrap();
        reschedule(&pool, id, next).await.unwrap();

        let reminder = find_reminder(&pool, "42", id).await.unwrap().expect("reminder exists");
        assert_eq!(reminder.remind_at, next);
        assert!(!reminder.sent);
    }

    #[tokio::test]
    async fn test_undecodable_rows_are_skipped() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        insert_reminder(&pool, "42", &new_reminder("Call Ivan", "2026-02-22T10:00:00", Repeat::Once))
            .await
            .unwrap();
        sqlx::query("INSERT INTO reminders (chat_id, text, remind_at, repeat) VALUES ('42', 'Broken', '2026-02-30T09:00:00', 'once')")
            .execute(&pool)
            .await
            .unwrap();

        let reminders = fetch_reminders(&pool, "42").await.unwrap();
        let texts: Vec<&str> = reminders.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Call Ivan"]);

        let due = fetch_due(&pool, parse_remind_at("2026-03-01T00:00:00").unwrap(), 50).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].reminder.text, "Call Ivan");
    }
}

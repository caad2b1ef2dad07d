use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::models::{Participants, StoredMessage, millis_to_datetime};

use super::ChatRepository;

fn row_to_message(r: SqliteRow) -> StoredMessage {
    StoredMessage {
        id: r.get("id"),
        uuid: r.get("uuid"),
        sender: r.get("sender"),
        participants: Participants {
            from: r.get("from_user"),
            to: r.get("to_user"),
        },
        body: r.get("body"),
        image: r.get("image"),
        created_at: millis_to_datetime(r.get("created_at")),
        updated_at: millis_to_datetime(r.get("updated_at")),
    }
}

impl ChatRepository {
    /// Append a message to the history of `participants`.
    ///
    /// The sender must be one of the two participants, and the participants
    /// must be distinct users.
    pub async fn append_message(
        &self,
        sender: &str,
        participants: &Participants,
        body: Option<&str>,
        image: Option<&str>,
    ) -> Result<StoredMessage> {
        anyhow::ensure!(
            participants.from != participants.to,
            "a conversation needs two distinct participants"
        );
        anyhow::ensure!(
            participants.contains(sender),
            "sender {sender} is not a participant"
        );

        let uuid = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().timestamp_millis();

        let result = sqlx::query(
            r#"
            INSERT INTO messages (uuid, from_user, to_user, sender, body, image, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&uuid)
        .bind(&participants.from)
        .bind(&participants.to)
        .bind(sender)
        .bind(body)
        .bind(image)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert message")?;

        Ok(StoredMessage {
            id: result.last_insert_rowid(),
            uuid,
            sender: sender.to_string(),
            participants: participants.clone(),
            body: body.map(str::to_string),
            image: image.map(str::to_string),
            created_at: millis_to_datetime(now),
            updated_at: millis_to_datetime(now),
        })
    }

    /// Full history between two users in either direction, oldest first.
    pub async fn get_conversation_history(&self, a: &str, b: &str) -> Result<Vec<StoredMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT id, uuid, from_user, to_user, sender, body, image, created_at, updated_at
            FROM messages
            WHERE (from_user = ? AND to_user = ?) OR (from_user = ? AND to_user = ?)
            ORDER BY updated_at ASC, id ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_message).collect())
    }

    pub async fn count_messages(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

use async_trait::async_trait;
use chrono::Utc;
use rg_core::error::{AppError, Result};
use rg_core::models::{Message, NewMessage};
use rg_core::traits::MessageRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::{db_err, SqliteRepo};

const MESSAGE_COLUMNS: &str = "id, body, sender_id, receiver_id, created_at";

fn message_from_row(row: &SqliteRow) -> sqlx::Result<Message> {
    Ok(Message {
        id: row.try_get("id")?,
        body: row.try_get("body")?,
        sender_id: row.try_get("sender_id")?,
        receiver_id: row.try_get("receiver_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl MessageRepo for SqliteRepo {
    async fn create_message(&self, message: NewMessage) -> Result<Message> {
        let row = sqlx::query(&format!(
            "INSERT INTO messages (body, sender_id, receiver_id, created_at) VALUES (?, ?, ?, ?) \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(&message.body)
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        message_from_row(&row).map_err(db_err)
    }

    async fn get_message(&self, id: i64) -> Result<Option<Message>> {
        let row = sqlx::query(&format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| message_from_row(&r)).transpose().map_err(db_err)
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE sender_id = ? OR receiver_id = ? ORDER BY id"
        ))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter()
            .map(message_from_row)
            .collect::<sqlx::Result<_>>()
            .map_err(db_err)
    }

    async fn delete_message(&self, id: i64) -> Result<()> {
        let done = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("Message", id));
        }
        Ok(())
    }
}

use async_trait::async_trait;
use chrono::Utc;
use rg_core::error::{AppError, Result};
use rg_core::models::{Comment, NewComment, Page};
use rg_core::traits::CommentRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::{db_err, SqliteRepo};

const COMMENT_COLUMNS: &str = "id, content, user_id, image_id, created_at, updated_at";

fn comment_from_row(row: &SqliteRow) -> sqlx::Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        user_id: row.try_get("user_id")?,
        image_id: row.try_get("image_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn comments_from_rows(rows: Vec<SqliteRow>) -> Result<Vec<Comment>> {
    rows.iter()
        .map(comment_from_row)
        .collect::<sqlx::Result<_>>()
        .map_err(db_err)
}

#[async_trait]
impl CommentRepo for SqliteRepo {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO comments (content, user_id, image_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(&comment.content)
        .bind(comment.user_id)
        .bind(comment.image_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        comment_from_row(&row).map_err(db_err)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| comment_from_row(&r)).transpose().map_err(db_err)
    }

    async fn list_for_image(&self, image_id: i64, page: Page) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE image_id = ? ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(image_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        comments_from_rows(rows)
    }

    async fn list_by_author_on_image(&self, image_id: i64, user_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE image_id = ? AND user_id = ? ORDER BY id"
        ))
        .bind(image_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        comments_from_rows(rows)
    }

    async fn update_content(&self, id: i64, content: &str) -> Result<Comment> {
        let row = sqlx::query(&format!(
            "UPDATE comments SET content = ?, updated_at = ? WHERE id = ? RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(content)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::not_found("Comment", id))?;
        comment_from_row(&row).map_err(db_err)
    }

    async fn delete_comment(&self, id: i64) -> Result<()> {
        let done = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("Comment", id));
        }
        Ok(())
    }
}

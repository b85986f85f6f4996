use async_trait::async_trait;
use rg_core::error::{AppError, Result};
use rg_core::models::{Page, Tag};
use rg_core::traits::TagRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::{db_err, SqliteRepo};

pub(crate) fn tag_from_row(row: &SqliteRow) -> sqlx::Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}

#[async_trait]
impl TagRepo for SqliteRepo {
    async fn create_tag(&self, name: &str) -> Result<Tag> {
        let row = sqlx::query("INSERT INTO tags (name) VALUES (?) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match db_err(e) {
                AppError::Conflict(_) => AppError::Conflict(format!("tag '{name}' already exists")),
                other => other,
            })?;
        tag_from_row(&row).map_err(db_err)
    }

    async fn ensure_tags(&self, names: Vec<String>) -> Result<Vec<Tag>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut tags = Vec::with_capacity(names.len());
        for name in &names {
            sqlx::query("INSERT INTO tags (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
                .bind(name)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            let row = sqlx::query("SELECT id, name FROM tags WHERE name = ?")
                .bind(name)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err)?;
            tags.push(tag_from_row(&row).map_err(db_err)?);
        }
        tx.commit().await.map_err(db_err)?;
        Ok(tags)
    }

    async fn get_tag(&self, id: i64) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| tag_from_row(&r)).transpose().map_err(db_err)
    }

    async fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| tag_from_row(&r)).transpose().map_err(db_err)
    }

    async fn list_tags(&self, page: Page) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name FROM tags ORDER BY id LIMIT ? OFFSET ?")
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(tag_from_row)
            .collect::<sqlx::Result<_>>()
            .map_err(db_err)
    }

    async fn rename_tag(&self, id: i64, name: &str) -> Result<Tag> {
        let row = sqlx::query("UPDATE tags SET name = ? WHERE id = ? RETURNING id, name")
            .bind(name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::not_found("Tag", id))?;
        tag_from_row(&row).map_err(db_err)
    }

    async fn delete_tag(&self, id: i64) -> Result<()> {
        let done = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("Tag", id));
        }
        Ok(())
    }
}

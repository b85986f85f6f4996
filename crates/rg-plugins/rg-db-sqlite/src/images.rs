use async_trait::async_trait;
use chrono::Utc;
use rg_core::error::{AppError, Result};
use rg_core::models::{Image, NewImage, SortField, Tag};
use rg_core::traits::ImageRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};

use crate::tags::tag_from_row;
use crate::{db_err, SqliteRepo};

const IMAGE_COLUMNS: &str =
    "i.id, i.url, i.public_name, i.public_id, i.description, i.user_id, i.created_at, i.updated_at";

fn image_from_row(row: &SqliteRow, tags: Vec<Tag>) -> sqlx::Result<Image> {
    Ok(Image {
        id: row.try_get("id")?,
        url: row.try_get("url")?,
        public_name: row.try_get("public_name")?,
        public_id: row.try_get("public_id")?,
        description: row.try_get("description")?,
        user_id: row.try_get("user_id")?,
        tags,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_by(sort: SortField) -> &'static str {
    match sort {
        SortField::Date => "i.created_at, i.id",
        SortField::Id => "i.id",
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn like_pattern(words: &str) -> String {
    let escaped = words
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Links `image_id` to each named tag. Names missing from `tags` are skipped.
async fn link_tags(tx: &mut Transaction<'_, Sqlite>, image_id: i64, names: &[String]) -> Result<()> {
    for name in names {
        sqlx::query(
            "INSERT OR IGNORE INTO image_tags (image_id, tag_id) SELECT ?, id FROM tags WHERE name = ?",
        )
        .bind(image_id)
        .bind(name)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

impl SqliteRepo {
    async fn tags_of(&self, image_id: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT t.id, t.name FROM tags t JOIN image_tags it ON it.tag_id = t.id \
             WHERE it.image_id = ? ORDER BY t.id",
        )
        .bind(image_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter()
            .map(tag_from_row)
            .collect::<sqlx::Result<_>>()
            .map_err(db_err)
    }

    /// Attaches tags to each fetched image row.
    async fn hydrate(&self, rows: Vec<SqliteRow>) -> Result<Vec<Image>> {
        let mut images = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(db_err)?;
            let tags = self.tags_of(id).await?;
            images.push(image_from_row(&row, tags).map_err(db_err)?);
        }
        Ok(images)
    }

    async fn existing_image(&self, id: i64) -> Result<Image> {
        self.get_image(id)
            .await?
            .ok_or_else(|| AppError::not_found("Image", id))
    }
}

#[async_trait]
impl ImageRepo for SqliteRepo {
    /// Inserts the image row and its tag links in one transaction.
    async fn create_image(&self, image: NewImage) -> Result<Image> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let id: i64 = sqlx::query(
            "INSERT INTO images (url, public_name, public_id, description, user_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&image.url)
        .bind(&image.public_name)
        .bind(&image.public_id)
        .bind(&image.description)
        .bind(image.user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?
        .try_get("id")
        .map_err(db_err)?;

        link_tags(&mut tx, id, &image.tags).await?;
        tx.commit().await.map_err(db_err)?;

        self.existing_image(id).await
    }

    async fn get_image(&self, id: i64) -> Result<Option<Image>> {
        let row = sqlx::query(&format!("SELECT {IMAGE_COLUMNS} FROM images i WHERE i.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(self.hydrate(row.into_iter().collect()).await?.pop())
    }

    async fn list_images(&self) -> Result<Vec<Image>> {
        let rows = sqlx::query(&format!("SELECT {IMAGE_COLUMNS} FROM images i ORDER BY i.id"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        self.hydrate(rows).await
    }

    async fn public_name_exists(&self, public_name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM images WHERE public_name = ?) AS taken")
            .bind(public_name)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get("taken").map_err(db_err)
    }

    async fn update_description(&self, id: i64, description: Option<String>) -> Result<Image> {
        let done = sqlx::query("UPDATE images SET description = ?, updated_at = ? WHERE id = ?")
            .bind(description)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("Image", id));
        }
        self.existing_image(id).await
    }

    async fn replace_tags(&self, id: i64, tags: Vec<String>) -> Result<Image> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let done = sqlx::query("UPDATE images SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("Image", id));
        }
        sqlx::query("DELETE FROM image_tags WHERE image_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        link_tags(&mut tx, id, &tags).await?;
        tx.commit().await.map_err(db_err)?;

        self.existing_image(id).await
    }

    async fn delete_image(&self, id: i64) -> Result<()> {
        let done = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("Image", id));
        }
        Ok(())
    }

    async fn count_by_owner(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM images WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get("n").map_err(db_err)
    }

    async fn find_by_tag(&self, tag: &str, sort: SortField) -> Result<Vec<Image>> {
        let rows = sqlx::query(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images i \
             JOIN image_tags it ON it.image_id = i.id \
             JOIN tags t ON t.id = it.tag_id \
             WHERE t.name = ? ORDER BY {}",
            order_by(sort)
        ))
        .bind(tag)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        self.hydrate(rows).await
    }

    async fn find_by_keywords(&self, words: &str, sort: SortField) -> Result<Vec<Image>> {
        let rows = sqlx::query(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images i \
             WHERE i.description LIKE ? ESCAPE '\\' ORDER BY {}",
            order_by(sort)
        ))
        .bind(like_pattern(words))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        self.hydrate(rows).await
    }
}

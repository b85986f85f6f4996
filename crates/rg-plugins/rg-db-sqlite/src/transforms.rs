use async_trait::async_trait;
use chrono::Utc;
use rg_core::error::{AppError, Result};
use rg_core::models::{ImageTransform, NewImageTransform, TransformSettings};
use rg_core::traits::TransformRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::{db_err, decode_err, SqliteRepo};

const TRANSFORM_COLUMNS: &str =
    "id, image_id, user_id, settings, secure_url, transformed_url, qrcode_url, created_at";

fn transform_from_row(row: &SqliteRow) -> sqlx::Result<ImageTransform> {
    let settings: String = row.try_get("settings")?;
    let settings: TransformSettings = serde_json::from_str(&settings).map_err(decode_err)?;
    Ok(ImageTransform {
        id: row.try_get("id")?,
        image_id: row.try_get("image_id")?,
        user_id: row.try_get("user_id")?,
        settings,
        secure_url: row.try_get("secure_url")?,
        transformed_url: row.try_get("transformed_url")?,
        qrcode_url: row.try_get("qrcode_url")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl TransformRepo for SqliteRepo {
    async fn create_transform(&self, transform: NewImageTransform) -> Result<ImageTransform> {
        let settings = serde_json::to_string(&transform.settings)
            .map_err(|e| AppError::Internal(format!("cannot encode settings: {e}")))?;
        let row = sqlx::query(&format!(
            "INSERT INTO image_transforms \
             (image_id, user_id, settings, secure_url, transformed_url, qrcode_url, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {TRANSFORM_COLUMNS}"
        ))
        .bind(transform.image_id)
        .bind(transform.user_id)
        .bind(settings)
        .bind(&transform.secure_url)
        .bind(&transform.transformed_url)
        .bind(&transform.qrcode_url)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        transform_from_row(&row).map_err(db_err)
    }

    async fn get_transform(&self, id: i64) -> Result<Option<ImageTransform>> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSFORM_COLUMNS} FROM image_transforms WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(|r| transform_from_row(&r)).transpose().map_err(db_err)
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ImageTransform>> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSFORM_COLUMNS} FROM image_transforms WHERE user_id = ? ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter()
            .map(transform_from_row)
            .collect::<sqlx::Result<_>>()
            .map_err(db_err)
    }
}

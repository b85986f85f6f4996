use async_trait::async_trait;
use chrono::Utc;
use rg_core::error::{AppError, Result};
use rg_core::models::{NewRating, Rating, Stars};
use rg_core::traits::RatingRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::{db_err, decode_err, SqliteRepo};

const RATING_COLUMNS: &str = "id, stars, user_id, image_id, created_at";

fn stars_from_column(row: &SqliteRow) -> sqlx::Result<Stars> {
    let raw: i64 = row.try_get("stars")?;
    let value = u8::try_from(raw).map_err(decode_err)?;
    Stars::try_from(value).map_err(decode_err)
}

fn rating_from_row(row: &SqliteRow) -> sqlx::Result<Rating> {
    Ok(Rating {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        image_id: row.try_get("image_id")?,
        stars: stars_from_column(row)?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl RatingRepo for SqliteRepo {
    async fn create_rating(&self, rating: NewRating) -> Result<Rating> {
        let row = sqlx::query(&format!(
            "INSERT INTO ratings (stars, user_id, image_id, created_at) VALUES (?, ?, ?, ?) \
             RETURNING {RATING_COLUMNS}"
        ))
        .bind(i64::from(rating.stars.value()))
        .bind(rating.user_id)
        .bind(rating.image_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        rating_from_row(&row).map_err(db_err)
    }

    async fn get_rating(&self, id: i64) -> Result<Option<Rating>> {
        let row = sqlx::query(&format!("SELECT {RATING_COLUMNS} FROM ratings WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| rating_from_row(&r)).transpose().map_err(db_err)
    }

    async fn find_rating(&self, image_id: i64, user_id: i64) -> Result<Option<Rating>> {
        let row = sqlx::query(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE image_id = ? AND user_id = ?"
        ))
        .bind(image_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(|r| rating_from_row(&r)).transpose().map_err(db_err)
    }

    async fn update_stars(&self, id: i64, stars: Stars) -> Result<Rating> {
        let row = sqlx::query(&format!(
            "UPDATE ratings SET stars = ? WHERE id = ? RETURNING {RATING_COLUMNS}"
        ))
        .bind(i64::from(stars.value()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::not_found("Rating", id))?;
        rating_from_row(&row).map_err(db_err)
    }

    async fn delete_rating(&self, id: i64) -> Result<()> {
        let done = sqlx::query("DELETE FROM ratings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("Rating", id));
        }
        Ok(())
    }

    async fn stars_for_image(&self, image_id: i64) -> Result<Vec<Stars>> {
        let rows = sqlx::query("SELECT stars FROM ratings WHERE image_id = ?")
            .bind(image_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(stars_from_column)
            .collect::<sqlx::Result<_>>()
            .map_err(db_err)
    }
}

use async_trait::async_trait;
use chrono::Utc;
use rg_core::error::{AppError, Result};
use rg_core::models::{NewUser, Role, User};
use rg_core::traits::UserRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::{db_err, decode_err, SqliteRepo};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, avatar, refresh_token, confirmed, role, access, created_at";

fn user_from_row(row: &SqliteRow) -> sqlx::Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        avatar: row.try_get("avatar")?,
        refresh_token: row.try_get("refresh_token")?,
        confirmed: row.try_get("confirmed")?,
        role: role.parse::<Role>().map_err(decode_err)?,
        access: row.try_get("access")?,
        created_at: row.try_get("created_at")?,
    })
}

impl SqliteRepo {
    async fn user_where(&self, clause: &str, value: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE {clause} = ?"))
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| user_from_row(&r)).transpose().map_err(db_err)
    }
}

/// Result of a single-row `UPDATE ... RETURNING` against `users`.
fn updated_user(row: Option<SqliteRow>, id: i64) -> Result<User> {
    let row = row.ok_or_else(|| AppError::not_found("User", id))?;
    user_from_row(&row).map_err(db_err)
}

#[async_trait]
impl UserRepo for SqliteRepo {
    /// The very first account bootstraps the instance as its admin.
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (username, email, password_hash, avatar, role, created_at) \
             VALUES (?, ?, ?, ?, CASE WHEN EXISTS (SELECT 1 FROM users) THEN 'user' ELSE 'admin' END, ?) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        user_from_row(&row).map_err(db_err)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| user_from_row(&r)).transpose().map_err(db_err)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_where("email", email).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_where("username", username).await
    }

    async fn update_refresh_token(&self, id: i64, token: Option<String>) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = ? WHERE id = ?")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn confirm_email(&self, id: i64) -> Result<()> {
        let done = sqlx::query("UPDATE users SET confirmed = TRUE WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found("User", id));
        }
        Ok(())
    }

    async fn update_username(&self, id: i64, username: &str) -> Result<User> {
        let row = sqlx::query(&format!(
            "UPDATE users SET username = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        updated_user(row, id)
    }

    async fn update_avatar(&self, id: i64, url: &str) -> Result<User> {
        let row = sqlx::query(&format!(
            "UPDATE users SET avatar = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        updated_user(row, id)
    }

    async fn set_role(&self, id: i64, role: Role) -> Result<User> {
        let row = sqlx::query(&format!(
            "UPDATE users SET role = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(role.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        updated_user(row, id)
    }

    async fn set_access(&self, id: i64, access: bool) -> Result<User> {
        let row = sqlx::query(&format!(
            "UPDATE users SET access = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(access)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        updated_user(row, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{repo, seed_user};

    #[tokio::test]
    async fn first_account_is_admin() {
        let repo = repo().await;
        let first = seed_user(&repo, "alice").await;
        let second = seed_user(&repo, "bob").await;
        assert_eq!(first.role, Role::Admin);
        assert_eq!(second.role, Role::User);
        assert!(!second.confirmed);
        assert!(second.access);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let repo = repo().await;
        seed_user(&repo, "alice").await;
        let err = repo
            .create_user(NewUser {
                username: "alice2".into(),
                email: "alice@example.com".into(),
                password_hash: "x".into(),
                avatar: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn lookups_and_updates() {
        let repo = repo().await;
        let alice = seed_user(&repo, "alice").await;

        repo.update_refresh_token(alice.id, Some("rt".into())).await.unwrap();
        repo.confirm_email(alice.id).await.unwrap();
        let found = repo.get_user_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(found.refresh_token.as_deref(), Some("rt"));
        assert!(found.confirmed);

        let renamed = repo.update_username(alice.id, "alicia").await.unwrap();
        assert_eq!(renamed.username, "alicia");
        assert!(repo.get_user_by_username("alice").await.unwrap().is_none());

        let blocked = repo.set_access(alice.id, false).await.unwrap();
        assert!(!blocked.access);
        let demoted = repo.set_role(alice.id, Role::Moderator).await.unwrap();
        assert_eq!(demoted.role, Role::Moderator);
    }

    #[tokio::test]
    async fn updating_missing_user_is_not_found() {
        let repo = repo().await;
        assert!(matches!(
            repo.update_avatar(42, "https://x").await,
            Err(AppError::NotFound(..))
        ));
        assert!(matches!(repo.confirm_email(42).await, Err(AppError::NotFound(..))));
    }
}

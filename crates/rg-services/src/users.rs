//! Accounts: signup, tokens, email confirmation, profiles and admin access control.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use rg_core::access::{ADMIN_ONLY, EVERYONE};
use rg_core::{
    AppError, AuthProvider, ImageRepo, Mailer, MediaStore, NewUser, Principal, Profile, Result,
    Role, TokenScope, Transformation, User, UserRepo,
};

use crate::media::{ensure_image, THUMBNAIL_SIZE};

pub const MIN_PASSWORD_LEN: usize = 6;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=50;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepo>,
    images: Arc<dyn ImageRepo>,
    auth: Arc<dyn AuthProvider>,
    mailer: Arc<dyn Mailer>,
    media: Arc<dyn MediaStore>,
    folder: String,
}

fn check_username(username: &str) -> Result<String> {
    let username = username.trim();
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(AppError::validation(format!(
            "username must be {} to {} characters long",
            USERNAME_LEN.start(),
            USERNAME_LEN.end()
        )));
    }
    Ok(username.to_string())
}

fn check_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::validation("email address is malformed")),
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Could not validate credentials".to_string())
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        images: Arc<dyn ImageRepo>,
        auth: Arc<dyn AuthProvider>,
        mailer: Arc<dyn Mailer>,
        media: Arc<dyn MediaStore>,
        folder: &str,
    ) -> Self {
        Self {
            users,
            images,
            auth,
            mailer,
            media,
            folder: folder.to_string(),
        }
    }

    /// Mints a confirmation token and mails it without waiting for delivery.
    fn send_confirmation(&self, user: &User) -> Result<()> {
        let token = self.auth.issue_token(&user.email, TokenScope::EmailConfirmation)?;
        let mailer = self.mailer.clone();
        let (email, username) = (user.email.clone(), user.username.clone());
        tokio::spawn(async move {
            if let Err(e) = mailer.send_confirmation(&email, &username, &token).await {
                log::error!("failed to send confirmation mail to {}: {:#}", email, e);
            }
        });
        Ok(())
    }

    async fn issue_pair(&self, user: &User) -> Result<TokenPair> {
        let access_token = self.auth.issue_token(&user.email, TokenScope::Access)?;
        let refresh_token = self.auth.issue_token(&user.email, TokenScope::Refresh)?;
        self.users
            .update_refresh_token(user.id, Some(refresh_token.clone()))
            .await?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer",
        })
    }

    async fn by_email(&self, email: &str) -> Result<User> {
        self.users
            .get_user_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::not_found("User", email))
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<User> {
        let username = check_username(&request.username)?;
        let email = check_email(&request.email)?;
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }
        if self.users.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Account already exists".to_string()));
        }
        if self.users.get_user_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict(format!("username '{username}' is taken")));
        }

        let password_hash = self.auth.hash_password(&request.password)?;
        let user = self
            .users
            .create_user(NewUser {
                username,
                email,
                password_hash,
                avatar: None,
            })
            .await?;
        log::info!("new account {} ({})", user.id, user.username);
        self.send_confirmation(&user)?;
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let user = self
            .users
            .get_user_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email".to_string()))?;
        if !user.confirmed {
            return Err(AppError::Unauthorized("Email not confirmed".to_string()));
        }
        if !self.auth.verify_password(password, &user.password_hash) {
            return Err(AppError::Unauthorized("Invalid password".to_string()));
        }
        if !user.access {
            return Err(AppError::forbidden("account is blocked"));
        }
        self.issue_pair(&user).await
    }

    /// Rotates the token pair. A refresh token that does not match the stored one
    /// revokes the stored one as well.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let email = self
            .auth
            .verify_token(refresh_token, TokenScope::Refresh)
            .map_err(|_| invalid_credentials())?;
        let user = self
            .users
            .get_user_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;
        if user.refresh_token.as_deref() != Some(refresh_token) {
            log::warn!("stale refresh token presented for user {}", user.id);
            self.users.update_refresh_token(user.id, None).await?;
            return Err(AppError::Unauthorized("Invalid refresh token".to_string()));
        }
        if !user.access {
            return Err(AppError::forbidden("account is blocked"));
        }
        self.issue_pair(&user).await
    }

    pub async fn confirm_email(&self, token: &str) -> Result<&'static str> {
        let email = self
            .auth
            .verify_token(token, TokenScope::EmailConfirmation)
            .map_err(|_| AppError::validation("Verification error"))?;
        let user = self
            .users
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::validation("Verification error"))?;
        if user.confirmed {
            return Ok("Your email is already confirmed");
        }
        self.users.confirm_email(user.id).await?;
        Ok("Email confirmed")
    }

    /// Always answers the same way for unknown addresses.
    pub async fn request_confirmation(&self, email: &str) -> Result<&'static str> {
        let email = email.trim().to_lowercase();
        match self.users.get_user_by_email(&email).await? {
            Some(user) if user.confirmed => Ok("Your email is already confirmed"),
            Some(user) => {
                self.send_confirmation(&user)?;
                Ok("Check your email for confirmation.")
            }
            None => Ok("Check your email for confirmation."),
        }
    }

    /// Resolves a bearer access token into the acting principal.
    pub async fn authenticate(&self, access_token: &str) -> Result<Principal> {
        let email = self
            .auth
            .verify_token(access_token, TokenScope::Access)
            .map_err(|_| invalid_credentials())?;
        let user = self
            .users
            .get_user_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;
        if !user.access {
            return Err(AppError::forbidden("account is blocked"));
        }
        Ok(Principal::from(&user))
    }

    pub async fn me(&self, principal: &Principal) -> Result<User> {
        EVERYONE.check(principal.role)?;
        self.users
            .get_user(principal.id)
            .await?
            .ok_or_else(|| AppError::not_found("User", principal.id))
    }

    pub async fn update_profile(&self, principal: &Principal, username: &str) -> Result<User> {
        EVERYONE.check(principal.role)?;
        let username = check_username(username)?;
        if let Some(other) = self.users.get_user_by_username(&username).await? {
            if other.id != principal.id {
                return Err(AppError::Conflict(format!("username '{username}' is taken")));
            }
        }
        self.users.update_username(principal.id, &username).await
    }

    pub async fn update_avatar(&self, principal: &Principal, data: Vec<u8>) -> Result<User> {
        EVERYONE.check(principal.role)?;
        ensure_image(&data)?;
        let public_id = format!("{}/avatars/{}", self.folder, principal.username);
        let stored = self.media.save_upload(data, &public_id).await?;
        let url = self.media.get_url(
            &stored.public_id,
            stored.version,
            &Transformation::fill(THUMBNAIL_SIZE),
        );
        self.users.update_avatar(principal.id, &url).await
    }

    pub async fn profile(&self, principal: &Principal, username: &str) -> Result<Profile> {
        EVERYONE.check(principal.role)?;
        let user = self
            .users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User", username))?;
        let images = self.images.count_by_owner(user.id).await?;
        Ok(Profile {
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            created_at: user.created_at,
            images,
        })
    }

    async fn set_access(&self, principal: &Principal, email: &str, access: bool) -> Result<User> {
        ADMIN_ONLY.check(principal.role)?;
        let target = self.by_email(email).await?;
        if target.id == principal.id && !access {
            return Err(AppError::validation("you cannot block yourself"));
        }
        let user = self.users.set_access(target.id, access).await?;
        log::info!(
            "{} {} by {}",
            user.email,
            if access { "unblocked" } else { "blocked" },
            principal.username
        );
        Ok(user)
    }

    pub async fn block(&self, principal: &Principal, email: &str) -> Result<User> {
        self.set_access(principal, email, false).await
    }

    pub async fn unblock(&self, principal: &Principal, email: &str) -> Result<User> {
        self.set_access(principal, email, true).await
    }

    pub async fn set_role(&self, principal: &Principal, email: &str, role: Role) -> Result<User> {
        ADMIN_ONLY.check(principal.role)?;
        let target = self.by_email(email).await?;
        if target.id == principal.id {
            return Err(AppError::forbidden("you cannot change your own role"));
        }
        if target.role == role {
            return Ok(target);
        }
        let user = self.users.set_role(target.id, role).await?;
        log::info!("{} is now {} (set by {})", user.email, role, principal.username);
        Ok(user)
    }
}

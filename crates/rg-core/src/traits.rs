//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! Repositories are narrow, one per entity, and report failures as [`AppError`].

use async_trait::async_trait;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::error::Result;
use crate::models::{
    Comment, Image, ImageTransform, Message, NewComment, NewImage, NewImageTransform,
    NewMessage, NewRating, NewUser, Page, Rating, Role, SortField, Stars, Tag, TransformSettings,
    User,
};

/// Account persistence.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn update_refresh_token(&self, id: i64, token: Option<String>) -> Result<()>;
    async fn confirm_email(&self, id: i64) -> Result<()>;
    async fn update_username(&self, id: i64, username: &str) -> Result<User>;
    async fn update_avatar(&self, id: i64, url: &str) -> Result<User>;
    async fn set_role(&self, id: i64, role: Role) -> Result<User>;
    async fn set_access(&self, id: i64, access: bool) -> Result<User>;
}

/// Image persistence, including the image <-> tag association.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ImageRepo: Send + Sync {
    /// Inserts the image and links its tags in one transaction.
    async fn create_image(&self, image: NewImage) -> Result<Image>;
    async fn get_image(&self, id: i64) -> Result<Option<Image>>;
    async fn list_images(&self) -> Result<Vec<Image>>;
    async fn public_name_exists(&self, public_name: &str) -> Result<bool>;
    async fn update_description(&self, id: i64, description: Option<String>) -> Result<Image>;
    /// Replaces the whole tag set; tag names must already exist in the tag store.
    async fn replace_tags(&self, id: i64, tags: Vec<String>) -> Result<Image>;
    async fn delete_image(&self, id: i64) -> Result<()>;
    async fn count_by_owner(&self, user_id: i64) -> Result<i64>;
    async fn find_by_tag(&self, tag: &str, sort: SortField) -> Result<Vec<Image>>;
    async fn find_by_keywords(&self, words: &str, sort: SortField) -> Result<Vec<Image>>;
}

/// Tag dictionary.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait TagRepo: Send + Sync {
    /// Fails with `Conflict` when the name is taken.
    async fn create_tag(&self, name: &str) -> Result<Tag>;
    /// Creates whichever names are missing and returns every requested tag.
    async fn ensure_tags(&self, names: Vec<String>) -> Result<Vec<Tag>>;
    async fn get_tag(&self, id: i64) -> Result<Option<Tag>>;
    async fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>>;
    async fn list_tags(&self, page: Page) -> Result<Vec<Tag>>;
    async fn rename_tag(&self, id: i64, name: &str) -> Result<Tag>;
    async fn delete_tag(&self, id: i64) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;
    async fn get_comment(&self, id: i64) -> Result<Option<Comment>>;
    async fn list_for_image(&self, image_id: i64, page: Page) -> Result<Vec<Comment>>;
    async fn list_by_author_on_image(&self, image_id: i64, user_id: i64) -> Result<Vec<Comment>>;
    async fn update_content(&self, id: i64, content: &str) -> Result<Comment>;
    async fn delete_comment(&self, id: i64) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait RatingRepo: Send + Sync {
    /// Fails with `Conflict` when (user, image) is already rated.
    async fn create_rating(&self, rating: NewRating) -> Result<Rating>;
    async fn get_rating(&self, id: i64) -> Result<Option<Rating>>;
    async fn find_rating(&self, image_id: i64, user_id: i64) -> Result<Option<Rating>>;
    async fn update_stars(&self, id: i64, stars: Stars) -> Result<Rating>;
    async fn delete_rating(&self, id: i64) -> Result<()>;
    async fn stars_for_image(&self, image_id: i64) -> Result<Vec<Stars>>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MessageRepo: Send + Sync {
    async fn create_message(&self, message: NewMessage) -> Result<Message>;
    async fn get_message(&self, id: i64) -> Result<Option<Message>>;
    /// Every message the user sent or received, oldest first.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Message>>;
    async fn delete_message(&self, id: i64) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait TransformRepo: Send + Sync {
    async fn create_transform(&self, transform: NewImageTransform) -> Result<ImageTransform>;
    async fn get_transform(&self, id: i64) -> Result<Option<ImageTransform>>;
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ImageTransform>>;
}

/// What the CDN handed back for an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub public_id: String,
    pub version: Option<String>,
    pub secure_url: String,
}

/// A delivery-time transformation request (`c_fill,h_250,w_250` and friends).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transformation {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop: Option<String>,
    pub gravity: Option<String>,
    pub radius: Option<String>,
    pub effect: Option<String>,
    pub color_space: Option<String>,
    pub angle: Option<i32>,
}

impl Transformation {
    /// Square thumbnail filled from the centre.
    pub fn fill(size: u32) -> Self {
        Transformation {
            width: Some(size),
            height: Some(size),
            crop: Some("fill".to_string()),
            ..Default::default()
        }
    }
}

impl From<&TransformSettings> for Transformation {
    fn from(s: &TransformSettings) -> Self {
        Transformation {
            width: s.width,
            height: s.height,
            crop: s.crop.clone(),
            gravity: s.gravity.clone(),
            radius: s.radius.clone(),
            effect: s.effect.clone(),
            color_space: s.color_space.clone(),
            angle: s.angle,
        }
    }
}

/// Media CDN contract for uploads and delivery URLs.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Uploads raw bytes under `public_id`, overwriting any previous asset.
    async fn save_upload(&self, data: Vec<u8>, public_id: &str) -> anyhow::Result<StoredMedia>;
    /// Renders `payload` as a QR-code PNG and uploads it under `public_id`.
    async fn save_qr_code(&self, payload: &str, public_id: &str) -> anyhow::Result<StoredMedia>;
    /// Builds a delivery URL for an uploaded asset.
    fn get_url(&self, public_id: &str, version: Option<String>, transformation: &Transformation) -> String;
}

/// The purpose a token was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    Access,
    Refresh,
    EmailConfirmation,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Access => "access_token",
            TokenScope::Refresh => "refresh_token",
            TokenScope::EmailConfirmation => "email_token",
        }
    }
}

/// Identity contract: password hashing and token minting.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait AuthProvider: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String>;
    /// Verifies a password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool;
    /// Mints a token for `subject` (the account email).
    fn issue_token(&self, subject: &str, scope: TokenScope) -> Result<String>;
    /// Returns the subject if the token is valid and was minted for `scope`.
    fn verify_token(&self, token: &str, scope: TokenScope) -> Result<String>;
}

/// Outbound mail contract.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_confirmation(&self, email: &str, username: &str, token: &str) -> anyhow::Result<()>;
}

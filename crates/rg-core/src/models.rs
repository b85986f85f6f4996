//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Gallery.
//! Rows are keyed by the integer ids handed out by the relational store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::rating::StarSelection;

/// Closed set of roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    #[default]
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Moderator, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "user" => Ok(Role::User),
            other => Err(AppError::validation(format!("unknown role '{other}'"))),
        }
    }
}

/// A registered account as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub confirmed: bool,
    pub role: Role,
    /// `false` once an admin has blocked the account
    pub access: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
}

/// The authenticated actor behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner of the resource, or an admin acting on anyone's behalf.
    pub fn owns_or_admin(&self, owner_id: i64) -> bool {
        self.id == owner_id || self.is_admin()
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Principal {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Public profile card.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub images: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    /// CDN delivery URL of the stored original
    pub url: String,
    pub public_name: String,
    /// Asset id on the media CDN
    pub public_id: String,
    pub description: Option<String>,
    pub user_id: i64,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub url: String,
    pub public_name: String,
    pub public_id: String,
    pub description: Option<String>,
    pub user_id: i64,
    /// Lower-cased tag names, already capped
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub image_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub user_id: i64,
    pub image_id: i64,
}

/// One of the five mutually exclusive rating buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Stars {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
}

impl Stars {
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl From<Stars> for u8 {
    fn from(stars: Stars) -> u8 {
        stars.value()
    }
}

impl TryFrom<u8> for Stars {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Stars::One),
            2 => Ok(Stars::Two),
            3 => Ok(Stars::Three),
            4 => Ok(Stars::Four),
            5 => Ok(Stars::Five),
            other => Err(AppError::validation(format!(
                "rating must be between 1 and 5, got {other}"
            ))),
        }
    }
}

/// Serialized with the bucket spread over the five `one_star .. five_stars` flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RatingWire", try_from = "RatingWire")]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub image_id: i64,
    pub stars: Stars,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct RatingWire {
    id: i64,
    user_id: i64,
    image_id: i64,
    #[serde(flatten)]
    buckets: StarSelection,
    created_at: DateTime<Utc>,
}

impl From<Rating> for RatingWire {
    fn from(rating: Rating) -> Self {
        RatingWire {
            id: rating.id,
            user_id: rating.user_id,
            image_id: rating.image_id,
            buckets: StarSelection::from(rating.stars),
            created_at: rating.created_at,
        }
    }
}

impl TryFrom<RatingWire> for Rating {
    type Error = AppError;

    fn try_from(wire: RatingWire) -> Result<Self, Self::Error> {
        Ok(Rating {
            id: wire.id,
            user_id: wire.user_id,
            image_id: wire.image_id,
            stars: wire.buckets.to_stars()?,
            created_at: wire.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewRating {
    pub user_id: i64,
    pub image_id: i64,
    pub stars: Stars,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub body: String,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub body: String,
    pub sender_id: i64,
    pub receiver_id: i64,
}

/// Cosmetic transformation parameters understood by the media CDN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformSettings {
    pub radius: Option<String>,
    pub effect: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub crop: Option<String>,
    pub gravity: Option<String>,
    pub color_space: Option<String>,
    pub angle: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTransform {
    pub id: i64,
    pub image_id: i64,
    pub user_id: i64,
    pub settings: TransformSettings,
    pub secure_url: String,
    pub transformed_url: String,
    pub qrcode_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewImageTransform {
    pub image_id: i64,
    pub user_id: i64,
    pub settings: TransformSettings,
    pub secure_url: String,
    pub transformed_url: String,
    pub qrcode_url: String,
}

/// Ordering for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Date,
    Id,
}

/// Offset/limit passthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(offset: Option<i64>, limit: Option<i64>) -> Self {
        Page {
            offset: offset.unwrap_or(0).max(0),
            limit: limit.unwrap_or(Self::MAX_LIMIT).clamp(1, Self::MAX_LIMIT),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

//! # rg-services
//!
//! Use-case layer for Rusty-Gallery. Each service owns the ports it needs,
//! runs the access gate for its operation, and talks to the repositories.
//! Nothing here knows about HTTP.

use std::sync::Arc;

use rg_core::{
    AuthProvider, CommentRepo, ImageRepo, Mailer, MediaStore, MessageRepo, RatingRepo, TagRepo,
    TransformRepo, UserRepo,
};

pub mod comments;
pub mod images;
mod media;
pub mod messages;
pub mod ratings;
pub mod search;
pub mod tags;
pub mod transforms;
pub mod users;

pub use comments::CommentService;
pub use images::{ImageService, ImageUpload, ImageWithComments, Tagged};
pub use media::MAX_UPLOAD_BYTES;
pub use messages::MessageService;
pub use ratings::{RatingOutcome, RatingService};
pub use search::SearchService;
pub use tags::TagService;
pub use transforms::TransformService;
pub use users::{SignupRequest, TokenPair, UserService};

/// Every port a running instance needs. Assembled once by the binary.
#[derive(Clone)]
pub struct Ports {
    pub users: Arc<dyn UserRepo>,
    pub images: Arc<dyn ImageRepo>,
    pub tags: Arc<dyn TagRepo>,
    pub comments: Arc<dyn CommentRepo>,
    pub ratings: Arc<dyn RatingRepo>,
    pub messages: Arc<dyn MessageRepo>,
    pub transforms: Arc<dyn TransformRepo>,
    pub media: Arc<dyn MediaStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub mailer: Arc<dyn Mailer>,
}

/// All services, wired from one set of ports.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub images: ImageService,
    pub comments: CommentService,
    pub ratings: RatingService,
    pub tags: TagService,
    pub messages: MessageService,
    pub search: SearchService,
    pub transforms: TransformService,
}

impl Services {
    /// `media_folder` is the CDN folder every asset is uploaded under.
    pub fn new(ports: Ports, media_folder: &str) -> Self {
        Services {
            users: UserService::new(
                ports.users.clone(),
                ports.images.clone(),
                ports.auth.clone(),
                ports.mailer.clone(),
                ports.media.clone(),
                media_folder,
            ),
            images: ImageService::new(
                ports.images.clone(),
                ports.tags.clone(),
                ports.comments.clone(),
                ports.media.clone(),
                media_folder,
            ),
            comments: CommentService::new(ports.comments.clone(), ports.images.clone()),
            ratings: RatingService::new(ports.ratings.clone(), ports.images.clone()),
            tags: TagService::new(ports.tags.clone()),
            messages: MessageService::new(ports.messages.clone(), ports.users.clone()),
            search: SearchService::new(ports.images.clone()),
            transforms: TransformService::new(
                ports.transforms.clone(),
                ports.images.clone(),
                ports.media.clone(),
                media_folder,
            ),
        }
    }
}

//! Image lifecycle: upload to the CDN, describe, tag, delete.

use std::sync::Arc;

use serde::Serialize;

use rg_core::access::EVERYONE;
use rg_core::tags::TagSelection;
use rg_core::{
    AppError, Comment, CommentRepo, Image, ImageRepo, MediaStore, NewImage, Principal, Result,
    TagRepo, Transformation,
};

use crate::media::{ensure_image, public_stem, THUMBNAIL_SIZE};

pub const MAX_DESCRIPTION_LEN: usize = 250;

/// A multipart upload after the HTTP layer has pulled it apart.
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Vec<u8>,
    pub description: Option<String>,
    /// Raw comma-separated tag groups, as typed by the user.
    pub tags: Vec<String>,
}

/// An image together with the caller's own comments on it.
#[derive(Debug, Clone, Serialize)]
pub struct ImageWithComments {
    #[serde(flatten)]
    pub image: Image,
    pub comments: Vec<Comment>,
}

/// A result plus the tag overflow notice, if any tags were dropped.
#[derive(Debug, Clone, Serialize)]
pub struct Tagged<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'static str>,
}

#[derive(Clone)]
pub struct ImageService {
    images: Arc<dyn ImageRepo>,
    tags: Arc<dyn TagRepo>,
    comments: Arc<dyn CommentRepo>,
    media: Arc<dyn MediaStore>,
    folder: String,
}

fn clean_description(description: Option<String>) -> Result<Option<String>> {
    let description = description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    if let Some(d) = &description {
        if d.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::validation(format!(
                "description is longer than {MAX_DESCRIPTION_LEN} characters"
            )));
        }
    }
    Ok(description)
}

impl ImageService {
    pub fn new(
        images: Arc<dyn ImageRepo>,
        tags: Arc<dyn TagRepo>,
        comments: Arc<dyn CommentRepo>,
        media: Arc<dyn MediaStore>,
        folder: &str,
    ) -> Self {
        Self {
            images,
            tags,
            comments,
            media,
            folder: folder.to_string(),
        }
    }

    async fn with_comments(&self, principal: &Principal, image: Image) -> Result<ImageWithComments> {
        let comments = self
            .comments
            .list_by_author_on_image(image.id, principal.id)
            .await?;
        Ok(ImageWithComments { image, comments })
    }

    async fn owned(&self, principal: &Principal, image_id: i64) -> Result<Image> {
        let image = self
            .images
            .get_image(image_id)
            .await?
            .ok_or_else(|| AppError::not_found("Image", image_id))?;
        if !principal.owns_or_admin(image.user_id) {
            return Err(AppError::forbidden("not the owner of this image"));
        }
        Ok(image)
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<ImageWithComments>> {
        EVERYONE.check(principal.role)?;
        let images = self.images.list_images().await?;
        let mut out = Vec::with_capacity(images.len());
        for image in images {
            out.push(self.with_comments(principal, image).await?);
        }
        Ok(out)
    }

    pub async fn get(&self, principal: &Principal, image_id: i64) -> Result<ImageWithComments> {
        EVERYONE.check(principal.role)?;
        let image = self
            .images
            .get_image(image_id)
            .await?
            .ok_or_else(|| AppError::not_found("Image", image_id))?;
        self.with_comments(principal, image).await
    }

    /// First free public name: `stem`, then `stem_2`, `stem_3`, ...
    async fn unique_public_name(&self, stem: &str) -> Result<String> {
        let mut candidate = stem.to_string();
        let mut suffix = 2;
        while self.images.public_name_exists(&candidate).await? {
            candidate = format!("{stem}_{suffix}");
            suffix += 1;
        }
        Ok(candidate)
    }

    pub async fn upload(&self, principal: &Principal, upload: ImageUpload) -> Result<Tagged<Image>> {
        EVERYONE.check(principal.role)?;
        let format = ensure_image(&upload.data)?;
        let description = clean_description(upload.description)?;
        let selection = TagSelection::from_raw(&upload.tags);

        let public_name = self.unique_public_name(&public_stem(&upload.file_name)).await?;
        let public_id = format!("{}/{}_{}", self.folder, public_name, principal.username);

        log::debug!(
            "uploading {:?} image {} ({} bytes)",
            format,
            public_id,
            upload.data.len()
        );
        let stored = self.media.save_upload(upload.data, &public_id).await?;
        let url = self.media.get_url(
            &stored.public_id,
            stored.version,
            &Transformation::fill(THUMBNAIL_SIZE),
        );

        self.tags.ensure_tags(selection.applied.clone()).await?;
        let image = self
            .images
            .create_image(NewImage {
                url,
                public_name,
                public_id: stored.public_id,
                description,
                user_id: principal.id,
                tags: selection.applied,
            })
            .await?;

        log::info!("image {} uploaded by {}", image.id, principal.username);
        Ok(Tagged {
            item: image,
            detail: selection.overflow,
        })
    }

    pub async fn update_description(
        &self,
        principal: &Principal,
        image_id: i64,
        description: Option<String>,
    ) -> Result<Image> {
        EVERYONE.check(principal.role)?;
        let description = clean_description(description)?;
        self.owned(principal, image_id).await?;
        self.images.update_description(image_id, description).await
    }

    /// Replaces the whole tag set; names missing from the dictionary are created.
    pub async fn replace_tags(
        &self,
        principal: &Principal,
        image_id: i64,
        raw_tags: Vec<String>,
    ) -> Result<Tagged<Image>> {
        EVERYONE.check(principal.role)?;
        self.owned(principal, image_id).await?;
        let selection = TagSelection::from_raw(&raw_tags);
        self.tags.ensure_tags(selection.applied.clone()).await?;
        let image = self.images.replace_tags(image_id, selection.applied).await?;
        Ok(Tagged {
            item: image,
            detail: selection.overflow,
        })
    }

    pub async fn delete(&self, principal: &Principal, image_id: i64) -> Result<Image> {
        EVERYONE.check(principal.role)?;
        let image = self.owned(principal, image_id).await?;
        self.images.delete_image(image_id).await?;
        log::info!("image {} deleted by {}", image_id, principal.username);
        Ok(image)
    }
}

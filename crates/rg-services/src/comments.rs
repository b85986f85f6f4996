use std::sync::Arc;

use rg_core::access::{EVERYONE, MODERATORS};
use rg_core::{AppError, Comment, CommentRepo, ImageRepo, NewComment, Page, Principal, Result};

pub const MAX_COMMENT_LEN: usize = 250;

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepo>,
    images: Arc<dyn ImageRepo>,
}

fn clean_content(content: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::validation("comment is empty"));
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::validation(format!(
            "comment is longer than {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok(content.to_string())
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepo>, images: Arc<dyn ImageRepo>) -> Self {
        Self { comments, images }
    }

    pub async fn list_for_image(
        &self,
        principal: &Principal,
        image_id: i64,
        page: Page,
    ) -> Result<Vec<Comment>> {
        EVERYONE.check(principal.role)?;
        self.comments.list_for_image(image_id, page).await
    }

    pub async fn get(&self, principal: &Principal, comment_id: i64) -> Result<Comment> {
        EVERYONE.check(principal.role)?;
        self.comments
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", comment_id))
    }

    pub async fn create(
        &self,
        principal: &Principal,
        image_id: i64,
        content: &str,
    ) -> Result<Comment> {
        EVERYONE.check(principal.role)?;
        let content = clean_content(content)?;
        if self.images.get_image(image_id).await?.is_none() {
            return Err(AppError::not_found("Image", image_id));
        }
        self.comments
            .create_comment(NewComment {
                content,
                user_id: principal.id,
                image_id,
            })
            .await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        comment_id: i64,
        content: &str,
    ) -> Result<Comment> {
        EVERYONE.check(principal.role)?;
        let content = clean_content(content)?;
        let comment = self.get(principal, comment_id).await?;
        if !principal.owns_or_admin(comment.user_id) {
            return Err(AppError::forbidden("not the author of this comment"));
        }
        self.comments.update_content(comment_id, &content).await
    }

    /// Moderation only; ownership does not matter.
    pub async fn delete(&self, principal: &Principal, comment_id: i64) -> Result<Comment> {
        MODERATORS.check(principal.role)?;
        let comment = self.get(principal, comment_id).await?;
        self.comments.delete_comment(comment_id).await?;
        log::info!(
            "comment {} on image {} removed by {} ({})",
            comment_id,
            comment.image_id,
            principal.username,
            principal.role
        );
        Ok(comment)
    }
}

use std::sync::Arc;

use rg_core::access::EVERYONE;
use rg_core::{AppError, Image, ImageRepo, Principal, Result, SortField};

#[derive(Clone)]
pub struct SearchService {
    images: Arc<dyn ImageRepo>,
}

impl SearchService {
    pub fn new(images: Arc<dyn ImageRepo>) -> Self {
        Self { images }
    }

    pub async fn by_tag(&self, principal: &Principal, tag: &str, sort: SortField) -> Result<Vec<Image>> {
        EVERYONE.check(principal.role)?;
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return Err(AppError::validation("tag to search for is empty"));
        }
        self.images.find_by_tag(&tag, sort).await
    }

    pub async fn by_keywords(
        &self,
        principal: &Principal,
        words: &str,
        sort: SortField,
    ) -> Result<Vec<Image>> {
        EVERYONE.check(principal.role)?;
        let words = words.trim();
        if words.is_empty() {
            return Err(AppError::validation("keywords to search for are empty"));
        }
        self.images.find_by_keywords(words, sort).await
    }
}

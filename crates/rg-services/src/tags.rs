use std::sync::Arc;

use rg_core::access::{EVERYONE, MODERATORS};
use rg_core::tags::MAX_TAG_LEN;
use rg_core::{AppError, Page, Principal, Result, Tag, TagRepo};

#[derive(Clone)]
pub struct TagService {
    tags: Arc<dyn TagRepo>,
}

/// A single tag name as the dictionary stores it: trimmed and lower-cased.
fn tag_name(raw: &str) -> Result<String> {
    let name = raw.trim().to_lowercase();
    if name.is_empty() {
        return Err(AppError::validation("tag name is empty"));
    }
    if name.chars().count() > MAX_TAG_LEN {
        return Err(AppError::validation(format!(
            "tag name is longer than {MAX_TAG_LEN} characters"
        )));
    }
    Ok(name)
}

impl TagService {
    pub fn new(tags: Arc<dyn TagRepo>) -> Self {
        Self { tags }
    }

    pub async fn create(&self, principal: &Principal, name: &str) -> Result<Tag> {
        EVERYONE.check(principal.role)?;
        let name = tag_name(name)?;
        self.tags.create_tag(&name).await
    }

    pub async fn list(&self, principal: &Principal, page: Page) -> Result<Vec<Tag>> {
        EVERYONE.check(principal.role)?;
        self.tags.list_tags(page).await
    }

    pub async fn get(&self, principal: &Principal, tag_id: i64) -> Result<Tag> {
        EVERYONE.check(principal.role)?;
        self.tags
            .get_tag(tag_id)
            .await?
            .ok_or_else(|| AppError::not_found("Tag", tag_id))
    }

    pub async fn rename(&self, principal: &Principal, tag_id: i64, name: &str) -> Result<Tag> {
        MODERATORS.check(principal.role)?;
        let name = tag_name(name)?;
        let current = self.get(principal, tag_id).await?;
        if current.name == name {
            return Ok(current);
        }
        if self.tags.get_tag_by_name(&name).await?.is_some() {
            return Err(AppError::Conflict(format!("tag '{name}' already exists")));
        }
        self.tags.rename_tag(tag_id, &name).await
    }

    pub async fn delete(&self, principal: &Principal, tag_id: i64) -> Result<Tag> {
        MODERATORS.check(principal.role)?;
        let tag = self.get(principal, tag_id).await?;
        self.tags.delete_tag(tag_id).await?;
        log::info!("tag '{}' deleted by {}", tag.name, principal.username);
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::principal;
    use mockall::predicate::eq;
    use rg_core::{MockTagRepo, Role};

    fn tag(id: i64, name: &str) -> Tag {
        Tag { id, name: name.to_string() }
    }

    #[tokio::test]
    async fn create_lowercases() {
        let mut tags = MockTagRepo::new();
        tags.expect_create_tag()
            .with(eq("sunset"))
            .returning(|name| Ok(tag(1, name)));
        let svc = TagService::new(Arc::new(tags));
        let created = svc.create(&principal(1, Role::User), " Sunset ").await.unwrap();
        assert_eq!(created.name, "sunset");
    }

    #[tokio::test]
    async fn create_rejects_long_names() {
        let svc = TagService::new(Arc::new(MockTagRepo::new()));
        let err = svc
            .create(&principal(1, Role::User), &"t".repeat(MAX_TAG_LEN + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn duplicate_create_surfaces_conflict() {
        let mut tags = MockTagRepo::new();
        tags.expect_create_tag()
            .returning(|name| Err(AppError::Conflict(format!("tag '{name}' already exists"))));
        let svc = TagService::new(Arc::new(tags));
        let err = svc.create(&principal(1, Role::User), "sea").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn rename_is_moderated() {
        let svc = TagService::new(Arc::new(MockTagRepo::new()));
        let err = svc.rename(&principal(1, Role::User), 1, "x").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn rename_onto_existing_name_conflicts() {
        let mut tags = MockTagRepo::new();
        tags.expect_get_tag().returning(|id| Ok(Some(tag(id, "sea"))));
        tags.expect_get_tag_by_name()
            .with(eq("sun"))
            .returning(|name| Ok(Some(tag(2, name))));
        tags.expect_rename_tag().never();
        let svc = TagService::new(Arc::new(tags));
        let err = svc.rename(&principal(3, Role::Moderator), 1, "Sun").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn rename_to_free_name() {
        let mut tags = MockTagRepo::new();
        tags.expect_get_tag().returning(|id| Ok(Some(tag(id, "sea"))));
        tags.expect_get_tag_by_name().returning(|_| Ok(None));
        tags.expect_rename_tag()
            .with(eq(1), eq("ocean"))
            .returning(|id, name| Ok(tag(id, name)));
        let svc = TagService::new(Arc::new(tags));
        let renamed = svc.rename(&principal(3, Role::Admin), 1, "ocean").await.unwrap();
        assert_eq!(renamed.name, "ocean");
    }

    #[tokio::test]
    async fn delete_missing_tag() {
        let mut tags = MockTagRepo::new();
        tags.expect_get_tag().returning(|_| Ok(None));
        let svc = TagService::new(Arc::new(tags));
        let err = svc.delete(&principal(3, Role::Admin), 4).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }
}

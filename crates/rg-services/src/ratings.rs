//! Star ratings: one per (user, image), never on your own image.

use std::sync::Arc;

use rg_core::access::{EVERYONE, MODERATORS};
use rg_core::rating::{self, StarSelection};
use rg_core::{AppError, ImageRepo, NewRating, Principal, Rating, RatingRepo, Result};

/// Whether `submit` stored a new row or found one already there.
#[derive(Debug, Clone, PartialEq)]
pub enum RatingOutcome {
    Created(Rating),
    Existing(Rating),
}

impl RatingOutcome {
    pub fn rating(&self) -> &Rating {
        match self {
            RatingOutcome::Created(r) | RatingOutcome::Existing(r) => r,
        }
    }

    pub fn into_rating(self) -> Rating {
        match self {
            RatingOutcome::Created(r) | RatingOutcome::Existing(r) => r,
        }
    }
}

#[derive(Clone)]
pub struct RatingService {
    ratings: Arc<dyn RatingRepo>,
    images: Arc<dyn ImageRepo>,
}

impl RatingService {
    pub fn new(ratings: Arc<dyn RatingRepo>, images: Arc<dyn ImageRepo>) -> Self {
        Self { ratings, images }
    }

    pub async fn submit(
        &self,
        principal: &Principal,
        image_id: i64,
        selection: StarSelection,
    ) -> Result<RatingOutcome> {
        EVERYONE.check(principal.role)?;

        let image = self
            .images
            .get_image(image_id)
            .await?
            .ok_or_else(|| AppError::not_found("Image", image_id))?;
        if image.user_id == principal.id {
            return Err(AppError::forbidden("you may not rate your own image"));
        }
        let stars = selection.to_stars()?;

        if let Some(existing) = self.ratings.find_rating(image_id, principal.id).await? {
            return Ok(RatingOutcome::Existing(existing));
        }

        let new = NewRating {
            user_id: principal.id,
            image_id,
            stars,
        };
        match self.ratings.create_rating(new).await {
            Ok(rating) => {
                log::info!("user {} rated image {} with {} stars", principal.id, image_id, stars.value());
                Ok(RatingOutcome::Created(rating))
            }
            // Lost a race with a concurrent submit for the same pair.
            Err(AppError::Conflict(_)) => self
                .ratings
                .find_rating(image_id, principal.id)
                .await?
                .map(RatingOutcome::Existing)
                .ok_or_else(|| AppError::Internal("rating vanished after conflict".to_string())),
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, principal: &Principal, rating_id: i64) -> Result<Rating> {
        EVERYONE.check(principal.role)?;
        self.ratings
            .get_rating(rating_id)
            .await?
            .ok_or_else(|| AppError::not_found("Rating", rating_id))
    }

    pub async fn update(
        &self,
        principal: &Principal,
        rating_id: i64,
        selection: StarSelection,
    ) -> Result<Rating> {
        EVERYONE.check(principal.role)?;
        let stars = selection.to_stars()?;

        let rating = self.get(principal, rating_id).await?;
        if !principal.owns_or_admin(rating.user_id) {
            return Err(AppError::forbidden("not the author of this rating"));
        }
        self.ratings.update_stars(rating_id, stars).await
    }

    pub async fn remove(&self, principal: &Principal, rating_id: i64) -> Result<Rating> {
        MODERATORS.check(principal.role)?;
        let rating = self.get(principal, rating_id).await?;
        self.ratings.delete_rating(rating_id).await?;
        log::info!("rating {} removed by {}", rating_id, principal.id);
        Ok(rating)
    }

    pub async fn average(&self, principal: &Principal, image_id: i64) -> Result<f64> {
        EVERYONE.check(principal.role)?;
        if self.images.get_image(image_id).await?.is_none() {
            return Err(AppError::not_found("Image", image_id));
        }
        let stars = self.ratings.stars_for_image(image_id).await?;
        Ok(rating::average(&stars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{image, principal};
    use chrono::Utc;
    use mockall::predicate::eq;
    use rg_core::{MockImageRepo, MockRatingRepo, Role, Stars};

    fn rating(id: i64, user_id: i64, image_id: i64, stars: Stars) -> Rating {
        Rating { id, user_id, image_id, stars, created_at: Utc::now() }
    }

    fn images_owned_by(owner: i64) -> MockImageRepo {
        let mut images = MockImageRepo::new();
        images
            .expect_get_image()
            .returning(move |id| Ok(Some(image(id, owner))));
        images
    }

    fn service(ratings: MockRatingRepo, images: MockImageRepo) -> RatingService {
        RatingService::new(Arc::new(ratings), Arc::new(images))
    }

    fn four_stars() -> StarSelection {
        StarSelection::from_buckets([false, false, false, true, false])
    }

    #[tokio::test]
    async fn cannot_rate_own_image() {
        let svc = service(MockRatingRepo::new(), images_owned_by(1));
        let err = svc.submit(&principal(1, Role::User), 10, four_stars()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn rejects_two_buckets() {
        let svc = service(MockRatingRepo::new(), images_owned_by(2));
        let selection = StarSelection::from_buckets([true, true, false, false, false]);
        let err = svc.submit(&principal(1, Role::User), 10, selection).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn missing_image_is_not_found() {
        let mut images = MockImageRepo::new();
        images.expect_get_image().returning(|_| Ok(None));
        let svc = service(MockRatingRepo::new(), images);
        let err = svc.submit(&principal(1, Role::User), 10, four_stars()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn second_submit_returns_existing_row() {
        let mut ratings = MockRatingRepo::new();
        ratings
            .expect_find_rating()
            .with(eq(10), eq(1))
            .returning(|image_id, user_id| Ok(Some(rating(5, user_id, image_id, Stars::Two))));
        ratings.expect_create_rating().never();

        let svc = service(ratings, images_owned_by(2));
        let outcome = svc.submit(&principal(1, Role::User), 10, four_stars()).await.unwrap();
        assert_eq!(outcome, RatingOutcome::Existing(outcome.rating().clone()));
        assert_eq!(outcome.rating().id, 5);
        assert_eq!(outcome.rating().stars, Stars::Two);
    }

    #[tokio::test]
    async fn first_submit_creates() {
        let mut ratings = MockRatingRepo::new();
        ratings.expect_find_rating().returning(|_, _| Ok(None));
        ratings
            .expect_create_rating()
            .withf(|new| new.stars == Stars::Four && new.user_id == 1 && new.image_id == 10)
            .times(1)
            .returning(|new| Ok(rating(9, new.user_id, new.image_id, new.stars)));

        let svc = service(ratings, images_owned_by(2));
        let outcome = svc.submit(&principal(1, Role::User), 10, four_stars()).await.unwrap();
        assert!(matches!(outcome, RatingOutcome::Created(ref r) if r.id == 9));
    }

    #[tokio::test]
    async fn insert_race_falls_back_to_existing() {
        let mut ratings = MockRatingRepo::new();
        let mut seq = mockall::Sequence::new();
        ratings
            .expect_find_rating()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(None));
        ratings
            .expect_create_rating()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::Conflict("duplicate".into())));
        ratings
            .expect_find_rating()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|image_id, user_id| Ok(Some(rating(3, user_id, image_id, Stars::Five))));

        let svc = service(ratings, images_owned_by(2));
        let outcome = svc.submit(&principal(1, Role::User), 10, four_stars()).await.unwrap();
        assert!(matches!(outcome, RatingOutcome::Existing(ref r) if r.id == 3));
    }

    #[tokio::test]
    async fn average_of_unrated_image_is_zero() {
        let mut ratings = MockRatingRepo::new();
        ratings.expect_stars_for_image().returning(|_| Ok(vec![]));
        let svc = service(ratings, images_owned_by(2));
        assert_eq!(svc.average(&principal(1, Role::User), 10).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn average_is_mean_of_buckets() {
        let mut ratings = MockRatingRepo::new();
        ratings
            .expect_stars_for_image()
            .with(eq(10))
            .returning(|_| Ok(vec![Stars::Two, Stars::Four]));
        let svc = service(ratings, images_owned_by(2));
        assert_eq!(svc.average(&principal(1, Role::User), 10).await.unwrap(), 3.0);
    }

    #[tokio::test]
    async fn update_rejects_bad_selection_before_lookup() {
        let mut ratings = MockRatingRepo::new();
        ratings.expect_get_rating().never();
        let svc = service(ratings, MockImageRepo::new());
        for selection in [
            StarSelection::from_buckets([false, true, true, false, false]),
            StarSelection::default(),
        ] {
            let err = svc.update(&principal(1, Role::User), 4, selection).await.unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
        }
    }

    #[tokio::test]
    async fn update_by_stranger_is_forbidden() {
        let mut ratings = MockRatingRepo::new();
        ratings
            .expect_get_rating()
            .returning(|id| Ok(Some(rating(id, 2, 10, Stars::One))));
        ratings.expect_update_stars().never();
        let svc = service(ratings, MockImageRepo::new());
        let err = svc.update(&principal(1, Role::User), 4, four_stars()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn owner_updates_bucket() {
        let mut ratings = MockRatingRepo::new();
        ratings
            .expect_get_rating()
            .returning(|id| Ok(Some(rating(id, 1, 10, Stars::One))));
        ratings
            .expect_update_stars()
            .with(eq(4), eq(Stars::Four))
            .returning(|id, stars| Ok(rating(id, 1, 10, stars)));
        let svc = service(ratings, MockImageRepo::new());
        let updated = svc.update(&principal(1, Role::User), 4, four_stars()).await.unwrap();
        assert_eq!(updated.stars, Stars::Four);
    }

    #[tokio::test]
    async fn only_moderators_remove() {
        let svc = service(MockRatingRepo::new(), MockImageRepo::new());
        let err = svc.remove(&principal(1, Role::User), 4).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let mut ratings = MockRatingRepo::new();
        ratings
            .expect_get_rating()
            .returning(|id| Ok(Some(rating(id, 1, 10, Stars::One))));
        ratings.expect_delete_rating().with(eq(4)).times(1).returning(|_| Ok(()));
        let svc = service(ratings, MockImageRepo::new());
        assert_eq!(svc.remove(&principal(3, Role::Moderator), 4).await.unwrap().id, 4);
    }
}

use actix_web::{web, HttpResponse};
use rg_services::Services;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::handlers::SortQuery;

#[derive(Debug, Deserialize)]
pub struct TagQuery {
    pub tag: String,
}

#[derive(Debug, Deserialize)]
pub struct WordsQuery {
    pub words: String,
}

/// `GET /find/tag?tag=cats&sort=date`
pub async fn by_tag(
    services: web::Data<Services>,
    user: CurrentUser,
    query: web::Query<TagQuery>,
    sort: web::Query<SortQuery>,
) -> Result<HttpResponse, ApiError> {
    let images = services.search.by_tag(&user.0, &query.tag, sort.sort).await?;
    Ok(HttpResponse::Ok().json(images))
}

/// `GET /find/words?words=sunset&sort=id`
pub async fn by_keywords(
    services: web::Data<Services>,
    user: CurrentUser,
    query: web::Query<WordsQuery>,
    sort: web::Query<SortQuery>,
) -> Result<HttpResponse, ApiError> {
    let images = services
        .search
        .by_keywords(&user.0, &query.words, sort.sort)
        .await?;
    Ok(HttpResponse::Ok().json(images))
}

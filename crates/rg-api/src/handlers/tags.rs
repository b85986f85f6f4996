use actix_web::{web, HttpResponse};
use rg_services::Services;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::handlers::PageQuery;

#[derive(Debug, Deserialize)]
pub struct TagBody {
    pub name: String,
}

pub async fn list(
    services: web::Data<Services>,
    user: CurrentUser,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let tags = services.tags.list(&user.0, page.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(tags))
}

pub async fn create(
    services: web::Data<Services>,
    user: CurrentUser,
    body: web::Json<TagBody>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Created().json(services.tags.create(&user.0, &body.name).await?))
}

pub async fn get(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.tags.get(&user.0, *id).await?))
}

pub async fn rename(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
    body: web::Json<TagBody>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.tags.rename(&user.0, *id, &body.name).await?))
}

pub async fn delete(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.tags.delete(&user.0, *id).await?))
}

use actix_web::{web, HttpResponse};
use rg_services::Services;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::handlers::PageQuery;

#[derive(Debug, Deserialize)]
pub struct NewCommentBody {
    pub image_id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentUpdate {
    pub content: String,
}

pub async fn list_for_image(
    services: web::Data<Services>,
    user: CurrentUser,
    image_id: web::Path<i64>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let comments = services
        .comments
        .list_for_image(&user.0, *image_id, page.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(comments))
}

pub async fn create(
    services: web::Data<Services>,
    user: CurrentUser,
    body: web::Json<NewCommentBody>,
) -> Result<HttpResponse, ApiError> {
    let comment = services
        .comments
        .create(&user.0, body.image_id, &body.content)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn get(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.comments.get(&user.0, *id).await?))
}

pub async fn update(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
    body: web::Json<CommentUpdate>,
) -> Result<HttpResponse, ApiError> {
    let comment = services.comments.update(&user.0, *id, &body.content).await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn delete(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.comments.delete(&user.0, *id).await?))
}

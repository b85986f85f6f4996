use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use rg_services::{ImageUpload, Services};
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::upload::read_form;

#[derive(Debug, Deserialize)]
pub struct DescriptionUpdate {
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagsUpdate {
    pub tags: Vec<String>,
}

pub async fn list(
    services: web::Data<Services>,
    user: CurrentUser,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.images.list(&user.0).await?))
}

pub async fn get(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.images.get(&user.0, *id).await?))
}

/// Multipart fields: `file` (required), `description`, and any number of
/// `tags` parts, each a comma-separated group.
pub async fn upload(
    services: web::Data<Services>,
    user: CurrentUser,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut form = read_form(payload).await?;
    let file = form.take_file("file")?;
    let upload = ImageUpload {
        file_name: file.file_name,
        data: file.data,
        description: form.text("description"),
        tags: form.all("tags"),
    };
    let created = services.images.upload(&user.0, upload).await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn update_description(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
    body: web::Json<DescriptionUpdate>,
) -> Result<HttpResponse, ApiError> {
    let image = services
        .images
        .update_description(&user.0, *id, body.into_inner().description)
        .await?;
    Ok(HttpResponse::Ok().json(image))
}

pub async fn replace_tags(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
    body: web::Json<TagsUpdate>,
) -> Result<HttpResponse, ApiError> {
    let image = services
        .images
        .replace_tags(&user.0, *id, body.into_inner().tags)
        .await?;
    Ok(HttpResponse::Ok().json(image))
}

pub async fn delete(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.images.delete(&user.0, *id).await?))
}

//! Star ratings. The body of a submit or update is the five-bucket selection,
//! e.g. `{"four_stars": true}`.

use actix_web::{web, HttpResponse};
use rg_core::rating::StarSelection;
use rg_services::{RatingOutcome, Services};
use serde_json::json;

use crate::error::ApiError;
use crate::extract::CurrentUser;

/// 201 for a fresh rating, 200 when the caller had already rated the image.
pub async fn submit(
    services: web::Data<Services>,
    user: CurrentUser,
    image_id: web::Path<i64>,
    body: web::Json<StarSelection>,
) -> Result<HttpResponse, ApiError> {
    let outcome = services
        .ratings
        .submit(&user.0, *image_id, body.into_inner())
        .await?;
    let response = match outcome {
        RatingOutcome::Created(rating) => HttpResponse::Created().json(rating),
        RatingOutcome::Existing(rating) => HttpResponse::Ok().json(rating),
    };
    Ok(response)
}

pub async fn average(
    services: web::Data<Services>,
    user: CurrentUser,
    image_id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let average = services.ratings.average(&user.0, *image_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "image_id": *image_id, "average": average })))
}

pub async fn get(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.ratings.get(&user.0, *id).await?))
}

pub async fn update(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
    body: web::Json<StarSelection>,
) -> Result<HttpResponse, ApiError> {
    let rating = services
        .ratings
        .update(&user.0, *id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(rating))
}

pub async fn remove(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.ratings.remove(&user.0, *id).await?))
}

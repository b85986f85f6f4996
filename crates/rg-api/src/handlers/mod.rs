//! # rg-api Handlers
//!
//! Thin adapters between HTTP and the services: pull the request apart,
//! call one service operation, shape the JSON response.

use actix_web::HttpResponse;
use rg_core::{Page, SortField};
use serde::Deserialize;
use serde_json::json;

pub mod access;
pub mod auth;
pub mod comments;
pub mod images;
pub mod messages;
pub mod ratings;
pub mod search;
pub mod tags;
pub mod transforms;
pub mod users;

/// `?offset=&limit=` query, clamped by [`Page::new`].
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl From<PageQuery> for Page {
    fn from(q: PageQuery) -> Self {
        Page::new(q.offset, q.limit)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SortQuery {
    #[serde(default)]
    pub sort: SortField,
}

/// Liveness probe.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

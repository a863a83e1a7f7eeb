use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use tracing::warn;
use watchtower::{Badge, TargetError, TargetService};

use crate::error::ApiError;
use crate::response::ApiResponse;

pub const WEBSITES_PATH: &str = "/api/websites";
pub const BADGE_PATH: &str = "/api/websites/badge";

macros_utils::routes! {
    route create_website,
    route get_websites,
    route update_website,
    route delete_website,
    route website_badge,
}

#[derive(Debug, Deserialize)]
pub struct WebsiteRequest {
    #[serde(default)]
    pub url: String,
    /// Seconds between checks, anything under the floor is raised to it
    #[serde(default)]
    pub frequency: i64,
}

impl WebsiteRequest {
    fn frequency(&self) -> u64 {
        u64::try_from(self.frequency).unwrap_or(0)
    }
}

#[derive(Debug, Deserialize)]
pub struct WebsiteQuery {
    #[serde(rename = "websiteUrl")]
    pub website_url: Option<String>,
}

impl WebsiteQuery {
    fn url(&self) -> Option<&str> {
        self.website_url.as_deref().filter(|url| !url.is_empty())
    }

    fn require_url(&self) -> Result<&str, ApiError> {
        self.url().ok_or_else(|| ApiError::BadRequest("URL parameter is required".into()))
    }
}

#[post("/api/websites")]
pub async fn create_website(
    targets: web::Data<TargetService>,
    body: web::Json<WebsiteRequest>,
) -> Result<HttpResponse, ApiError> {
    if body.url.is_empty() {
        return Err(ApiError::BadRequest("URL is required".into()));
    }

    let target = targets
        .create(&body.url, body.frequency())
        .await
        .map_err(|e| ApiError::from_target(e, "Failed to save website configuration"))?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message("Website added to monitoring", target)))
}

/// One website with `websiteUrl`, every website without it
#[get("/api/websites")]
pub async fn get_websites(
    targets: web::Data<TargetService>,
    query: web::Query<WebsiteQuery>,
) -> Result<HttpResponse, ApiError> {
    if let Some(url) = query.url() {
        let target = targets.get(url).await.map_err(|e| ApiError::from_target(e, "Failed to read website"))?;
        return Ok(HttpResponse::Ok().json(ApiResponse::data(target)));
    }

    let all = targets.list().await.map_err(|e| ApiError::from_target(e, "Failed to list websites"))?;
    Ok(HttpResponse::Ok().json(ApiResponse::data(all)))
}

#[put("/api/websites")]
pub async fn update_website(
    targets: web::Data<TargetService>,
    query: web::Query<WebsiteQuery>,
    body: web::Json<WebsiteRequest>,
) -> Result<HttpResponse, ApiError> {
    let url = query.require_url()?;
    let target = targets
        .update_frequency(url, body.frequency())
        .await
        .map_err(|e| ApiError::from_target(e, "Failed to update website configuration"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message("Website updated", target)))
}

#[delete("/api/websites")]
pub async fn delete_website(
    targets: web::Data<TargetService>,
    query: web::Query<WebsiteQuery>,
) -> Result<HttpResponse, ApiError> {
    let url = query.require_url()?;
    targets.delete(url).await.map_err(|e| ApiError::from_target(e, "Failed to delete website"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("Website deleted")))
}

/// Shields.io endpoint, the badge is the whole body
#[get("/api/websites/badge")]
pub async fn website_badge(
    targets: web::Data<TargetService>,
    query: web::Query<WebsiteQuery>,
) -> Result<HttpResponse, ApiError> {
    let url = query.require_url()?;

    match targets.badge(url).await {
        Ok(badge) => Ok(HttpResponse::Ok().json(badge)),
        Err(TargetError::NotFound) => Ok(HttpResponse::NotFound().json(Badge::unknown_target())),
        Err(e) => {
            warn!("Serving unknown badge for {}: {}", url, e);
            Ok(HttpResponse::NotFound().json(Badge::unknown_target()))
        }
    }
}

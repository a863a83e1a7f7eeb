use std::collections::HashMap;

use actix_web::{HttpResponse, Responder, get};

use crate::response::ApiResponse;

macros_utils::routes! {
    route index_route,
    route health_route,
}

#[get("/")]
pub async fn index_route() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::data(HashMap::from([("message", "Hello from watchtower")])))
}

/// Health check route
/// Answers as long as the process serves requests, the store is not queried.
#[get("/health")]
pub async fn health_route() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::data(HashMap::from([("status", "ok")])))
}

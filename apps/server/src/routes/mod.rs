use actix_web::{HttpRequest, HttpResponse, ResponseError, web};

use crate::error::ApiError;

mod health;
mod websites;

macros_utils::routes! {
    module health,
    module websites,
}

/// Paths served by a route, used to tell a wrong method from a wrong path
const KNOWN_PATHS: &[&str] = &["/", "/health", websites::WEBSITES_PATH, websites::BADGE_PATH];

/// Register every route along with the extractor error handlers and the
/// fallback for unmatched requests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|_, _| ApiError::BadRequest("Invalid request body".into()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|_, _| ApiError::BadRequest("Invalid query parameters".into()).into()),
    )
    .configure(routes)
    .default_service(web::to(fallback));
}

async fn fallback(req: HttpRequest) -> HttpResponse {
    let error = if KNOWN_PATHS.contains(&req.path()) {
        ApiError::MethodNotAllowed
    } else {
        ApiError::NotFound("Endpoint not found".into())
    };

    error.error_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::Value;
    use watchtower::{EngineConfig, MemoryStore, TargetService, TargetStore};

    use std::sync::Arc;

    #[actix_web::test]
    async fn test_unmatched_requests() {
        let targets = TargetService::new(TargetStore::new(Arc::new(MemoryStore::new())), &EngineConfig::default());
        let app = test::init_service(App::new().app_data(web::Data::new(targets)).configure(configure)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/nope").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({"success": false, "error": "Endpoint not found"}));

        let req = test::TestRequest::patch().uri("/api/websites").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({"success": false, "error": "Method not allowed"}));

        let req = test::TestRequest::post().uri("/api/websites/badge").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

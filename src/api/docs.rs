use axum::{http::header, routing::get, Router};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::AppError;

use super::{dto, handlers, AppState};

pub const OPENAPI_YAML_PATH: &str = "/swagger/openapi.yaml";
pub const OPENAPI_JSON_PATH: &str = "/swagger/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "subtally API",
        description = "Per-user subscription records and their cost over a range of months"
    ),
    paths(
        handlers::create_subscription,
        handlers::list_subscriptions,
        handlers::total_cost,
        handlers::get_subscription,
        handlers::update_subscription,
        handlers::delete_subscription,
        handlers::health,
    ),
    components(schemas(
        dto::SubscriptionRequest,
        dto::SubscriptionResponse,
        dto::CreatedResponse,
        dto::TotalResponse,
        dto::HealthResponse,
        dto::ErrorResponse,
        dto::ErrorDetail,
    )),
    tags(
        (name = "Subscriptions", description = "Subscription records and cost aggregation"),
        (name = "Health", description = "Liveness of the service and its database"),
    )
)]
pub struct ApiDoc;

/// Swagger UI at `/docs`, backed by the generated document.
pub fn docs_routes() -> Router<AppState> {
    Router::new()
        .merge(SwaggerUi::new("/docs").url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
        .route(OPENAPI_YAML_PATH, get(openapi_yaml))
}

async fn openapi_yaml() -> Result<([(header::HeaderName, &'static str); 1], String), AppError> {
    let yaml = ApiDoc::openapi()
        .to_yaml()
        .map_err(|e| AppError::Internal(format!("Failed to render OpenAPI document: {e}")))?;

    Ok(([(header::CONTENT_TYPE, "application/yaml")], yaml))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/subscriptions",
            "/subscriptions/total",
            "/subscriptions/{id}",
            "/health",
        ] {
            assert!(paths.contains(&expected), "missing {}", expected);
        }

        let item = &doc.paths.paths["/subscriptions/{id}"];
        assert!(item.get.is_some());
        assert!(item.put.is_some());
        assert!(item.delete.is_some());
    }
}

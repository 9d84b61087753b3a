//! # API REST
//!
//! REST API for the practice contact form.
//!
//! Handles:
//! - `POST /api/contact` (every other method gets `405`)
//! - `GET /health`
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns: status mapping, CORS, security headers, panic recovery
//!
//! Request screening, validation and email dispatch live in `fyl-core`; this crate only moves
//! bytes in and JSON out.

#![warn(rust_2018_idioms)]

mod error;

pub use error::{ApiError, GENERIC_ERROR};

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, HeaderName, HeaderValue},
        HeaderMap, Method, StatusCode,
    },
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use http_body_util::LengthLimitError;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{ContactReq, ContactSuccessRes, ErrorRes, HealthRes, HealthService};
use fyl_core::{
    constants::{MAX_BODY_SIZE, SUCCESS_MESSAGE},
    ContactError, ContactOutcome, ContactService, CoreConfig,
};

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<CoreConfig>,
    service: ContactService,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, service: ContactService) -> Self {
        Self { cfg, service }
    }

    fn expose_details(&self) -> bool {
        !self.cfg.mode().is_production()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, contact),
    components(schemas(HealthRes, ContactReq, ContactSuccessRes, ErrorRes))
)]
pub struct ApiDoc;

/// Build the application router with all layers applied.
pub fn router(state: AppState) -> Router {
    let production = state.cfg.mode().is_production();
    let cors = cors_layer(&state.cfg);

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/api/contact", post(contact).fallback(method_not_allowed))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        ));

    if production {
        app = app.layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
        ));
    }

    app.layer(cors).with_state(state)
}

/// Browsers may only call the API from the canonical site.
fn cors_layer(cfg: &CoreConfig) -> CorsLayer {
    let layer = match HeaderValue::from_str(cfg.base_url()) {
        Ok(origin) => CorsLayer::new().allow_origin(origin),
        Err(e) => {
            tracing::warn!("BASE_URL is not a valid CORS origin: {}", e);
            CorsLayer::new()
        }
    };
    layer
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

fn handle_panic(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("contact handler panicked");
    error::internal_error_response()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactReq,
    responses(
        (status = 200, description = "Request accepted (or silently discarded)", body = ContactSuccessRes),
        (status = 400, description = "Invalid content type, body or field", body = ErrorRes),
        (status = 403, description = "Cross-origin submission (production only)", body = ErrorRes),
        (status = 405, description = "Method other than POST", body = ErrorRes),
        (status = 413, description = "Body larger than 1 MiB", body = ErrorRes),
        (status = 429, description = "Too many requests from this client", body = ErrorRes),
        (status = 500, description = "Practice notification could not be sent", body = ErrorRes)
    )
)]
/// Submit an appointment request.
///
/// Headers are screened before the body is read, so oversized or unwanted requests are turned
/// away without buffering them.
///
/// # Errors
/// Returns the status and message of the first failing check; see [`ContactError`].
#[axum::debug_handler]
async fn contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<ContactSuccessRes>, ApiError> {
    let expose = state.expose_details();
    let fail = |e: ContactError| ApiError::new(e, expose);

    state.service.screen_headers(&headers).map_err(fail)?;

    let bytes = axum::body::to_bytes(body, MAX_BODY_SIZE)
        .await
        .map_err(|e| {
            if exceeded_body_limit(&e) {
                ContactError::PayloadTooLarge
            } else {
                tracing::error!("failed to read contact body: {}", e);
                ContactError::InvalidJson(e.to_string())
            }
        })
        .map_err(fail)?;

    let screened = state.service.screen_body(&bytes).map_err(fail)?;
    let outcome = state.service.submit(screened).await.map_err(fail)?;

    let message = match outcome {
        ContactOutcome::Delivered { .. } => Some(SUCCESS_MESSAGE.to_string()),
        ContactOutcome::Discarded => None,
    };
    Ok(Json(ContactSuccessRes {
        success: true,
        message,
    }))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorRes::new("Method not allowed")),
    )
}

fn exceeded_body_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

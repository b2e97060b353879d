//! Router assembly: CORS, rate limiting, body limits, request tracing.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::App;

mod http;

type IpGovernorConfig =
    tower_governor::governor::GovernorConfig<SmartIpKeyExtractor, NoOpMiddleware>;

pub fn router(app: Arc<App>) -> Router {
    let allow_any_origin = app.config.allowed_origins.iter().any(|origin| origin == "*");
    let cors_origins = app
        .config
        .allowed_origins
        .iter()
        .filter(|origin| *origin != "*")
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("invalid allowed origin: {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();

    let cors = if allow_any_origin {
        CorsLayer::new().allow_origin(AllowOrigin::any())
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(cors_origins))
    }
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let governor_conf = match (
        app.config.rate_limit_per_second,
        app.config.rate_limit_burst,
    ) {
        (Some(rate_per_second), Some(burst_size)) if rate_per_second > 0 && burst_size > 0 => {
            let nanos_per_request = (1_000_000_000u64 / rate_per_second).max(1);
            GovernorConfigBuilder::default()
                .period(Duration::from_nanos(nanos_per_request))
                .burst_size(burst_size)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .map(Arc::<IpGovernorConfig>::new)
        }
        _ => None,
    };

    let router = Router::new()
        .route("/healthz", get(http::healthz))
        .route("/metrics/http", get(http::http_metrics))
        .route("/api/balance", get(http::get_balance))
        .route("/api/balance/update", post(http::update_balance))
        .route("/api/moneyclicker/click", post(http::moneyclicker_click));

    let router = if app.config.dev_login {
        router.route("/api/session", post(http::dev_session))
    } else {
        router
    };

    let router = match governor_conf {
        Some(config) => router.layer(GovernorLayer { config }),
        None => router,
    };

    let router = router.layer(cors);
    let router = match app.config.body_limit_bytes {
        Some(limit) if limit > 0 => router.layer(DefaultBodyLimit::max(limit)),
        _ => router,
    };
    let router = router.layer(TraceLayer::new_for_http());

    router.with_state(app)
}

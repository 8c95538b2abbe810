use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::TraceLayer,
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Header carrying the request correlation id back to the caller.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Span-per-request tracing for the HTTP stack.
pub fn create_logging_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(tower_http::trace::DefaultMakeSpan::new().level(Level::DEBUG))
        .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::DEBUG))
}

/// Request/response logging middleware with correlation ids
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start_time = Instant::now();

    let user_id = request
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous")
        .to_string();

    tracing::debug!(
        correlation_id = %correlation_id,
        method = %method,
        uri = %uri,
        user_id = %user_id,
        "incoming request"
    );

    let mut response = next.run(request).await;

    let duration = start_time.elapsed();
    let status = response.status();

    if status.is_server_error() {
        tracing::warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis(),
            "request failed"
        );
    } else {
        tracing::info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis(),
            "request completed"
        );
    }

    if let Ok(value) = correlation_id.parse() {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    response
}

fn parse_level(log_level: &str) -> Option<Level> {
    match log_level.to_uppercase().as_str() {
        "TRACE" => Some(Level::TRACE),
        "DEBUG" => Some(Level::DEBUG),
        "INFO" => Some(Level::INFO),
        "WARN" | "WARNING" => Some(Level::WARN),
        "ERROR" => Some(Level::ERROR),
        _ => None,
    }
}

/// Filter directives derived from the configured level; they take precedence over `RUST_LOG`.
fn filter_directives(level: Level) -> String {
    format!("grc_backend={},tower_http=info,sqlx=warn", level)
}

/// Install the global subscriber, JSON or plain text.
pub fn init_logging(log_level: &str, log_format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let level = parse_level(log_level).unwrap_or_else(|| {
        eprintln!("Invalid log level '{}', defaulting to INFO", log_level);
        Level::INFO
    });

    let env_filter = tracing_subscriber::EnvFilter::try_new(filter_directives(level))?;
    let subscriber = tracing_subscriber::registry().with(env_filter);

    match log_format.to_lowercase().as_str() {
        "plain" | "text" => {
            let plain_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true);

            subscriber.with(plain_layer).try_init()?;
        }
        _ => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_thread_ids(true);

            subscriber.with(json_layer).try_init()?;
        }
    }

    tracing::info!(
        log_level = %log_level,
        log_format = %log_format,
        "logging initialized"
    );

    Ok(())
}

use crate::auth::{context::UserContext, rbac::Role};
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ORGANIZATION_ID_HEADER: &str = "x-organization-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Identity middleware
/// Checks the API key (when keys are configured), then attaches the identity
/// forwarded by the gateway as a [`UserContext`] extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let settings = &state.config;

    if !settings.api_keys.is_empty() {
        let key_ok = headers
            .get(settings.api_key_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map_or(false, |key| settings.api_keys.iter().any(|k| k == key));

        if !key_ok {
            tracing::debug!("API key missing or invalid");
            return Err(ApiError::authentication("Missing or invalid API key"));
        }
    }

    let context = identity_from_headers(&headers)?;
    tracing::debug!(
        user_id = %context.user_id,
        organization_id = %context.organization_id,
        role = %context.role,
        "request authenticated"
    );

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Build the caller identity from the forwarded headers.
pub fn identity_from_headers(headers: &HeaderMap) -> Result<UserContext, ApiError> {
    let user_id = uuid_header(headers, USER_ID_HEADER)?;
    let organization_id = uuid_header(headers, ORGANIZATION_ID_HEADER)?;

    let role_value = header_str(headers, USER_ROLE_HEADER)?;
    let role = Role::parse(role_value)
        .ok_or_else(|| ApiError::authentication(format!("Unknown role '{}'", role_value)))?;

    let mut context = UserContext::new(user_id, organization_id, role);
    context.email = headers
        .get(USER_EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    Ok(context)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::authentication(format!("Missing {} header", name)))
}

fn uuid_header(headers: &HeaderMap, name: &str) -> Result<Uuid, ApiError> {
    let value = header_str(headers, name)?;
    Uuid::parse_str(value)
        .map_err(|_| ApiError::authentication(format!("Malformed {} header", name)))
}

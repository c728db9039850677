use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};

use keygate_core::ServiceError;

use crate::api::{AppState, authorization, cookies};
use crate::model::{IssuedSession, LoginRequest, TokenResponse};
use crate::service::SessionService;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

type SessionResponse = ([(axum::http::HeaderName, String); 1], Json<TokenResponse>);

/// Access token in the body, refresh token only in the cookie.
fn session_response(svc: &SessionService, session: &IssuedSession) -> SessionResponse {
    let cookie = svc
        .config()
        .cookie
        .issue(&session.refresh_token, session.refresh_expires_in);
    ([(SET_COOKIE, cookie)], Json(TokenResponse::from(session)))
}

/// POST /session/login: exchange credentials for a session.
async fn login(
    State(svc): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<SessionResponse, ServiceError> {
    let session = svc.login(&input).map_err(ServiceError::from)?;
    Ok(session_response(&svc, &session))
}

/// POST /session/refresh: rotate the session using the refresh cookie.
async fn refresh(
    State(svc): State<AppState>,
    headers: HeaderMap,
) -> Result<SessionResponse, ServiceError> {
    let cookie_header = cookies(&headers);
    let session = svc
        .refresh(cookie_header.as_deref())
        .map_err(ServiceError::from)?;
    Ok(session_response(&svc, &session))
}

/// POST /session/logout: verify both credentials and drop the cookie.
async fn logout(
    State(svc): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1]), ServiceError> {
    let cookie_header = cookies(&headers);
    svc.logout(authorization(&headers), cookie_header.as_deref())
        .map_err(ServiceError::from)?;
    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, svc.config().cookie.clear())]))
}

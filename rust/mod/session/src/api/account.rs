use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};

use keygate_core::ServiceError;

use crate::api::{AppState, authorization};
use crate::model::{ConfirmRequest, EmailRequest, Profile, RegisterRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/confirm", post(confirm))
        .route("/confirm/resend", post(resend_confirmation))
        .route("/profile", get(profile))
}

/// POST /session/register: create an unconfirmed account.
async fn register(
    State(svc): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServiceError> {
    let reg = svc.register(&input).map_err(ServiceError::from)?;
    let mut body = serde_json::json!({ "ukey": reg.account.ukey });
    if svc.config().expose_email_tokens {
        body["confirm_token"] = reg.confirm_token.into();
    }
    Ok((StatusCode::CREATED, Json(body)))
}

/// POST /session/confirm/resend: mail a new confirmation token.
async fn resend_confirmation(
    State(svc): State<AppState>,
    Json(input): Json<EmailRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let token = svc.resend_confirmation(&input.email).map_err(ServiceError::from)?;
    let mut body = serde_json::json!({ "sent": true });
    if svc.config().expose_email_tokens {
        body["confirm_token"] = token.into();
    }
    Ok(Json(body))
}

/// POST /session/confirm: redeem a confirmation token.
async fn confirm(
    State(svc): State<AppState>,
    Json(input): Json<ConfirmRequest>,
) -> Result<Json<Profile>, ServiceError> {
    let profile = svc.confirm(&input).map_err(ServiceError::from)?;
    Ok(Json(profile))
}

/// GET /session/profile: the bearer's own account.
async fn profile(
    State(svc): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Profile>, ServiceError> {
    let profile = svc.profile(authorization(&headers)).map_err(ServiceError::from)?;
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::build_router;
    use crate::api::testing::call;
    use crate::service::SessionConfig;
    use crate::service::testing::{service, service_with};

    fn register_body(email: &str) -> serde_json::Value {
        json!({"email": email, "password": "p1", "confirmation": "p1"})
    }

    #[tokio::test]
    async fn test_register_errors() {
        let (svc, _) = service();
        let r = build_router(svc);

        let (s, _, _) = call(&r, "POST", "/register", &[], Some(register_body("a@x.com"))).await;
        assert_eq!(s, StatusCode::CREATED);

        let (s, _, body) =
            call(&r, "POST", "/register", &[], Some(register_body("a@x.com"))).await;
        assert_eq!(s, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ALREADY_EXISTS");

        let (s, _, body) = call(
            &r,
            "POST",
            "/register",
            &[],
            Some(json!({"email": "b@x.com", "password": "p1", "confirmation": "p2"})),
        )
        .await;
        assert_eq!(s, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn test_exposed_tokens_in_development() {
        let config = SessionConfig {
            expose_email_tokens: true,
            ..Default::default()
        };
        let (svc, mailer) = service_with(config);
        let r = build_router(svc);

        let (_, _, body) = call(&r, "POST", "/register", &[], Some(register_body("a@x.com"))).await;
        assert_eq!(body["confirm_token"], json!(mailer.last_token().unwrap()));

        let (s, _, body) = call(
            &r,
            "POST",
            "/confirm/resend",
            &[],
            Some(json!({"email": "a@x.com"})),
        )
        .await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["sent"], true);
        assert_eq!(body["confirm_token"], json!(mailer.last_token().unwrap()));
    }

    #[tokio::test]
    async fn test_confirm_and_resend_status_codes() {
        let (svc, mailer) = service();
        let r = build_router(svc);

        let (s, _, _) = call(
            &r,
            "POST",
            "/confirm/resend",
            &[],
            Some(json!({"email": "ghost@x.com"})),
        )
        .await;
        assert_eq!(s, StatusCode::NOT_FOUND);

        call(&r, "POST", "/register", &[], Some(register_body("a@x.com"))).await;
        let token = mailer.last_token().unwrap();
        let confirm = json!({"token": token, "email": "a@x.com"});

        let (s, _, _) = call(&r, "POST", "/confirm", &[], Some(confirm.clone())).await;
        assert_eq!(s, StatusCode::OK);
        let (s, _, _) = call(&r, "POST", "/confirm", &[], Some(confirm)).await;
        assert_eq!(s, StatusCode::CONFLICT);

        let (s, _, body) = call(
            &r,
            "POST",
            "/confirm/resend",
            &[],
            Some(json!({"email": "a@x.com"})),
        )
        .await;
        assert_eq!(s, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "not authorized");
    }
}

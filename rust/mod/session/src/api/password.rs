use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};

use keygate_core::ServiceError;

use crate::api::{AppState, authorization};
use crate::model::{ChangePasswordRequest, EmailRequest, ResetPasswordRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/password/forgot", post(forgot_password))
        .route("/password/reset", post(reset_password))
        .route("/password/change", post(change_password))
}

async fn forgot_password(
    State(svc): State<AppState>,
    Json(input): Json<EmailRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let token = svc.forgot_password(&input.email).map_err(ServiceError::from)?;
    let mut body = serde_json::json!({ "sent": true });
    if svc.config().expose_email_tokens {
        body["reset_token"] = token.into();
    }
    Ok(Json(body))
}

async fn reset_password(
    State(svc): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ServiceError> {
    svc.reset_password(&input).map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_password(
    State(svc): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ServiceError> {
    svc.change_password(authorization(&headers), &input)
        .map_err(ServiceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::build_router;
    use crate::api::testing::call;
    use crate::model::{ConfirmRequest, RegisterRequest};
    use crate::service::testing::service;

    #[tokio::test]
    async fn test_forgot_reset_change() {
        let (svc, mailer) = service();
        let reg = svc
            .register(&RegisterRequest {
                email: "a@x.com".into(),
                password: "p1".into(),
                confirmation: "p1".into(),
            })
            .unwrap();
        svc.confirm(&ConfirmRequest {
            token: reg.confirm_token,
            email: "a@x.com".into(),
        })
        .unwrap();
        let r = build_router(svc);

        let (s, _, _) = call(
            &r,
            "POST",
            "/password/forgot",
            &[],
            Some(json!({"email": "ghost@x.com"})),
        )
        .await;
        assert_eq!(s, StatusCode::NOT_FOUND);

        let (s, _, body) = call(
            &r,
            "POST",
            "/password/forgot",
            &[],
            Some(json!({"email": "a@x.com"})),
        )
        .await;
        assert_eq!(s, StatusCode::OK);
        assert!(body.get("reset_token").is_none());

        let reset = json!({
            "token": mailer.last_token().unwrap(),
            "password": "p2",
            "confirmation": "p2",
        });
        let (s, _, _) = call(&r, "POST", "/password/reset", &[], Some(reset)).await;
        assert_eq!(s, StatusCode::NO_CONTENT);

        let (s, _, body) = call(
            &r,
            "POST",
            "/login",
            &[],
            Some(json!({"email": "a@x.com", "password": "p2"})),
        )
        .await;
        assert_eq!(s, StatusCode::OK);
        let auth = format!("Bearer {}", body["access_token"].as_str().unwrap());

        let (s, _, _) = call(
            &r,
            "POST",
            "/password/change",
            &[("authorization", auth.as_str())],
            Some(json!({"old_password": "p2", "password": "p2", "confirmation": "p2"})),
        )
        .await;
        assert_eq!(s, StatusCode::BAD_REQUEST);

        let (s, _, _) = call(
            &r,
            "POST",
            "/password/change",
            &[("authorization", auth.as_str())],
            Some(json!({"old_password": "p2", "password": "p3", "confirmation": "p3"})),
        )
        .await;
        assert_eq!(s, StatusCode::NO_CONTENT);

        let (s, _, _) = call(
            &r,
            "POST",
            "/password/change",
            &[],
            Some(json!({"old_password": "p3", "password": "p4", "confirmation": "p4"})),
        )
        .await;
        assert_eq!(s, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reset_with_garbage_token() {
        let (svc, _) = service();
        let r = build_router(svc);
        let (s, _, body) = call(
            &r,
            "POST",
            "/password/reset",
            &[],
            Some(json!({"token": "junk", "password": "p2", "confirmation": "p2"})),
        )
        .await;
        assert_eq!(s, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }
}

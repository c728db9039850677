mod account;
mod password;
mod session;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};

use crate::service::SessionService;

/// Shared application state.
pub type AppState = Arc<SessionService>;

/// Build the session API router.
///
/// All routes are relative; the caller nests them under `/session`.
pub fn build_router(svc: Arc<SessionService>) -> Router {
    Router::new()
        .merge(account::routes())
        .merge(session::routes())
        .merge(password::routes())
        .with_state(svc)
}

/// The `Authorization` header, only when exactly one is present.
pub(crate) fn authorization(headers: &HeaderMap) -> Option<&str> {
    let mut values = headers.get_all(AUTHORIZATION).iter();
    match (values.next(), values.next()) {
        (Some(v), None) => v.to_str().ok(),
        _ => None,
    }
}

/// All `Cookie` headers folded into one list.
pub(crate) fn cookies(headers: &HeaderMap) -> Option<String> {
    let parts: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    /// One request against the router: (status, set-cookie, json body).
    pub async fn call(
        router: &axum::Router,
        method: &str,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> (StatusCode, Option<String>, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_string(&v).unwrap())
            }
            None => Body::empty(),
        };
        let resp = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let cookie = resp
            .headers()
            .get("set-cookie")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::json!(null)
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::json!(null))
        };
        (status, cookie, json)
    }

    /// `name=value` from a Set-Cookie header.
    pub fn cookie_pair(set_cookie: &str) -> String {
        set_cookie.split(';').next().unwrap().to_string()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};
    use serde_json::json;

    use super::testing::{call, cookie_pair};
    use super::*;
    use crate::service::testing::service;

    #[test]
    fn test_authorization_requires_single_header() {
        let mut h = HeaderMap::new();
        assert_eq!(authorization(&h), None);
        h.append(AUTHORIZATION, HeaderValue::from_static("Bearer a"));
        assert_eq!(authorization(&h), Some("Bearer a"));
        h.append(AUTHORIZATION, HeaderValue::from_static("Bearer b"));
        assert_eq!(authorization(&h), None);
    }

    #[test]
    fn test_cookie_headers_are_joined() {
        let mut h = HeaderMap::new();
        assert_eq!(cookies(&h), None);
        h.append(COOKIE, HeaderValue::from_static("a=1"));
        h.append(COOKIE, HeaderValue::from_static("b=2; c=3"));
        assert_eq!(cookies(&h).as_deref(), Some("a=1; b=2; c=3"));
    }

    #[tokio::test]
    async fn test_full_lifecycle_over_http() {
        let (svc, mailer) = service();
        let r = build_router(svc);

        let (s, _, body) = call(
            &r,
            "POST",
            "/register",
            &[],
            Some(json!({"email": "a@x.com", "password": "p1", "confirmation": "p1"})),
        )
        .await;
        assert_eq!(s, StatusCode::CREATED);
        let ukey = body["ukey"].as_str().unwrap().to_string();
        assert!(body.get("confirm_token").is_none());

        let confirm_token = mailer.last_token().unwrap();
        let (s, _, body) = call(
            &r,
            "POST",
            "/confirm",
            &[],
            Some(json!({"token": confirm_token, "email": "a@x.com"})),
        )
        .await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["confirmed"], true);

        let (s, set_cookie, body) = call(
            &r,
            "POST",
            "/login",
            &[],
            Some(json!({"email": "a@x.com", "password": "p1"})),
        )
        .await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["ukey"], ukey);
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["expires_in"], 900);
        assert!(body.get("refresh_token").is_none());
        let set_cookie = set_cookie.unwrap();
        assert!(set_cookie.contains("Max-Age=604800"));
        assert!(set_cookie.contains("HttpOnly"));
        let r0 = cookie_pair(&set_cookie);
        let access0 = body["access_token"].as_str().unwrap().to_string();

        let (s, set_cookie, body) = call(
            &r,
            "POST",
            "/refresh",
            &[("cookie", r0.as_str())],
            None,
        )
        .await;
        assert_eq!(s, StatusCode::OK);
        let r1 = cookie_pair(&set_cookie.unwrap());
        let access1 = format!("Bearer {}", body["access_token"].as_str().unwrap());

        let (s, _, body) = call(
            &r,
            "POST",
            "/refresh",
            &[("cookie", r0.as_str())],
            None,
        )
        .await;
        assert_eq!(s, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "not authorized");

        let stale = format!("Bearer {access0}");
        let (s, _, _) = call(
            &r,
            "GET",
            "/profile",
            &[("authorization", stale.as_str())],
            None,
        )
        .await;
        assert_eq!(s, StatusCode::UNAUTHORIZED);

        let (s, _, body) = call(
            &r,
            "GET",
            "/profile",
            &[("authorization", access1.as_str())],
            None,
        )
        .await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body, json!({"ukey": ukey, "email": "a@x.com", "confirmed": true}));

        let (s, set_cookie, _) = call(
            &r,
            "POST",
            "/logout",
            &[("authorization", access1.as_str()), ("cookie", r1.as_str())],
            None,
        )
        .await;
        assert_eq!(s, StatusCode::NO_CONTENT);
        assert!(set_cookie.unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_auth_failures_share_one_shape() {
        let (svc, _) = service();
        let r = build_router(svc);

        let attempts: Vec<Vec<(&str, &str)>> = vec![
            vec![],
            vec![("authorization", "Bearer")],
            vec![("authorization", "Basic abc")],
            vec![("authorization", "Bearer not.a.jwt")],
            vec![("authorization", "Bearer x"), ("authorization", "Bearer y")],
        ];
        let mut seen = Vec::new();
        for headers in attempts {
            let (s, _, body) = call(&r, "GET", "/profile", &headers, None).await;
            seen.push((s, body));
        }
        assert!(seen.iter().all(|(s, _)| *s == StatusCode::UNAUTHORIZED));
        assert!(seen.windows(2).all(|w| w[0].1 == w[1].1));
        assert_eq!(
            seen[0].1,
            json!({"code": "UNAUTHENTICATED", "message": "not authorized"})
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_client_error() {
        let (svc, _) = service();
        let r = build_router(svc);
        let (s, _, _) = call(&r, "POST", "/login", &[], Some(json!({"email": 1}))).await;
        assert!(s.is_client_error());
    }
}

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::TestApp;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, cookie, json)
}

fn json_request(method: &str, uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn signup(app: &Router, name: &str, email: &str, role: &str) -> String {
    let (status, cookie, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/signup",
            &json!({"name": name, "email": email, "password": "Secret12!", "role": role}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    cookie.expect("signup sets a session cookie")
}

#[tokio::test]
async fn test_signup_then_me() {
    let app = TestApp::spawn().await;
    let router = app.router().await;

    let (status, cookie, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/signup",
            &json!({"name": "Ana", "email": "ana@x.com", "password": "Secret12!", "role": "architect"}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["outcome"], "incomplete");
    assert_eq!(body["data"]["account"]["category"], "Planning");
    assert_eq!(body["data"]["account"]["sub_category"], "Architect");

    let cookie = cookie.expect("session cookie");
    let (status, _, body) = send(&router, get("/api/auth/me", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ana@x.com");
    assert_eq!(body["data"]["role"], "architect");
}

#[tokio::test]
async fn test_me_requires_session() {
    let app = TestApp::spawn().await;
    let router = app.router().await;

    let (status, _, body) = send(&router, get("/api/auth/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_duplicate_signup_is_conflict() {
    let app = TestApp::spawn().await;
    let router = app.router().await;
    signup(&router, "Ana", "ana@x.com", "architect").await;

    let (status, _, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/signup",
            &json!({"name": "Ana", "email": "ana@x.com", "password": "Other123!", "role": "plumber"}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");
    assert_eq!(body["code"], "duplicate_email");
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let app = TestApp::spawn().await;
    let router = app.router().await;

    let (status, _, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/signup",
            &json!({"name": "Ana", "email": "ana@x.com", "password": "Secret12!"}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["code"], "missing_field");
}

#[tokio::test]
async fn test_login_errors_are_generic() {
    let app = TestApp::spawn().await;
    let router = app.router().await;
    signup(&router, "Ana", "ana@x.com", "architect").await;

    let (wrong_status, _, wrong_body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/login",
            &json!({"email": "ana@x.com", "password": "Wrong123!"}),
            None,
        ),
    )
    .await;
    let (unknown_status, _, unknown_body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/login",
            &json!({"email": "nobody@x.com", "password": "Secret12!"}),
            None,
        ),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["code"], "invalid_credentials");
}

#[tokio::test]
async fn test_profile_completion_over_http() {
    let app = TestApp::spawn().await;
    let router = app.router().await;
    let cookie = signup(&router, "Ana", "ana@x.com", "architect").await;

    let (status, _, body) = send(
        &router,
        json_request(
            "PUT",
            "/api/onboarding/profile",
            &json!({"bio": "Passive houses", "experience_years": 7}),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "complete");
    assert_eq!(body["data"]["role"], "architect");
    assert_eq!(body["data"]["account"]["profile_completed"], true);

    let (status, _, _) = send(
        &router,
        json_request("PUT", "/api/onboarding/profile", &json!({"bio": "x"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_recovery_over_http() {
    let app = TestApp::spawn().await;
    let router = app.router().await;
    signup(&router, "Ana", "ana@x.com", "architect").await;

    let (status, _, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/forgot-password",
            &json!({"email": "ana@x.com"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "challenge_issued");

    let code = app.notifier.recovery_code_for("ana@x.com").await;
    let (status, _, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/reset-password",
            &json!({"email": "ana@x.com", "code": code, "new_password": "NewSecret1!"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "challenge_consumed");

    let (status, _, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/reset-password",
            &json!({"email": "ana@x.com", "code": code, "new_password": "NewSecret1!"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "challenge");
    assert_eq!(body["code"], "challenge_mismatch");

    let (status, _, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/forgot-password",
            &json!({"email": "nobody@x.com"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "account_not_found");
}

#[tokio::test]
async fn test_provider_login_and_role_selection() {
    let app = TestApp::spawn().await;
    app.idp.accept("tok-bo", "sub-bo", "bo@x.com", "Bo");
    let router = app.router().await;

    let (status, cookie, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/provider",
            &json!({"access_token": "tok-bo"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "incomplete");
    let cookie = cookie.expect("session cookie");

    let (status, _, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/provider/role",
            &json!({"role": "land_owner"}),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "complete");
    assert_eq!(body["data"]["role"], "land_owner");
    assert_eq!(body["data"]["account"]["category"], "Land Owner");

    let (status, _, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/provider",
            &json!({"access_token": "nope"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "external_dependency");
    assert_eq!(body["code"], "invalid_external_token");
}

async fn provider_session(app: &TestApp, router: &Router, token: &str) -> (String, String) {
    let (status, cookie, body) = send(
        router,
        json_request("POST", "/api/auth/provider", &json!({"access_token": token}), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let id = body["data"]["account"]["id"].as_str().unwrap().to_string();
    assert!(app.shared.store.get_account_by_id(&id).await.unwrap().is_some());
    (cookie.expect("session cookie"), id)
}

#[tokio::test]
async fn test_provider_role_requires_session() {
    let app = TestApp::spawn().await;
    app.idp.accept("tok-vi", "sub-vi", "vi@x.com", "Vi");
    let router = app.router().await;
    let (_, victim_id) = provider_session(&app, &router, "tok-vi").await;

    let (status, cookie, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/provider/role",
            &json!({"account_id": victim_id, "role": "admin"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(cookie.is_none());

    let stored = app.shared.store.get_account_by_id(&victim_id).await.unwrap().unwrap();
    assert_eq!(stored.role_category, None);
    assert!(!app.shared.store.admin_exists().await.unwrap());
}

#[tokio::test]
async fn test_provider_role_rejects_foreign_account_id() {
    let app = TestApp::spawn().await;
    app.idp.accept("tok-a", "sub-a", "a@x.com", "A");
    app.idp.accept("tok-b", "sub-b", "b@x.com", "B");
    let router = app.router().await;
    let (cookie_a, id_a) = provider_session(&app, &router, "tok-a").await;
    let (_, id_b) = provider_session(&app, &router, "tok-b").await;

    let (status, _, _) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/provider/role",
            &json!({"account_id": id_b, "role": "admin"}),
            Some(&cookie_a),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let stored_b = app.shared.store.get_account_by_id(&id_b).await.unwrap().unwrap();
    assert_eq!(stored_b.role_category, None);

    // The session is still bound to A.
    let (_, _, me) = send(&router, get("/api/auth/me", Some(&cookie_a))).await;
    assert_eq!(me["data"]["id"], id_a.as_str());

    let (status, _, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/provider/role",
            &json!({"account_id": id_a, "role": "plumber"}),
            Some(&cookie_a),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["account"]["email"], "a@x.com");
}

#[tokio::test]
async fn test_admin_status_route_is_admin_only() {
    let app = TestApp::spawn().await;
    let router = app.router().await;
    let admin_cookie = signup(&router, "Root", "root@x.com", "admin").await;
    let ana_cookie = signup(&router, "Ana", "ana@x.com", "architect").await;

    let (_, _, me) = send(&router, get("/api/auth/me", Some(&ana_cookie))).await;
    let ana_id = me["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/admin/accounts/{ana_id}/status");

    let (status, _, body) = send(
        &router,
        json_request("PUT", &uri, &json!({"status": "suspended"}), Some(&ana_cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, _, body) = send(
        &router,
        json_request("PUT", &uri, &json!({"status": "approved"}), Some(&admin_cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");
}

#[tokio::test]
async fn test_resume_upload() {
    let app = TestApp::spawn().await;
    let router = app.router().await;
    let cookie = signup(&router, "Ana", "ana@x.com", "architect").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/onboarding/resume?filename=my%20cv.pdf")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/pdf")
        .body(Body::from("%PDF-1.4 fake"))
        .unwrap();
    let (status, _, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let path = body["data"]["path"].as_str().unwrap().to_string();
    assert!(path.ends_with("_my_cv.pdf"));
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 fake");

    let (status, _, body) = send(
        &router,
        json_request(
            "PUT",
            "/api/onboarding/profile",
            &json!({"resume_path": path}),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "complete");
}

#[tokio::test]
async fn test_roles_and_health() {
    let app = TestApp::spawn().await;
    let router = app.router().await;

    let (status, _, body) = send(&router, get("/api/roles", None)).await;
    assert_eq!(status, StatusCode::OK);
    let roles = body["data"].as_array().unwrap();
    assert_eq!(roles.len(), 14);
    assert!(roles.iter().any(|r| r["key"] == "architect" && r["category"] == "Planning"));

    let (status, _, body) = send(&router, get("/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::spawn().await;
    let router = app.router().await;
    let cookie = signup(&router, "Ana", "ana@x.com", "architect").await;

    let (status, _, _) = send(
        &router,
        Request::builder()
            .method("POST")
            .uri("/api/auth/logout")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&router, get("/api/auth/me", Some(&cookie))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

//! # HTTP 路由集成测试
//!
//! 直接驱动完整的 axum 路由：鉴权、角色白名单与统一响应格式

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use entity::enums::TalentType;
use sipodi::management::build_router;
use sipodi::testing::*;

struct Reply {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Value,
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        headers,
        body,
    }
}

fn router_of(app: &TestApp) -> Router {
    build_router(Arc::clone(&app.context))
}

#[tokio::test]
async fn test_health_and_ping() {
    let app = TestApp::new().await.unwrap();
    let router = router_of(&app);

    let reply = send(&router, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "status": "ok" }));
    assert!(reply.headers.contains_key("x-request-id"));

    let response = router
        .clone()
        .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"pong");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new().await.unwrap();
    let response = router_of(&app)
        .oneshot(
            Request::get("/api/v1/health")
                .header("x-request-id", "req-sipodi-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-sipodi-1");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new().await.unwrap();
    let router = router_of(&app);

    let reply = send(&router, Method::GET, "/api/v1/me", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["success"], json!(false));
    assert_eq!(reply.body["error"]["code"], json!("UNAUTHORIZED"));
    assert_eq!(reply.body["error"]["message"], json!("Token tidak ditemukan"));

    let reply = send(&router, Method::GET, "/api/v1/me", Some("bukan.jwt.valid"), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_gate_rejects_gtk() {
    let app = TestApp::new().await.unwrap();
    let school = SchoolFixture::new().insert(app.db()).await.unwrap();
    let gtk = UserFixture::gtk(school.id).insert(app.db()).await.unwrap();
    let tokens = app.login(&gtk.email, DEFAULT_PASSWORD).await.unwrap();
    let router = router_of(&app);

    let reply = send(
        &router,
        Method::GET,
        "/api/v1/users",
        Some(&tokens.access_token),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["error"]["code"], json!("FORBIDDEN"));

    let reply = send(
        &router,
        Method::GET,
        "/api/v1/verifications/talents",
        Some(&tokens.access_token),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = send(
        &router,
        Method::GET,
        "/api/v1/me/talents",
        Some(&tokens.access_token),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["pagination"]["total"], json!(0));
}

#[tokio::test]
async fn test_login_sets_refresh_cookie() {
    let app = TestApp::new().await.unwrap();
    let user = UserFixture::new()
        .email("budi@sipodi.test")
        .insert(app.db())
        .await
        .unwrap();
    let router = router_of(&app);

    let reply = send(
        &router,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "budi@sipodi.test", "password": DEFAULT_PASSWORD })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["token_type"], json!("Bearer"));
    assert_eq!(reply.body["data"]["user"]["id"], json!(user.id));
    let access_token = reply.body["data"]["access_token"].as_str().unwrap();
    assert!(app.authenticate(access_token).is_ok());

    let cookie = reply.headers[header::SET_COOKIE].to_str().unwrap();
    let refresh_token = reply.body["data"]["refresh_token"].as_str().unwrap();
    assert!(cookie.starts_with(&format!("refresh_token={refresh_token}")));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Secure"));

    // 只带 cookie 刷新
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/auth/refresh")
                .header(header::COOKIE, format!("refresh_token={refresh_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_validation_envelope_lists_fields() {
    let app = TestApp::new().await.unwrap();
    let reply = send(
        &router_of(&app),
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "bukan-email", "password": "" })),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(reply.body["error"]["code"], json!("VALIDATION_ERROR"));
    let fields: Vec<&str> = reply.body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
}

#[tokio::test]
async fn test_submit_and_approve_over_http() {
    let app = TestApp::new().await.unwrap();
    let school = SchoolFixture::new().insert(app.db()).await.unwrap();
    let admin = UserFixture::school_admin(school.id)
        .insert(app.db())
        .await
        .unwrap();
    let gtk = UserFixture::gtk(school.id).insert(app.db()).await.unwrap();
    let gtk_token = app
        .login(&gtk.email, DEFAULT_PASSWORD)
        .await
        .unwrap()
        .access_token;
    let admin_token = app
        .login(&admin.email, DEFAULT_PASSWORD)
        .await
        .unwrap()
        .access_token;
    let router = router_of(&app);

    let reply = send(
        &router,
        Method::POST,
        "/api/v1/me/talents",
        Some(&gtk_token),
        Some(json!({
            "talent_type": TalentType::MinatBakat,
            "detail": sample_detail(TalentType::MinatBakat),
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["data"]["status"], json!("pending"));
    let talent_id = reply.body["data"]["id"].as_str().unwrap().to_string();

    // 管理员不能以 GTK 身份申报
    let reply = send(
        &router,
        Method::POST,
        "/api/v1/me/talents",
        Some(&admin_token),
        Some(json!({ "talent_type": "minat_bakat", "detail": {} })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = send(
        &router,
        Method::POST,
        &format!("/api/v1/verifications/talents/{talent_id}/approve"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["status"], json!("approved"));

    let reply = send(
        &router,
        Method::GET,
        "/api/v1/me/notifications/unread-count",
        Some(&gtk_token),
        None,
    )
    .await;
    assert_eq!(reply.body["data"]["unread_count"], json!(1));

    let reply = send(
        &router,
        Method::POST,
        "/api/v1/verifications/talents/bukan-uuid/approve",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"]["code"], json!("INVALID_REQUEST"));
}

/// 预签名、直传、确认后返回已确认的文件地址
async fn upload_confirmed(
    app: &TestApp,
    router: &Router,
    token: &str,
    upload: Value,
    size: u64,
) -> (String, String) {
    let content_type = upload["content_type"].as_str().unwrap().to_string();
    let reply = send(router, Method::POST, "/api/v1/uploads/presign", Some(token), Some(upload)).await;
    assert_eq!(reply.status, StatusCode::OK);
    let upload_id = reply.body["data"]["upload_id"].as_str().unwrap().to_string();
    let object_key = reply.body["data"]["object_key"].as_str().unwrap();

    app.storage.put_object(object_key, size, &content_type).await;

    let reply = send(
        router,
        Method::POST,
        &format!("/api/v1/uploads/{upload_id}/confirm"),
        Some(token),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let file_url = reply.body["data"]["file_url"].as_str().unwrap().to_string();
    (upload_id, file_url)
}

#[tokio::test]
async fn test_confirmed_certificate_is_attached_to_talent() {
    let app = TestApp::new().await.unwrap();
    let school = SchoolFixture::new().insert(app.db()).await.unwrap();
    let gtk = UserFixture::gtk(school.id).insert(app.db()).await.unwrap();
    let token = app
        .login(&gtk.email, DEFAULT_PASSWORD)
        .await
        .unwrap()
        .access_token;
    let router = router_of(&app);

    let (upload_id, file_url) = upload_confirmed(
        &app,
        &router,
        &token,
        json!({
            "filename": "piagam.pdf",
            "content_type": "application/pdf",
            "upload_type": "talent_certificate",
        }),
        256 * 1024,
    )
    .await;

    // 明细无效时票据被归还，可再次使用
    let reply = send(
        &router,
        Method::POST,
        "/api/v1/me/talents",
        Some(&token),
        Some(json!({
            "talent_type": "minat_bakat",
            "detail": {},
            "upload_id": upload_id,
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);

    let reply = send(
        &router,
        Method::POST,
        "/api/v1/me/talents",
        Some(&token),
        Some(json!({
            "talent_type": "minat_bakat",
            "detail": sample_detail(TalentType::MinatBakat),
            "upload_id": upload_id,
            "certificate_url": "http://elsewhere.test/palsu.pdf",
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["data"]["certificate_url"], json!(file_url));

    // 同一上传只能认领一次
    let reply = send(
        &router,
        Method::POST,
        "/api/v1/me/talents",
        Some(&token),
        Some(json!({
            "talent_type": "minat_bakat",
            "detail": sample_detail(TalentType::MinatBakat),
            "upload_id": upload_id,
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(reply.body["error"]["details"][0]["field"], json!("upload_id"));
}

#[tokio::test]
async fn test_raw_certificate_url_is_ignored() {
    let app = TestApp::new().await.unwrap();
    let school = SchoolFixture::new().insert(app.db()).await.unwrap();
    let gtk = UserFixture::gtk(school.id).insert(app.db()).await.unwrap();
    let token = app
        .login(&gtk.email, DEFAULT_PASSWORD)
        .await
        .unwrap()
        .access_token;

    let reply = send(
        &router_of(&app),
        Method::POST,
        "/api/v1/me/talents",
        Some(&token),
        Some(json!({
            "talent_type": "minat_bakat",
            "detail": sample_detail(TalentType::MinatBakat),
            "certificate_url": "http://elsewhere.test/palsu.pdf",
        })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["data"]["certificate_url"], Value::Null);
}

#[tokio::test]
async fn test_photo_requires_confirmed_upload() {
    let app = TestApp::new().await.unwrap();
    let user = UserFixture::new().insert(app.db()).await.unwrap();
    let token = app
        .login(&user.email, DEFAULT_PASSWORD)
        .await
        .unwrap()
        .access_token;
    let router = router_of(&app);

    let reply = send(
        &router,
        Method::PATCH,
        "/api/v1/me/photo",
        Some(&token),
        Some(json!({ "photo_url": "http://elsewhere.test/foto.png" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);

    // 证书上传不能用作头像
    let (certificate_id, _) = upload_confirmed(
        &app,
        &router,
        &token,
        json!({
            "filename": "piagam.png",
            "content_type": "image/png",
            "upload_type": "talent_certificate",
        }),
        1024,
    )
    .await;
    let reply = send(
        &router,
        Method::PATCH,
        "/api/v1/me/photo",
        Some(&token),
        Some(json!({ "upload_id": certificate_id })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);

    let (upload_id, file_url) = upload_confirmed(
        &app,
        &router,
        &token,
        json!({
            "filename": "foto.png",
            "content_type": "image/png",
            "upload_type": "profile_photo",
        }),
        64 * 1024,
    )
    .await;
    let reply = send(
        &router,
        Method::PATCH,
        "/api/v1/me/photo",
        Some(&token),
        Some(json!({ "upload_id": upload_id })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["photo_url"], json!(file_url));
}

//! # 认证集成测试
//!
//! 登录、刷新令牌轮换、注销与初始管理员创建

use chrono::{Duration, Utc};
use entity::enums::UserRole;
use entity::{refresh_tokens, users};
use pretty_assertions::assert_eq;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use sipodi::auth::{AuthService, AuthUtils};
use sipodi::config::BootstrapConfig;
use sipodi::database::ensure_default_admin;
use sipodi::error::AppError;
use sipodi::management::services::users::UsersService;
use sipodi::testing::*;

async fn sessions_of(app: &TestApp, user_id: Uuid) -> u64 {
    refresh_tokens::Entity::find()
        .filter(refresh_tokens::Column::UserId.eq(user_id))
        .count(app.db())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_login_issues_verifiable_tokens() {
    let app = TestApp::new().await.unwrap();
    let school = SchoolFixture::new().insert(app.db()).await.unwrap();
    let gtk = UserFixture::gtk(school.id)
        .email("ani@sipodi.test")
        .insert(app.db())
        .await
        .unwrap();

    let (tokens, user) = AuthService::new(&app.context)
        .login("  ANI@sipodi.test ", DEFAULT_PASSWORD)
        .await
        .unwrap();
    assert_eq!(user.id, gtk.id);
    assert_eq!(tokens.token_type, "Bearer");
    assert_eq!(tokens.expires_in, 900);
    assert_eq!(tokens.refresh_token.len(), 64);

    let ctx = app.authenticate(&tokens.access_token).unwrap();
    assert_eq!(ctx.user_id, gtk.id);
    assert_eq!(ctx.role, UserRole::Gtk);
    assert_eq!(ctx.school_id, Some(school.id));

    let stored = refresh_tokens::Entity::find()
        .filter(refresh_tokens::Column::UserId.eq(gtk.id))
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.token_hash, AuthUtils::sha256_hash(&tokens.refresh_token));
    assert_ne!(stored.token_hash, tokens.refresh_token);
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::new().await.unwrap();
    UserFixture::new()
        .email("aktif@sipodi.test")
        .insert(app.db())
        .await
        .unwrap();
    UserFixture::new()
        .email("nonaktif@sipodi.test")
        .inactive()
        .insert(app.db())
        .await
        .unwrap();
    let auth = AuthService::new(&app.context);

    let err = auth.login("aktif@sipodi.test", "salah-password").await.unwrap_err();
    assert!(matches!(err.root(), AppError::InvalidCredentials));

    let err = auth.login("tidak-ada@sipodi.test", DEFAULT_PASSWORD).await.unwrap_err();
    assert!(matches!(err.root(), AppError::InvalidCredentials));

    let err = auth.login("nonaktif@sipodi.test", DEFAULT_PASSWORD).await.unwrap_err();
    assert!(matches!(err.root(), AppError::AccountDisabled));
}

#[tokio::test]
async fn test_refresh_token_is_single_use() {
    let app = TestApp::new().await.unwrap();
    let user = UserFixture::new().insert(app.db()).await.unwrap();
    let auth = AuthService::new(&app.context);

    let first = app.login(&user.email, DEFAULT_PASSWORD).await.unwrap();
    let second = auth.refresh(&first.refresh_token).await.unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);

    let err = auth.refresh(&first.refresh_token).await.unwrap_err();
    assert!(matches!(err.root(), AppError::InvalidToken));

    auth.refresh(&second.refresh_token).await.unwrap();
    assert_eq!(sessions_of(&app, user.id).await, 1);
}

#[tokio::test]
async fn test_expired_refresh_token_is_deleted() {
    let app = TestApp::new().await.unwrap();
    let user = UserFixture::new().insert(app.db()).await.unwrap();
    let raw = AuthUtils::generate_refresh_token();
    let now = Utc::now().naive_utc();
    refresh_tokens::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        token_hash: Set(AuthUtils::sha256_hash(&raw)),
        expires_at: Set(now - Duration::minutes(1)),
        created_at: Set(now - Duration::days(8)),
    }
    .insert(app.db())
    .await
    .unwrap();

    let err = AuthService::new(&app.context).refresh(&raw).await.unwrap_err();
    assert!(matches!(err.root(), AppError::TokenExpired));
    assert_eq!(sessions_of(&app, user.id).await, 0);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let app = TestApp::new().await.unwrap();
    let user = UserFixture::new().insert(app.db()).await.unwrap();
    let tokens = app.login(&user.email, DEFAULT_PASSWORD).await.unwrap();
    let auth = AuthService::new(&app.context);

    auth.logout(&tokens.refresh_token).await.unwrap();
    auth.logout(&tokens.refresh_token).await.unwrap();
    auth.logout("bukan-token").await.unwrap();
    assert_eq!(sessions_of(&app, user.id).await, 0);
}

#[tokio::test]
async fn test_logout_all_reports_terminated_sessions() {
    let app = TestApp::new().await.unwrap();
    let user = UserFixture::new().insert(app.db()).await.unwrap();
    let other = UserFixture::new().insert(app.db()).await.unwrap();
    for _ in 0..3 {
        app.login(&user.email, DEFAULT_PASSWORD).await.unwrap();
    }
    app.login(&other.email, DEFAULT_PASSWORD).await.unwrap();

    let revoked = AuthService::new(&app.context)
        .logout_all(user.id)
        .await
        .unwrap();
    assert_eq!(revoked, 3);
    assert_eq!(sessions_of(&app, user.id).await, 0);
    assert_eq!(sessions_of(&app, other.id).await, 1);
}

#[tokio::test]
async fn test_deactivation_revokes_sessions() {
    let app = TestApp::new().await.unwrap();
    let root = UserFixture::super_admin().insert(app.db()).await.unwrap();
    let user = UserFixture::new().insert(app.db()).await.unwrap();
    let tokens = app.login(&user.email, DEFAULT_PASSWORD).await.unwrap();

    let updated = UsersService::new(&app.context)
        .set_active(&auth_of(&root), user.id, false)
        .await
        .unwrap();
    assert!(!updated.is_active);

    let err = AuthService::new(&app.context)
        .refresh(&tokens.refresh_token)
        .await
        .unwrap_err();
    assert!(matches!(err.root(), AppError::InvalidToken));

    let err = app.login(&user.email, DEFAULT_PASSWORD).await.unwrap_err();
    assert!(matches!(err.root(), AppError::AccountDisabled));
}

#[tokio::test]
async fn test_tampered_access_token_is_invalid() {
    let app = TestApp::new().await.unwrap();
    let user = UserFixture::new().insert(app.db()).await.unwrap();
    let tokens = app.login(&user.email, DEFAULT_PASSWORD).await.unwrap();

    let mut tampered = tokens.access_token.clone();
    tampered.push('x');
    assert!(app.authenticate(&tampered).is_err());
    assert!(app.authenticate("bukan.jwt.valid").is_err());
}

#[tokio::test]
async fn test_bootstrap_admin_created_once() {
    let app = TestApp::new().await.unwrap();
    let bootstrap = BootstrapConfig {
        email: "Admin@SIPODI.test".to_string(),
        password: "admin12345".to_string(),
        full_name: "Super Admin".to_string(),
    };

    assert!(!ensure_default_admin(app.db(), None, TEST_BCRYPT_COST).await.unwrap());
    assert!(
        ensure_default_admin(app.db(), Some(&bootstrap), TEST_BCRYPT_COST)
            .await
            .unwrap()
    );
    assert!(
        !ensure_default_admin(app.db(), Some(&bootstrap), TEST_BCRYPT_COST)
            .await
            .unwrap()
    );

    let admins = users::Entity::find()
        .filter(users::Column::Role.eq(UserRole::SuperAdmin))
        .all(app.db())
        .await
        .unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].email, "admin@sipodi.test");
    app.login("admin@sipodi.test", "admin12345").await.unwrap();
}

//! # 路由配置
//!
//! 公开路由与需要登录的路由分开组装；角色白名单按路由组挂载。

use crate::auth::permissions::{ADMINS, GTK_ONLY, SUPER_ADMIN_ONLY};
use crate::management::handlers::{
    auth, dashboard, notifications, schools, system, talents, uploads, users, verifications,
};
use crate::management::middleware::{self as mw, require_roles};
use crate::management::server::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, patch, post, put};
use entity::enums::UserRole;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    let protected = Router::new()
        .merge(session_routes())
        .merge(me_routes())
        .merge(school_routes())
        .merge(user_routes())
        .merge(talent_routes())
        .merge(verification_routes())
        .merge(upload_routes())
        .route("/dashboard/summary", get(dashboard::summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), mw::auth));

    Router::new()
        .merge(public_routes())
        .merge(protected)
        .with_state(state)
}

/// 仅允许 `allowed` 中的角色访问 `router` 内的路由
fn restrict(allowed: &'static [UserRole], router: Router<AppState>) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(allowed, require_roles))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
}

fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/logout-all", post(auth::logout_all))
}

/// 个人中心
fn me_routes() -> Router<AppState> {
    let common = Router::new()
        .route("/me", get(users::get_me).patch(users::update_profile))
        .route("/me/password", patch(users::change_password))
        .route("/me/photo", patch(users::update_photo))
        .route("/me/talents", get(talents::list_my_talents))
        .route("/me/notifications", get(notifications::list))
        .route(
            "/me/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route(
            "/me/notifications/read-all",
            patch(notifications::mark_all_as_read),
        )
        .route("/me/notifications/{id}/read", patch(notifications::mark_as_read));

    let gtk = restrict(
        GTK_ONLY,
        Router::new()
            .route("/me/talents", post(talents::create_talent))
            .route(
                "/me/talents/{id}",
                put(talents::update_talent).delete(talents::delete_talent),
            ),
    );

    common.merge(gtk)
}

fn school_routes() -> Router<AppState> {
    let super_admin = restrict(
        SUPER_ADMIN_ONLY,
        Router::new()
            .route("/schools", get(schools::list).post(schools::create))
            .route("/schools/{id}", put(schools::update).delete(schools::delete)),
    );
    let admins = restrict(
        ADMINS,
        Router::new().route("/schools/{id}/users", get(schools::list_users)),
    );

    Router::new()
        .route("/schools/{id}", get(schools::get))
        .merge(super_admin)
        .merge(admins)
}

fn user_routes() -> Router<AppState> {
    let super_admin = restrict(
        SUPER_ADMIN_ONLY,
        Router::new()
            .route("/users", get(users::list))
            .route("/users/{id}", delete(users::delete)),
    );
    let admins = restrict(
        ADMINS,
        Router::new()
            .route("/users", post(users::create))
            .route("/users/{id}", put(users::update))
            .route("/users/{id}/activate", patch(users::activate))
            .route("/users/{id}/deactivate", patch(users::deactivate)),
    );

    Router::new()
        .route("/users/{id}", get(users::get))
        .merge(super_admin)
        .merge(admins)
}

fn talent_routes() -> Router<AppState> {
    Router::new()
        .route("/talents/{id}", get(talents::get_talent))
        .merge(restrict(
            ADMINS,
            Router::new().route("/talents", get(talents::list_talents)),
        ))
}

fn verification_routes() -> Router<AppState> {
    restrict(
        ADMINS,
        Router::new()
            .route("/verifications/talents", get(verifications::list_pending))
            .route(
                "/verifications/talents/batch/approve",
                post(verifications::batch_approve),
            )
            .route(
                "/verifications/talents/batch/reject",
                post(verifications::batch_reject),
            )
            .route(
                "/verifications/talents/{id}/approve",
                post(verifications::approve),
            )
            .route(
                "/verifications/talents/{id}/reject",
                post(verifications::reject),
            ),
    )
}

fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/uploads/presign", post(uploads::presign))
        .route("/uploads/{upload_id}/confirm", post(uploads::confirm))
        .route("/uploads/{upload_id}", delete(uploads::cancel))
}

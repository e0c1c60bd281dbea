pub mod user;

use axum::{
    Router,
    routing::{get, post},
};

use crate::{AppState, middleware::log_errors};

/// 用户接口路由
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(user::list_users).post(user::create_user))
        .route("/users/search", post(user::search_user))
        .route(
            "/users/{id}",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
}

/// 完整路由：挂载到配置的基础路径并加上日志中间件
pub fn app_router(state: AppState) -> Router {
    let base = state.config.api_base_uri.trim_end_matches('/').to_string();
    let router = if base.is_empty() {
        Router::new().merge(user_routes())
    } else {
        Router::new().nest(&base, user_routes())
    };

    let router = router.layer(axum::middleware::from_fn(log_errors));

    // 开发环境允许跨域，方便前端本地调试
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router.with_state(state)
}

use crate::auth::require_auth;
use crate::handlers;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    let water = Router::new()
        .route("/goal", get(handlers::get_goal).put(handlers::set_goal))
        .route("/today", get(handlers::get_today).put(handlers::set_today))
        .route("/drink", post(handlers::drink).delete(handlers::undo_drink))
        .route("/history", get(handlers::get_history))
        .route("/date/:date", get(handlers::get_by_date));

    let protected = Router::new()
        .nest("/api/water", water)
        .route("/api/users/me", get(handlers::get_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/users", post(handlers::register))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

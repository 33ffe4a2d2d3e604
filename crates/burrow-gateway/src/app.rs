use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_url_handler, delete_url_handler, evict_cache_handler, get_url_handler,
    health_handler, list_user_urls_handler, lookup_url_handler, redirect_handler,
};
use crate::state::AppState;

pub struct App;

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .nest(
                "/url",
                Router::new()
                    .route("/", post(create_url_handler))
                    .route("/lookup", post(lookup_url_handler))
                    .route("/user/{user_id}", get(list_user_urls_handler))
                    .route(
                        "/{short_code}",
                        get(get_url_handler).delete(delete_url_handler),
                    ),
            )
            .route("/cache/{short_code}", delete(evict_cache_handler))
            .route("/{short_code}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

mod cache;
mod health;
mod redirect;
mod url;

pub use cache::evict_cache_handler;
pub use health::health_handler;
pub use redirect::redirect_handler;
pub use url::{
    create_url_handler, delete_url_handler, get_url_handler, list_user_urls_handler,
    lookup_url_handler,
};

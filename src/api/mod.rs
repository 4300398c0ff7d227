pub mod collection_handlers;
pub mod handlers;
pub mod routes;
pub mod stats_handlers;
pub mod stats_routes;
pub mod user_extractor;

pub use handlers::*;
pub use routes::*;

pub mod app;
pub mod collection;
pub mod common;
pub mod stats;
pub mod user_context;

pub use app::*;
pub use collection::*;
pub use common::*;
pub use stats::*;
pub use user_context::*;

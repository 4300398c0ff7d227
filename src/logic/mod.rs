pub mod collections;
pub mod permissions;
pub mod render;
pub mod series;
pub mod stats;

pub use collections::*;
pub use permissions::*;
pub use render::*;
pub use series::*;

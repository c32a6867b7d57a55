pub mod error;
pub mod primitives;

pub use error::AppError;
pub use primitives::*;

pub mod authorization;
pub mod constants;
pub mod error;
pub mod types;

pub use authorization::*;
pub use constants::*;
pub use error::ClaimError;
pub use types::*;

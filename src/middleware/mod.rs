pub mod auth;
pub mod cors;
pub mod logging;

pub use auth::*;
pub use cors::*;
pub use logging::*;

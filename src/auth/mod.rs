pub mod context;
pub mod rbac;

pub use context::UserContext;
pub use rbac::{Permission, Role};

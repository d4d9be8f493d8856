pub mod auth;
pub mod superadmin;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
pub use superadmin::require_super_admin;

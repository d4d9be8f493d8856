pub mod password;
pub mod reset_token;
pub mod validation;

pub use password::{Password, PasswordHashString};
pub use validation::{EventMemberIds, ResourceId, ValidatedJson, ValidatedQuery};

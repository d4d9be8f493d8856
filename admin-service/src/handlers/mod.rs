pub mod auth;
pub mod dashboard;
pub mod events;
pub mod resources;
pub mod system;
pub mod user;
pub mod users;

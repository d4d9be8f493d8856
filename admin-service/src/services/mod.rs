//! Business logic: authentication, user administration and the resource
//! collections.

mod auth;
mod credentials;
mod dashboard;
pub mod email;
pub mod error;
mod events;
mod jwt;
mod members;
mod parishes;
mod prayer_requests;
pub mod repository;
mod resources;
mod users;

pub use auth::{AuthService, RESET_TICKET_TTL_MINUTES};
pub use credentials::{CredentialStore, MockCredentialStore, PgCredentialStore};
pub use dashboard::{range_start, DashboardService};
pub use email::{EmailProvider, EmailService, MockEmailService, SentEmail};
pub use error::ServiceError;
pub use events::{EventRepository, MEMBER_ALREADY_REGISTERED};
pub use jwt::{SessionClaims, TokenService};
pub use members::MemberRepository;
pub use parishes::ParishRepository;
pub use prayer_requests::PrayerRequestRepository;
pub use repository::Repository;
pub use resources::ResourceRepository;
pub use users::UserService;

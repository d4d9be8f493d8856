pub mod auth;
pub mod dashboard;
pub mod event;
pub mod member;
pub mod parish;
pub mod prayer_request;
pub mod resource;
pub mod user;

pub use auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, ResetTokenQuery,
};
pub use dashboard::{DashboardMetrics, DashboardQuery, DashboardRange, DashboardStats, MetricCount};
pub use event::{AddEventMemberRequest, CreateEventRequest, UpdateEventRequest};
pub use member::{CreateMemberRequest, UpdateMemberRequest};
pub use parish::{CreateParishRequest, UpdateParishRequest};
pub use prayer_request::{CreatePrayerRequestRequest, UpdatePrayerRequestRequest};
pub use resource::{CreateResourceRequest, UpdateResourceRequest};
pub use user::{ChangePasswordRequest, CreateUserRequest, UpdateProfileRequest, UpdateUserRequest};

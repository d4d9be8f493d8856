pub mod event;
pub mod member;
pub mod parish;
pub mod prayer_request;
pub mod resource;
pub mod user;

pub use event::{Event, EventMemberRow, EventMemberSummary, EventWithMembers};
pub use member::Member;
pub use parish::Parish;
pub use prayer_request::PrayerRequest;
pub use resource::{Resource, ResourceType};
pub use user::{NewUser, SanitizedUser, User, UserChanges};

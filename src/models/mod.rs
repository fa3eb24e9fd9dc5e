//! Data models for Injoyplan

pub mod comment;
pub mod complaint;
pub mod event;
pub mod favorite;
pub mod user;

// Re-export commonly used types
pub use event::{Event, EventCard, EventDate, FavoriteMark, Location, Paginated};
pub use favorite::Favorite;
pub use user::{Organizer, UserClaims, UserType};

//! SeaORM entities.
//!
//! `users`, `messages` and `notifications` are read and written by the
//! service and favorites and comments feed profile stats; the remaining
//! entities describe rows that take part in account deletion and are used
//! to seed and inspect them in tests.

pub mod message;
pub mod notification;
pub mod pet_profile;
pub mod pet_walk;
pub mod service_provider;
pub mod service_request;
pub mod user;
pub mod user_comment;
pub mod user_favorite;
pub mod user_request;

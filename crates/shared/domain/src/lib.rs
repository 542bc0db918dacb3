//! Domain layer - Core account entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the user aggregate, messages, password hashing, reset tokens and slug
//! generation.

pub mod constants;
pub mod error;
pub mod message;
pub mod password;
pub mod reset_token;
pub mod slug;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use message::{Message, NewMessage, NewNotification, Notification};
pub use password::Password;
pub use reset_token::ResetToken;
pub use user::{
    is_acceptable_photo, normalize_email, normalize_photo, AuthProvider, NewUser, User, UserStats,
    UserView,
};

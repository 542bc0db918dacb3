//! Service layer - account and messaging use cases.

mod account_service;
pub mod credential_store;
pub mod mailer;
mod message_service;
pub mod side_effect;
pub mod slug_allocator;

pub use account_service::{
    AccountManager, AccountService, AuthResponse, FederatedProfile, ProfileUpdate,
};
pub use credential_store::CredentialStore;
pub use mailer::{LogMailer, Mailer};
pub use message_service::{MessageManager, MessageReceipt, MessageService};
pub use side_effect::Delivery;

//! HTTP handlers.

mod auth_handler;
mod health_handler;
mod message_handler;
mod user_handler;

pub use auth_handler::auth_routes;
pub use health_handler::health_check;
pub use message_handler::message_routes;
pub use user_handler::user_routes;

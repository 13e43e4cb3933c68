pub mod auth;
pub mod error;
pub mod messages;
pub mod push;
pub mod users;

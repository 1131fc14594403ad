//! External integrations

pub mod mail;

pub use mail::{build_dispatcher, ContactDispatcher, ContactMessage, DispatchError};

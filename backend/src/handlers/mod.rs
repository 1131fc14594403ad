//! HTTP request handlers

pub mod agent;
pub mod auth;
pub mod balance;
pub mod health;
pub mod history;
pub mod invoice;
pub mod notification;
pub mod order;
pub mod product;
pub mod supplier;

pub use agent::*;
pub use auth::*;
pub use balance::*;
pub use health::*;
pub use history::*;
pub use invoice::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use supplier::*;

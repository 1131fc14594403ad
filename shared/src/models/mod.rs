//! Domain models for the stock management platform

mod access;
mod balance;
mod history;
mod invoice;
mod notification;
mod order;
mod product;
mod supplier;
mod user;

pub use access::*;
pub use balance::*;
pub use history::*;
pub use invoice::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use supplier::*;
pub use user::*;

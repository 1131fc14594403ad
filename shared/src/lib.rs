//! Shared models and business rules for the stock management platform
//!
//! Everything here is free of I/O: stock movements, invoice transitions,
//! alert planning, role resolution and input validation. The backend applies
//! these rules inside its database transactions.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::*;

//! Business logic services for the stock management backend

pub mod agent;
pub mod audit;
pub mod auth;
pub mod balance;
pub mod invoice;
pub mod notification;
pub mod order;
pub mod product;
pub mod supplier;

pub use agent::AgentService;
pub use audit::AuditService;
pub use auth::AuthService;
pub use balance::BalanceService;
pub use invoice::InvoiceService;
pub use notification::NotificationService;
pub use order::OrderService;
pub use product::ProductService;
pub use supplier::SupplierService;

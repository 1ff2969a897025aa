//! Account lifecycle: registration, email verification, password reset
//! and administration.

pub mod notifier;
pub mod service;

pub use notifier::{AccountNotifier, LogNotifier};
pub use service::{AccountService, RegisterAccount};

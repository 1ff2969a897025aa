//! Account domain entities.

pub mod model;

pub use model::{Account, CreateAccount, LockoutState, normalize_email};

pub mod identity;

pub use identity::{AccountService, LoginOutcome, RegisterInput, SharedAccountService};

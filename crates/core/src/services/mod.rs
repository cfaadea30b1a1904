mod account;
pub mod bootstrap;

pub use account::AccountService;
pub use bootstrap::{SeedConfig, seed_wallets};

pub mod notifier;
pub mod trade_poller;
pub mod wallet_age;

pub use notifier::{AlertNotifier, EmailNotifier};
pub use trade_poller::{CycleStats, Monitor};
pub use wallet_age::{EtherscanOracle, WalletAgeOracle};

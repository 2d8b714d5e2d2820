use crate::traits::{ActorDirectory, MessageQueue, OrderManagement, PaymentManagement, SettingsStore, WalletLedger};

/// Everything the settlement flows need from a storage backend, in one bound.
pub trait SettlementDatabase:
    Clone + WalletLedger + PaymentManagement + OrderManagement + ActorDirectory + SettingsStore + MessageQueue
{
    /// The URL of the database
    fn url(&self) -> &str;
}

use crate::{db_types::SettlementSettings, traits::StoreError};

#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    /// The current settings, or [`SettlementSettings::default`] if none have been saved.
    async fn fetch_settings(&self) -> Result<SettlementSettings, StoreError>;

    async fn save_settings(&self, settings: SettlementSettings) -> Result<SettlementSettings, StoreError>;
}

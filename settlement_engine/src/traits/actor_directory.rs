use crate::{
    db_types::{Rider, RiderAvailability, User},
    traits::StoreError,
};

/// Read access to users and riders, plus the one rider field settlement writes.
///
/// The `upsert_*` methods mirror records owned by the user and rider services.
#[allow(async_fn_in_trait)]
pub trait ActorDirectory {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, StoreError>;

    async fn fetch_rider(&self, rider_id: i64) -> Result<Option<Rider>, StoreError>;

    async fn set_rider_availability(&self, rider_id: i64, availability: RiderAvailability)
        -> Result<Rider, StoreError>;

    async fn upsert_user(&self, id: i64, name: &str, email: &str) -> Result<User, StoreError>;

    async fn upsert_rider(&self, id: i64, name: &str, email: &str) -> Result<Rider, StoreError>;
}

use crate::{
    db_types::{NewPayment, Payment, PaymentStatus},
    traits::StoreError,
};

#[allow(async_fn_in_trait)]
pub trait PaymentManagement {
    /// Stores a new payment in the `processing` state. Fails with [`StoreError::PaymentAlreadyExists`] if the order
    /// already has a payment that has not failed.
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, StoreError>;

    async fn fetch_payment(&self, id: i64) -> Result<Option<Payment>, StoreError>;

    async fn fetch_payment_by_reference(&self, reference: &str) -> Result<Option<Payment>, StoreError>;

    /// The payment for the order that has not failed, if there is one.
    async fn fetch_live_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, StoreError>;

    async fn set_authorization_url(&self, payment_id: i64, url: &str) -> Result<Payment, StoreError>;

    /// Conditional status change. Returns `None` if the payment was not in the `from` state, which makes redelivered
    /// events harmless.
    async fn transition_payment_status(
        &self,
        payment_id: i64,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<Option<Payment>, StoreError>;
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

use crate::{
    config::PaystackConfig,
    data_objects::{
        Bank,
        InitializedTransaction,
        NewTransaction,
        NewTransferRecipient,
        PaystackResponse,
        ResolvedAccount,
        TransactionVerification,
        TransferInitiated,
        TransferRecipient,
    },
    helpers::{backoff_delay, is_retryable_status},
    PaystackApiError,
};

#[derive(Clone)]
struct CachedBanks {
    fetched_at: DateTime<Utc>,
    banks: Vec<Bank>,
}

#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
    banks: Arc<RwLock<Option<CachedBanks>>>,
}

impl PaystackApi {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), banks: Arc::new(RwLock::new(None)) })
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Sends a request and unwraps the Paystack envelope.
    ///
    /// Responses with status 429 or 5xx are retried up to `max_attempts` in total, waiting `attempt * retry_delay`
    /// between tries. Transport failures and every other status are returned straight away.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, PaystackApiError> {
        let url = self.url(path);
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            trace!("Sending REST query: {method} {url} (attempt {attempt}/{max_attempts})");
            let mut req = self.client.request(method.clone(), &url);
            if !params.is_empty() {
                req = req.query(params);
            }
            if let Some(body) = &body {
                req = req.json(body);
            }
            let response = req.send().await.map_err(|e| PaystackApiError::RestRequestError(e.to_string()))?;
            let status = response.status();
            if status.is_success() {
                trace!("REST query successful. {status}");
                let envelope = response
                    .json::<PaystackResponse<T>>()
                    .await
                    .map_err(|e| PaystackApiError::JsonError(e.to_string()))?;
                return envelope.into_data(path);
            }
            let status = status.as_u16();
            let message = response.text().await.map_err(|e| PaystackApiError::RestResponseError(e.to_string()))?;
            if is_retryable_status(status) && attempt < max_attempts {
                let delay = backoff_delay(attempt, self.config.retry_delay);
                warn!("Paystack returned {status} for {path}. Retrying in {}ms", delay.as_millis());
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }
            return Err(PaystackApiError::QueryError { status, message });
        }
    }

    /// Starts a hosted checkout. The caller supplies its own reference, so that the payment row can be written before
    /// the customer ever sees the checkout page.
    pub async fn initialize_transaction(
        &self,
        mut tx: NewTransaction,
    ) -> Result<InitializedTransaction, PaystackApiError> {
        if tx.callback_url.is_none() {
            tx.callback_url = self.config.callback_url.clone();
        }
        debug!("Initializing transaction {} for {}", tx.reference, tx.amount);
        let result = self
            .rest_query::<InitializedTransaction, _>(Method::POST, "/transaction/initialize", &[], Some(&tx))
            .await?;
        info!("Initialized transaction {}", result.reference);
        Ok(result)
    }

    pub async fn verify_transaction(&self, reference: &str) -> Result<TransactionVerification, PaystackApiError> {
        let path = format!("/transaction/verify/{reference}");
        debug!("Verifying transaction {reference}");
        let result = self.rest_query::<TransactionVerification, ()>(Method::GET, &path, &[], None).await?;
        debug!("Transaction {reference} has status {}", result.status);
        Ok(result)
    }

    pub async fn create_transfer_recipient(
        &self,
        name: &str,
        account_number: &str,
        bank_code: &str,
    ) -> Result<TransferRecipient, PaystackApiError> {
        let recipient = NewTransferRecipient::nuban(name, account_number, bank_code, &self.config.currency);
        debug!("Creating transfer recipient for account at bank {bank_code}");
        let result = self
            .rest_query::<TransferRecipient, _>(Method::POST, "/transferrecipient", &[], Some(&recipient))
            .await?;
        info!("Created transfer recipient {}", result.recipient_code);
        Ok(result)
    }

    pub async fn initiate_transfer(
        &self,
        amount: settle_common::MinorUnits,
        recipient_code: &str,
        reference: &str,
        reason: &str,
    ) -> Result<TransferInitiated, PaystackApiError> {
        let body = serde_json::json!({
            "source": "balance",
            "amount": amount,
            "recipient": recipient_code,
            "reference": reference,
            "reason": reason,
        });
        debug!("Initiating transfer {reference} of {amount} to {recipient_code}");
        let result = self.rest_query::<TransferInitiated, _>(Method::POST, "/transfer", &[], Some(body)).await?;
        info!("Transfer {reference} accepted with status {}", result.status);
        Ok(result)
    }

    pub async fn resolve_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<ResolvedAccount, PaystackApiError> {
        let params = [("account_number", account_number), ("bank_code", bank_code)];
        debug!("Resolving account at bank {bank_code}");
        self.rest_query::<ResolvedAccount, ()>(Method::GET, "/bank/resolve", &params, None).await
    }

    /// Returns the bank list, served from memory while it is younger than the configured TTL.
    pub async fn list_banks(&self) -> Result<Vec<Bank>, PaystackApiError> {
        {
            let cache = self.banks.read().await;
            if let Some(cached) = cache.as_ref() {
                if Utc::now() - cached.fetched_at < self.config.bank_cache_ttl {
                    trace!("Serving {} banks from cache", cached.banks.len());
                    return Ok(cached.banks.clone());
                }
            }
        }
        let params = [("currency", self.config.currency.as_str())];
        let banks = self.rest_query::<Vec<Bank>, ()>(Method::GET, "/bank", &params, None).await?;
        info!("Fetched {} banks from Paystack", banks.len());
        let mut cache = self.banks.write().await;
        *cache = Some(CachedBanks { fetched_at: Utc::now(), banks: banks.clone() });
        Ok(banks)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn urls_ignore_trailing_slash() {
        let config = PaystackConfig { base_url: "http://localhost:9000/".into(), ..Default::default() };
        let api = PaystackApi::new(config).unwrap();
        assert_eq!(api.url("/bank"), "http://localhost:9000/bank");
    }

    #[tokio::test]
    async fn cached_banks_are_served_without_a_request() {
        // Nothing listens on this port, so any real request would fail.
        let config = PaystackConfig { base_url: "http://127.0.0.1:9".into(), ..Default::default() };
        let api = PaystackApi::new(config).unwrap();
        {
            let mut cache = api.banks.write().await;
            *cache = Some(CachedBanks {
                fetched_at: Utc::now(),
                banks: vec![Bank { name: "GTBank".into(), code: "058".into(), active: true }],
            });
        }
        let banks = api.list_banks().await.unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].code, "058");
    }

    #[tokio::test]
    async fn transport_errors_are_not_retried() {
        let config = PaystackConfig {
            base_url: "http://127.0.0.1:9".into(),
            retry_delay: std::time::Duration::from_secs(30),
            ..Default::default()
        };
        let api = PaystackApi::new(config).unwrap();
        let start = std::time::Instant::now();
        let err = api.verify_transaction("ref-1").await.unwrap_err();
        assert!(matches!(err, PaystackApiError::RestRequestError(_)));
        assert!(err.is_transient());
        assert!(start.elapsed() < std::time::Duration::from_secs(30));
    }
}

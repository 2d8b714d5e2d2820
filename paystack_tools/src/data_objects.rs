use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use settle_common::MinorUnits;

use crate::PaystackApiError;

/// Every Paystack response is wrapped in the same envelope. `status: false` means the request was understood but
/// refused.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaystackResponse<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> PaystackResponse<T> {
    pub fn into_data(self, context: &str) -> Result<T, PaystackApiError> {
        if !self.status {
            return Err(PaystackApiError::Declined(self.message));
        }
        self.data.ok_or_else(|| PaystackApiError::EmptyResponse(context.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    pub email: String,
    pub amount: MinorUnits,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransactionVerification {
    /// `success`, `failed`, `abandoned` etc.
    pub status: String,
    pub reference: String,
    pub amount: MinorUnits,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub gateway_response: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

impl TransactionVerification {
    pub fn is_successful(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTransferRecipient {
    #[serde(rename = "type")]
    pub recipient_type: String,
    pub name: String,
    pub account_number: String,
    pub bank_code: String,
    pub currency: String,
}

impl NewTransferRecipient {
    pub fn nuban(name: &str, account_number: &str, bank_code: &str, currency: &str) -> Self {
        Self {
            recipient_type: "nuban".to_string(),
            name: name.to_string(),
            account_number: account_number.to_string(),
            bank_code: bank_code.to_string(),
            currency: currency.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransferRecipient {
    pub recipient_code: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransferInitiated {
    pub transfer_code: String,
    pub reference: String,
    /// Usually `pending` or `otp`. The final outcome arrives by webhook.
    pub status: String,
    pub amount: MinorUnits,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolvedAccount {
    pub account_number: String,
    pub account_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Bank {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub active: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn declined_envelope() {
        let json = r#"{"status": false, "message": "Invalid key", "data": null}"#;
        let response: PaystackResponse<InitializedTransaction> = serde_json::from_str(json).unwrap();
        let err = response.into_data("initialize").unwrap_err();
        assert!(matches!(err, PaystackApiError::Declined(m) if m == "Invalid key"));
    }

    #[test]
    fn verification_envelope() {
        let json = r#"{
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": "success",
                "reference": "pay-7-abc",
                "amount": 500000,
                "currency": "NGN",
                "gateway_response": "Approved",
                "paid_at": "2024-06-01T12:00:00Z",
                "channel": "card"
            }
        }"#;
        let response: PaystackResponse<TransactionVerification> = serde_json::from_str(json).unwrap();
        let data = response.into_data("verify").unwrap();
        assert!(data.is_successful());
        assert_eq!(data.amount, MinorUnits::from(500_000));
        assert_eq!(data.reference, "pay-7-abc");
    }

    #[test]
    fn missing_data_is_an_error() {
        let json = r#"{"status": true, "message": "ok"}"#;
        let response: PaystackResponse<Vec<Bank>> = serde_json::from_str(json).unwrap();
        assert!(matches!(response.into_data("banks"), Err(PaystackApiError::EmptyResponse(_))));
    }

    #[test]
    fn recipient_payload() {
        let recipient = NewTransferRecipient::nuban("Mama Put", "0123456789", "058", "NGN");
        let json = serde_json::to_value(&recipient).unwrap();
        assert_eq!(json["type"], "nuban");
        assert_eq!(json["bank_code"], "058");
    }
}

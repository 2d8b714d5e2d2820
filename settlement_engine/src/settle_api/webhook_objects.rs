//! The gateway's webhook wire format, and the tagged union it is classified into.
//!
//! The gateway sends `{ "event": "<family>.<outcome>", "data": { "reference": ..., ... } }`. The event name is resolved
//! once, here, into a [`GatewayEvent`]. Nothing downstream looks at the raw event string again.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use settle_common::MinorUnits;

use crate::settle_api::errors::SettlementError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// The parts of a charge notification that settlement relies on. The gateway sends much more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeData {
    pub reference: String,
    #[serde(default)]
    pub amount: Option<MinorUnits>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferData {
    pub reference: String,
    #[serde(default)]
    pub amount: Option<MinorUnits>,
    #[serde(default)]
    pub transfer_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeEventKind {
    Success,
    Failed,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEventKind {
    Success,
    Failed,
    Reversed,
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    Charge { kind: ChargeEventKind, data: ChargeData },
    Transfer { kind: TransferEventKind, data: TransferData },
    /// Event families we do not handle. Accepted and ignored, since the gateway adds new ones over time.
    Unknown(String),
}

impl GatewayEvent {
    pub fn name(&self) -> String {
        match self {
            GatewayEvent::Charge { kind, .. } => match kind {
                ChargeEventKind::Success => "charge.success".into(),
                ChargeEventKind::Failed => "charge.failed".into(),
                ChargeEventKind::Other(s) => format!("charge.{s}"),
            },
            GatewayEvent::Transfer { kind, .. } => match kind {
                TransferEventKind::Success => "transfer.success".into(),
                TransferEventKind::Failed => "transfer.failed".into(),
                TransferEventKind::Reversed => "transfer.reversed".into(),
                TransferEventKind::Other(s) => format!("transfer.{s}"),
            },
            GatewayEvent::Unknown(s) => s.clone(),
        }
    }
}

impl TryFrom<WebhookPayload> for GatewayEvent {
    type Error = SettlementError;

    fn try_from(payload: WebhookPayload) -> Result<Self, Self::Error> {
        let event = payload.event.trim();
        if let Some(outcome) = event.strip_prefix("charge.") {
            let data = parse_data::<ChargeData>(&payload.event, payload.data)?;
            let kind = match outcome {
                "success" => ChargeEventKind::Success,
                "failed" => ChargeEventKind::Failed,
                other => ChargeEventKind::Other(other.to_string()),
            };
            return Ok(GatewayEvent::Charge { kind, data });
        }
        if let Some(outcome) = event.strip_prefix("transfer.") {
            let data = parse_data::<TransferData>(&payload.event, payload.data)?;
            let kind = match outcome {
                "success" => TransferEventKind::Success,
                "failed" => TransferEventKind::Failed,
                "reversed" => TransferEventKind::Reversed,
                other => TransferEventKind::Other(other.to_string()),
            };
            return Ok(GatewayEvent::Transfer { kind, data });
        }
        Ok(GatewayEvent::Unknown(event.to_string()))
    }
}

fn parse_data<T: serde::de::DeserializeOwned>(event: &str, data: Value) -> Result<T, SettlementError> {
    serde_json::from_value(data).map_err(|e| SettlementError::InvalidWebhookPayload(format!("{event}: {e}")))
}

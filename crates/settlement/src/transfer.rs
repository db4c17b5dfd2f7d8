//! Outbound value transfer
//!
//! The settlement layer never moves funds itself; it hands a zeroed
//! balance to a [`FundsTransfer`] collaborator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use surety_core::{Amount, Principal};
use uuid::Uuid;

use crate::error::TransferError;

/// Proof that a transfer left the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub id: String,
    pub to: Principal,
    pub amount: Amount,
    pub completed_at: DateTime<Utc>,
}

/// Carrier that releases funds to a principal
#[async_trait]
pub trait FundsTransfer: Send + Sync {
    async fn transfer(&self, to: &Principal, amount: Amount)
        -> Result<TransferReceipt, TransferError>;
}

/// In-process transfer that records every receipt
///
/// Can be switched into a failing mode to exercise reconciliation.
#[derive(Debug, Default)]
pub struct RecordingTransfer {
    sent: Mutex<Vec<TransferReceipt>>,
    failure: Mutex<Option<TransferError>>,
}

impl RecordingTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent transfer fail with `error`
    pub fn fail_with(&self, error: TransferError) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn receipts(&self) -> Vec<TransferReceipt> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Total amount released to `to`, None on overflow
    pub fn total_sent_to(&self, to: &Principal) -> Option<Amount> {
        self.receipts()
            .iter()
            .filter(|r| &r.to == to)
            .try_fold(Amount::ZERO, |acc, r| acc.checked_add(&r.amount))
    }
}

#[async_trait]
impl FundsTransfer for RecordingTransfer {
    async fn transfer(
        &self,
        to: &Principal,
        amount: Amount,
    ) -> Result<TransferReceipt, TransferError> {
        if let Some(error) = self.failure.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            return Err(error);
        }

        let receipt = TransferReceipt {
            id: Uuid::new_v4().to_string(),
            to: to.clone(),
            amount,
            completed_at: Utc::now(),
        };
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(receipt.clone());

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_transfer_records_receipts() {
        let transfer = RecordingTransfer::new();
        let to = Principal::from("P1");

        let receipt = transfer.transfer(&to, Amount::units(2)).await.unwrap();
        transfer.transfer(&to, Amount::units(1)).await.unwrap();

        assert_eq!(receipt.to, to);
        assert_eq!(transfer.receipts().len(), 2);
        assert_eq!(transfer.total_sent_to(&to), Some(Amount::units(3)));
        assert!(Uuid::parse_str(&receipt.id).is_ok());
    }

    #[tokio::test]
    async fn test_total_sent_overflow_is_none() {
        let transfer = RecordingTransfer::new();
        let to = Principal::from("P1");
        let max = Amount::new(rust_decimal::Decimal::MAX).unwrap();

        transfer.transfer(&to, max).await.unwrap();
        transfer.transfer(&to, max).await.unwrap();

        assert_eq!(transfer.receipts().len(), 2);
        assert_eq!(transfer.total_sent_to(&to), None);
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let transfer = RecordingTransfer::new();
        let to = Principal::from("P1");

        transfer.fail_with(TransferError::Unavailable("bank offline".into()));
        assert!(transfer.transfer(&to, Amount::units(1)).await.is_err());
        assert!(transfer.receipts().is_empty());

        transfer.recover();
        assert!(transfer.transfer(&to, Amount::units(1)).await.is_ok());
    }
}

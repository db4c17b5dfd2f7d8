//! Pull-payment withdrawal
//!
//! Ordering is fixed: the balance is zeroed and committed first, the
//! transfer runs second. A re-entrant or repeated withdrawal therefore
//! finds a zero balance. A transfer that fails after the zeroing is
//! recorded for reconciliation and surfaced as an error; the balance is
//! not restored.

use chrono::Utc;
use std::sync::Arc;
use surety_core::{Amount, Principal, SuretyEvent};
use surety_ledger::{atomically, LedgerStore, ReconciliationRecord};

use crate::error::SettlementError;
use crate::transfer::{FundsTransfer, TransferReceipt};

#[derive(Clone)]
pub struct Settlement {
    transfer: Arc<dyn FundsTransfer>,
}

impl Settlement {
    pub fn new(transfer: Arc<dyn FundsTransfer>) -> Self {
        Self { transfer }
    }

    /// Zero `sender`'s balance, returning what it held
    pub fn debit<S: LedgerStore>(
        &self,
        store: &mut S,
        sender: &Principal,
    ) -> Result<Amount, SettlementError> {
        if store.get_balance(sender).is_zero() {
            return Err(SettlementError::InsufficientBalance(sender.clone()));
        }
        Ok(store.take_balance(sender))
    }

    /// Withdraw `sender`'s whole balance through the transfer collaborator
    pub async fn withdraw<S: LedgerStore + Clone>(
        &self,
        store: &mut S,
        sender: &Principal,
    ) -> Result<TransferReceipt, SettlementError> {
        let amount = atomically(store, |draft| self.debit(draft, sender))?;
        self.release(store, sender, amount).await
    }

    /// Transfer an already debited `amount` and record the outcome.
    ///
    /// Success emits `BalanceWithdrawn`. Failure is recorded for
    /// reconciliation, emits `ReconciliationFailed`, and the balance stays
    /// zero.
    pub async fn release<S: LedgerStore>(
        &self,
        store: &mut S,
        sender: &Principal,
        amount: Amount,
    ) -> Result<TransferReceipt, SettlementError> {
        tracing::info!(passenger = %sender, %amount, "Balance debited for withdrawal");

        match self.transfer.transfer(sender, amount).await {
            Ok(receipt) => {
                store.emit(SuretyEvent::BalanceWithdrawn {
                    passenger: sender.clone(),
                    amount,
                });
                tracing::info!(passenger = %sender, %amount, receipt = %receipt.id, "Withdrawal completed");
                Ok(receipt)
            }
            Err(e) => {
                let reason = e.to_string();
                store.record_reconciliation_failure(ReconciliationRecord {
                    passenger: sender.clone(),
                    amount,
                    reason: reason.clone(),
                    recorded_at: Utc::now(),
                });
                store.emit(SuretyEvent::ReconciliationFailed {
                    passenger: sender.clone(),
                    amount,
                    reason: reason.clone(),
                });
                Err(SettlementError::ReconciliationFailure {
                    passenger: sender.clone(),
                    amount,
                    reason,
                })
            }
        }
    }
}

impl std::fmt::Debug for Settlement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settlement").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferError;
    use crate::transfer::RecordingTransfer;
    use rust_decimal_macros::dec;
    use surety_ledger::InMemoryLedger;

    fn setup() -> (Arc<RecordingTransfer>, Settlement, InMemoryLedger) {
        let transfer = Arc::new(RecordingTransfer::new());
        let settlement = Settlement::new(transfer.clone());
        let mut ledger = InMemoryLedger::new("OWNER".into());
        ledger
            .credit_balance(&"P1".into(), Amount::new(dec!(0.75)).unwrap())
            .unwrap();
        (transfer, settlement, ledger)
    }

    #[tokio::test]
    async fn test_withdraw_zeroes_and_transfers() {
        let (transfer, settlement, mut ledger) = setup();
        let passenger = Principal::from("P1");

        let receipt = settlement.withdraw(&mut ledger, &passenger).await.unwrap();

        assert_eq!(receipt.amount.value(), dec!(0.75));
        assert_eq!(ledger.get_balance(&passenger), Amount::ZERO);
        assert_eq!(transfer.total_sent_to(&passenger).unwrap().value(), dec!(0.75));
        assert_eq!(
            ledger.drain_events(),
            vec![SuretyEvent::BalanceWithdrawn {
                passenger,
                amount: Amount::new(dec!(0.75)).unwrap()
            }]
        );
    }

    #[tokio::test]
    async fn test_second_withdraw_finds_nothing() {
        let (transfer, settlement, mut ledger) = setup();
        let passenger = Principal::from("P1");

        settlement.withdraw(&mut ledger, &passenger).await.unwrap();
        let second = settlement.withdraw(&mut ledger, &passenger).await;

        assert_eq!(second, Err(SettlementError::InsufficientBalance(passenger.clone())));
        assert_eq!(transfer.receipts().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_balance_rejected() {
        let (transfer, settlement, mut ledger) = setup();
        let result = settlement.withdraw(&mut ledger, &"P9".into()).await;

        assert!(matches!(result, Err(SettlementError::InsufficientBalance(_))));
        assert!(transfer.receipts().is_empty());
        assert!(ledger.drain_events().is_empty());
    }

    #[tokio::test]
    async fn test_failed_transfer_is_recorded() {
        let (transfer, settlement, mut ledger) = setup();
        let passenger = Principal::from("P1");
        transfer.fail_with(TransferError::Rejected("account closed".into()));

        let result = settlement.withdraw(&mut ledger, &passenger).await;

        assert!(matches!(
            result,
            Err(SettlementError::ReconciliationFailure { .. })
        ));
        assert_eq!(ledger.get_balance(&passenger), Amount::ZERO);

        let failures = ledger.reconciliation_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].amount.value(), dec!(0.75));
        assert!(failures[0].reason.contains("account closed"));
        assert!(matches!(
            ledger.drain_events().as_slice(),
            [SuretyEvent::ReconciliationFailed { .. }]
        ));
    }
}

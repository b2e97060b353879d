//! The balance mutation service: the only code path that changes a
//! balance. Every delta is computed from the value read inside the
//! ledger transaction, never from anything the client claims its balance
//! to be.

use crate::ledger::{Ledger, LedgerError, UserId};
use crate::metrics::Metrics;
use parlor_types::api::ClickedItem;
use parlor_types::items::item_kind;
use parlor_types::{Amount, BalanceAction, DOLLAR_BILL_KIND, DOLLAR_BILL_NAME, DOLLAR_BILL_VALUE};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Result of a money-clicker credit.
#[derive(Clone, Debug)]
pub struct ClickCredit {
    pub balance: Amount,
    pub amount: Amount,
    pub item_name: String,
    pub message: String,
}

pub struct BalanceService {
    ledger: Arc<Ledger>,
    metrics: Arc<Metrics>,
}

impl BalanceService {
    pub fn new(ledger: Arc<Ledger>, metrics: Arc<Metrics>) -> Self {
        Self { ledger, metrics }
    }

    /// Apply one named table-game delta. The wager must be positive; the
    /// action's arithmetic runs against the committed balance under the
    /// row lock.
    pub async fn apply_action(
        &self,
        user: UserId,
        wager: Amount,
        action: BalanceAction,
    ) -> Result<(Amount, String), ServiceError> {
        if !wager.is_positive() {
            return Err(ServiceError::Validation(
                "Amount and action are required".to_string(),
            ));
        }

        let start = Instant::now();
        let result = self
            .ledger
            .mutate(user, move |balance| {
                action.apply_to(balance, wager).ok_or(LedgerError::Overflow)
            })
            .await;
        self.metrics.record_mutation(start.elapsed(), &result);
        let balance = result?;

        Ok((balance, format!("Balance updated: {action} ${wager}")))
    }

    /// Credit a money-clicker click: the base dollar bill, a known kind
    /// id, or a spawned item's descriptor.
    ///
    /// Descriptor values are trusted verbatim, matching the observed
    /// protocol; a hardened deployment would resolve values server-side
    /// here.
    pub async fn credit_click(
        &self,
        user: UserId,
        item: &ClickedItem,
    ) -> Result<ClickCredit, ServiceError> {
        let (name, value) = match item {
            ClickedItem::Kind(id) if id == DOLLAR_BILL_KIND => {
                (DOLLAR_BILL_NAME.to_string(), DOLLAR_BILL_VALUE)
            }
            ClickedItem::Kind(id) => match item_kind(id) {
                Some(kind) => (kind.name.to_string(), kind.value),
                None => {
                    return Err(ServiceError::Validation(format!("unknown item: {id}")));
                }
            },
            ClickedItem::Descriptor { name, value } => (name.clone(), *value),
        };

        let start = Instant::now();
        let result = self
            .ledger
            .mutate(user, move |balance| {
                balance.checked_add(value).ok_or(LedgerError::Overflow)
            })
            .await;
        self.metrics.record_mutation(start.elapsed(), &result);
        let balance = result?;

        Ok(ClickCredit {
            balance,
            amount: value,
            item_name: name,
            message: format!("Balance updated: click ${value}"),
        })
    }

    pub async fn balance(&self, user: UserId) -> Result<Amount, ServiceError> {
        Ok(self.ledger.balance(user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_types::STARTING_BALANCE;

    fn service() -> (tempfile::TempDir, BalanceService, Arc<Ledger>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = Arc::new(Ledger::open(&dir.path().join("ledger.db")).expect("open ledger"));
        let service = BalanceService::new(Arc::clone(&ledger), Arc::new(Metrics::default()));
        (dir, service, ledger)
    }

    #[tokio::test]
    async fn bet_then_win_round_trips_the_wager() {
        let (_dir, service, ledger) = service();
        let (user, _) = ledger.create_user("ada").await.unwrap();

        let wager = Amount::from_dollars(50);
        let (after_bet, message) = service
            .apply_action(user, wager, BalanceAction::Bet)
            .await
            .unwrap();
        assert_eq!(
            after_bet,
            STARTING_BALANCE.checked_sub(wager).unwrap()
        );
        assert_eq!(message, "Balance updated: bet $50");

        let (after_win, _) = service
            .apply_action(user, wager, BalanceAction::Win)
            .await
            .unwrap();
        assert_eq!(
            after_win,
            STARTING_BALANCE.checked_add(wager).unwrap()
        );
    }

    #[tokio::test]
    async fn lose_never_changes_the_balance() {
        let (_dir, service, ledger) = service();
        let (user, initial) = ledger.create_user("ada").await.unwrap();
        let (balance, _) = service
            .apply_action(user, Amount::from_dollars(500), BalanceAction::Lose)
            .await
            .unwrap();
        assert_eq!(balance, initial);
    }

    #[tokio::test]
    async fn zero_wagers_are_rejected_before_the_transaction() {
        let (_dir, service, ledger) = service();
        let (user, initial) = ledger.create_user("ada").await.unwrap();
        let err = service
            .apply_action(user, Amount::ZERO, BalanceAction::Bet)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(service.balance(user).await.unwrap(), initial);
    }

    #[tokio::test]
    async fn clicks_credit_the_item_value() {
        let (_dir, service, ledger) = service();
        let (user, initial) = ledger.create_user("ada").await.unwrap();

        let bill = service
            .credit_click(user, &ClickedItem::Kind("dollar_bill".into()))
            .await
            .unwrap();
        assert_eq!(bill.amount, Amount::from_dollars(1));
        assert_eq!(bill.item_name, "Dollar bill");
        assert_eq!(
            bill.balance,
            initial.checked_add(Amount::from_dollars(1)).unwrap()
        );

        let ruby = service
            .credit_click(
                user,
                &ClickedItem::Descriptor {
                    name: "Ruby".into(),
                    value: Amount::from_dollars(100),
                },
            )
            .await
            .unwrap();
        assert_eq!(ruby.amount, Amount::from_dollars(100));
        assert_eq!(ruby.item_name, "Ruby");
    }

    #[tokio::test]
    async fn unknown_kind_ids_are_a_validation_error() {
        let (_dir, service, ledger) = service();
        let (user, initial) = ledger.create_user("ada").await.unwrap();
        let err = service
            .credit_click(user, &ClickedItem::Kind("emerald".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(service.balance(user).await.unwrap(), initial);
    }
}

//! Works out who owes whom from a snapshot of expenses and settlements.
//!
//! Every expense is split evenly between the two partners. A partner's balance
//! is what they paid minus their fair share: a positive balance means they are
//! owed money, a negative balance means they owe money. In full reconciliation
//! mode settlements are netted against those balances, so a debtor paying the
//! creditor moves both balances towards zero.
//!
//! The functions here are pure. They never round, see
//! [crate::money::round_currency] for presentation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};

use crate::{
    expense::Expense,
    money::round_currency,
    partner::{NO_DEBT, PartnerId, Partners},
    settlement::Settlement,
};

/// Whether settlements are netted against the expense balances.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceMode {
    /// Only expenses are considered.
    #[serde(rename = "expenses")]
    ExpensesOnly,
    /// Expenses and settlements are considered.
    #[default]
    #[serde(rename = "full")]
    Full,
}

/// The direction of the debt between the two partners.
///
/// Serializes as two entries, `who_owes_whom` (the debtor or "none") and
/// `owed_to` (the creditor or null), and is meant to be flattened into the
/// struct that contains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhoOwesWhom {
    /// Neither partner owes the other anything.
    Nobody,
    /// `debtor` owes `creditor` money.
    Owes {
        /// The partner with the negative balance.
        debtor: PartnerId,
        /// The partner with the positive balance.
        creditor: PartnerId,
    },
}

impl WhoOwesWhom {
    /// The partner who owes money, if any.
    pub fn debtor(&self) -> Option<&PartnerId> {
        match self {
            WhoOwesWhom::Nobody => None,
            WhoOwesWhom::Owes { debtor, .. } => Some(debtor),
        }
    }

    /// The partner who is owed money, if any.
    pub fn creditor(&self) -> Option<&PartnerId> {
        match self {
            WhoOwesWhom::Nobody => None,
            WhoOwesWhom::Owes { creditor, .. } => Some(creditor),
        }
    }
}

impl Serialize for WhoOwesWhom {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(
            "who_owes_whom",
            self.debtor().map_or(NO_DEBT, PartnerId::as_str),
        )?;
        map.serialize_entry("owed_to", &self.creditor())?;
        map.end()
    }
}

/// The financial position between the two partners.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSummary {
    /// Whether settlements were included.
    pub mode: BalanceMode,
    /// The sum of all expense amounts.
    pub combined_total: Decimal,
    /// How much each partner spent on shared expenses.
    pub paid_by: BTreeMap<PartnerId, Decimal>,
    /// Each partner's even share of the combined total.
    pub fair_share: Decimal,
    /// How much each partner paid to the other in settlements.
    pub settlements_paid: BTreeMap<PartnerId, Decimal>,
    /// How much each partner received from the other in settlements.
    pub settlements_received: BTreeMap<PartnerId, Decimal>,
    /// Each partner's net position, positive when they are owed money.
    pub balance: BTreeMap<PartnerId, Decimal>,
    /// The size of the debt between the partners.
    pub net_balance: Decimal,
    /// Who owes whom, flattened into `who_owes_whom` and `owed_to`.
    #[serde(flatten)]
    pub who_owes_whom: WhoOwesWhom,
}

impl BalanceSummary {
    /// How much `partner` spent on shared expenses.
    pub fn paid(&self, partner: &PartnerId) -> Decimal {
        self.paid_by.get(partner).copied().unwrap_or_default()
    }

    /// The net position of `partner`, positive when they are owed money.
    pub fn balance_of(&self, partner: &PartnerId) -> Decimal {
        self.balance.get(partner).copied().unwrap_or_default()
    }

    /// A copy of the summary with every amount rounded to whole cents.
    ///
    /// Only use this for display, the unrounded summary is the source of truth.
    pub fn rounded(&self) -> Self {
        let round_all = |amounts: &BTreeMap<PartnerId, Decimal>| {
            amounts
                .iter()
                .map(|(partner, amount)| (partner.clone(), round_currency(*amount)))
                .collect()
        };

        let net_balance = round_currency(self.net_balance);
        // A debt of less than half a cent rounds away to nothing.
        let who_owes_whom = if net_balance.is_zero() {
            WhoOwesWhom::Nobody
        } else {
            self.who_owes_whom.clone()
        };

        Self {
            mode: self.mode,
            combined_total: round_currency(self.combined_total),
            paid_by: round_all(&self.paid_by),
            fair_share: round_currency(self.fair_share),
            settlements_paid: round_all(&self.settlements_paid),
            settlements_received: round_all(&self.settlements_received),
            balance: round_all(&self.balance),
            net_balance,
            who_owes_whom,
        }
    }
}

/// Accumulates expenses and settlements one at a time.
///
/// Used directly when intermediate balances are needed, e.g. for balance history.
/// Otherwise prefer [calculate_balance] and [reconcile].
#[derive(Debug, Clone)]
pub struct BalanceLedger<'a> {
    partners: &'a Partners,
    mode: BalanceMode,
    combined_total: Decimal,
    paid: [Decimal; 2],
    settlements_paid: [Decimal; 2],
    settlements_received: [Decimal; 2],
}

impl<'a> BalanceLedger<'a> {
    /// Create an empty ledger between `partners`.
    pub fn new(partners: &'a Partners, mode: BalanceMode) -> Self {
        Self {
            partners,
            mode,
            combined_total: Decimal::ZERO,
            paid: [Decimal::ZERO; 2],
            settlements_paid: [Decimal::ZERO; 2],
            settlements_received: [Decimal::ZERO; 2],
        }
    }

    fn index_of(&self, partner: &PartnerId) -> Option<usize> {
        if self.partners.first().id == *partner {
            Some(0)
        } else if self.partners.second().id == *partner {
            Some(1)
        } else {
            None
        }
    }

    /// Add an expense to the ledger.
    ///
    /// Expenses paid by someone other than the two partners should have been
    /// rejected before they were stored. They are skipped with a warning, as
    /// are expenses that would overflow the running totals.
    pub fn add_expense(&mut self, expense: &Expense) {
        let Some(payer) = self.index_of(&expense.paid_by) else {
            tracing::warn!(
                "Skipping expense {} paid by unknown partner {}",
                expense.id,
                expense.paid_by
            );
            return;
        };

        let (Some(combined_total), Some(paid)) = (
            self.combined_total.checked_add(expense.amount),
            self.paid[payer].checked_add(expense.amount),
        ) else {
            tracing::warn!(
                "Skipping expense {} of {}, the totals would overflow",
                expense.id,
                expense.amount
            );
            return;
        };

        self.combined_total = combined_total;
        self.paid[payer] = paid;
    }

    /// Add a settlement to the ledger.
    ///
    /// Settlements are ignored in [BalanceMode::ExpensesOnly]. Settlements that
    /// do not go from one partner to the other are skipped with a warning.
    pub fn add_settlement(&mut self, settlement: &Settlement) {
        if self.mode == BalanceMode::ExpensesOnly {
            return;
        }

        match (
            self.index_of(&settlement.paid_by),
            self.index_of(&settlement.paid_to),
        ) {
            (Some(payer), Some(payee)) if payer != payee => {
                let (Some(paid), Some(received)) = (
                    self.settlements_paid[payer].checked_add(settlement.amount),
                    self.settlements_received[payee].checked_add(settlement.amount),
                ) else {
                    tracing::warn!(
                        "Skipping settlement {} of {}, the totals would overflow",
                        settlement.id,
                        settlement.amount
                    );
                    return;
                };

                self.settlements_paid[payer] = paid;
                self.settlements_received[payee] = received;
            }
            _ => tracing::warn!(
                "Skipping settlement {} from {} to {}",
                settlement.id,
                settlement.paid_by,
                settlement.paid_to
            ),
        }
    }

    /// The balance of each partner, in the order of [Partners::iter].
    fn balances(&self) -> [Decimal; 2] {
        let fair_share = self.fair_share();

        // Saturates for totals far beyond MAX_AMOUNT.
        [0, 1].map(|i| {
            self.paid[i]
                .saturating_sub(fair_share)
                .saturating_add(self.settlements_paid[i])
                .saturating_sub(self.settlements_received[i])
        })
    }

    fn fair_share(&self) -> Decimal {
        self.combined_total / Decimal::TWO
    }

    /// The balance of the first partner so far.
    pub fn first_partner_balance(&self) -> Decimal {
        self.balances()[0]
    }

    /// Summarise everything added to the ledger so far.
    pub fn summary(&self) -> BalanceSummary {
        let balances = self.balances();
        let [first, second] = [&self.partners.first().id, &self.partners.second().id];
        let per_partner = |amounts: [Decimal; 2]| {
            BTreeMap::from([(first.clone(), amounts[0]), (second.clone(), amounts[1])])
        };

        let who_owes_whom = if balances[0].is_zero() {
            WhoOwesWhom::Nobody
        } else if balances[0].is_sign_positive() {
            WhoOwesWhom::Owes {
                debtor: second.clone(),
                creditor: first.clone(),
            }
        } else {
            WhoOwesWhom::Owes {
                debtor: first.clone(),
                creditor: second.clone(),
            }
        };

        BalanceSummary {
            mode: self.mode,
            combined_total: self.combined_total,
            paid_by: per_partner(self.paid),
            fair_share: self.fair_share(),
            settlements_paid: per_partner(self.settlements_paid),
            settlements_received: per_partner(self.settlements_received),
            balance: per_partner(balances),
            net_balance: balances[0].abs(),
            who_owes_whom,
        }
    }
}

/// Work out the balance between `partners` from `expenses` alone.
pub fn calculate_balance(partners: &Partners, expenses: &[Expense]) -> BalanceSummary {
    let mut ledger = BalanceLedger::new(partners, BalanceMode::ExpensesOnly);

    for expense in expenses {
        ledger.add_expense(expense);
    }

    ledger.summary()
}

/// Work out the balance between `partners` from `expenses`, netting off
/// `settlements`.
pub fn reconcile(
    partners: &Partners,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> BalanceSummary {
    let mut ledger = BalanceLedger::new(partners, BalanceMode::Full);

    for expense in expenses {
        ledger.add_expense(expense);
    }

    for settlement in settlements {
        ledger.add_settlement(settlement);
    }

    ledger.summary()
}

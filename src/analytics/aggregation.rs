//! Spending and balance aggregation for the analytics endpoints.
//!
//! Provides functions to total expenses by month, category and partner, and to
//! track how the balance between the partners changed month by month.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use time::{Date, Month};

use crate::{
    balance::{BalanceLedger, BalanceMode, WhoOwesWhom},
    expense::{Expense, UNCATEGORISED_LABEL},
    partner::{PartnerId, Partners},
    settlement::Settlement,
};

/// A calendar month, e.g. March 2024.
///
/// Serializes as "YYYY-MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthKey {
    year: i32,
    month: Month,
}

impl MonthKey {
    /// The month containing `date`.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month as a short label, e.g. "Mar 2024".
    pub fn label(&self) -> String {
        let month = match self.month {
            Month::January => "Jan",
            Month::February => "Feb",
            Month::March => "Mar",
            Month::April => "Apr",
            Month::May => "May",
            Month::June => "Jun",
            Month::July => "Jul",
            Month::August => "Aug",
            Month::September => "Sep",
            Month::October => "Oct",
            Month::November => "Nov",
            Month::December => "Dec",
        };

        format!("{month} {}", self.year)
    }
}

impl Ord for MonthKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, u8::from(self.month)).cmp(&(other.year, u8::from(other.month)))
    }
}

impl PartialOrd for MonthKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Total spending in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    /// The month the expenses were made in.
    pub month: MonthKey,
    /// A display label for the month, e.g. "Jan 2024".
    pub label: String,
    /// The sum of every expense in the month.
    pub total: Decimal,
    /// How much each partner paid in the month.
    pub paid_by: BTreeMap<PartnerId, Decimal>,
    /// The number of expenses in the month.
    pub expense_count: usize,
}

/// Total spending in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category name.
    pub category: String,
    /// The sum of every expense in the category.
    pub total: Decimal,
    /// The number of expenses in the category.
    pub expense_count: usize,
    /// The category's share of all spending as a percentage, to two decimal places.
    pub percentage: Decimal,
}

/// Everything one partner has paid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerTotals {
    /// The partner's ID.
    pub partner: PartnerId,
    /// The partner's display name.
    pub name: String,
    /// The number of expenses the partner paid for.
    pub expense_count: usize,
    /// The sum of the expenses the partner paid for.
    pub expenses_paid: Decimal,
    /// The sum of the settlements the partner sent.
    pub settlements_paid: Decimal,
    /// The sum of the settlements the partner received.
    pub settlements_received: Decimal,
}

/// The reconciled balance at the end of a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancePoint {
    /// The month the point describes.
    pub month: MonthKey,
    /// A display label for the month, e.g. "Jan 2024".
    pub label: String,
    /// The first partner's balance at the end of the month.
    ///
    /// Positive when the first partner is owed money.
    pub balance: Decimal,
    /// How much the debtor owes at the end of the month.
    pub net_balance: Decimal,
    /// The direction of the debt at the end of the month.
    #[serde(flatten)]
    pub who_owes_whom: WhoOwesWhom,
}

/// Totals expenses by calendar month.
///
/// Only months that have expenses are included, in chronological order.
/// Expenses paid by someone other than `partners` still count towards the
/// monthly total but not towards any partner.
pub fn monthly_trends(partners: &Partners, expenses: &[Expense]) -> Vec<MonthlyTrend> {
    let mut by_month: BTreeMap<MonthKey, MonthlyTrend> = BTreeMap::new();

    for expense in expenses {
        let month = MonthKey::of(expense.date);
        let trend = by_month.entry(month).or_insert_with(|| MonthlyTrend {
            month,
            label: month.label(),
            total: Decimal::ZERO,
            paid_by: partners
                .iter()
                .map(|partner| (partner.id.clone(), Decimal::ZERO))
                .collect(),
            expense_count: 0,
        });

        trend.total = trend.total.saturating_add(expense.amount);
        trend.expense_count += 1;

        if let Some(paid) = trend.paid_by.get_mut(&expense.paid_by) {
            *paid = paid.saturating_add(expense.amount);
        }
    }

    by_month.into_values().collect()
}

/// Totals expenses by category.
///
/// Categories are sorted by total, largest first, with ties broken by name.
/// [UNCATEGORISED_LABEL] is always sorted last.
pub fn category_breakdown(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut by_category: HashMap<&str, (Decimal, usize)> = HashMap::new();
    let mut combined_total = Decimal::ZERO;

    for expense in expenses {
        let (total, count) = by_category
            .entry(expense.category.as_str())
            .or_insert((Decimal::ZERO, 0));
        *total = total.saturating_add(expense.amount);
        *count += 1;
        combined_total = combined_total.saturating_add(expense.amount);
    }

    let mut categories: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, (total, expense_count))| CategoryTotal {
            category: category.to_owned(),
            total,
            expense_count,
            percentage: percentage_of(total, combined_total),
        })
        .collect();

    categories.sort_by(|a, b| {
        let a_uncategorised = a.category == UNCATEGORISED_LABEL;
        let b_uncategorised = b.category == UNCATEGORISED_LABEL;

        a_uncategorised
            .cmp(&b_uncategorised)
            .then_with(|| b.total.cmp(&a.total))
            .then_with(|| a.category.cmp(&b.category))
    });

    categories
}

/// `part` as a percentage of `whole`, or zero when it cannot be calculated.
fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|percentage| {
            percentage.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        })
        .unwrap_or_default()
}

/// Totals what each partner paid, in the order of [Partners::iter].
pub fn partner_totals(
    partners: &Partners,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> Vec<PartnerTotals> {
    partners
        .iter()
        .map(|partner| {
            let paid: Vec<&Expense> = expenses
                .iter()
                .filter(|expense| expense.paid_by == partner.id)
                .collect();

            PartnerTotals {
                partner: partner.id.clone(),
                name: partner.name.clone(),
                expense_count: paid.len(),
                expenses_paid: paid
                    .iter()
                    .map(|expense| expense.amount)
                    .fold(Decimal::ZERO, Decimal::saturating_add),
                settlements_paid: settlements
                    .iter()
                    .filter(|settlement| settlement.paid_by == partner.id)
                    .map(|settlement| settlement.amount)
                    .fold(Decimal::ZERO, Decimal::saturating_add),
                settlements_received: settlements
                    .iter()
                    .filter(|settlement| settlement.paid_to == partner.id)
                    .map(|settlement| settlement.amount)
                    .fold(Decimal::ZERO, Decimal::saturating_add),
            }
        })
        .collect()
}

/// Tracks the reconciled balance at the end of each month with activity.
///
/// A month has activity when it has at least one expense or settlement. The
/// balance is cumulative, so the last point always matches
/// [crate::balance::reconcile] over the same records.
pub fn balance_history(
    partners: &Partners,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> Vec<BalancePoint> {
    let mut expenses_by_month: BTreeMap<MonthKey, Vec<&Expense>> = BTreeMap::new();
    for expense in expenses {
        expenses_by_month
            .entry(MonthKey::of(expense.date))
            .or_default()
            .push(expense);
    }

    let mut settlements_by_month: BTreeMap<MonthKey, Vec<&Settlement>> = BTreeMap::new();
    for settlement in settlements {
        settlements_by_month
            .entry(MonthKey::of(settlement.date))
            .or_default()
            .push(settlement);
    }

    let months: BTreeSet<MonthKey> = expenses_by_month
        .keys()
        .chain(settlements_by_month.keys())
        .copied()
        .collect();

    let mut ledger = BalanceLedger::new(partners, BalanceMode::Full);

    months
        .into_iter()
        .map(|month| {
            for expense in expenses_by_month.get(&month).into_iter().flatten() {
                ledger.add_expense(expense);
            }

            for settlement in settlements_by_month.get(&month).into_iter().flatten() {
                ledger.add_settlement(settlement);
            }

            let summary = ledger.summary();

            BalancePoint {
                month,
                label: month.label(),
                balance: ledger.first_partner_balance(),
                net_balance: summary.net_balance,
                who_owes_whom: summary.who_owes_whom,
            }
        })
        .collect()
}

#[cfg(test)]
mod month_key_tests {
    use time::macros::date;

    use super::MonthKey;

    #[test]
    fn orders_chronologically() {
        let mut months = vec![
            MonthKey::of(date!(2024 - 11 - 05)),
            MonthKey::of(date!(2023 - 12 - 31)),
            MonthKey::of(date!(2024 - 02 - 01)),
        ];

        months.sort();

        let labels: Vec<String> = months.iter().map(MonthKey::label).collect();
        assert_eq!(labels, ["Dec 2023", "Feb 2024", "Nov 2024"]);
    }

    #[test]
    fn same_month_is_equal() {
        assert_eq!(
            MonthKey::of(date!(2024 - 02 - 01)),
            MonthKey::of(date!(2024 - 02 - 29))
        );
    }

    #[test]
    fn serializes_as_year_and_month() {
        let json = serde_json::to_value(MonthKey::of(date!(2024 - 03 - 15))).unwrap();

        assert_eq!(json, "2024-03");
    }
}

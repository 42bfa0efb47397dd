use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calendar::FundDate;
use crate::decimal::Money;
use crate::state::Payment;
use crate::types::PaymentType;

/// one display row of a member's payment history
///
/// a split payment event is stored as two records sharing a date; this view
/// reassembles them. purely derived, nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PaymentRow {
    Single(Payment),
    Combined {
        date: FundDate,
        repayment: Payment,
        contribution: Payment,
        /// the contribution leg came from an over-repayment surplus
        surplus_to_deposit: bool,
    },
}

impl PaymentRow {
    pub fn date(&self) -> FundDate {
        match self {
            PaymentRow::Single(p) => p.date,
            PaymentRow::Combined { date, .. } => *date,
        }
    }

    pub fn total(&self) -> Money {
        match self {
            PaymentRow::Single(p) => p.amount,
            PaymentRow::Combined {
                repayment,
                contribution,
                ..
            } => repayment.amount + contribution.amount,
        }
    }

    /// receipt image behind the row, when the payment came from telegram
    pub fn receipt_image_path(&self) -> Option<&str> {
        match self {
            PaymentRow::Single(p) => p.receipt_image_path.as_deref(),
            PaymentRow::Combined {
                repayment,
                contribution,
                ..
            } => repayment
                .receipt_image_path
                .as_deref()
                .or(contribution.receipt_image_path.as_deref()),
        }
    }
}

/// group one member's payments into display rows, newest date first
///
/// a date holding both a repayment and a contribution renders as one
/// combined row; the contribution leg is flagged as surplus when its note
/// carries the surplus tag. any further records on the same date stay
/// single rows.
pub fn member_history(payments: &[Payment], surplus_tag: &str) -> Vec<PaymentRow> {
    let mut by_date: BTreeMap<FundDate, Vec<&Payment>> = BTreeMap::new();
    for p in payments {
        by_date.entry(p.date).or_default().push(p);
    }

    let mut rows = Vec::new();
    for (date, same_date) in by_date.into_iter().rev() {
        let repayment = same_date
            .iter()
            .position(|p| p.payment_type == PaymentType::Repayment);
        let contribution = same_date
            .iter()
            .position(|p| p.payment_type == PaymentType::Contribution);
        match (repayment, contribution) {
            (Some(r), Some(c)) => {
                let repayment = same_date[r].clone();
                let contribution = same_date[c].clone();
                let surplus = contribution
                    .note
                    .as_deref()
                    .map(|n| n.contains(surplus_tag))
                    .unwrap_or(false);
                rows.push(PaymentRow::Combined {
                    date,
                    repayment,
                    contribution,
                    surplus_to_deposit: surplus,
                });
                for (i, p) in same_date.iter().enumerate() {
                    if i != r && i != c {
                        rows.push(PaymentRow::Single((*p).clone()));
                    }
                }
            }
            _ => {
                for p in same_date {
                    rows.push(PaymentRow::Single(p.clone()));
                }
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn payment(date: &str, amount: i64, payment_type: PaymentType, note: Option<&str>) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            amount: Money::from_major(amount),
            date: date.parse().unwrap(),
            payment_type,
            note: note.map(String::from),
            created_at: Utc::now(),
            receipt_image_path: None,
        }
    }

    const TAG: &str = "مازاد وام به سپرده";

    #[test]
    fn test_same_date_pair_becomes_combined() {
        let payments = vec![
            payment("1400-02-15", 1_200_000, PaymentType::Repayment, Some("بازپرداخت وام (مازاد به سپرده)")),
            payment("1400-02-15", 300_000, PaymentType::Contribution, Some(TAG)),
            payment("1400-01-15", 500_000, PaymentType::Contribution, None),
        ];
        let rows = member_history(&payments, TAG);
        assert_eq!(rows.len(), 2);
        match &rows[0] {
            PaymentRow::Combined {
                surplus_to_deposit, ..
            } => {
                assert!(*surplus_to_deposit);
                assert_eq!(rows[0].total(), Money::from_major(1_500_000));
            }
            other => panic!("expected combined row, got {other:?}"),
        }
        assert!(matches!(rows[1], PaymentRow::Single(_)));
    }

    #[test]
    fn test_installment_pair_not_flagged_as_surplus() {
        let mut first = payment("1400-02-15", 1_000_000, PaymentType::Repayment, Some("قسط ماهانه"));
        first.receipt_image_path = Some("receipts/7.jpg".to_string());
        let payments = vec![
            first,
            payment("1400-02-15", 500_000, PaymentType::Contribution, Some("سپرده")),
        ];
        let rows = member_history(&payments, TAG);
        match &rows[0] {
            PaymentRow::Combined {
                surplus_to_deposit, ..
            } => assert!(!surplus_to_deposit),
            other => panic!("expected combined row, got {other:?}"),
        }
        // the receipt image carries over from whichever leg holds it
        assert_eq!(rows[0].receipt_image_path(), Some("receipts/7.jpg"));
    }

    #[test]
    fn test_rows_sorted_newest_date_first() {
        let payments = vec![
            payment("1400-01-10", 100, PaymentType::Contribution, None),
            payment("1400-03-10", 300, PaymentType::Contribution, None),
            payment("1400-02-10", 200, PaymentType::Repayment, None),
        ];
        let rows = member_history(&payments, TAG);
        let dates: Vec<String> = rows.iter().map(|r| r.date().to_string()).collect();
        assert_eq!(dates, vec!["1400-03-10", "1400-02-10", "1400-01-10"]);
    }

    #[test]
    fn test_lone_records_stay_single() {
        let payments = vec![
            payment("1400-02-15", 100_000, PaymentType::Repayment, None),
            payment("1400-02-16", 100_000, PaymentType::Repayment, None),
        ];
        let rows = member_history(&payments, TAG);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| matches!(r, PaymentRow::Single(_))));
    }
}

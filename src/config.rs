use serde::{Deserialize, Serialize};

use crate::decimal::Money;

/// note texts stamped onto posted records
///
/// the surplus tag doubles as the marker the display grouping looks for,
/// so changing it orphans existing records; keep the defaults unless the
/// store is migrated too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteTemplates {
    /// installment leg of a combined payment
    pub installment: String,
    /// prefix joined to an operator note on the installment leg
    pub installment_prefix: String,
    /// deposit leg of a combined payment
    pub deposit: String,
    pub deposit_prefix: String,
    /// plain repayment
    pub repayment: String,
    pub repayment_prefix: String,
    /// repayment whose surplus went to the deposit
    pub repayment_with_surplus: String,
    /// surplus-to-deposit contribution leg; also the display grouping tag
    pub surplus_to_deposit: String,
    /// repayment record written by a deduct-from-loan withdrawal
    pub withdrawal_deduct_loan: String,
}

impl Default for NoteTemplates {
    fn default() -> Self {
        Self {
            installment: "قسط ماهانه".to_string(),
            installment_prefix: "قسط".to_string(),
            deposit: "سپرده".to_string(),
            deposit_prefix: "سپرده".to_string(),
            repayment: "بازپرداخت".to_string(),
            repayment_prefix: "بازپرداخت".to_string(),
            repayment_with_surplus: "بازپرداخت وام (مازاد به سپرده)".to_string(),
            surplus_to_deposit: "مازاد وام به سپرده".to_string(),
            withdrawal_deduct_loan: "برداشت از سپرده — کسر از وام".to_string(),
        }
    }
}

impl NoteTemplates {
    fn with_prefix(prefix: &str, base: &str, note: Option<&str>) -> String {
        match note {
            Some(n) if !n.trim().is_empty() => format!("{prefix} — {}", n.trim()),
            _ => base.to_string(),
        }
    }

    /// note for the installment leg of a combined payment
    pub fn installment_leg(&self, note: Option<&str>) -> String {
        Self::with_prefix(&self.installment_prefix, &self.installment, note)
    }

    /// note for the deposit leg of a combined payment
    pub fn deposit_leg(&self, note: Option<&str>) -> String {
        Self::with_prefix(&self.deposit_prefix, &self.deposit, note)
    }

    /// note for a repayment; the no-note default names the surplus routing
    /// when part of the amount went to the deposit
    pub fn repayment_leg(&self, note: Option<&str>, has_surplus: bool) -> String {
        let base = if has_surplus {
            &self.repayment_with_surplus
        } else {
            &self.repayment
        };
        Self::with_prefix(&self.repayment_prefix, base, note)
    }

    /// note for the surplus-to-deposit contribution leg
    pub fn surplus_leg(&self, note: Option<&str>) -> String {
        Self::with_prefix(&self.surplus_to_deposit, &self.surplus_to_deposit, note)
    }

    /// fund-log note for a transfer withdrawal
    pub fn transfer_outflow(&self, card_number: &str, amount: Money) -> String {
        format!("واریز به حساب - کارت: {card_number} - مبلغ: {amount}")
    }

    /// tag identifying a surplus-to-deposit leg in stored notes
    pub fn surplus_tag(&self) -> &str {
        &self.surplus_to_deposit
    }
}

/// fund-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundConfig {
    pub notes: NoteTemplates,
    /// message sent to a member when a receipt is rejected without one
    pub default_reject_message: String,
}

impl Default for FundConfig {
    fn default() -> Self {
        Self {
            notes: NoteTemplates::default(),
            default_reject_message: "رسید شما تأیید نشد. در صورت نیاز مجدداً ارسال کنید."
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leg_notes_without_operator_note() {
        let notes = NoteTemplates::default();
        assert_eq!(notes.installment_leg(None), "قسط ماهانه");
        assert_eq!(notes.deposit_leg(None), "سپرده");
        assert_eq!(notes.repayment_leg(None, false), "بازپرداخت");
        assert_eq!(notes.repayment_leg(None, true), "بازپرداخت وام (مازاد به سپرده)");
        assert_eq!(notes.surplus_leg(None), "مازاد وام به سپرده");
    }

    #[test]
    fn test_leg_notes_with_operator_note() {
        let notes = NoteTemplates::default();
        assert_eq!(notes.installment_leg(Some("سهم فروردین")), "قسط — سهم فروردین");
        assert_eq!(notes.surplus_leg(Some("x")), "مازاد وام به سپرده — x");
        // blank operator notes fall back to the base text
        assert_eq!(notes.deposit_leg(Some("  ")), "سپرده");
    }

    #[test]
    fn test_transfer_outflow_names_card_and_amount() {
        let notes = NoteTemplates::default();
        let note = notes.transfer_outflow("6037-1234", Money::from_major(250_000));
        assert!(note.contains("6037-1234"));
        assert!(note.contains("250000"));
    }
}

/// split payments: over-repayment surplus and the combined deposit/installment type
use chrono::Utc;
use hourglass_rs::{SafeTimeProvider, TimeSource};
use lending_fund_rs::{
    Fund, FundConfig, LoanApplication, Member, MemberStatus, MemoryStore, Money, PaymentIntent,
    PaymentRequest, Submission, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let mut store = MemoryStore::new();

    let member = Member {
        id: Uuid::new_v4(),
        full_name: "مریم احمدی".to_string(),
        phone: "09350000000".to_string(),
        national_id: None,
        join_date: "1399-02-01".parse()?,
        monthly_amount: Money::from_major(500_000),
        status: MemberStatus::Active,
        loan_amount: Money::ZERO,
        deposit: Money::from_major(15_000_000),
        loan_balance: Money::ZERO,
        telegram_chat_id: None,
        created_at: Utc::now(),
        version: 0,
    };
    let member_id = member.id;
    store.put_member(member);

    let mut fund = Fund::new(store, FundConfig::default());
    fund.disburse_loan(
        LoanApplication {
            member_id,
            amount: Money::from_major(12_000_000),
            date: "1400-01-15".parse()?,
            due_months: 12,
            note: None,
        },
        &time,
    )?;

    // a repayment above the installment needs operator confirmation:
    // the repayment leg is capped at the loan balance, the rest becomes deposit
    let outcome = fund.submit_payment(
        PaymentRequest {
            member_id,
            amount: Money::from_major(1_500_000),
            date: "1400-02-15".parse()?,
            intent: PaymentIntent::Repayment,
            note: None,
        },
        &time,
    )?;
    let plan = match outcome {
        Submission::NeedsConfirmation(plan) => plan,
        Submission::Posted(_) => unreachable!("over-installment amounts are gated"),
    };
    println!(
        "preview: {} to the loan, {} to the deposit",
        plan.classification.repayment_portion().format_toman(),
        plan.classification.contribution_portion().format_toman()
    );
    let receipt = fund.confirm_payment(plan, &time)?;
    println!("posted {} payment records", receipt.payments.len());

    // the combined type splits differently: always exactly one installment
    let outcome = fund.submit_payment(
        PaymentRequest {
            member_id,
            amount: Money::from_major(1_500_000),
            date: "1400-03-15".parse()?,
            intent: PaymentIntent::ContributionRepayment,
            note: Some("سهم خرداد".to_string()),
        },
        &time,
    )?;
    if let Submission::NeedsConfirmation(plan) = outcome {
        println!(
            "combined preview: {} installment, {} deposit",
            plan.classification.repayment_portion().format_toman(),
            plan.classification.contribution_portion().format_toman()
        );
        fund.confirm_payment(plan, &time)?;
    }

    for row in fund.member_history(member_id)? {
        println!("{} — {}", row.date(), row.total().format_toman());
    }

    Ok(())
}

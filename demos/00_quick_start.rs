/// quick start - minimal example to get started
use chrono::Utc;
use hourglass_rs::{SafeTimeProvider, TimeSource};
use lending_fund_rs::{
    Fund, FundConfig, LoanApplication, Member, MemberStatus, MemoryStore, Money, PaymentIntent,
    PaymentRequest, Submission, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let mut store = MemoryStore::new();

    // register a member with some pooled deposit
    let member = Member {
        id: Uuid::new_v4(),
        full_name: "علی رضایی".to_string(),
        phone: "09120000000".to_string(),
        national_id: None,
        join_date: "1399-05-01".parse()?,
        monthly_amount: Money::from_major(500_000),
        status: MemberStatus::Active,
        loan_amount: Money::ZERO,
        deposit: Money::from_major(3_000_000),
        loan_balance: Money::ZERO,
        telegram_chat_id: None,
        created_at: Utc::now(),
        version: 0,
    };
    let member_id = member.id;
    store.put_member(member);

    let mut fund = Fund::new(store, FundConfig::default());

    // disburse a 1,200,000 toman loan over 12 months
    let disbursal = fund.disburse_loan(
        LoanApplication {
            member_id,
            amount: Money::from_major(1_200_000),
            date: "1400-01-15".parse()?,
            due_months: 12,
            note: None,
        },
        &time,
    )?;
    println!(
        "installment: {}",
        disbursal.loan.monthly_installment().format_toman()
    );

    // pay one monthly installment
    let outcome = fund.submit_payment(
        PaymentRequest {
            member_id,
            amount: Money::from_major(100_000),
            date: "1400-02-15".parse()?,
            intent: PaymentIntent::Repayment,
            note: None,
        },
        &time,
    )?;
    if let Submission::Posted(receipt) = outcome {
        println!(
            "remaining loan balance: {}",
            receipt.member.loan_balance.format_toman()
        );
    }

    Ok(())
}

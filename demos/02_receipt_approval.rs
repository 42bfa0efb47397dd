/// receipt approval - telegram receipts route through the same classification
use chrono::Utc;
use hourglass_rs::{SafeTimeProvider, TimeSource};
use lending_fund_rs::{
    Fund, FundConfig, Loan, LoanStatus, Member, MemberStatus, MemoryStore, Money, PaymentIntent,
    ReceiptApproval, ReceiptSubmission, RequestStatus, Submission, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let mut store = MemoryStore::new();

    let member = Member {
        id: Uuid::new_v4(),
        full_name: "حسین کریمی".to_string(),
        phone: "09190000000".to_string(),
        national_id: None,
        join_date: "1399-07-01".parse()?,
        monthly_amount: Money::from_major(500_000),
        status: MemberStatus::Active,
        loan_amount: Money::from_major(1_200_000),
        deposit: Money::from_major(2_000_000),
        loan_balance: Money::from_major(900_000),
        telegram_chat_id: Some("88421".to_string()),
        created_at: Utc::now(),
        version: 0,
    };
    let member_id = member.id;
    store.put_member(member);
    store.put_loan(Loan {
        id: Uuid::new_v4(),
        member_id,
        amount: Money::from_major(1_200_000),
        date: "1400-01-15".parse()?,
        due_months: 12,
        status: Some(LoanStatus::Active),
        note: None,
        created_at: Utc::now(),
    });

    // two receipts arrive from the bot
    let good = ReceiptSubmission {
        id: Uuid::new_v4(),
        member_id,
        member_name: "حسین کریمی".to_string(),
        image_path: "receipts/1400-02-100.jpg".to_string(),
        status: RequestStatus::Pending,
        note: Some("قسط اردیبهشت".to_string()),
        created_at: Utc::now(),
        approved_at: None,
    };
    let blurry = ReceiptSubmission {
        id: Uuid::new_v4(),
        member_id,
        member_name: "حسین کریمی".to_string(),
        image_path: "receipts/1400-02-101.jpg".to_string(),
        status: RequestStatus::Pending,
        note: None,
        created_at: Utc::now(),
        approved_at: None,
    };
    let good_id = good.id;
    let blurry_id = blurry.id;
    store.put_receipt_submission(good);
    store.put_receipt_submission(blurry);

    let mut fund = Fund::new(store, FundConfig::default());
    println!("pending receipts: {}", fund.pending_receipts()?.len());

    // the admin reads the amount off the image; approval still classifies
    let outcome = fund.approve_receipt(
        good_id,
        ReceiptApproval {
            amount: Money::from_major(100_000),
            date: "1400-02-15".parse()?,
            intent: PaymentIntent::Repayment,
        },
        &time,
    )?;
    if let Submission::Posted(receipt) = outcome {
        println!(
            "posted from receipt, remaining balance: {}",
            receipt.member.loan_balance.format_toman()
        );
        println!(
            "record keeps the image: {:?}",
            receipt.payments[0].receipt_image_path
        );
    }

    // an unreadable receipt goes back to the member with a message
    fund.reject_receipt(blurry_id, Some("رسید خوانا نیست، دوباره ارسال کنید"), &time)?;
    println!("pending receipts: {}", fund.pending_receipts()?.len());

    Ok(())
}

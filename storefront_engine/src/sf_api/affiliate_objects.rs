use serde::{Deserialize, Serialize};

use crate::db_types::{BankDetails, Kobo, LedgerEntry, Referral};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub amount: Kobo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub reference: String,
    pub amount: Kobo,
    pub new_balance: Kobo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateCodeCheck {
    pub valid: bool,
    pub affiliate_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateRegistration {
    pub affiliate_code: String,
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffiliateDashboard {
    pub affiliate_code: Option<String>,
    pub approved: bool,
    pub wallet_balance: Kobo,
    pub referral_count: usize,
    pub total_commission: Kobo,
    pub referrals: Vec<Referral>,
    /// The most recent commission, withdrawal and adjustment entries
    pub recent_transactions: Vec<LedgerEntry>,
    /// Where withdrawals are paid out to. `None` until all the bank fields are filled in.
    pub bank_details: Option<BankDetails>,
}

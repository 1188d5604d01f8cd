use std::fmt::Debug;

use log::*;
use sf_common::helpers::normalize_code;

use crate::{
    db_types::{Kobo, NewLedgerEntry, TransactionStatus, TransactionType, UserAccount},
    helpers::{generate_affiliate_code, withdrawal_reference},
    sf_api::{
        affiliate_objects::{AffiliateCodeCheck, AffiliateDashboard, AffiliateRegistration, WithdrawalReceipt},
        errors::StorefrontError,
    },
    traits::{AccountManagement, StoreDbError, WalletManagement},
};

const MAX_CODE_ATTEMPTS: usize = 10;
pub const DASHBOARD_TRANSACTION_LIMIT: i64 = 20;

/// Affiliate self-service: registration, code validation, the earnings dashboard and withdrawals.
pub struct AffiliateApi<B> {
    db: B,
}

impl<B> Debug for AffiliateApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AffiliateApi")
    }
}

impl<B> AffiliateApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AffiliateApi<B>
where B: AccountManagement + WalletManagement
{
    /// Moves `amount` out of an approved affiliate's wallet into a pending withdrawal. The payout itself happens
    /// elsewhere; the ledger entry carries the bank details it needs.
    pub async fn request_withdrawal(&self, user_id: i64, amount: Kobo) -> Result<WithdrawalReceipt, StorefrontError> {
        if !amount.is_positive() {
            return Err(StorefrontError::InvalidAmount(format!("Withdrawal amount must be positive, but was {amount}")));
        }
        let user = self.fetch_user(user_id).await?;
        if !user.is_approved_affiliate() {
            warn!("💰️ User #{user_id} requested a withdrawal but is not an approved affiliate");
            return Err(StorefrontError::Authorization("Only approved affiliates can withdraw".into()));
        }
        let bank = user.bank_details().ok_or_else(|| {
            StorefrontError::Validation("Bank details must be complete before requesting a withdrawal".into())
        })?;
        let reference = withdrawal_reference();
        let entry = NewLedgerEntry::wallet(user_id, TransactionType::Withdrawal, -amount, reference.clone())
            .with_status(TransactionStatus::Pending)
            .with_metadata(serde_json::json!({
                "account_name": bank.account_name,
                "account_number": bank.account_number,
                "bank_name": bank.bank_name,
            }));
        let new_balance = self.db.debit_wallet(entry).await?;
        info!("💰️ Withdrawal {reference} of {amount} requested by affiliate #{user_id}. New balance: {new_balance}");
        Ok(WithdrawalReceipt { reference, amount, new_balance })
    }

    /// Checks whether a code belongs to an approved affiliate.
    pub async fn validate_affiliate_code(&self, code: &str) -> Result<AffiliateCodeCheck, StorefrontError> {
        let code = normalize_code(code).ok_or_else(|| StorefrontError::Validation("Affiliate code is empty".into()))?;
        let affiliate = self
            .db
            .fetch_affiliate_by_code(&code)
            .await?
            .ok_or_else(|| StorefrontError::NotFound(format!("Affiliate code {code}")))?;
        if !affiliate.affiliate_approved {
            return Err(StorefrontError::Authorization(format!("Affiliate code {code} is not approved yet")));
        }
        Ok(AffiliateCodeCheck { valid: true, affiliate_name: affiliate.full_name })
    }

    /// Makes the user an affiliate with a fresh random code. New affiliates need approval before their code gives a
    /// discount or earns commission.
    pub async fn register_affiliate(&self, user_id: i64) -> Result<AffiliateRegistration, StorefrontError> {
        let user = self.fetch_user(user_id).await?;
        if user.is_affiliate {
            return Err(StorefrontError::Validation("User is already an affiliate".into()));
        }
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_affiliate_code();
            match self.db.register_affiliate(user_id, &code).await {
                Ok(Some(user)) => {
                    info!("🤝️ User #{user_id} registered as affiliate {code}");
                    return Ok(AffiliateRegistration {
                        affiliate_code: user.affiliate_code.unwrap_or(code),
                        approved: user.affiliate_approved,
                    });
                },
                Ok(None) => return Err(StorefrontError::Validation("User is already an affiliate".into())),
                Err(StoreDbError::DuplicateEntry(_)) => {
                    debug!("🤝️ Affiliate code {code} is taken (attempt {attempt}). Trying another.");
                },
                Err(e) => return Err(e.into()),
            }
        }
        error!("🤝️ Could not find a free affiliate code for user #{user_id} after {MAX_CODE_ATTEMPTS} attempts");
        Err(StorefrontError::Consistency("Could not allocate an affiliate code".into()))
    }

    pub async fn affiliate_dashboard(&self, user_id: i64) -> Result<AffiliateDashboard, StorefrontError> {
        let user = self.fetch_user(user_id).await?;
        if !user.is_affiliate {
            return Err(StorefrontError::Authorization("User is not an affiliate".into()));
        }
        let referrals = self.db.fetch_referrals(user_id).await?;
        let types = [TransactionType::Commission, TransactionType::Withdrawal, TransactionType::Adjustment];
        let recent_transactions = self.db.fetch_ledger_entries(user_id, &types, DASHBOARD_TRANSACTION_LIMIT).await?;
        let total_commission = referrals.iter().map(|r| r.commission_amount).sum();
        let bank_details = user.bank_details();
        Ok(AffiliateDashboard {
            affiliate_code: user.affiliate_code,
            approved: user.affiliate_approved,
            wallet_balance: user.wallet_balance,
            referral_count: referrals.len(),
            total_commission,
            referrals,
            recent_transactions,
            bank_details,
        })
    }

    async fn fetch_user(&self, user_id: i64) -> Result<UserAccount, StorefrontError> {
        self.db.fetch_user(user_id).await?.ok_or(StorefrontError::UserNotFound(user_id))
    }
}

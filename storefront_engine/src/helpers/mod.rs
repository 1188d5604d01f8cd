mod references;
mod webhook_signature;

pub use references::{
    commission_reference,
    gateway_reference,
    generate_affiliate_code,
    order_number,
    wallet_reference,
    withdrawal_reference,
    AFFILIATE_CODE_LENGTH,
};
pub use webhook_signature::{calculate_webhook_signature, verify_webhook_signature};

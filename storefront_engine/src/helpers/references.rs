//! Builders for the human-readable identifiers that the engine hands out.
use chrono::Utc;
use rand::{distributions::Uniform, Rng};

const ORDER_NUMBER_PREFIX: &str = "MEL";
const AFFILIATE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const AFFILIATE_CODE_LENGTH: usize = 5;

/// `MEL-000042` for order id 42. Ids above 999,999 simply use more digits.
pub fn order_number(order_id: i64) -> String {
    format!("{ORDER_NUMBER_PREFIX}-{order_id:06}")
}

/// The reference sent to the payment gateway. It is unique per initialisation attempt, so a retried payment gets a
/// fresh reference. `MEL-000042-1760000000000` for order `MEL-000042`.
pub fn gateway_reference(order_number: &str) -> String {
    format!("{order_number}-{}", Utc::now().timestamp_millis())
}

/// Ledger reference for the wallet portion of an order. Also the settlement reference of orders the wallet covers in
/// full.
pub fn wallet_reference(order_number: &str) -> String {
    format!("WALLET-{order_number}")
}

pub fn commission_reference(order_number: &str) -> String {
    format!("COMM-{order_number}")
}

pub fn withdrawal_reference() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    format!("WD-{}-{suffix}", Utc::now().timestamp_millis())
}

/// A random affiliate code of [`AFFILIATE_CODE_LENGTH`] upper-case letters and digits.
pub fn generate_affiliate_code() -> String {
    let dist = Uniform::from(0..AFFILIATE_CODE_ALPHABET.len());
    rand::thread_rng().sample_iter(dist).take(AFFILIATE_CODE_LENGTH).map(|i| AFFILIATE_CODE_ALPHABET[i] as char).collect()
}

mod kobo;

pub mod helpers;
pub mod op;
mod secret;

pub use kobo::{Kobo, KoboConversionError, CURRENCY_CODE, KOBO_PER_NAIRA};
pub use secret::Secret;

pub mod helpers;
mod money;

pub mod op;
mod secret;

pub use money::{Coins, Money, MoneyConversionError, CURRENCY_CODE};
pub use secret::Secret;

pub mod enums;

pub use enums::{Currency, CurrencyUnit, PaymentStatus};

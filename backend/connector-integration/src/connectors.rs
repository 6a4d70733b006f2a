pub mod quickpay;

pub use self::quickpay::Quickpay;

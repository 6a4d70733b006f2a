//! Common utilities shared by the payment integration crates.

/// Masking primitives for secrets and header values. Secrets deserialize and
/// serialize transparently (request construction needs the real value) but
/// never render through `Debug`/`Display`.
pub mod masking {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    /// A wrapper that keeps the inner value out of log output. Access is
    /// explicit via [`PeekInterface`] or [`ExposeInterface`].
    #[derive(Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
    #[serde(transparent)]
    pub struct Secret<T>(T);

    impl<T> Secret<T> {
        pub fn new(value: T) -> Self {
            Self(value)
        }
    }

    impl<T> From<T> for Secret<T> {
        fn from(value: T) -> Self {
            Self(value)
        }
    }

    impl<T> fmt::Debug for Secret<T> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "*** {} ***", std::any::type_name::<T>())
        }
    }

    impl<T: Default> Default for Secret<T> {
        fn default() -> Self {
            Self(T::default())
        }
    }

    pub trait PeekInterface<T> {
        fn peek(&self) -> &T;
    }

    impl<T> PeekInterface<T> for Secret<T> {
        fn peek(&self) -> &T {
            &self.0
        }
    }

    pub trait ExposeInterface<T> {
        fn expose(self) -> T;
    }

    impl<T> ExposeInterface<T> for Secret<T> {
        fn expose(self) -> T {
            self.0
        }
    }

    /// A value that may or may not need masking when rendered, e.g. header
    /// values where `Authorization` is masked and `Content-Type` is not.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub enum Maskable<T> {
        Masked(Secret<T>),
        Normal(T),
    }

    impl<T: Clone> Maskable<T> {
        pub fn new_masked(value: Secret<T>) -> Self {
            Self::Masked(value)
        }

        pub fn new_normal(value: T) -> Self {
            Self::Normal(value)
        }

        /// The raw inner value, regardless of masking.
        pub fn into_inner(self) -> T {
            match self {
                Self::Masked(secret) => secret.0,
                Self::Normal(value) => value,
            }
        }
    }

    impl<T> From<T> for Maskable<T> {
        fn from(value: T) -> Self {
            Self::Normal(value)
        }
    }

    pub trait Mask {
        type Output;
        fn into_masked(self) -> Self::Output;
    }

    impl Mask for String {
        type Output = Maskable<String>;

        fn into_masked(self) -> Self::Output {
            Maskable::Masked(Secret::new(self))
        }
    }

    impl Mask for Secret<String> {
        type Output = Maskable<String>;

        fn into_masked(self) -> Self::Output {
            Maskable::Masked(self)
        }
    }
}

pub use masking::{ExposeInterface, Mask, Maskable, PeekInterface, Secret};

pub mod consts;
pub mod crypto;
pub mod errors;
pub mod ext_traits;
pub mod request;
pub mod types;

pub use errors::{CustomResult, ParsingError};
pub use request::{Method, Request, RequestBuilder, RequestContent};

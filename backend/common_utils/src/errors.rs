/// The shared result type: a value or an [`error_stack::Report`] wrapping a
/// typed error, with printable context attached along the way.
pub type CustomResult<T, E> = error_stack::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Failed to sign message")]
    MessageSigningFailed,
    #[error("Failed to verify signature")]
    SignatureVerificationFailed,
}

#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    #[error("Failed to parse struct: {0}")]
    StructParseFailure(&'static str),
    #[error("Failed to serialize to {0} format")]
    EncodeError(&'static str),
    #[error("Could not convert i64 to decimal")]
    I64ToDecimalConversionFailure,
    #[error("Could not convert decimal to f64")]
    FloatToDecimalConversionFailure,
}

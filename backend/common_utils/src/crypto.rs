//! Signing and verification algorithms for webhook authentication.

use crate::errors::{CryptoError, CustomResult};

/// Sign a message with the given secret.
pub trait SignMessage: Send + Sync {
    fn sign_message(&self, secret: &[u8], msg: &[u8]) -> CustomResult<Vec<u8>, CryptoError>;
}

/// Verify a signature over a message with the given secret.
pub trait VerifySignature: Send + Sync {
    fn verify_signature(
        &self,
        secret: &[u8],
        signature: &[u8],
        msg: &[u8],
    ) -> CustomResult<bool, CryptoError>;
}

/// Pass-through algorithm for connectors without source verification.
#[derive(Debug)]
pub struct NoAlgorithm;

impl SignMessage for NoAlgorithm {
    fn sign_message(&self, _secret: &[u8], _msg: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        Ok(Vec::new())
    }
}

impl VerifySignature for NoAlgorithm {
    fn verify_signature(
        &self,
        _secret: &[u8],
        _signature: &[u8],
        _msg: &[u8],
    ) -> CustomResult<bool, CryptoError> {
        Ok(true)
    }
}

/// HMAC-SHA256. Verification is constant-time via `ring::hmac::verify`.
#[derive(Debug)]
pub struct HmacSha256;

impl SignMessage for HmacSha256 {
    fn sign_message(&self, secret: &[u8], msg: &[u8]) -> CustomResult<Vec<u8>, CryptoError> {
        let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret);
        Ok(ring::hmac::sign(&key, msg).as_ref().to_vec())
    }
}

impl VerifySignature for HmacSha256 {
    fn verify_signature(
        &self,
        secret: &[u8],
        signature: &[u8],
        msg: &[u8],
    ) -> CustomResult<bool, CryptoError> {
        let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret);
        Ok(ring::hmac::verify(&key, msg, signature).is_ok())
    }
}

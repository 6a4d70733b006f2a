use common_utils::{crypto, errors::CustomResult};
use domain_types::{
    connector_types::ConnectorWebhookSecrets, errors::ConnectorError,
    router_data::ConnectorAuthType,
};
use error_stack::ResultExt;

#[derive(Clone)]
pub enum ConnectorSourceVerificationSecrets {
    AuthHeaders(ConnectorAuthType),
    WebhookSecret(ConnectorWebhookSecrets),
}

/// Core trait for verifying that an inbound payload was produced by the
/// gateway. The default pipeline extracts the secret, the claimed signature
/// and the message, then checks them with the connector's algorithm.
pub trait SourceVerification {
    fn get_secrets(
        &self,
        _secrets: ConnectorSourceVerificationSecrets,
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        Ok(Vec::new())
    }

    fn get_algorithm(
        &self,
    ) -> CustomResult<Box<dyn crypto::VerifySignature + Send>, ConnectorError> {
        Ok(Box::new(crypto::NoAlgorithm))
    }

    fn get_signature(
        &self,
        _payload: &[u8],
        _secrets: &[u8],
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        Ok(Vec::new())
    }

    fn get_message(
        &self,
        payload: &[u8],
        _secrets: &[u8],
    ) -> CustomResult<Vec<u8>, ConnectorError> {
        Ok(payload.to_owned())
    }

    fn verify(
        &self,
        secrets: ConnectorSourceVerificationSecrets,
        payload: &[u8],
    ) -> CustomResult<bool, ConnectorError> {
        let algorithm = self.get_algorithm()?;
        let extracted_secrets = self.get_secrets(secrets)?;
        let signature = self.get_signature(payload, &extracted_secrets)?;
        let message = self.get_message(payload, &extracted_secrets)?;

        algorithm
            .verify_signature(&extracted_secrets, &signature, &message)
            .change_context(ConnectorError::SourceVerificationFailed)
    }
}

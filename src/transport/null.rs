use super::{Gateway, OutboundMessage, UserInfo};
use crate::error::TransportError;
use async_trait::async_trait;
use uuid::Uuid;

/// A local gateway that performs no network calls. Used by the preview
/// runner and tests; session ids are minted locally so the traversal path
/// behaves exactly as it does with a real backend.
pub struct NullGateway;

#[async_trait]
impl Gateway for NullGateway {
    async fn fetch_flow(&self, _public_id: &str) -> Result<String, TransportError> {
        Err(TransportError::Disabled)
    }

    async fn create_session(
        &self,
        _assistant_id: &str,
        _user_info: &UserInfo,
    ) -> Result<String, TransportError> {
        Ok(format!("local-{}", Uuid::new_v4().simple()))
    }

    async fn log_message(
        &self,
        _session_id: &str,
        _message: &OutboundMessage,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn node_viewed(&self, _session_id: &str, _node_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn end_session(&self, _session_id: &str) -> Result<(), TransportError> {
        Ok(())
    }
}

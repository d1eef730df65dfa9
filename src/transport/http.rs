use super::{Gateway, OutboundMessage, UserInfo};
use crate::error::TransportError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// The HTTP implementation of the backend gateway.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn checked(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(TransportError::Status(response.status().as_u16()))
    }
}

#[derive(Deserialize)]
struct SessionCreated {
    id: String,
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_flow(&self, public_id: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(self.url(&format!("/api/assistants/{public_id}/flow")))
            .send()
            .await?;
        Ok(checked(response)?.text().await?)
    }

    async fn create_session(
        &self,
        assistant_id: &str,
        user_info: &UserInfo,
    ) -> Result<String, TransportError> {
        let response = self
            .client
            .post(self.url("/api/sessions/"))
            .json(&json!({
                "assistant_id": assistant_id,
                "user_info": user_info,
            }))
            .send()
            .await?;
        let created: SessionCreated = checked(response)?.json().await?;
        Ok(created.id)
    }

    async fn log_message(
        &self,
        session_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.url(&format!("/api/sessions/{session_id}/messages")))
            .json(message)
            .send()
            .await?;
        checked(response)?;
        Ok(())
    }

    async fn node_viewed(&self, session_id: &str, node_id: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.url(&format!(
                "/api/sessions/{session_id}/nodes/{node_id}/viewed"
            )))
            .send()
            .await?;
        checked(response)?;
        Ok(())
    }

    async fn end_session(&self, session_id: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .put(self.url(&format!("/api/sessions/{session_id}/end")))
            .send()
            .await?;
        checked(response)?;
        Ok(())
    }
}

//! Client for the backend clients API

use keydesk_common::{
    client_url, clients_url, decode_client, decode_clients, generate_key_url, Client, ClientId,
    NewClient, ProtocolError,
};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Upper bound for a single API request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status { status: StatusCode, url: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// HTTP client bound to one API base URL
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Get the API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {api}/clients`
    pub async fn list_clients(&self) -> Result<Vec<Client>, ApiError> {
        let response = self.client.get(clients_url(&self.base_url)).send().await?;
        let body = read_body(response).await?;
        Ok(decode_clients(&body)?)
    }

    /// `GET {api}/clients/{id}`
    pub async fn get_client(&self, id: ClientId) -> Result<Client, ApiError> {
        let response = self.client.get(client_url(&self.base_url, id)).send().await?;
        let body = read_body(response).await?;
        Ok(decode_client(&body)?)
    }

    /// `POST {api}/clients`
    pub async fn create_client(&self, name: &str) -> Result<Client, ApiError> {
        let response = self
            .client
            .post(clients_url(&self.base_url))
            .form(&NewClient::new(name))
            .send()
            .await?;
        let body = read_body(response).await?;
        Ok(decode_client(&body)?)
    }

    /// `POST {api}/clients/{id}`
    pub async fn update_client(&self, id: ClientId, name: &str) -> Result<Client, ApiError> {
        let response = self
            .client
            .post(client_url(&self.base_url, id))
            .form(&NewClient::new(name))
            .send()
            .await?;
        let body = read_body(response).await?;
        Ok(decode_client(&body)?)
    }

    /// `DELETE {api}/clients/{id}`
    pub async fn delete_client(&self, id: ClientId) -> Result<Client, ApiError> {
        let response = self
            .client
            .delete(client_url(&self.base_url, id))
            .send()
            .await?;
        let body = read_body(response).await?;
        Ok(decode_client(&body)?)
    }

    /// `POST {api}/clients/{id}/generate_key`
    pub async fn generate_key(&self, id: ClientId) -> Result<Client, ApiError> {
        let response = self
            .client
            .post(generate_key_url(&self.base_url, id))
            .send()
            .await?;
        let body = read_body(response).await?;
        Ok(decode_client(&body)?)
    }
}

/// Read the body of a successful response as text.
///
/// The content type is not trusted; callers decode the text as JSON.
async fn read_body(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            status,
            url: response.url().to_string(),
        });
    }
    Ok(response.text().await?)
}

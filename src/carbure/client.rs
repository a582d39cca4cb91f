//! HTTP client for CarbuRe API requests.
//!
//! This module provides a low-level HTTP client wrapper for making requests
//! to the CarbuRe API, handling authentication, status checks, and response
//! parsing.

use super::CarbureError;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Makes requests to CarbuRe and tries to conform response data to the
/// requested type.
///
pub struct Client {
    pub(crate) access_token: Option<String>,
    pub(crate) base_url: String,
    pub(crate) http_client: reqwest::Client,
}

impl Client {
    /// Returns a new instance for the given base URL and optional token.
    ///
    pub fn new(access_token: Option<&str>, base_url: &str) -> Result<Self, CarbureError> {
        Ok(Client {
            access_token: access_token.map(str::to_owned),
            base_url: base_url.trim_end_matches('/').to_owned(),
            http_client: reqwest::Client::builder().build()?,
        })
    }

    /// Issue a GET request with the given parameters and decode the body.
    ///
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, CarbureError> {
        let response = self.request(Method::GET, path).query(params).send().await?;
        let response = Self::check(response).await?;

        let bytes = response.bytes().await?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            log::error!(
                "Failed to deserialize API response: {}. Response body: {}",
                e,
                String::from_utf8_lossy(&bytes)
            );
            CarbureError::Deserialization(e)
        })
    }

    /// Issue a POST request with a JSON body, discarding the response body.
    ///
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), CarbureError> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Prepare a request with authentication for the given path.
    ///
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        log::debug!("{} {}", method, url);
        let request = self.http_client.request(method, &url);
        match &self.access_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Turn non-success statuses into errors carrying the response text.
    ///
    async fn check(response: Response) -> Result<Response, CarbureError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("Unable to read response"));
        log::error!("API request failed with status {}: {}", status, message);
        Err(CarbureError::ApiError {
            status: status.as_u16(),
            message,
        })
    }
}

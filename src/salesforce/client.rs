//! HTTP client for CRM REST and Tooling API requests.
//!
//! This module wraps `reqwest` with bearer authentication, versioned paths,
//! `nextRecordsUrl` pagination and error-body parsing.

use super::error::SalesforceError;
use super::models::{error_message, QueryPage};
use anyhow::Result;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Makes requests to the CRM and tries to conform response data to a given
/// type.
///
pub struct Client {
    pub(crate) access_token: String,
    pub(crate) base_url: String,
    pub(crate) api_version: String,
    pub(crate) http_client: reqwest::Client,
}

impl Client {
    /// Returns a new instance for the given access token, instance URL and
    /// API version (e.g. `59.0`).
    ///
    pub fn new(access_token: &str, base_url: &str, api_version: &str) -> Self {
        Client {
            access_token: access_token.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_version: api_version.trim_start_matches('v').to_owned(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Return the versioned REST path for a resource, e.g. `sobjects/`.
    ///
    pub(crate) fn data_path(&self, resource: &str) -> String {
        format!("/services/data/v{}/{}", self.api_version, resource)
    }

    /// Return deserialized data for a GET request or error.
    ///
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<Vec<(&str, &str)>>,
    ) -> Result<T> {
        let response = self.call(Method::GET, path, params, None::<&()>).await?;
        Self::parse(response).await
    }

    /// Send a JSON body and return the raw response, successful or not.
    ///
    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Response> {
        self.call(Method::POST, path, None, Some(body)).await
    }

    /// Send a JSON body as a partial update and return the raw response.
    ///
    pub async fn patch<B: Serialize>(&self, path: &str, body: &B) -> Result<Response> {
        self.call(Method::PATCH, path, None, Some(body)).await
    }

    /// Run a SOQL query against `query/` or `tooling/query/`, following
    /// `nextRecordsUrl` until the result is done.
    ///
    pub async fn query_all<T: DeserializeOwned>(&self, resource: &str, soql: &str) -> Result<Vec<T>> {
        let mut page: QueryPage<T> = self
            .get(&self.data_path(resource), Some(vec![("q", soql)]))
            .await?;
        let mut records = Vec::new();
        let mut pages = 1;

        loop {
            records.extend(page.records);
            log::debug!(
                "Fetched query page {} (total so far: {} of {})",
                pages,
                records.len(),
                page.total_size
            );
            let next = match (page.done, page.next_records_url) {
                (false, Some(next)) => next,
                _ => break,
            };
            if !next.starts_with("/services/data/") {
                return Err(SalesforceError::Pagination(next).into());
            }
            page = self.get(&next, None).await?;
            pages += 1;
        }

        Ok(records)
    }

    /// Fail with an `ApiError` carrying the parsed error body when the status
    /// is not a success.
    ///
    pub(crate) async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("Unable to read response"));
        let message = error_message(&body);
        log::error!("API request failed with status {}: {}", status, message);
        Err(SalesforceError::ApiError {
            status: status.as_u16(),
            message,
        }
        .into())
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        match serde_json::from_slice::<T>(&bytes) {
            Ok(data) => Ok(data),
            Err(e) => {
                log::error!(
                    "Failed to deserialize API response: {}. Response body: {}",
                    e,
                    String::from_utf8_lossy(&bytes)
                );
                Err(SalesforceError::Deserialization(e).into())
            }
        }
    }

    /// Make request and return the response or a transport error.
    ///
    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        params: Option<Vec<(&str, &str)>>,
        body: Option<&B>,
    ) -> Result<Response> {
        let request_url = format!("{}{}", &self.base_url, path);
        log::trace!("{} {}", method, request_url);

        let mut request = self
            .http_client
            .request(method, &request_url)
            .header("Authorization", format!("Bearer {}", &self.access_token))
            .header("Accept", "application/json");

        if let Some(params) = params {
            request = request.query(&params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await.map_err(SalesforceError::from)?)
    }
}

use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::descriptor::RemoteDirectory;

pub const DEFAULT_API_URL: &str = "http://qverlix.serv.nu:3004/api";

#[derive(Debug, Error)]
pub enum CapeApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api base url cannot carry path segments: {0}")]
    CannotBeABase(Url),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

impl CapeApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CapeApiError::Api { status, .. } => Some(*status),
            CapeApiError::Request(err) => err.status(),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct CapeApiClient {
    http: Client,
    base_url: Url,
}

impl CapeApiClient {
    pub fn with_base_url(base_url: &str) -> Result<Self, CapeApiError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(CapeApiError::CannotBeABase(base_url));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches the full username to descriptor listing.
    pub async fn fetch_directory(&self) -> Result<RemoteDirectory, CapeApiError> {
        debug!(url = %self.base_url, "fetching cape directory");
        let response = self.http.get(self.base_url.clone()).send().await?;
        let map: Map<String, Value> = Self::handle_response(response).await?;
        Ok(RemoteDirectory::from_json_map(map))
    }

    /// Downloads the PNG texture for `cape_id` from `<base>/cape/<id>`.
    pub async fn download_cape(&self, cape_id: &str) -> Result<Vec<u8>, CapeApiError> {
        let url = self.cape_endpoint(cape_id)?;
        debug!(url = %url, cape_id, "downloading cape");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CapeApiError::Api { status, body });
        }
        Ok(response.bytes().await?.to_vec())
    }

    fn cape_endpoint(&self, cape_id: &str) -> Result<Url, CapeApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CapeApiError::CannotBeABase(self.base_url.clone()))?
            .pop_if_empty()
            .push("cape")
            .push(cape_id);
        Ok(url)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CapeApiError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(CapeApiError::Api { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cape_endpoint_keeps_base_path() {
        let client = CapeApiClient::with_base_url("http://localhost:3004/api").unwrap();
        let url = client.cape_endpoint("custom_0").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3004/api/cape/custom_0");
    }

    #[test]
    fn cape_endpoint_tolerates_trailing_slash() {
        let client = CapeApiClient::with_base_url("http://localhost:3004/api/").unwrap();
        let url = client.cape_endpoint("free_1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3004/api/cape/free_1");
    }

    #[test]
    fn cape_endpoint_encodes_id_as_single_segment() {
        let client = CapeApiClient::with_base_url("http://localhost/api").unwrap();
        let url = client.cape_endpoint("a b/c").unwrap();
        assert_eq!(url.as_str(), "http://localhost/api/cape/a%20b%2Fc");
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(matches!(
            CapeApiClient::with_base_url("mailto:someone@example.com"),
            Err(CapeApiError::CannotBeABase(_))
        ));
        assert!(matches!(
            CapeApiClient::with_base_url("not a url"),
            Err(CapeApiError::Url(_))
        ));
    }
}

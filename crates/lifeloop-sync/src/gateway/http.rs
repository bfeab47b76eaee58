use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use lifeloop_shared::constants::ENTRIES_COLLECTION;
use lifeloop_shared::{EntryId, IdentityId, RemoteRecord};

use super::{GatewayError, RemoteGateway};
use crate::config::ClientConfig;

/// Gateway speaking to a `lifeloop-server` instance.
///
/// Routes are `/users/{identity}/entries[/{id}|/batch]`. Request timeouts are
/// enforced here, per request.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpGateway {
    pub fn new(
        base_url: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GatewayError::Unavailable(format!("invalid remote URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::Unavailable(format!(
                "remote URL {base_url} cannot hold paths"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_token,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, GatewayError> {
        Self::new(
            &config.remote_url,
            config.api_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn collection_url(&self, owner: &IdentityId, tail: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["users", owner.as_str(), ENTRIES_COLLECTION])
                .extend(tail);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, GatewayError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };

    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(GatewayError::Unavailable(format!("{status}: {message}")))
    } else {
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn fetch_all(&self, owner: &IdentityId) -> Result<Vec<RemoteRecord>, GatewayError> {
        let url = self.collection_url(owner, &[]);
        let response = self.send(self.request(Method::GET, url)).await?;
        let records: Vec<RemoteRecord> = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        debug!(identity = %owner, records = records.len(), "fetched remote collection");
        Ok(records)
    }

    async fn put(&self, owner: &IdentityId, record: &RemoteRecord) -> Result<(), GatewayError> {
        let url = self.collection_url(owner, &[record.id().as_str()]);
        self.send(self.request(Method::PUT, url).json(record)).await?;
        Ok(())
    }

    async fn put_batch(
        &self,
        owner: &IdentityId,
        records: &[RemoteRecord],
    ) -> Result<(), GatewayError> {
        let url = self.collection_url(owner, &["batch"]);
        self.send(self.request(Method::POST, url).json(records)).await?;
        Ok(())
    }

    async fn delete(&self, owner: &IdentityId, id: &EntryId) -> Result<(), GatewayError> {
        let url = self.collection_url(owner, &[id.as_str()]);
        match self.send(self.request(Method::DELETE, url)).await {
            Ok(_) => Ok(()),
            Err(GatewayError::Rejected { status: 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base: &str) -> HttpGateway {
        HttpGateway::new(base, None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_builds_collection_urls() {
        let gw = gateway("http://localhost:8080");
        let owner = IdentityId::from("uid_1");
        assert_eq!(
            gw.collection_url(&owner, &[]).as_str(),
            "http://localhost:8080/users/uid_1/entries"
        );
        assert_eq!(
            gw.collection_url(&owner, &["batch"]).as_str(),
            "http://localhost:8080/users/uid_1/entries/batch"
        );
    }

    #[test]
    fn test_keeps_base_path_prefix() {
        let gw = gateway("https://example.com/api/");
        let url = gw.collection_url(&IdentityId::from("u"), &["e1"]);
        assert_eq!(url.as_str(), "https://example.com/api/users/u/entries/e1");
    }

    #[test]
    fn test_escapes_path_segments() {
        let gw = gateway("http://localhost:8080");
        let url = gw.collection_url(&IdentityId::from("a/b"), &[]);
        assert_eq!(url.as_str(), "http://localhost:8080/users/a%2Fb/entries");
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(HttpGateway::new("not a url", None, Duration::from_secs(1)).is_err());
        assert!(HttpGateway::new("mailto:me@example.com", None, Duration::from_secs(1)).is_err());
    }
}

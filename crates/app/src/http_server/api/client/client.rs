use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use super::error::ApiError;
use super::ApiRequest;

/// Talks to a running content server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let builder = request.build_request(&self.remote, &self.client)?;
        self.send(builder).await
    }

    /// Send a prepared request and decode a JSON success body.
    pub async fn send<R: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<R, ApiError> {
        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(ApiError::rejected(response).await);
        }
        Ok(response.json::<R>().await?)
    }

    /// Resolve an absolute server path against the remote.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.remote.join(path)?)
    }

    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    pub fn http_client(&self) -> &Client {
        &self.client
    }
}

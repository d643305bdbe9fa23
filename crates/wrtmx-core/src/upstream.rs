//! HTTP access rooted at the active mirror.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::FetchError;
use crate::mirror::ActiveMirror;

/// A client bound to the active mirror, applying a timeout to every request.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: Client,
    mirror: ActiveMirror,
    timeout: Duration,
}

impl Upstream {
    /// Bind `client` to `mirror`.
    pub fn new(client: Client, mirror: ActiveMirror, timeout: Duration) -> Self {
        Self {
            client,
            mirror,
            timeout,
        }
    }

    /// The mirror every request goes to.
    pub fn mirror(&self) -> &ActiveMirror {
        &self.mirror
    }

    /// Absolute URL for a mirror-relative path.
    pub fn url(&self, path: &str) -> String {
        self.mirror.join(path)
    }

    /// Fetch a document body. Non-success statuses are errors.
    pub async fn get_text(&self, path: &str) -> Result<String, FetchError> {
        let url = self.url(path);
        let resp = self.client.get(&url).timeout(self.timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }

    /// Fetch and decode a JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let text = self.get_text(path).await?;
        serde_json::from_str(&text).map_err(|source| FetchError::Parse {
            url: self.url(path),
            source,
        })
    }
}

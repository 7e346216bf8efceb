use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::model::RawLookupResponse;
use crate::{Error, Result, DEFAULT_ENDPOINT};

/// Performs the network lookup for a single word.
///
/// Implementations are shared between the tasks of a chunk, hence `Send + Sync`.
#[async_trait]
pub trait LookupClient: Send + Sync {
    async fn fetch(&self, word: &str) -> Result<RawLookupResponse>;
}

/// [`LookupClient`] over HTTP GET against a templated endpoint.
///
/// The `{word}` placeholder in the template is replaced by the percent-encoded word.
#[derive(Debug, Clone)]
pub struct TracauClient {
    // Client uses Arc so we can clone cheaply
    client: Client,
    endpoint: String,
}

impl TracauClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn url_for(&self, word: &str) -> String {
        self.endpoint
            .replace("{word}", &urlencoding::encode(word))
    }
}

impl Default for TracauClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl LookupClient for TracauClient {
    /// Requests the entry and decodes the JSON body.
    /// Non-2xx statuses and bodies that are not JSON are errors; a JSON body of an
    /// unexpected shape is logged and treated as an empty response.
    async fn fetch(&self, word: &str) -> Result<RawLookupResponse> {
        let url = self.url_for(word);
        debug!(word, %url, "requesting entry");

        let res = self.client.get(&url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                word: word.to_string(),
                status: status.as_u16(),
            });
        }

        let body = res.text().await?;
        match RawLookupResponse::from_json(&body)? {
            Some(response) => Ok(response),
            None => {
                warn!(word, "lookup response has an unexpected shape, using an empty entry");
                Ok(RawLookupResponse::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_percent_encodes_the_word() {
        let client = TracauClient::new("https://example.com/s/{word}/en");
        assert_eq!(
            client.url_for("bank account"),
            "https://example.com/s/bank%20account/en"
        );
        assert_eq!(client.url_for("café"), "https://example.com/s/caf%C3%A9/en");
    }

    #[test]
    fn default_client_targets_the_tracau_endpoint() {
        let client = TracauClient::default();
        assert_eq!(
            client.url_for("bank"),
            "https://api.tracau.vn/WBBcwnwQpV89/s/bank/en"
        );
    }
}

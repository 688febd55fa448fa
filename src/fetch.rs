use std::time::Duration;

use crate::{AppError, Result};

/// A response from the file download endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The request never produced a usable response.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FetchError(pub String);

/// Retrieves the bytes behind a `url_private_download` link.
pub trait Fetcher {
    fn fetch(&self, url: &str, token: &str) -> std::result::Result<Fetched, FetchError>;
}

/// `Fetcher` backed by a blocking reqwest client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Build a client. With `None` a stalled server blocks forever, since the
    /// blocking client's own 30s default is cleared as well.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, token: &str) -> std::result::Result<Fetched, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .map_err(|e| FetchError(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Ok(Fetched {
                status,
                body: Vec::new(),
            });
        }

        let body = response.bytes().map_err(|e| FetchError(e.to_string()))?;

        Ok(Fetched {
            status,
            body: body.to_vec(),
        })
    }
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn fetch(&self, url: &str, token: &str) -> std::result::Result<Fetched, FetchError> {
        (**self).fetch(url, token)
    }
}

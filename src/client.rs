use std::io::Read;
use std::thread;
use std::time::Duration;

use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::bulk::{self, RawDataset};
use crate::domain::DatasetId;
use crate::error::FetchError;

const BULK_BASE_URL: &str =
    "https://ec.europa.eu/eurostat/estat-navtree-portlet-prod/BulkDownloadListing";

pub trait BulkClient: Send + Sync {
    fn fetch_raw(&self, id: &DatasetId) -> Result<RawDataset, FetchError>;
}

#[derive(Clone)]
pub struct BulkHttpClient {
    client: Client,
    base_url: String,
}

impl BulkHttpClient {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(BULK_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("eurostat-fetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FetchError::Http(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| FetchError::Http(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn send_with_retries<F>(&self, mut make_req: F) -> Result<reqwest::blocking::Response, FetchError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(FetchError::Http(err.to_string()));
                }
            }
        }
    }
}

impl BulkClient for BulkHttpClient {
    fn fetch_raw(&self, id: &DatasetId) -> Result<RawDataset, FetchError> {
        let file = format!("data/{}.tsv.gz", id.as_str());
        let response = self.send_with_retries(|| {
            self.client
                .get(&self.base_url)
                .query(&[("file", file.as_str())])
        })?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(FetchError::DatasetNotFound(id.as_str().to_string()));
        }
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "bulk request failed".to_string());
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .map_err(|err| FetchError::Http(err.to_string()))?;
        let mut text = String::new();
        GzDecoder::new(body.as_ref())
            .read_to_string(&mut text)
            .map_err(|err| FetchError::MalformedBulk(format!("gzip decode: {err}")))?;
        bulk::parse_tsv(&text)
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

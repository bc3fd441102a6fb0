use std::time::Duration;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, IntoUrl, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use super::RecordType;

pub const DEFAULT_API_URL: &str = "https://api.gandi.net/v5/livedns/";

/// TTL written with every update.
pub const RRSET_TTL: u32 = 1800;

const RECORD_OBJECT: &str = "dns-record";

/// Client for the Gandi LiveDNS records API.
#[derive(Debug)]
pub struct GandiProvider {
    base_url: Url,
    client: Client,
}

impl GandiProvider {
    pub fn new<U: IntoUrl>(api_key: &str, url: U, timeout: Duration) -> Result<Self, GandiError> {
        let base_url = url.into_url()?;
        if base_url.cannot_be_a_base() {
            return Err(GandiError::BadBaseUrl);
        }

        let mut auth = HeaderValue::from_str(&format!("Apikey {}", api_key))
            .map_err(|_| GandiError::InvalidApiKey)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { base_url, client })
    }

    fn record_url(&self, domain: &str, name: &str, rtype: RecordType) -> Result<Url, GandiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GandiError::BadBaseUrl)?
            .pop_if_empty()
            .extend(["domains", domain, "records", name, rtype.as_str()]);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl super::Provider for GandiProvider {
    type Error = GandiError;

    #[tracing::instrument(skip(self))]
    async fn get_record(&self, domain: &str, name: &str, rtype: RecordType) -> Result<Vec<String>, Self::Error> {
        let url = self.record_url(domain, name, rtype)?;
        let response = self.client.get(url)
            .send()
            .await?;

        // LiveDNS answers 404 both for a missing rrset and for an unknown
        // domain. Only the former means the record is empty.
        if response.status() == StatusCode::NOT_FOUND {
            let not_found = response.json::<ErrorBody>().await.unwrap_or_default();
            if not_found.object == RECORD_OBJECT {
                debug!("no {} record for {}", rtype, name);
                return Ok(Vec::new());
            }
            return Err(GandiError::NotFound {
                object: not_found.object,
                message: not_found.message,
            });
        }

        let rrset = response.error_for_status()?
            .json::<RecordSet>()
            .await?;

        debug!(values = ?rrset.rrset_values, "got {} record for {}", rtype, name);

        Ok(rrset.rrset_values)
    }

    #[tracing::instrument(skip(self))]
    async fn update_record(&self, domain: &str, name: &str, rtype: RecordType, value: &str) -> Result<(), Self::Error> {
        let url = self.record_url(domain, name, rtype)?;
        let body = RecordSetUpdate {
            rrset_ttl: RRSET_TTL,
            rrset_values: [value],
        };
        let response = self.client.put(url)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(GandiError::Rejected { status, message })
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum GandiError {
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    #[error("bad base url")]
    BadBaseUrl,
    #[error("api key is not a valid header value")]
    InvalidApiKey,
    #[error("update rejected with status {status}: {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("not found (object: {object:?}): {message}")]
    NotFound { object: String, message: String },
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    object: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RecordSet {
    #[serde(default)]
    rrset_values: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RecordSetUpdate<'a> {
    rrset_ttl: u32,
    rrset_values: [&'a str; 1],
}

use std::net::IpAddr;
use std::time::Duration;
use reqwest::{Client, IntoUrl, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use super::IpFamily;

pub const DEFAULT_IPV4_URL: &str = "https://api.ipify.org?format=json";
pub const DEFAULT_IPV6_URL: &str = "https://api64.ipify.org?format=json";

#[derive(Debug)]
pub struct IpifySource {
    ipv4_url: Url,
    ipv6_url: Url,
    client: Client,
}

impl IpifySource {
    pub fn new<U: IntoUrl>(ipv4_url: U, ipv6_url: U, timeout: Duration) -> Result<Self, IpifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            ipv4_url: ipv4_url.into_url()?,
            ipv6_url: ipv6_url.into_url()?,
            client,
        })
    }

    fn url(&self, family: IpFamily) -> &Url {
        match family {
            IpFamily::V4 => &self.ipv4_url,
            IpFamily::V6 => &self.ipv6_url,
        }
    }
}

#[async_trait::async_trait]
impl super::IpSource for IpifySource {
    type Error = IpifyError;

    #[tracing::instrument(skip(self))]
    async fn public_ip(&self, family: IpFamily) -> Result<String, Self::Error> {
        let response = self.client.get(self.url(family).clone())
            .send()
            .await?
            .error_for_status()?
            .json::<IpifyResponse>()
            .await?;

        debug!(?response, "got lookup response");

        // The address is returned untouched; only its shape is checked.
        let addr = response.ip.parse::<IpAddr>()
            .map_err(|_| IpifyError::InvalidAddress(response.ip.clone()))?;
        if !family.matches(&addr) {
            return Err(IpifyError::WrongFamily { family, ip: response.ip });
        }

        Ok(response.ip)
    }
}

#[derive(Debug, Error)]
pub enum IpifyError {
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    #[error("lookup returned an invalid address: {0:?}")]
    InvalidAddress(String),
    #[error(
        "expected an {} address, got {}; set `{} = false` in [DNS] if this host has no {} connectivity",
        .family, .ip, .family.setting(), .family
    )]
    WrongFamily { family: IpFamily, ip: String },
}

#[derive(Debug, Deserialize)]
struct IpifyResponse {
    ip: String,
}

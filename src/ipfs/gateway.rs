//! IPFS gateway client.

use std::time::Duration;

use serde::Deserialize;

use crate::chain::account::Account;
use crate::chain::types::{RobonomicsError, RobonomicsResult};
use crate::config::IpfsConfig;
use crate::ipfs::auth::{web3_auth_for, Web3Credentials};

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// `/api/v0/add` reply; `Size` comes as a string.
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "Size")]
    size: String,
}

#[derive(Debug, Clone)]
pub struct IpfsGateway {
    client: reqwest::Client,
    config: IpfsConfig,
    auth: Option<Web3Credentials>,
}

impl IpfsGateway {
    pub fn new(config: IpfsConfig) -> RobonomicsResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            config,
            auth: None,
        })
    }

    /// Gateway client signing in as `account` when `web3_auth` is enabled.
    pub fn for_account(config: IpfsConfig, account: &Account) -> RobonomicsResult<Self> {
        let auth = if config.web3_auth {
            Some(web3_auth_for(account)?)
        } else {
            None
        };
        Ok(Self::new(config)?.with_auth(auth))
    }

    pub fn with_auth(mut self, auth: Option<Web3Credentials>) -> Self {
        self.auth = auth;
        self
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.post(url);
        match &self.auth {
            Some((login, password)) => request.basic_auth(login, Some(password)),
            None => request,
        }
    }

    /// Upload content.
    ///
    /// # Returns
    /// The CID and the size the gateway reports.
    ///
    /// # Errors
    /// `UploadFailed` with the status code on any non-200 reply.
    pub async fn upload_content(&self, content: Vec<u8>) -> RobonomicsResult<(String, u64)> {
        let url = format!("{}/api/v0/add", self.config.api_gateway);
        tracing::info!(gateway = %self.config.api_gateway, bytes = content.len(), "Uploading content to IPFS");

        let part = reqwest::multipart::Part::bytes(content).file_name("file");
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self.post(&url).multipart(form).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "IPFS upload refused");
            return Err(RobonomicsError::UploadFailed(status.as_u16()));
        }

        let added: AddResponse = response.json().await?;
        let size = added
            .size
            .parse()
            .map_err(|_| RobonomicsError::Decode(format!("IPFS size '{}' is not a number", added.size)))?;
        tracing::info!(cid = %added.hash, size = size, "Content uploaded");
        Ok((added.hash, size))
    }

    /// Pin `cid` on the API gateway.
    pub async fn pin(&self, cid: &str) -> RobonomicsResult<()> {
        let url = format!("{}/api/v0/pin/add?arg={}", self.config.api_gateway, cid);
        tracing::info!(cid = %cid, "Pinning content");

        let status = self.post(&url).send().await?.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(cid = %cid, status = status.as_u16(), "IPFS pin refused");
            return Err(RobonomicsError::PinFailed(status.as_u16()));
        }
        Ok(())
    }

    /// Fetch the content stored under `cid`.
    pub async fn get_content(&self, cid: &str) -> RobonomicsResult<Vec<u8>> {
        let url = format!("{}/ipfs/{}", self.config.content_gateway, cid);
        tracing::debug!(cid = %cid, "Fetching IPFS content");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

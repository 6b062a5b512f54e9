use std::{future::Future, time::Duration};

use async_trait::async_trait;
use sapling::StateDiff;
use serde::de::DeserializeOwned;

use crate::{Error, LedgerState, Result};

/// Reads the pool of one sapling contract from a node's JSON-RPC
#[derive(Debug, Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    rpc_url: String,
    contract_address: String,
}

impl NodeClient {
    pub fn new(rpc_url: &str, contract_address: &str) -> NodeClient {
        NodeClient {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.trim_end_matches('/').to_owned(),
            contract_address: contract_address.to_owned(),
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    fn contract_url(&self, endpoint: &str) -> String {
        format!(
            "{}/chains/main/blocks/head/context/contracts/{}/{endpoint}",
            self.rpc_url, self.contract_address
        )
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        retry_on_network_failure(move || async move {
            let response = self.http.get(url).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(Error::Status {
                    status,
                    url: url.to_owned(),
                });
            }

            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        })
        .await
    }
}

#[async_trait]
impl LedgerState for NodeClient {
    #[tracing::instrument(err, skip(self), fields(contract = %self.contract_address))]
    async fn state_diff(&self) -> Result<StateDiff> {
        let diff: StateDiff = self.get(&self.contract_url("single_sapling_get_diff")).await?;

        tracing::debug!(
            commitments = diff.commitments_and_ciphertexts.len(),
            nullifiers = diff.nullifiers.len(),
            "fetched sapling state diff"
        );

        Ok(diff)
    }

    #[tracing::instrument(err, ret, skip(self))]
    async fn chain_id(&self) -> Result<String> {
        self.get(&format!("{}/chains/main/chain_id", self.rpc_url))
            .await
    }
}

trait IsNetworkFailure {
    fn is_network_failure(&self) -> bool;
}

impl IsNetworkFailure for Error {
    fn is_network_failure(&self) -> bool {
        match self {
            Error::Http(err) => err.is_connect() || err.is_timeout(),
            Error::Status { status, .. } => matches!(status.as_u16(), 502..=504),
            Error::SerdeJson(_) => false,
        }
    }
}

/// Retries 3 times, waiting 16s in total, before giving up.
async fn retry_on_network_failure<T, E: IsNetworkFailure, Fut: Future<Output = Result<T, E>>>(
    f: impl FnOnce() -> Fut + Clone,
) -> Result<T, E> {
    const DELAYS: &[Duration] = &[
        Duration::from_secs(1),
        Duration::from_secs(5),
        Duration::from_secs(10),
    ];

    for delay in DELAYS {
        let res = (f.clone())().await;

        match res {
            Err(err) if err.is_network_failure() => {
                tracing::warn!(?delay, "network failure, retrying");
                tokio::time::sleep(*delay).await;
            }
            res => return res,
        }
    }

    f().await
}

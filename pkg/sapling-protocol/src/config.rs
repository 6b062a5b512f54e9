use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use commitment_tree::{DEFAULT_HEIGHT, MAX_HEIGHT};
use sapling::constants::DEFAULT_MEMO_SIZE;
use sapling_node::NodeClient;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Settings of one shielded pool deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub name: String,
    /// The sapling contract holding the pool
    pub contract_address: String,
    pub memo_size: usize,
    pub merkle_tree_height: usize,
    pub rpc_url: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            name: "Shielded Tez".to_owned(),
            contract_address: "KT1Wr1z3CwrZamPsazpVXefpEjXUBScUPuHZ".to_owned(),
            memo_size: DEFAULT_MEMO_SIZE,
            merkle_tree_height: DEFAULT_HEIGHT,
            rpc_url: "https://tezos-ithacanet-node.prod.gke.papers.tech".to_owned(),
        }
    }
}

impl ProtocolConfig {
    /// Defaults, overridden by the TOML file at `path` (if given), overridden by `SAPLING_*`
    /// environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }

        let config: Self = figment.merge(Env::prefixed("SAPLING_")).extract()?;
        config.validate()?;

        Ok(config)
    }

    /// A client reading the configured contract from the configured node
    pub fn node_client(&self) -> NodeClient {
        NodeClient::new(&self.rpc_url, &self.contract_address)
    }

    fn validate(&self) -> Result<()> {
        if self.merkle_tree_height > MAX_HEIGHT {
            return Err(figment::Error::from(format!(
                "merkle_tree_height must be at most {MAX_HEIGHT}, got {}",
                self.merkle_tree_height
            ))
            .into());
        }

        Ok(())
    }
}

//! Node configuration (§6): loaded from a TOML file, with the CLI able to
//! override `debug` regardless of what the file says.

use std::path::Path;

use serde::Deserialize;

/// Configuration consumed by the core node (§6).
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// TCP port the dispatcher binds.
    pub port: u16,

    /// Shared symmetric key for registration-signature HMACs. Also the
    /// chain id; `smartxchain` is accepted as an alias for the same field
    /// since the two names refer to one value (§6, §9).
    #[serde(alias = "smartxchain")]
    pub chain_secret: String,

    /// Address this node credits with the mining reward (§4.7).
    pub miner_address: String,

    /// Seed peers contacted at startup, `tcp://host:port` each.
    #[serde(default)]
    pub peers: Vec<String>,

    /// Skip the fingerprint check on inbound frames (§4.4, §6).
    #[serde(default)]
    pub debug: bool,

    /// Address this node advertises to peers when registering. Defaults to
    /// `tcp://127.0.0.1:<port>` if left unset.
    #[serde(default)]
    pub advertise_addr: Option<String>,

    /// Where chain snapshots are written and re-loaded from on restart.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl NodeConfig {
    /// Parses a TOML config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("parsing config file {}: {e}", path.display()))?;
        Ok(config)
    }

    /// The address this node advertises for its own registration.
    #[must_use]
    pub fn own_addr(&self) -> String {
        self.advertise_addr
            .clone()
            .unwrap_or_else(|| format!("tcp://127.0.0.1:{}", self.port))
    }
}

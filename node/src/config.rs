use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;

use nomen_ledger::ReceiptWait;
use nomen_registrar::ParentZone;

/// Full node configuration: TOML file plus `NOMEN_*` environment overrides
/// (e.g. `NOMEN_RPC__URL`, `NOMEN_SIGNER__KEY_HEX`).
#[derive(Debug, Deserialize)]
pub struct NodeConfig {
    pub rpc: RpcConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    pub zone: ParentZone,
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub receipts: ReceiptConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
}

#[derive(Debug, Deserialize)]
pub struct RpcConfig {
    /// Base URL of the ledger RPC endpoint.
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct GatewayConfig {
    pub listen: SocketAddr,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8085".parse().expect("static addr parses"),
        }
    }
}

/// Where the privileged signing key comes from. Exactly one source must be
/// set; the node refuses to start otherwise.
#[derive(Debug, Default, Deserialize)]
pub struct SignerConfig {
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    #[serde(default)]
    pub key_hex: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptConfig {
    pub deadline_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 60_000,
            poll_interval_ms: 500,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MessagingConfig {
    /// Base URL of the always-on messaging agent; proxy routes answer 503
    /// when unset.
    #[serde(default)]
    pub url: Option<String>,
}

impl NodeConfig {
    /// Load configuration from an optional TOML file and the environment.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(ConfigFile::from(path.clone()));
        }
        let raw = builder
            .add_source(Environment::with_prefix("NOMEN").separator("__"))
            .build()
            .context("failed to assemble configuration sources")?;

        let config: NodeConfig = raw
            .try_deserialize()
            .context("configuration is malformed")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.rpc.url.trim().is_empty() {
            bail!("rpc.url must not be empty");
        }
        self.zone
            .parent_node()
            .context("zone.parent_name is not a valid name")?;
        match (&self.signer.key_file, &self.signer.key_hex) {
            (None, None) => bail!(
                "no signing key configured: set signer.key_file or NOMEN_SIGNER__KEY_HEX"
            ),
            (Some(_), Some(_)) => {
                bail!("signer.key_file and signer.key_hex are mutually exclusive")
            }
            _ => {}
        }
        if self.receipts.poll_interval_ms == 0 || self.receipts.deadline_ms == 0 {
            bail!("receipts.deadline_ms and receipts.poll_interval_ms must be positive");
        }
        Ok(())
    }

    /// Resolve the privileged signing key bytes.
    pub fn signer_key(&self) -> Result<[u8; 32]> {
        if let Some(path) = &self.signer.key_file {
            let key_file = nomen_wallet::KeyFile::load(path)
                .with_context(|| format!("failed to load key file {}", path.display()))?;
            return Ok(key_file.private_key()?);
        }
        let hex = self
            .signer
            .key_hex
            .as_deref()
            .expect("validate() guarantees one source");
        Ok(nomen_wallet::keyfile::private_key_from_hex(hex)?)
    }

    pub fn receipt_wait(&self) -> ReceiptWait {
        ReceiptWait {
            deadline: Duration::from_millis(self.receipts.deadline_ms),
            poll_interval: Duration::from_millis(self.receipts.poll_interval_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[rpc]
url = "http://127.0.0.1:9545"

[zone]
parent_name = "kantina.base.eth"
registry = "0xb94704422c2a1e396835a571837aa5ae53285a95"
resolver = "0xc6d566a56a1aff6508b41f6c90ff131615583bcd"
wallet_factory = "0x0ba5ed0c6aa8c49038f819e587e2633c4a9f428a"

[signer]
key_hex = "0x1111111111111111111111111111111111111111111111111111111111111111"
"#
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_minimal_config_with_defaults() {
        let file = write_config(sample_toml());
        let config = NodeConfig::load(Some(&file.path().to_path_buf())).unwrap();

        assert_eq!(config.zone.parent_name, "kantina.base.eth");
        assert_eq!(config.receipts.deadline_ms, 60_000);
        assert!(config.messaging.url.is_none());
        assert_eq!(config.signer_key().unwrap(), [0x11u8; 32]);
    }

    #[test]
    fn rejects_missing_signer() {
        let stripped = sample_toml().replace("[signer]", "[ignored]").replace(
            "key_hex = \"0x1111111111111111111111111111111111111111111111111111111111111111\"",
            "",
        );
        let file = write_config(&stripped);
        let err = NodeConfig::load(Some(&file.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("no signing key configured"));
    }

    #[test]
    fn rejects_bad_parent_name() {
        let broken = sample_toml().replace("kantina.base.eth", "");
        let file = write_config(&broken);
        assert!(NodeConfig::load(Some(&file.path().to_path_buf())).is_err());
    }
}

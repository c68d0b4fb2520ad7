use std::fmt::Display;
use std::path::PathBuf;

use log::warn;
use registry_client::reference::without_port;
use serde::Deserialize;

pub const DEFAULT_BINARY: &str = "skopeo";
pub const DEFAULT_CERTS_DIR: &str = "/etc/skopeo/certs.d";

/// Relay settings as they appear in the host configuration. Empty fields
/// fall back to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelayConfig
{
    #[serde(default)]
    pub binary: String,
    #[serde(default)]
    pub certs_dir: String,
    #[serde(default)]
    pub mode: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferMode
{
    #[default]
    Copy,
    Sync,
}

impl TransferMode
{
    const COPY: &'static str = "copy";
    const SYNC: &'static str = "sync";

    /// Anything but `sync` means `copy`.
    pub fn parse(value: &str) -> Self
    {
        match value {
            Self::SYNC => TransferMode::Sync,
            "" | Self::COPY => TransferMode::Copy,
            other => {
                warn!("Unknown transfer mode \"{}\", falling back to {}", other, Self::COPY);
                TransferMode::Copy
            }
        }
    }

    pub fn is_sync(&self) -> bool
    {
        matches!(self, TransferMode::Sync)
    }

    pub fn as_str(&self) -> &'static str
    {
        match self {
            TransferMode::Copy => Self::COPY,
            TransferMode::Sync => Self::SYNC,
        }
    }
}

impl Display for TransferMode
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.write_str(self.as_str())
    }
}

/// Settings a relay instance works with, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig
{
    pub binary: String,
    pub certs_dir: PathBuf,
    pub mode: TransferMode,
}

impl Default for ResolvedConfig
{
    fn default() -> Self
    {
        ResolvedConfig {
            binary: DEFAULT_BINARY.to_string(),
            certs_dir: PathBuf::from(DEFAULT_CERTS_DIR),
            mode: TransferMode::Copy,
        }
    }
}

impl ResolvedConfig
{
    pub fn resolve(conf: Option<&RelayConfig>) -> Self
    {
        let mut config = ResolvedConfig::default();

        if let Some(conf) = conf {
            if !conf.binary.is_empty() {
                config.binary = conf.binary.clone();
            }
            if !conf.certs_dir.is_empty() {
                config.certs_dir = PathBuf::from(&conf.certs_dir);
            }
            config.mode = TransferMode::parse(&conf.mode);
        }

        config
    }

    /// Certificate directory of a registry, ports don't take part.
    pub fn certs_dir_for_registry(&self, registry: &str) -> PathBuf
    {
        self.certs_dir.join(without_port(registry))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn defaults_without_config()
    {
        let config = ResolvedConfig::resolve(None);
        assert_eq!(config.binary, "skopeo");
        assert_eq!(config.certs_dir, PathBuf::from("/etc/skopeo/certs.d"));
        assert_eq!(config.mode, TransferMode::Copy);
    }

    #[test]
    fn empty_fields_keep_defaults()
    {
        let config = ResolvedConfig::resolve(Some(&RelayConfig::default()));
        assert_eq!(config, ResolvedConfig::default());
    }

    #[test]
    fn overrides()
    {
        let conf = RelayConfig {
            binary: "/opt/bin/skopeo".to_string(),
            certs_dir: "/certs".to_string(),
            mode: "sync".to_string(),
        };
        let config = ResolvedConfig::resolve(Some(&conf));
        assert_eq!(config.binary, "/opt/bin/skopeo");
        assert_eq!(config.certs_dir, PathBuf::from("/certs"));
        assert_eq!(config.mode, TransferMode::Sync);
    }

    #[test]
    fn unknown_mode_means_copy()
    {
        assert_eq!(TransferMode::parse("mirror"), TransferMode::Copy);
        assert_eq!(TransferMode::parse("SYNC"), TransferMode::Copy);
        assert_eq!(TransferMode::parse(""), TransferMode::Copy);
        assert_eq!(TransferMode::parse("sync").to_string(), "sync");
    }

    #[test]
    fn registry_certs_dir_drops_port()
    {
        let config = ResolvedConfig::default();
        assert_eq!(
            config.certs_dir_for_registry("mirror.example.com:5000"),
            PathBuf::from("/etc/skopeo/certs.d/mirror.example.com")
        );
    }

    #[test]
    fn deserializes_kebab_case()
    {
        let conf: RelayConfig =
            serde_json::from_str(r#"{"binary": "skopeo2", "certs-dir": "/c"}"#).unwrap();
        assert_eq!(conf.binary, "skopeo2");
        assert_eq!(conf.certs_dir, "/c");
        assert_eq!(conf.mode, "");
    }
}

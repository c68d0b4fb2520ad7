use crate::auth::Credentials;
use crate::service_url::{Scheme, HTTPS_SCHEME, HTTP_SCHEME};
use crate::tls::TlsMaterial;

const SECURE_SCHEMES: &[&Scheme] = &[&HTTPS_SCHEME];
const INSECURE_SCHEMES: &[&Scheme] = &[&HTTPS_SCHEME, &HTTP_SCHEME];

pub enum ConnectionMode {
    /// Verify the registry against the system roots and the given material.
    Verified(TlsMaterial),
    /// Accept any certificate, fall back to plain http if https fails.
    Insecure(TlsMaterial),
}

pub struct Config {
    pub(crate) host: String,
    pub(crate) mode: ConnectionMode,
    pub(crate) credentials: Option<Credentials>,
}

impl Config {
    pub fn builder() -> ConfigBuilder<WantsHost> {
        ConfigBuilder {
            state: WantsHost {}
        }
    }

    /// Schemes to try, in order.
    pub fn schemes(&self) -> &'static [&'static Scheme] {
        self.mode.schemes()
    }
}

impl ConnectionMode {
    pub fn is_secure(&self) -> bool {
        matches!(self, ConnectionMode::Verified(_))
    }

    pub fn into_tls_material(self) -> TlsMaterial {
        match self {
            ConnectionMode::Verified(material) => material,
            ConnectionMode::Insecure(material) => material,
        }
    }

    fn schemes(&self) -> &'static [&'static Scheme] {
        match self {
            ConnectionMode::Verified(_) => SECURE_SCHEMES,
            ConnectionMode::Insecure(_) => INSECURE_SCHEMES,
        }
    }
}

pub struct ConfigBuilder<S> {
    state: S,
}

pub struct WantsHost {}

pub struct WantsMode {
    pub(crate) host: String,
}

pub struct WantsCredentials {
    pub(crate) host: String,
    pub(crate) mode: ConnectionMode,
}

impl ConfigBuilder<WantsHost> {
    pub fn host(self, host: String) -> ConfigBuilder<WantsMode> {
        ConfigBuilder {
            state: WantsMode {
                host
            }
        }
    }
}

impl ConfigBuilder<WantsMode> {
    pub fn verified(self, material: TlsMaterial) -> ConfigBuilder<WantsCredentials> {
        ConfigBuilder {
            state: WantsCredentials {
                host: self.state.host,
                mode: ConnectionMode::Verified(material),
            }
        }
    }

    pub fn insecure(self, material: TlsMaterial) -> ConfigBuilder<WantsCredentials> {
        ConfigBuilder {
            state: WantsCredentials {
                host: self.state.host,
                mode: ConnectionMode::Insecure(material),
            }
        }
    }

    pub fn tls(self, material: TlsMaterial, skip_tls_verify: bool) -> ConfigBuilder<WantsCredentials> {
        match skip_tls_verify {
            true => self.insecure(material),
            false => self.verified(material),
        }
    }
}

impl ConfigBuilder<WantsCredentials> {
    pub fn anonymous(self) -> Config {
        self.credentials(None)
    }

    pub fn credentials(self, credentials: Option<Credentials>) -> Config {
        Config {
            host: self.state.host,
            mode: self.state.mode,
            credentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_mode_only_uses_https() {
        let config = Config::builder()
            .host("reg.example.com".to_string())
            .tls(TlsMaterial::none(), false)
            .anonymous();

        assert!(config.mode.is_secure());
        assert_eq!(config.schemes().len(), 1);
        assert_eq!(config.schemes()[0].as_str(), "https://");
    }

    #[test]
    fn insecure_mode_falls_back_to_http() {
        let config = Config::builder()
            .host("reg.example.com".to_string())
            .tls(TlsMaterial::none(), true)
            .credentials(Credentials::from_pair("u:p"));

        assert!(!config.mode.is_secure());
        let schemes: Vec<&str> = config.schemes().iter().map(|s| s.as_str()).collect();
        assert_eq!(schemes, vec!["https://", "http://"]);
        assert_eq!(config.credentials, Some(Credentials::new("u", "p")));
    }
}

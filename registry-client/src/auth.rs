//! Registry credentials.
//!
//! Credentials travel through the mirroring system as an opaque blob: the
//! base64 encoding of `{"username": "...", "password": "..."}`. Decoding is
//! best effort; anything malformed means "no credentials".

use std::fmt::Display;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(alias = "Username", default)]
    pub username: String,
    #[serde(alias = "Password", default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Decode an opaque credential blob, `None` for empty or malformed input.
    pub fn decode(blob: &str) -> Option<Self> {
        let blob = blob.trim();
        if blob.is_empty() {
            return None;
        }

        let Some(json) = [URL_SAFE, URL_SAFE_NO_PAD, STANDARD, STANDARD_NO_PAD]
            .iter()
            .find_map(|engine| engine.decode(blob).ok())
        else {
            debug!("Credential blob is not valid base64, ignoring it");
            return None;
        };

        match serde_json::from_slice::<Credentials>(&json) {
            Ok(creds) if !creds.username.is_empty() => Some(creds),
            Ok(_) => {
                debug!("Credential blob carries no username, ignoring it");
                None
            }
            Err(e) => {
                debug!("Credential blob is not valid JSON, ignoring it: {}", e);
                None
            }
        }
    }

    /// Parse the `user:password` form used on the command line.
    pub fn from_pair(pair: &str) -> Option<Self> {
        let (username, password) = pair.split_once(':')?;
        if username.is_empty() {
            return None;
        }
        Some(Self::new(username, password))
    }

    pub fn encode(&self) -> String {
        // serializing two strings cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE.encode(json)
    }
}

impl Display for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.username, self.password)
    }
}

/// Turn an opaque credential blob into `user:password`.
pub fn decode_json_auth(blob: &str) -> Option<String> {
    Credentials::decode(blob).map(|creds| creds.to_string())
}

pub fn encode_json_auth(username: &str, password: &str) -> String {
    Credentials::new(username, password).encode()
}

/// `WWW-Authenticate: Bearer ...` challenge sent by token based registries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerChallenge {
    pub realm: String,
    pub service: Option<String>,
    pub scope: Option<String>,
}

impl BearerChallenge {
    const SCHEME: &'static str = "bearer";
    const PARAM_REGEX: &'static str = r#"([A-Za-z]+)="([^"]*)""#;

    pub fn parse(header: &str) -> Option<Self> {
        let (scheme, params) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case(Self::SCHEME) {
            return None;
        }

        let param_re = Regex::new(Self::PARAM_REGEX).expect("Challenge regex is malformed");

        let mut realm = None;
        let mut service = None;
        let mut scope = None;
        for captures in param_re.captures_iter(params) {
            let (_, [name, value]) = captures.extract();
            match name.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value.to_string()),
                "service" => service = Some(value.to_string()),
                "scope" => scope = Some(value.to_string()),
                _ => (),
            }
        }

        Some(Self { realm: realm?, service, scope })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_token(self) -> Option<String> {
        self.token
            .filter(|t| !t.is_empty())
            .or(self.access_token.filter(|t| !t.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_blob() {
        let blob = encode_json_auth("alice", "secret");
        assert_eq!(decode_json_auth(&blob), Some("alice:secret".to_string()));
    }

    #[test]
    fn decodes_standard_alphabet_and_capitalized_keys() {
        let blob = STANDARD.encode(r#"{"Username":"bob","Password":"p?ss>>"}"#);
        assert_eq!(decode_json_auth(&blob), Some("bob:p?ss>>".to_string()));
    }

    #[test]
    fn malformed_blobs_mean_no_credentials() {
        assert_eq!(decode_json_auth(""), None);
        assert_eq!(decode_json_auth("   "), None);
        assert_eq!(decode_json_auth("%%% not base64 %%%"), None);
        assert_eq!(decode_json_auth(&URL_SAFE.encode("not json")), None);
        assert_eq!(decode_json_auth(&URL_SAFE.encode(r#"{"password":"x"}"#)), None);
    }

    #[test]
    fn parses_pair() {
        assert_eq!(Credentials::from_pair("u:p:q"), Some(Credentials::new("u", "p:q")));
        assert_eq!(Credentials::from_pair("nocolon"), None);
        assert_eq!(Credentials::from_pair(":p"), None);
    }

    #[test]
    fn parses_bearer_challenge() {
        let challenge = BearerChallenge::parse(
            r#"Bearer realm="https://auth.docker.io/token",service="registry.docker.io",scope="repository:library/busybox:pull""#,
        )
        .unwrap();

        assert_eq!(challenge.realm, "https://auth.docker.io/token");
        assert_eq!(challenge.service.as_deref(), Some("registry.docker.io"));
        assert_eq!(challenge.scope.as_deref(), Some("repository:library/busybox:pull"));
    }

    #[test]
    fn ignores_other_challenges() {
        assert_eq!(BearerChallenge::parse(r#"Basic realm="registry""#), None);
        assert_eq!(BearerChallenge::parse(r#"Bearer service="x""#), None);
        assert_eq!(BearerChallenge::parse(""), None);
    }

    #[test]
    fn token_prefers_token_field() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"token":"a","access_token":"b"}"#).unwrap();
        assert_eq!(response.into_token().as_deref(), Some("a"));

        let response: TokenResponse = serde_json::from_str(r#"{"access_token":"b"}"#).unwrap();
        assert_eq!(response.into_token().as_deref(), Some("b"));
    }
}

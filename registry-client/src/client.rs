use crate::auth::{BearerChallenge, Credentials, TokenResponse};
use crate::config::Config;
use crate::error::Error;
use crate::reference::RepositoryRef;
use crate::service_url::{ServiceFile, ServiceUrl, TagList};
use crate::tls::TlsMaterial;
use crate::utils;

use std::any::type_name;
use std::collections::HashSet;
use std::path::Path;

use log::{debug, error, info, warn};
use oci_spec::distribution::TagList as OciTagList;
use reqwest::blocking::{Client as ReqwestClient, Response};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

pub struct Client {
    urls: Vec<ServiceUrl>,
    reqwest_client: ReqwestClient,
    credentials: Option<Credentials>,
}

impl Client {
    /// Create new registry client from given configuration
    pub fn from_config(config: Config) -> Result<Self, Error> {
        let schemes = config.schemes();
        let Config { host, mode, credentials } = config;
        let urls = schemes
            .iter()
            .map(|scheme| ServiceUrl::init(*scheme, host.clone()))
            .collect();

        let insecure = !mode.is_secure();
        let material = mode.into_tls_material();

        let mut builder = ReqwestClient::builder().danger_accept_invalid_certs(insecure);
        for root in material.roots {
            builder = builder.add_root_certificate(root);
        }
        if let Some(identity) = material.identity {
            builder = builder.identity(identity);
        }

        let reqwest_client = builder.build().map_err(Error::into_config)?;

        Ok(Self {
            urls,
            reqwest_client,
            credentials,
        })
    }

    /// List every tag of the repository, following pagination links.
    pub fn list_tags(&self, repository: &RepositoryRef) -> Result<Vec<String>, Error> {
        self.with_fallback(|service_url| self.list_all_from(service_url, repository))
            .inspect_err(|e| error!("Failed to list tags of {}: {}", repository.repository(), e))
    }

    fn with_fallback<T>(
        &self,
        mut request: impl FnMut(&ServiceUrl) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut result = Err(Error::ConnectionError);
        for service_url in self.urls.iter() {
            result = request(service_url);
            match &result {
                Err(e) if e.is_connection() => {
                    warn!("Cannot reach registry over {}", service_url.scheme())
                }
                _ => break,
            }
        }
        result
    }

    fn list_all_from(
        &self,
        service_url: &ServiceUrl,
        repository: &RepositoryRef,
    ) -> Result<Vec<String>, Error> {
        let file = ServiceFile::TagList(TagList);
        let accepted_types = file.supported_media_types();
        let mut url = service_url.get_url_path(repository, file)?;

        let mut bearer = None;
        let mut tags = Vec::new();
        let mut visited = HashSet::new();
        loop {
            visited.insert(url.clone());
            let response = self.get_response(&url, &accepted_types, &mut bearer)?;
            let next = utils::next_link(response.headers(), &url);

            let page: OciTagList = Self::extract_json(response)?;
            debug!("Received {} tag(s) of {}", page.tags().len(), page.name());
            tags.extend(page.tags().iter().cloned());

            match next {
                Some(next) if visited.contains(&next) => {
                    warn!("Registry links back to {}, stopping", next);
                    break;
                }
                Some(next) => url = next,
                None => break,
            }
        }

        info!("Found {} tag(s) in {}", tags.len(), repository.repository());
        Ok(tags)
    }

    fn extract_json<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        let content_length = utils::content_length(response.headers());

        let bytes = response.bytes().map_err(|_| Error::UnknownError)?;

        if let Some(cl) = content_length {
            debug!("Content-Length: {cl}");
            if cl != bytes.len() {
                error!("Response length doesn't match servers content-length");
                return Err(Error::ResponseLengthInvalid);
            }
        }

        serde_json::from_slice(&bytes)
            .inspect_err(|_| error!("Failed to parse {} as JSON", type_name::<T>()))
            .map_err(Error::from)
    }

    /// Send the request, answering a bearer token challenge once.
    fn get_response(
        &self,
        url: &Url,
        accepted_types: &[String],
        bearer: &mut Option<String>,
    ) -> Result<Response, Error> {
        info!("Fetching response from {}", url);
        debug!("Supported media types: {}", accepted_types.join(","));

        let response = self.send(url, accepted_types, bearer.as_deref())?;

        if response.status() == StatusCode::UNAUTHORIZED && bearer.is_none() {
            let challenge = utils::www_authenticate(response.headers())
                .and_then(|header| BearerChallenge::parse(&header));
            if let Some(challenge) = challenge {
                debug!("Registry asks for a bearer token from {}", challenge.realm);
                *bearer = Some(self.fetch_token(&challenge)?);
                let response = self.send(url, accepted_types, bearer.as_deref())?;
                return Self::check_status(response, accepted_types);
            }
        }

        Self::check_status(response, accepted_types)
    }

    fn send(
        &self,
        url: &Url,
        accepted_types: &[String],
        bearer: Option<&str>,
    ) -> Result<Response, Error> {
        let mut request = self
            .reqwest_client
            .get(url.clone())
            .header(ACCEPT, accepted_types.join(","));

        request = match (bearer, &self.credentials) {
            (Some(token), _) => request.bearer_auth(token),
            (None, Some(creds)) => request.basic_auth(&creds.username, Some(&creds.password)),
            (None, None) => request,
        };

        request
            .send()
            .inspect_err(|e| error!("Failed to send request: {}", e))
            .map_err(|err| match err.status() {
                Some(status_error) => Error::StatusError(status_error.as_u16()),
                None => Error::ConnectionError,
            })
    }

    fn check_status(response: Response, accepted_types: &[String]) -> Result<Response, Error> {
        if !response.status().is_success() {
            return Err(Error::StatusError(response.status().as_u16()));
        }

        if let Some(content_type_str) = utils::content_type(response.headers()) {
            debug!("Content-Type:\"{content_type_str}\"");

            let essence = content_type_str.split(';').next().unwrap_or_default().trim();
            if !accepted_types.iter().any(|t| t == essence) {
                warn!("Server returned unsupported content type");
            }
        }

        Ok(response)
    }

    fn fetch_token(&self, challenge: &BearerChallenge) -> Result<String, Error> {
        let mut url = Url::parse(&challenge.realm)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(service) = &challenge.service {
                query.append_pair("service", service);
            }
            if let Some(scope) = &challenge.scope {
                query.append_pair("scope", scope);
            }
        }

        info!("Fetching token from {}", url);

        let mut request = self.reqwest_client.get(url);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request
            .send()
            .inspect_err(|e| error!("Failed to send token request: {}", e))
            .map_err(|_| Error::ConnectionError)?;

        if !response.status().is_success() {
            return Err(Error::AuthError(format!(
                "token endpoint responded with status {}",
                response.status().as_u16()
            )));
        }

        let token: TokenResponse = Self::extract_json(response)?;
        token
            .into_token()
            .ok_or(Error::AuthError("token response carries no token".to_string()))
    }
}

/// List all tags of `reference` on its registry.
///
/// `credentials` is the `user:password` form, `cert_dir` a containers style
/// certificate directory for the registry.
pub fn list_all_tags(
    reference: &str,
    credentials: Option<&str>,
    cert_dir: Option<&Path>,
    skip_tls_verify: bool,
) -> Result<Vec<String>, Error> {
    let repository = RepositoryRef::parse(reference)?;

    let material = match cert_dir {
        Some(dir) => TlsMaterial::from_cert_dir(dir)?,
        None => TlsMaterial::none(),
    };

    let config = Config::builder()
        .host(repository.registry().to_string())
        .tls(material, skip_tls_verify)
        .credentials(credentials.and_then(Credentials::from_pair));

    Client::from_config(config)?.list_tags(&repository)
}

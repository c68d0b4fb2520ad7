use std::path::Path;

use registry_client::Error;

/// Source of the tag list used when a request asks for every tag.
pub trait TagLister: Send + Sync
{
    fn list_tags(
        &self,
        reference: &str,
        credentials: Option<&str>,
        cert_dir: Option<&Path>,
        skip_tls_verify: bool,
    ) -> Result<Vec<String>, Error>;
}

/// Lists tags straight from the registry HTTP API.
pub struct RegistryTagLister;

impl TagLister for RegistryTagLister
{
    fn list_tags(
        &self,
        reference: &str,
        credentials: Option<&str>,
        cert_dir: Option<&Path>,
        skip_tls_verify: bool,
    ) -> Result<Vec<String>, Error>
    {
        registry_client::list_all_tags(reference, credentials, cert_dir, skip_tls_verify)
    }
}

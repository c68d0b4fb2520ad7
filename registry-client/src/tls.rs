use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use reqwest::{Certificate, Identity};

use crate::error::Error;

const CA_EXT: &str = "crt";
const CERT_EXT: &str = "cert";
const KEY_EXT: &str = "key";

/// TLS material found in a per-registry certificate directory, laid out the
/// way the containers tools expect it: `*.crt` files are additional CA
/// roots, a `name.cert`/`name.key` pair is a client identity.
#[derive(Default)]
pub struct TlsMaterial {
    pub(crate) roots: Vec<Certificate>,
    pub(crate) identity: Option<Identity>,
}

impl TlsMaterial {
    pub fn none() -> Self {
        Self::default()
    }

    /// Load the material from `dir`. A missing directory is not an error,
    /// it simply provides nothing.
    pub fn from_cert_dir<T: AsRef<Path>>(dir: T) -> Result<Self, Error> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            debug!("Certificate directory \"{}\" not found, using system roots only", dir.display());
            return Ok(Self::none());
        }

        let mut entries = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<PathBuf>, _>>()?;
        entries.sort();

        let mut material = Self::none();
        for path in entries.iter() {
            match path.extension().and_then(|ext| ext.to_str()) {
                Some(CA_EXT) => {
                    let pem = fs::read(path)?;
                    let certs = Certificate::from_pem_bundle(&pem).map_err(Error::into_certificate)?;
                    debug!("Loaded {} CA certificate(s) from \"{}\"", certs.len(), path.display());
                    material.roots.extend(certs);
                }
                Some(CERT_EXT) => {
                    let key = path.with_extension(KEY_EXT);
                    if !key.is_file() {
                        return Err(Error::CertificateError(format!(
                            "missing key {} for client certificate {}",
                            key.display(),
                            path.display()
                        )));
                    }
                    if material.identity.is_some() {
                        warn!("More than one client certificate in \"{}\", using the first", dir.display());
                        continue;
                    }
                    let mut pem = fs::read(path)?;
                    pem.push(b'\n');
                    pem.extend(fs::read(&key)?);
                    material.identity = Some(Identity::from_pem(&pem).map_err(Error::into_certificate)?);
                    info!("Using client certificate \"{}\"", path.display());
                }
                Some(KEY_EXT) => {
                    let cert = path.with_extension(CERT_EXT);
                    if !cert.is_file() {
                        return Err(Error::CertificateError(format!(
                            "missing client certificate {} for key {}",
                            cert.display(),
                            path.display()
                        )));
                    }
                }
                _ => debug!("Ignoring \"{}\"", path.display()),
            }
        }

        Ok(material)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.identity.is_none()
    }
}

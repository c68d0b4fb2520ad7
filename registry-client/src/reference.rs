use std::fmt::Display;

use crate::error::{self, Error};
use log::{debug, error};
use regex::Regex;

pub(crate) const SHA_256: &str = "sha256";
pub(crate) const SHA_512: &str = "sha512";

/// Registry API host used when a reference carries no registry.
pub const DOCKER_HUB_REGISTRY: &str = "registry-1.docker.io";
const DOCKER_HUB_ALIASES: [&str; 2] = ["docker.io", "index.docker.io"];
const DOCKER_HUB_NAMESPACE: &str = "library";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    algorithm: String,
    value: String,
}

impl Digest {
    const REGEX: &'static str = r"^([a-z0-9]+(?:[+._-][a-z0-9]+)*):([a-zA-Z0-9=_-]+)$";

    fn from_str(value: &str) -> Option<Self> {
        let digest_re = Regex::new(Self::REGEX).expect("Digest regex is malformed");
        let captures = digest_re.captures(value)?;

        let (_, [algorithm, digest]) = captures.extract();
        match (algorithm, digest.len()) {
            (SHA_256, 64) | (SHA_512, 128) => Some(
                Digest { algorithm: algorithm.to_string(), value: digest.to_string() }
            ),
            (SHA_256, _) | (SHA_512, _) => {
                error!("Wrong length for {}: {}", algorithm, digest.len());
                None
            },
            (a, _) => {
                error!("Unrecognized digest algorithm: {}", a);
                None
            }
        }
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.value)
    }
}

impl TryFrom<&str> for Digest {
    type Error = error::Error;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value).ok_or(Error::DigestInvalidError)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag(String);

impl Tag {
    const REGEX: &'static str = r"^[a-zA-Z0-9_][a-zA-Z0-9._-]{0,127}$";

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_str(value: &str) -> Option<Self> {
        let tag_re = Regex::new(Self::REGEX).expect("Tag regex is malformed");
        match tag_re.is_match(value) {
            true => Some(Tag(value.to_string())),
            false => {
                debug!("\"{value}\" is not a tag");
                None
            },
        }
    }
}

impl TryFrom<&str> for Tag {
    type Error = error::Error;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value).ok_or(Error::TagInvalidError)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Digest(Digest),
    Tag(Tag),
}

impl TryFrom<&str> for Reference {
    type Error = error::Error;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if let Ok(digest) = Digest::try_from(value) {
            debug!("Reference \"{value}\" is a digest");
            return Ok(Self::Digest(digest));
        }

        if let Ok(tag) = Tag::try_from(value) {
            debug!("Reference \"{value}\" is a tag");
            return Ok(Self::Tag(tag));
        }

        debug!("\"{value}\" is neither a digest nor a tag");
        Err(Error::ReferenceInvalidError)
    }
}

impl Reference {
    /// Separator placed between a repository and this reference.
    pub fn separator(&self) -> char {
        match self {
            Self::Digest(_) => '@',
            Self::Tag(_) => ':',
        }
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Digest(digest) => digest.fmt(f),
            Self::Tag(tag) => f.write_str(tag.as_str()),
        }
    }
}

fn is_registry_host(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

fn split_tag(reference: &str) -> (&str, &str) {
    if let Some((name, digest)) = reference.split_once('@') {
        return (name, digest);
    }

    let last_segment = reference.rfind('/').map(|pos| pos + 1).unwrap_or(0);
    match reference[last_segment..].rfind(':') {
        Some(pos) => {
            let colon = last_segment + pos;
            (&reference[..colon], &reference[colon + 1..])
        }
        None => (reference, ""),
    }
}

/// Split an image reference into registry host, repository and tag (or
/// digest). Host and tag are empty when the reference doesn't carry them.
pub fn split_ref(reference: &str) -> (String, String, String) {
    let (name, tag) = split_tag(reference.trim());

    let (registry, repository) = match name.split_once('/') {
        Some((first, rest)) if is_registry_host(first) => (first, rest),
        _ => ("", name),
    };

    (registry.to_string(), repository.to_string(), tag.to_string())
}

/// Append a tag, or a digest, to a reference.
pub fn join_ref(reference: &str, tag: &str) -> String {
    let separator = Reference::try_from(tag)
        .map(|r| r.separator())
        .unwrap_or(':');
    format!("{}{}{}", reference, separator, tag)
}

pub fn join_refs_and_tag(source: &str, target: &str, tag: &str) -> (String, String) {
    (join_ref(source, tag), join_ref(target, tag))
}

/// Registry host with any `:port` suffix removed.
pub fn without_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Repository as addressed through the registry HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    registry: String,
    repository: String,
}

impl RepositoryRef {
    const REGEX: &'static str =
        r"^[a-z0-9]+(?:(?:\.|_|__|-+)[a-z0-9]+)*(?:/[a-z0-9]+(?:(?:\.|_|__|-+)[a-z0-9]+)*)*$";

    pub fn parse(reference: &str) -> Result<Self, Error> {
        let (registry, repository, _) = split_ref(reference);

        let repo_re = Regex::new(Self::REGEX).expect("Repository regex is malformed");
        if !repo_re.is_match(&repository) {
            error!("Invalid repository name \"{}\"", repository);
            return Err(Error::ReferenceInvalidError);
        }

        let docker_hub = registry.is_empty() || DOCKER_HUB_ALIASES.contains(&registry.as_str());
        if !docker_hub {
            return Ok(Self { registry, repository });
        }

        let repository = match repository.contains('/') {
            true => repository,
            false => format!("{}/{}", DOCKER_HUB_NAMESPACE, repository),
        };

        Ok(Self { registry: DOCKER_HUB_REGISTRY.to_string(), repository })
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn split(reference: &str) -> (String, String, String) {
        split_ref(reference)
    }

    #[test]
    fn split_with_registry() {
        assert_eq!(
            split("reg.example.com/ns/img"),
            ("reg.example.com".into(), "ns/img".into(), "".into())
        );
        assert_eq!(
            split("localhost/img:v1"),
            ("localhost".into(), "img".into(), "v1".into())
        );
        assert_eq!(
            split("reg.example.com:5000/ns/img:1.0"),
            ("reg.example.com:5000".into(), "ns/img".into(), "1.0".into())
        );
    }

    #[test]
    fn split_without_registry() {
        assert_eq!(split("library/busybox"), ("".into(), "library/busybox".into(), "".into()));
        assert_eq!(split("busybox:latest"), ("".into(), "busybox".into(), "latest".into()));
    }

    #[test]
    fn split_digest() {
        let (registry, repository, tag) = split(&format!("quay.io/app@{}", SHA));
        assert_eq!(registry, "quay.io");
        assert_eq!(repository, "app");
        assert_eq!(tag, SHA);
    }

    #[test]
    fn join_picks_separator() {
        assert_eq!(join_ref("reg.example.com/ns/img", "v1"), "reg.example.com/ns/img:v1");
        assert_eq!(join_ref("reg/img", SHA), format!("reg/img@{}", SHA));
        assert_eq!(join_ref("reg/img", "sha256:abc"), "reg/img:sha256:abc");

        let (src, trgt) = join_refs_and_tag("a.io/x", "b.io/y", "v2");
        assert_eq!(src, "a.io/x:v2");
        assert_eq!(trgt, "b.io/y:v2");
    }

    #[test]
    fn strips_port() {
        assert_eq!(without_port("mirror.example.com:5000"), "mirror.example.com");
        assert_eq!(without_port("mirror.example.com"), "mirror.example.com");
        assert_eq!(without_port("localhost:"), "localhost:");
    }

    #[test]
    fn reference_kinds() {
        assert!(matches!(Reference::try_from("v1.2.3"), Ok(Reference::Tag(_))));
        assert!(matches!(Reference::try_from(SHA), Ok(Reference::Digest(_))));
        assert!(matches!(Reference::try_from("sha256:abc"), Err(Error::ReferenceInvalidError)));
        assert_eq!(Reference::try_from(SHA).unwrap().to_string(), SHA);
    }

    #[test]
    fn repository_defaults_to_docker_hub() {
        let repo = RepositoryRef::parse("busybox").unwrap();
        assert_eq!(repo.registry(), DOCKER_HUB_REGISTRY);
        assert_eq!(repo.repository(), "library/busybox");

        let repo = RepositoryRef::parse("docker.io/bitnami/redis").unwrap();
        assert_eq!(repo.registry(), DOCKER_HUB_REGISTRY);
        assert_eq!(repo.repository(), "bitnami/redis");

        let repo = RepositoryRef::parse("reg.example.com:5000/ns/img").unwrap();
        assert_eq!(repo.registry(), "reg.example.com:5000");
        assert_eq!(repo.repository(), "ns/img");
    }

    #[test]
    fn repository_rejects_invalid_names() {
        assert!(RepositoryRef::parse("reg.example.com/NS/Img").is_err());
        assert!(RepositoryRef::parse("reg.example.com/").is_err());
    }
}

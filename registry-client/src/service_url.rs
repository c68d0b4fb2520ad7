use crate::error::Error;
use crate::reference::RepositoryRef;

use url::Url;

pub(crate) struct TagList;

impl TagList {
    const LIST: &'static str = "list";

    pub fn as_str(&self) -> &str {
        Self::LIST
    }
}

pub(crate) enum ServiceFile {
    TagList(TagList),
}

impl ServiceFile {
    const TAGS_PATH: &'static str = "tags/";

    pub fn get_file_uri(&self) -> String {
        match self {
            Self::TagList(tag_list) => format!("{}{}", Self::TAGS_PATH, tag_list.as_str()),
        }
    }

    pub fn supported_media_types(&self) -> Vec<String> {
        match self {
            Self::TagList(_) => vec![mime::APPLICATION_JSON.to_string()],
        }
    }
}

pub struct Scheme {
    scheme: &'static str,
}

impl Scheme {
    pub const fn init(scheme: &'static str) -> Self {
        Self {
            scheme
        }
    }

    pub const fn as_str(&self) -> &'static str {
        self.scheme
    }
}

pub(crate) const HTTPS_SCHEME: Scheme = Scheme::init("https://");
pub(crate) const HTTP_SCHEME: Scheme = Scheme::init("http://");

pub(crate) struct ServiceUrl {
    scheme: &'static Scheme,
    host: String,
}

impl ServiceUrl {
    const VERSION_PATH: &'static str = "v2/";

    pub fn init(scheme: &'static Scheme, host: String) -> Self {
        Self { scheme, host }
    }

    pub fn scheme(&self) -> &'static str {
        self.scheme.as_str()
    }

    fn base_url(&self) -> Result<Url, Error> {
        let url = Url::parse(&format!("{}{}", self.scheme.as_str(), self.host))?;
        Ok(url.join(Self::VERSION_PATH)?)
    }

    pub fn get_url_path(&self, repository: &RepositoryRef, file: ServiceFile) -> Result<Url, Error> {
        let repository_path = &format!("{}/", repository.repository());

        let url = self
            .base_url()?
            .join(repository_path)?
            .join(&file.get_file_uri())?;

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository(reference: &str) -> RepositoryRef {
        RepositoryRef::parse(reference).unwrap()
    }

    #[test]
    fn tag_list_url() {
        let repo = repository("reg.example.com:5000/ns/img");
        let url = ServiceUrl::init(&HTTPS_SCHEME, repo.registry().to_string())
            .get_url_path(&repo, ServiceFile::TagList(TagList))
            .unwrap();

        assert_eq!(url.as_str(), "https://reg.example.com:5000/v2/ns/img/tags/list");
    }
}

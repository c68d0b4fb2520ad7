use log::debug;

use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE, LINK, WWW_AUTHENTICATE};
use url::Url;

pub(crate) fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok().map(|ct| ct.to_string()))
}

pub(crate) fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|cl| cl.to_str().ok().and_then(|cl| cl.parse().ok()))
}

pub(crate) fn www_authenticate(headers: &HeaderMap) -> Option<String> {
    headers
        .get(WWW_AUTHENTICATE)
        .and_then(|wa| wa.to_str().ok().map(|wa| wa.to_string()))
}

/// Next page of a paginated listing, from an RFC 5988 `Link` header.
pub(crate) fn next_link(headers: &HeaderMap, current: &Url) -> Option<Url> {
    let link = headers.get(LINK)?.to_str().ok()?;
    next_link_from_str(link, current)
}

fn next_link_from_str(link: &str, current: &Url) -> Option<Url> {
    link.split(',')
        .filter(|part| {
            part.split(';')
                .skip(1)
                .any(|param| param.trim().trim_start_matches("rel=").trim_matches('"') == "next")
        })
        .find_map(|part| {
            let target = part.split(';').next()?.trim();
            let target = target.strip_prefix('<')?.strip_suffix('>')?;
            debug!("Next page: {}", target);
            current.join(target).ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> Url {
        Url::parse("https://reg.example.com/v2/ns/img/tags/list").unwrap()
    }

    #[test]
    fn relative_next_link() {
        let next = next_link_from_str(r#"</v2/ns/img/tags/list?n=2&last=b>; rel="next""#, &current());
        assert_eq!(
            next.unwrap().as_str(),
            "https://reg.example.com/v2/ns/img/tags/list?n=2&last=b"
        );
    }

    #[test]
    fn absolute_next_link_among_others() {
        let next = next_link_from_str(
            r#"<https://other.example.com/first>; rel="first", <https://other.example.com/v2/x/tags/list?last=z>; rel=next"#,
            &current(),
        );
        assert_eq!(next.unwrap().as_str(), "https://other.example.com/v2/x/tags/list?last=z");
    }

    #[test]
    fn no_next_link() {
        assert!(next_link_from_str(r#"</v2/ns/img/tags/list>; rel="prev""#, &current()).is_none());
        assert!(next_link_from_str("garbage", &current()).is_none());
        assert!(next_link(&HeaderMap::new(), &current()).is_none());
    }
}

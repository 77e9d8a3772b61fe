use anyhow::Result;
use axum::http::{header, HeaderMap, Uri};
use reqwest::Url;

use crate::config::UpstreamProtocol;

pub(crate) const FORWARDED_PROTO_HEADER_KEY: &str = "x-forwarded-proto";
const DEFAULT_PUBLIC_SCHEME: &str = "http";

// JSON API payloads only; asset downloads are streamed and never collected.
pub(crate) const REQUEST_SIZE_BYTES_UPPERBOUND: usize = 10 * 1024 * 1024;
pub(crate) const RESPONSE_SIZE_BYTES_UPPERBOUND: usize = 10 * 1024 * 1024;

const REDACTED: &str = "****";

const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MountedPath<'a> {
    pub(crate) version: &'a str,
    /// Everything after the host, always starting with `/`.
    pub(crate) upstream_path: &'a str,
}

pub(crate) fn split_mount<'a>(path: &'a str, host: &str) -> Option<MountedPath<'a>> {
    let (version, rest) = path.strip_prefix('/')?.split_once('/')?;
    let remainder = rest.strip_prefix(host)?;
    let upstream_path = match remainder {
        "" => "/",
        remainder if remainder.starts_with('/') => remainder,
        _ => return None,
    };
    Some(MountedPath {
        version,
        upstream_path,
    })
}

pub(crate) fn upstream_url(
    protocol: UpstreamProtocol,
    host: &str,
    path: &str,
    query: Option<&str>,
) -> Result<Url> {
    let mut url = Url::parse(&format!("{protocol}://{host}"))?;
    url.set_path(path);
    url.set_query(query.filter(|query| !query.is_empty()));
    Ok(url)
}

/// Sets `param` to `value`, dropping any value the client supplied for it.
pub(crate) fn with_query_param(mut url: Url, param: &str, value: &str) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair(param, value);
    url
}

pub(crate) fn redacted_url(url: &Url, param: &str) -> String {
    if !url.query_pairs().any(|(key, _)| key == param) {
        return url.to_string();
    }
    with_query_param(url.clone(), param, REDACTED).to_string()
}

pub(crate) fn forwardable_headers(client_headers: &HeaderMap) -> HeaderMap {
    let mut headers = strip_hop_by_hop(client_headers);
    headers.remove(header::HOST);
    // Upstream must answer in identity encoding so the body can be rewritten.
    headers.remove(header::ACCEPT_ENCODING);
    headers.remove(header::CONTENT_LENGTH);
    headers
}

pub(crate) fn relayable_headers(server_headers: &HeaderMap) -> HeaderMap {
    strip_hop_by_hop(server_headers)
}

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(key, _)| !HOP_BY_HOP_HEADERS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

pub(crate) fn public_base(headers: &HeaderMap, uri: &Uri, version: &str) -> String {
    let scheme = headers
        .get(FORWARDED_PROTO_HEADER_KEY)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_PUBLIC_SCHEME);
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.authority().map(|authority| authority.as_str()))
        .unwrap_or("localhost");
    format!("{scheme}://{host}/{version}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn split_mount_strips_version_and_host() {
        assert_eq!(
            split_mount("/v2/api.nasa.gov/planetary/apod", "api.nasa.gov"),
            Some(MountedPath {
                version: "v2",
                upstream_path: "/planetary/apod"
            })
        );
        assert_eq!(
            split_mount("/v2/api.nasa.gov", "api.nasa.gov"),
            Some(MountedPath {
                version: "v2",
                upstream_path: "/"
            })
        );
        assert_eq!(split_mount("/v2/api.nasa.gov.evil/x", "api.nasa.gov"), None);
        assert_eq!(split_mount("/v2/other.host/x", "api.nasa.gov"), None);
        assert_eq!(split_mount("/api.nasa.gov", "api.nasa.gov"), None);
    }

    #[test]
    fn api_key_is_appended() -> Result<()> {
        let url = upstream_url(
            UpstreamProtocol::Https,
            "api.nasa.gov",
            "/planetary/apod",
            Some("count=5"),
        )?;
        let url = with_query_param(url, "api_key", "SECRET");
        assert_eq!(
            url.as_str(),
            "https://api.nasa.gov/planetary/apod?count=5&api_key=SECRET"
        );
        Ok(())
    }

    #[test]
    fn client_supplied_api_key_is_overwritten() -> Result<()> {
        let url = upstream_url(
            UpstreamProtocol::Http,
            "127.0.0.1:8080",
            "/planetary/apod",
            Some("api_key=DEMO_KEY&date=2017-07-01"),
        )?;
        let url = with_query_param(url, "api_key", "SECRET");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/planetary/apod?date=2017-07-01&api_key=SECRET"
        );
        Ok(())
    }

    #[test]
    fn redaction_hides_api_key_only() -> Result<()> {
        let url = with_query_param(
            upstream_url(UpstreamProtocol::Https, "api.nasa.gov", "/x", Some("a=1"))?,
            "api_key",
            "SECRET",
        );
        let redacted = redacted_url(&url, "api_key");
        assert!(!redacted.contains("SECRET"));
        assert!(redacted.contains("a=1"));
        assert!(redacted.contains("api_key=****"));
        Ok(())
    }

    #[test]
    fn forwarded_headers_drop_host_encoding_and_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("proxy.example.com"));
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("astropiks/1.0"));
        headers.insert("approov-token", HeaderValue::from_static("a.b.c"));

        let forwarded = forwardable_headers(&headers);
        assert!(!forwarded.contains_key(header::HOST));
        assert!(!forwarded.contains_key(header::ACCEPT_ENCODING));
        assert!(!forwarded.contains_key(header::CONNECTION));
        assert!(!forwarded.contains_key(header::TRANSFER_ENCODING));
        assert!(!forwarded.contains_key(header::CONTENT_LENGTH));
        assert_eq!(forwarded[header::AUTHORIZATION], "Bearer abc");
        assert_eq!(forwarded[header::USER_AGENT], "astropiks/1.0");
        assert_eq!(forwarded["approov-token"], "a.b.c");
    }

    #[test]
    fn public_base_prefers_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("proxy.example.com"));
        let uri = Uri::from_static("/v2/api.nasa.gov/planetary/apod");

        assert_eq!(public_base(&headers, &uri, "v2"), "http://proxy.example.com/v2");

        headers.insert(FORWARDED_PROTO_HEADER_KEY, HeaderValue::from_static("https, http"));
        assert_eq!(public_base(&headers, &uri, "v2"), "https://proxy.example.com/v2");
    }
}

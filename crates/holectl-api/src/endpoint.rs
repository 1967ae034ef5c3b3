// URL construction
//
// Every request is plain `http://{host}{path}`; the host is taken as
// given (hostname or IP, optional port).

use url::Url;

use crate::error::Error;

/// v5 API script.
pub const LEGACY_API_PATH: &str = "/admin/api.php";
/// v6 session login.
pub const AUTH_PATH: &str = "/api/auth";
/// v6 blocking status / toggle.
pub const BLOCKING_PATH: &str = "/api/dns/blocking";

/// Build `http://{host}{path}`.
///
/// Surrounding whitespace and a trailing slash on `host` are ignored.
pub fn host_url(host: &str, path: &str) -> Result<Url, Error> {
    let host = host.trim().trim_end_matches('/');
    Url::parse(&format!("http://{host}{path}")).map_err(|e| Error::InvalidUrl {
        host: host.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builds_plain_http_urls() {
        let url = host_url("10.0.0.5", BLOCKING_PATH).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5/api/dns/blocking");

        let url = host_url(" pi.hole:8080/ ", AUTH_PATH).unwrap();
        assert_eq!(url.as_str(), "http://pi.hole:8080/api/auth");
    }

    #[test]
    fn rejects_garbage_hosts() {
        assert!(matches!(
            host_url("bad host", LEGACY_API_PATH),
            Err(Error::InvalidUrl { .. })
        ));
    }
}

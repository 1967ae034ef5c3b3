// Secret masking for diagnostics
//
// Legacy requests carry the API key in the query string and servers
// sometimes echo request data back in error bodies. Anything that ends
// up in a log line or an error message goes through here first.

use url::Url;
use url::form_urlencoded::byte_serialize;

/// Placeholder substituted for every secret.
pub const MASK: &str = "***";

/// Query parameters whose values are secret.
const SECRET_PARAMS: &[&str] = &["auth", "sid", "password"];

/// Replace each non-empty secret in `text`, in both its raw and its
/// percent-encoded form, with [`MASK`].
pub fn mask(text: &str, secrets: &[&str]) -> String {
    let mut out = text.to_owned();
    for secret in secrets.iter().filter(|s| !s.is_empty()) {
        let encoded: String = byte_serialize(secret.as_bytes()).collect();
        if encoded != *secret {
            out = out.replace(&encoded, MASK);
        }
        out = out.replace(secret, MASK);
    }
    out
}

/// Render a URL for logging with secret query values masked.
pub fn log_url(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }

    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut query = shown.query_pairs_mut();
        query.clear();
        for (key, value) in &pairs {
            if SECRET_PARAMS.contains(&key.as_str()) {
                query.append_pair(key, MASK);
            } else if value.is_empty() {
                query.append_key_only(key);
            } else {
                query.append_pair(key, value);
            }
        }
    }

    shown.to_string()
}

/// Truncate a response body for inclusion in an error message.
pub fn excerpt(body: &str, secrets: &[&str]) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let short: String = trimmed.chars().take(200).collect();
    Some(mask(&short, secrets))
}

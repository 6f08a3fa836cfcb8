// Wire codec for the controller's `prefix?key=value;key=value;` grammar.
//
// Requests are `GET /<path>?<param>;<param>;...;<http-date>=`. Responses echo
// the path as a prefix, then a `;`-joined body terminated by a NUL segment.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::Error;

/// HTTP-date layout used for the cache-busting trailer parameter.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A decoded device response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Echo of the request path (`login`, `request`, `update`, ...).
    pub prefix: String,
    /// Key/value pairs in order of appearance.
    pub values: IndexMap<String, String>,
}

impl Response {
    /// Look up a raw value by wire key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The `result` field that login/logout responses carry.
    pub fn result(&self) -> Option<&str> {
        self.get("result")
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}?", self.prefix)?;
        for (key, value) in &self.values {
            write!(f, "{key}={value};")?;
        }
        Ok(())
    }
}

/// Decode a raw response body.
///
/// Segments without `=` are skipped with a warning so that one bad pair
/// never discards the rest of a batched read. A body without any `?` has no
/// recognizable shape and is rejected.
pub fn decode(raw: &str) -> Result<Response, Error> {
    let Some((prefix, body)) = raw.split_once('?') else {
        return Err(Error::protocol(format!(
            "response has no '?' separator: {raw:?}"
        )));
    };

    let mut values = IndexMap::new();
    for segment in body.split(';') {
        let segment = segment.trim_matches(|c: char| c.is_whitespace() || c == '\0');
        if segment.is_empty() {
            continue;
        }
        let Some((key, value)) = segment.split_once('=') else {
            warn!(segment, "skipping malformed key value pair in response");
            continue;
        };
        let key = key.trim();
        if let Some(previous) = values.insert(key.to_owned(), value.trim().to_owned()) {
            debug!(key, previous = %previous, "duplicate key in response, keeping last value");
        }
    }

    Ok(Response {
        prefix: prefix.trim().to_owned(),
        values,
    })
}

/// The trailing `<http-date>=` parameter appended to every request.
pub fn timestamp_param(now: DateTime<Utc>) -> String {
    format!("{}=", now.format(HTTP_DATE_FORMAT))
}

/// Join request parameters with `;`, appending the timestamp parameter.
///
/// The device rejects or caches parameterless requests without the
/// trailer, so it is added unconditionally.
pub fn encode_query<I, S>(params: I, now: DateTime<Utc>) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut query = String::new();
    for param in params {
        query.push_str(param.as_ref());
        query.push(';');
    }
    query.push_str(&timestamp_param(now));
    query
}

/// Encode a full request target: `<path>?<param>;...;<timestamp>=`.
pub fn encode<I, S>(path: &str, params: I, now: DateTime<Utc>) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    format!("{path}?{}", encode_query(params, now))
}

/// A `key=value` write parameter.
pub fn write_param(key: &str, value: &str) -> String {
    format!("{key}={value}")
}

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CookieError {
    #[error("cookie segment '{segment}' has no '=' separator")]
    MissingSeparator { segment: String },
    #[error("cookie segment '{segment}' is not valid percent-encoded utf-8")]
    Decode { segment: String },
    #[error("cookie expiry is out of range")]
    ExpiryOutOfRange,
}

/// Assignment string for `document.cookie`. `days == 0` makes a session
/// cookie; everything else gets an absolute `expires` relative to `now_ms`.
pub fn set_cookie_assignment(
    name: &str,
    value: &str,
    days: i64,
    now_ms: i64,
) -> Result<String, CookieError> {
    let expires = if days == 0 {
        String::new()
    } else {
        let now = DateTime::<Utc>::from_timestamp_millis(now_ms).ok_or(CookieError::ExpiryOutOfRange)?;
        let lifetime = days
            .checked_mul(MILLIS_PER_DAY)
            .and_then(Duration::try_milliseconds)
            .ok_or(CookieError::ExpiryOutOfRange)?;
        let at = now
            .checked_add_signed(lifetime)
            .ok_or(CookieError::ExpiryOutOfRange)?;
        format!("; expires={}", at.format(EXPIRES_FORMAT))
    };
    Ok(format!("{name}={value}{expires}; path=/"))
}

pub fn delete_cookie_assignment(name: &str) -> String {
    format!("{name}=; Max-Age=0; path=/")
}

/// Raw value of `name` in a `document.cookie` style header.
pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|segment| {
        let segment = segment.trim_start();
        let rest = segment.strip_prefix(name)?;
        rest.strip_prefix('=').map(ToString::to_string)
    })
}

/// Splits a cookie header into decoded, trimmed name/value pairs. Later
/// duplicates win.
pub fn parse_cookie_header(header: &str) -> Result<BTreeMap<String, String>, CookieError> {
    let mut cookies = BTreeMap::new();
    for segment in header.split(';') {
        if segment.trim().is_empty() {
            continue;
        }
        let (name, value) = segment
            .split_once('=')
            .ok_or_else(|| CookieError::MissingSeparator {
                segment: segment.trim().to_string(),
            })?;
        let decode = |part: &str| {
            urlencoding::decode(part.trim())
                .map(|decoded| decoded.into_owned())
                .map_err(|_| CookieError::Decode {
                    segment: segment.trim().to_string(),
                })
        };
        cookies.insert(decode(name)?, decode(value)?);
    }
    Ok(cookies)
}

/// Where cookies are read from and written to; the browser document in
/// production.
pub trait CookieStore {
    type Error;

    fn read_all(&self) -> Result<String, Self::Error>;
    fn write(&self, assignment: &str) -> Result<(), Self::Error>;
}

pub struct CookieJar<S> {
    store: S,
}

impl<S: CookieStore> CookieJar<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn set(&self, name: &str, value: &str, days: i64, now_ms: i64) -> Result<(), CookieJarError<S::Error>> {
        let assignment =
            set_cookie_assignment(name, value, days, now_ms).map_err(CookieJarError::Cookie)?;
        self.store.write(&assignment).map_err(CookieJarError::Store)
    }

    pub fn get(&self, name: &str) -> Result<Option<String>, CookieJarError<S::Error>> {
        let header = self.store.read_all().map_err(CookieJarError::Store)?;
        Ok(find_cookie(&header, name))
    }

    pub fn delete(&self, name: &str) -> Result<(), CookieJarError<S::Error>> {
        self.store
            .write(&delete_cookie_assignment(name))
            .map_err(CookieJarError::Store)
    }

    pub fn parse_current(&self) -> Result<BTreeMap<String, String>, CookieJarError<S::Error>> {
        let header = self.store.read_all().map_err(CookieJarError::Store)?;
        parse_cookie_header(&header).map_err(CookieJarError::Cookie)
    }
}

#[derive(Debug, Error)]
pub enum CookieJarError<E> {
    #[error(transparent)]
    Cookie(CookieError),
    #[error("cookie store unavailable: {0:?}")]
    Store(E),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Mimics `document.cookie`: assignments upsert, `Max-Age=0` removes.
    #[derive(Default)]
    struct MemoryStore {
        cookies: RefCell<Vec<(String, String)>>,
    }

    impl CookieStore for MemoryStore {
        type Error = ();

        fn read_all(&self) -> Result<String, ()> {
            Ok(self
                .cookies
                .borrow()
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "))
        }

        fn write(&self, assignment: &str) -> Result<(), ()> {
            let mut parts = assignment.split(';');
            let (name, value) = parts.next().and_then(|pair| pair.split_once('=')).ok_or(())?;
            let expired = parts.any(|attribute| attribute.trim().eq_ignore_ascii_case("max-age=0"));
            let mut cookies = self.cookies.borrow_mut();
            cookies.retain(|(existing, _)| existing != name);
            if !expired {
                cookies.push((name.to_string(), value.to_string()));
            }
            Ok(())
        }
    }

    const NOW_MS: i64 = 1_700_000_000_000;

    #[test]
    fn assignment_carries_expiry_and_root_path() {
        let assignment = set_cookie_assignment("theme", "dark", 1, NOW_MS).expect("assignment");
        assert_eq!(assignment, "theme=dark; expires=Wed, 15 Nov 2023 22:13:20 GMT; path=/");
    }

    #[test]
    fn zero_days_makes_a_session_cookie() {
        let assignment = set_cookie_assignment("sid", "x", 0, NOW_MS).expect("assignment");
        assert_eq!(assignment, "sid=x; path=/");
    }

    #[test]
    fn absurd_lifetimes_are_rejected() {
        let error = set_cookie_assignment("a", "b", i64::MAX, NOW_MS).expect_err("overflow");
        assert_eq!(error, CookieError::ExpiryOutOfRange);
    }

    #[test]
    fn finds_exact_names_only() {
        let header = "ab=1; a=2; abc=3";
        assert_eq!(find_cookie(header, "a"), Some("2".to_string()));
        assert_eq!(find_cookie(header, "abc"), Some("3".to_string()));
        assert_eq!(find_cookie(header, "b"), None);
        assert_eq!(find_cookie("", "a"), None);
    }

    #[test]
    fn parses_and_decodes_header() {
        let cookies = parse_cookie_header(" user%20id = 42 ; note=a%3Db=c;;").expect("parsed");
        assert_eq!(cookies.get("user id").map(String::as_str), Some("42"));
        assert_eq!(cookies.get("note").map(String::as_str), Some("a=b=c"));
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn segment_without_separator_is_an_error() {
        let error = parse_cookie_header("a=1; flag").expect_err("missing separator");
        assert_eq!(
            error,
            CookieError::MissingSeparator {
                segment: "flag".to_string()
            }
        );
    }

    #[test]
    fn invalid_utf8_escape_is_an_error() {
        let error = parse_cookie_header("a=%FF").expect_err("bad escape");
        assert!(matches!(error, CookieError::Decode { .. }));
    }

    #[test]
    fn set_get_delete_round_trip() {
        let jar = CookieJar::new(MemoryStore::default());
        jar.set("a", "b", 365, NOW_MS).expect("set");
        assert_eq!(jar.get("a").expect("read"), Some("b".to_string()));
        jar.delete("a").expect("delete");
        assert_eq!(jar.get("a").expect("read"), None);
    }

    #[test]
    fn parse_current_reads_the_store() {
        let jar = CookieJar::new(MemoryStore::default());
        jar.set("lang", "en", 30, NOW_MS).expect("set");
        jar.set("tz", "UTC", 30, NOW_MS).expect("set");
        let cookies = jar.parse_current().expect("parse");
        assert_eq!(cookies.get("tz").map(String::as_str), Some("UTC"));
        assert_eq!(cookies.len(), 2);
    }
}

//! # Address Computation
//!
//! Pure functions turning a context prefix and a resource class into the path
//! pattern a listener is bound to, and turning a bound address back into the
//! address a listener publishes.
//!
//! Patterns are composed on top of a sentinel, non-routable base URL so the
//! usual URL rules apply (percent-encoding, a single `/` between segments).
//! The sentinel origin is stripped afterwards and the wildcard suffix appended
//! so the listener owns the whole subtree:
//!
//! ```text
//! context "/app" + class path "/widgets"
//!   -> http://nopath/app/widgets
//!   -> /app/widgets/.*
//! ```

use crate::error::{DeployError, DeployResult};
use crate::model::ResourceClass;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

/// Placeholder base every pattern is composed on.
pub const NOPATH_PREFIX: &str = "http://nopath/";

/// Suffix making a listener bind the whole subtree of its path.
pub const WILDCARD_SUFFIX: &str = "/.*";

/// Characters escaped inside one path segment. `%` is only escaped when it
/// does not already start a `%XX` escape.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// Computes the path pattern under which `class` is bound.
///
/// Fails with [`DeployError::AddressComputation`] when the class path still
/// holds template variables (nothing can expand them at deployment time),
/// tries to climb out of its context with `..`, or when the composed URL
/// cannot be built.
pub fn compute_address(context: Option<&str>, class: &ResourceClass) -> DeployResult<String> {
    let malformed = |reason: String| DeployError::AddressComputation {
        target: class.name.clone(),
        reason,
    };

    if let Some(path) = class.path.as_deref() {
        if path.contains('{') || path.contains('}') {
            return Err(malformed(format!(
                "path template '{path}' has no values to expand"
            )));
        }
    }

    let mut segments = Vec::new();
    for segment in context
        .into_iter()
        .chain(class.path.as_deref())
        .flat_map(|part| part.split('/'))
    {
        match &*percent_decode_str(segment).decode_utf8_lossy() {
            "" | "." => {}
            ".." => return Err(malformed("'..' segment escapes the context".to_string())),
            _ => segments.push(encode_segment(segment)),
        }
    }

    let mut url = Url::parse(NOPATH_PREFIX).map_err(|e| malformed(e.to_string()))?;
    if !segments.is_empty() {
        url.set_path(&format!("/{}", segments.join("/")));
    }

    // keep the leading '/' of the path
    let sentinel = &NOPATH_PREFIX[..NOPATH_PREFIX.len() - 1];
    let path = url
        .as_str()
        .strip_prefix(sentinel)
        .ok_or_else(|| malformed(format!("{url} lost the {NOPATH_PREFIX} origin")))?;

    Ok(format!("{}{}", path.trim_end_matches('/'), WILDCARD_SUFFIX))
}

/// Percent-encodes `segment`, keeping escapes that are already there.
fn encode_segment(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut encoded = String::with_capacity(segment.len());
    let (mut start, mut i) = (0, 0);
    while i < bytes.len() {
        let escaped = bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit();
        if escaped {
            encoded.extend(utf8_percent_encode(&segment[start..i], SEGMENT));
            encoded.push_str(&segment[i..i + 3]);
            i += 3;
            start = i;
        } else {
            i += 1;
        }
    }
    encoded.extend(utf8_percent_encode(&segment[start..], SEGMENT));
    encoded
}

/// Cuts `bound` at the first occurrence of `context` in its path and
/// re-appends `context`, giving the address a listener publishes.
///
/// Without a context (standalone beans) the bound address is returned as is.
pub fn compute_full_address(bound: &str, context: Option<&str>) -> DeployResult<String> {
    let Some(context) = context else {
        return Ok(bound.to_string());
    };

    let path_start = path_start(bound);
    let idx = bound[path_start..]
        .find(context)
        .map(|i| path_start + i)
        .ok_or_else(|| DeployError::AddressComputation {
            target: bound.to_string(),
            reason: format!("context '{context}' not found in bound address"),
        })?;

    let mut base = bound[..idx].to_string();
    if !base.ends_with('/') && !context.starts_with('/') {
        base.push('/');
    }
    base.push_str(context);
    Ok(base)
}

fn path_start(address: &str) -> usize {
    match address.find("://") {
        Some(scheme_end) => {
            let authority = scheme_end + 3;
            address[authority..]
                .find('/')
                .map_or(address.len(), |slash| authority + slash)
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(path: Option<&str>) -> ResourceClass {
        ResourceClass::new("shop.Widgets", path)
    }

    #[test]
    fn test_context_and_class_path_are_joined() {
        let pattern = compute_address(Some("/app"), &class(Some("/widgets"))).unwrap();
        assert_eq!(pattern, "/app/widgets/.*");
    }

    #[test]
    fn test_slashes_are_normalized() {
        assert_eq!(
            compute_address(Some("app/"), &class(Some("widgets/"))).unwrap(),
            "/app/widgets/.*"
        );
        assert_eq!(
            compute_address(Some("/app/api"), &class(Some("ping"))).unwrap(),
            "/app/api/ping/.*"
        );
        assert_eq!(
            compute_address(Some("//app//"), &class(Some("//a//b"))).unwrap(),
            "/app/a/b/.*"
        );
    }

    #[test]
    fn test_missing_parts_append_nothing() {
        assert_eq!(compute_address(None, &class(Some("/widgets"))).unwrap(), "/widgets/.*");
        assert_eq!(compute_address(Some("/app"), &class(None)).unwrap(), "/app/.*");
        assert_eq!(compute_address(None, &class(None)).unwrap(), "/.*");
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let pattern = compute_address(Some("/app"), &class(Some("/my widgets"))).unwrap();
        assert_eq!(pattern, "/app/my%20widgets/.*");
    }

    #[test]
    fn test_existing_escapes_are_kept() {
        assert_eq!(
            compute_address(Some("/app"), &class(Some("/a%20b"))).unwrap(),
            "/app/a%20b/.*"
        );
        assert_eq!(
            compute_address(Some("/my%20app"), &class(Some("/50%"))).unwrap(),
            "/my%20app/50%25/.*"
        );
    }

    #[test]
    fn test_escaped_context_is_found_in_bound_address() {
        let pattern = compute_address(Some("/my%20app"), &class(Some("/widgets"))).unwrap();
        let bound = format!("http://host:8080{pattern}");
        let full = compute_full_address(&bound, Some("/my%20app")).unwrap();
        assert_eq!(full, "http://host:8080/my%20app");
    }

    #[test]
    fn test_escaped_parent_segment_is_rejected() {
        let err = compute_address(Some("/app"), &class(Some("/%2e%2e/admin"))).unwrap_err();
        assert!(matches!(err, DeployError::AddressComputation { .. }));
    }

    #[test]
    fn test_template_path_is_rejected() {
        let err = compute_address(Some("/app"), &class(Some("/widgets/{id}"))).unwrap_err();
        assert!(matches!(
            err,
            DeployError::AddressComputation { ref target, .. } if target == "shop.Widgets"
        ));
    }

    #[test]
    fn test_parent_segment_is_rejected() {
        let err = compute_address(Some("/app"), &class(Some("/../admin"))).unwrap_err();
        assert!(matches!(err, DeployError::AddressComputation { .. }));
    }

    #[test]
    fn test_full_address_cuts_at_context() {
        let full =
            compute_full_address("http://host:8080/app/widgets/.*", Some("/app")).unwrap();
        assert_eq!(full, "http://host:8080/app");
    }

    #[test]
    fn test_full_address_adds_separator_for_relative_context() {
        let full = compute_full_address("http://host:8080/app/widgets/.*", Some("app")).unwrap();
        assert_eq!(full, "http://host:8080/app");
    }

    #[test]
    fn test_full_address_ignores_host_matches() {
        let full = compute_full_address("http://app.local:8080/app/widgets/.*", Some("app"))
            .unwrap();
        assert_eq!(full, "http://app.local:8080/app");
    }

    #[test]
    fn test_full_address_without_context_is_unchanged() {
        let bound = "http://host:8080/widgets/.*";
        assert_eq!(compute_full_address(bound, None).unwrap(), bound);
    }

    #[test]
    fn test_full_address_requires_context() {
        let err = compute_full_address("http://host:8080/other/.*", Some("/app")).unwrap_err();
        assert!(matches!(err, DeployError::AddressComputation { .. }));
    }

    #[test]
    fn test_round_trip_suffix_matches_context() {
        for context in ["/app", "app", "/app/api", "/app/"] {
            let pattern = compute_address(Some(context), &class(Some("/ping"))).unwrap();
            let bound = format!("http://host:8080{pattern}");
            let full = compute_full_address(&bound, Some(context)).unwrap();
            assert!(full.ends_with(context), "{full} should end with {context}");
        }
    }
}

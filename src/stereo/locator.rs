//! Tolerant search for the embedded right-eye payload in XMP text.
//!
//! Producers differ in namespace prefixes, quoting and pretty-printing, so the
//! text is never parsed as XML. Each [`Strategy`] is an independent matcher that
//! yields raw candidate values; the first candidate accepted by
//! [`accept_candidate`] wins.

use std::borrow::Cow;

use crate::stereo::payload::accept_candidate;

/// Attribute/element holding the right-eye image in Google VR180 photos.
pub const DEFAULT_PAYLOAD_KEY: &str = "GImage:Data";
/// Token expected in the namespace URI of the payload attribute.
pub const DEFAULT_VENDOR_TOKEN: &str = "google";
/// Namespace of the payload key when the document does not declare its prefix.
/// Compared without scheme or trailing slash.
pub const DEFAULT_VENDOR_NAMESPACE: &str = "ns.google.com/photos/1.0/image/";
/// Candidates must be longer than this, counted before whitespace is stripped.
pub const DEFAULT_MIN_PAYLOAD_LEN: usize = 1000;

/// One matching technique, tried in the configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Strategy {
    /// `key="value"`
    Attribute,
    /// `<key>value</key>`
    Element,
    /// `prefix:local="value"` where `xmlns:prefix` is bound to the key's own namespace.
    NamespacedAttribute,
    /// `key` ... `>` value `<`
    Loose,
    /// Collect base64 characters after the key up to the next `<` or `"`.
    Scan,
}

impl Strategy {
    pub const DEFAULT_ORDER: [Strategy; 5] = [
        Strategy::Attribute,
        Strategy::Element,
        Strategy::NamespacedAttribute,
        Strategy::Loose,
        Strategy::Scan,
    ];

    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            Strategy::Attribute => "attribute",
            Strategy::Element => "element",
            Strategy::NamespacedAttribute => "namespaced-attribute",
            Strategy::Loose => "loose",
            Strategy::Scan => "scan",
        }
    }

    /// Raw candidate values this strategy finds in `xmp`, in document order.
    /// Values are borrowed from `xmp` except for [`Strategy::Scan`], which filters characters.
    pub fn candidates<'a>(self, xmp: &'a str, config: &LocatorConfig) -> Vec<Cow<'a, str>> {
        match self {
            Strategy::Attribute => borrowed(attribute_values(xmp, &config.key)),
            Strategy::Element => borrowed(element_values(xmp, &config.key)),
            Strategy::NamespacedAttribute => borrowed(namespaced_values(xmp, config)),
            Strategy::Loose => borrowed(loose_values(xmp, &config.key)),
            Strategy::Scan => scan_values(xmp, &config.key).into_iter().map(Cow::Owned).collect(),
        }
    }
}

fn borrowed(values: Vec<&str>) -> Vec<Cow<'_, str>> {
    values.into_iter().map(Cow::Borrowed).collect()
}

/// Heuristics used by [`locate_payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorConfig {
    pub key: String,
    pub vendor_token: String,
    /// Used only when the key's prefix has no `xmlns` declaration in the document.
    pub vendor_namespace: String,
    pub min_payload_len: usize,
    pub strategies: Vec<Strategy>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_PAYLOAD_KEY.to_string(),
            vendor_token: DEFAULT_VENDOR_TOKEN.to_string(),
            vendor_namespace: DEFAULT_VENDOR_NAMESPACE.to_string(),
            min_payload_len: DEFAULT_MIN_PAYLOAD_LEN,
            strategies: Strategy::DEFAULT_ORDER.to_vec(),
        }
    }
}

impl LocatorConfig {
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_vendor_token(mut self, token: impl Into<String>) -> Self {
        self.vendor_token = token.into();
        self
    }

    pub fn with_vendor_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.vendor_namespace = namespace.into();
        self
    }

    pub fn with_min_payload_len(mut self, len: usize) -> Self {
        self.min_payload_len = len;
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }
}

/// Accepted payload plus the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedPayload {
    pub strategy: Strategy,
    /// Base64 text with all whitespace removed.
    pub base64: String,
}

/// Find the payload bound to `config.key` in `xmp`, or None.
pub fn locate_payload(xmp: &str, config: &LocatorConfig) -> Option<LocatedPayload> {
    if config.key.is_empty() {
        return None;
    }
    for &strategy in &config.strategies {
        for raw in strategy.candidates(xmp, config) {
            if let Some(base64) = accept_candidate(&raw, config.min_payload_len) {
                log::debug!("payload located by {} ({} chars)", strategy.label(), base64.len());
                return Some(LocatedPayload { strategy, base64 });
            }
        }
    }
    None
}

#[inline]
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '-' | '.')
}

/// Byte offsets where `name` occurs as a whole XML name (not a suffix or prefix of another).
fn name_positions(text: &str, name: &str) -> Vec<usize> {
    text.match_indices(name)
        .filter_map(|(pos, _)| {
            let before_ok = text[..pos].chars().next_back().map_or(true, |c| !is_name_char(c));
            let after_ok = text[pos + name.len()..].chars().next().map_or(true, |c| !is_name_char(c));
            (before_ok && after_ok).then_some(pos)
        })
        .collect()
}

/// Given text starting right after a name, parse `\s*=\s*"value"` (either quote style).
fn quoted_value_after_name(rest: &str) -> Option<&str> {
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &rest[1..];
    let end = body.find(quote)?;
    Some(&body[..end])
}

fn attribute_values<'a>(xmp: &'a str, key: &str) -> Vec<&'a str> {
    name_positions(xmp, key)
        .into_iter()
        .filter_map(|pos| quoted_value_after_name(&xmp[pos + key.len()..]))
        .collect()
}

fn element_values<'a>(xmp: &'a str, key: &str) -> Vec<&'a str> {
    let open = format!("<{key}>");
    let close = format!("</{key}>");
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(rel) = xmp[from..].find(&open) {
        let start = from + rel + open.len();
        let Some(len) = xmp[start..].find(&close) else {
            break;
        };
        out.push(&xmp[start..start + len]);
        from = start + len + close.len();
    }
    out
}

/// `xmlns:prefix="uri"` declarations in document order.
fn namespace_declarations(xmp: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    for (pos, _) in xmp.match_indices("xmlns:") {
        let rest = &xmp[pos + "xmlns:".len()..];
        let prefix_len = rest.find(|c: char| !is_name_char(c) || c == ':').unwrap_or(rest.len());
        let prefix = &rest[..prefix_len];
        if prefix.is_empty() {
            continue;
        }
        if let Some(uri) = quoted_value_after_name(&rest[prefix_len..]) {
            out.push((prefix, uri));
        }
    }
    out
}

/// Lowercased URI without scheme or trailing slash.
fn normalize_namespace(uri: &str) -> String {
    let uri = uri.trim();
    let uri = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    uri.trim_end_matches('/').to_ascii_lowercase()
}

/// Prefixes bound to the namespace of `config.key`.
///
/// That namespace is the one declared for the key's own prefix, or
/// `config.vendor_namespace` when the document never declares it. A prefix
/// qualifies when its URI ends with that namespace and, if a vendor token is
/// set, contains the token. Sibling vendor namespaces (audio, depth map) never match.
fn vendor_prefixes<'a>(xmp: &'a str, config: &LocatorConfig) -> Vec<&'a str> {
    let declarations = namespace_declarations(xmp);
    let declared = config
        .key
        .split_once(':')
        .and_then(|(prefix, _)| declarations.iter().find(|(p, _)| *p == prefix))
        .map(|(_, uri)| *uri);
    let namespace = normalize_namespace(declared.unwrap_or(config.vendor_namespace.as_str()));
    if namespace.is_empty() {
        return Vec::new();
    }
    let token = config.vendor_token.to_ascii_lowercase();

    let mut out: Vec<&str> = Vec::new();
    for (prefix, uri) in declarations {
        let uri = normalize_namespace(uri);
        if uri.ends_with(&namespace) && uri.contains(&token) && !out.contains(&prefix) {
            out.push(prefix);
        }
    }
    out
}

fn namespaced_values<'a>(xmp: &'a str, config: &LocatorConfig) -> Vec<&'a str> {
    let key = config.key.as_str();
    let local = key.rsplit(':').next().unwrap_or(key);
    let mut out = Vec::new();
    for prefix in vendor_prefixes(xmp, config) {
        let qualified = format!("{prefix}:{local}");
        out.extend(attribute_values(xmp, &qualified));
    }
    out
}

fn loose_values<'a>(xmp: &'a str, key: &str) -> Vec<&'a str> {
    name_positions(xmp, key)
        .into_iter()
        .filter_map(|pos| {
            let rest = &xmp[pos + key.len()..];
            let gt = rest.find('>')?;
            let value = &rest[gt + 1..];
            let end = value.find('<')?;
            Some(value[..end].trim())
        })
        .collect()
}

#[inline]
fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
}

fn scan_values(xmp: &str, key: &str) -> Vec<String> {
    xmp.match_indices(key)
        .map(|(pos, _)| {
            let rest = &xmp[pos + key.len()..];
            // Skip the delimiter run between the key and its value.
            let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '=' | '"' | '\'' | '>'));
            let mut value = String::new();
            for c in rest.chars() {
                if c == '<' || c == '"' {
                    break;
                }
                if is_base64_char(c) {
                    value.push(c);
                }
            }
            value
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: usize) -> String {
        "QUJD".repeat(n / 4)
    }

    #[test]
    fn attribute_requires_whole_name() {
        let xmp = r#"XGImage:Data="short" GImage:Data = 'v1'"#;
        assert_eq!(attribute_values(xmp, "GImage:Data"), vec!["v1"]);
    }

    #[test]
    fn element_values_found_in_order() {
        let xmp = "<k>one</k> <k>two</k>";
        assert_eq!(element_values(xmp, "k"), vec!["one", "two"]);
    }

    #[test]
    fn vendor_prefix_detection() {
        let xmp = r#"xmlns:a="http://example.com/" xmlns:gi="http://ns.Google.com/photos/1.0/image/""#;
        assert_eq!(vendor_prefixes(xmp, &LocatorConfig::default()), vec!["gi"]);
    }

    #[test]
    fn sibling_vendor_namespaces_are_not_vendor_prefixes() {
        let xmp = concat!(
            r#"xmlns:GAudio="http://ns.google.com/photos/1.0/audio/" "#,
            r#"xmlns:GDepth="http://ns.google.com/photos/1.0/depthmap/" "#,
            r#"xmlns:GPano="http://ns.google.com/photos/1.0/panorama/" "#,
            r#"xmlns:img="https://ns.google.com/photos/1.0/image""#,
        );
        assert_eq!(vendor_prefixes(xmp, &LocatorConfig::default()), vec!["img"]);
    }

    #[test]
    fn declared_key_namespace_overrides_default() {
        let xmp = r#"xmlns:GImage="http://example.org/stereo/" xmlns:s="http://example.org/stereo/" xmlns:o="http://ns.google.com/photos/1.0/image/""#;
        let config = LocatorConfig::default().with_vendor_token("");
        assert_eq!(vendor_prefixes(xmp, &config), vec!["GImage", "s"]);
    }

    #[test]
    fn loose_requires_whole_name() {
        let xmp = "<GImage:DataX>nope</GImage:DataX><GImage:Data a=\"1\">yes</GImage:Data>";
        assert_eq!(loose_values(xmp, "GImage:Data"), vec!["yes"]);
    }

    #[test]
    fn scan_skips_delimiters_and_stops_on_quote() {
        let xmp = "GImage:Data=\"AB CD\nEF\" next";
        assert_eq!(scan_values(xmp, "GImage:Data"), vec!["ABCDEF"]);
    }

    #[test]
    fn first_strategy_in_order_wins() {
        let payload = big(1200);
        let xmp = format!(r#"<x GImage:Data="{payload}"/><GImage:Data>{}</GImage:Data>"#, big(2000));
        let found = locate_payload(&xmp, &LocatorConfig::default()).unwrap();
        assert_eq!(found.strategy, Strategy::Attribute);
        assert_eq!(found.base64, payload);
    }

    #[test]
    fn custom_order_is_respected() {
        let xmp = format!(r#"<x GImage:Data="{}"/><GImage:Data>{}</GImage:Data>"#, big(1200), big(2000));
        let config = LocatorConfig::default().with_strategies(vec![Strategy::Element]);
        let found = locate_payload(&xmp, &config).unwrap();
        assert_eq!(found.strategy, Strategy::Element);
        assert_eq!(found.base64.len(), 2000);
    }

    #[test]
    fn empty_key_finds_nothing() {
        let config = LocatorConfig::default().with_key("");
        assert!(locate_payload(&big(2000), &config).is_none());
    }
}

//! Distinguished Name utilities for directory entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use adkit_core::Error as CoreError;

/// Errors that can occur when parsing or manipulating distinguished names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistinguishedNameError {
    /// The distinguished name was empty.
    #[error("distinguished name cannot be empty")]
    Empty,
    /// A component in the distinguished name was invalid.
    #[error("invalid distinguished name component: {0}")]
    InvalidComponent(String),
    /// A component was missing the attribute name to the left of the `=`.
    #[error("distinguished name component missing attribute: {0}")]
    MissingAttribute(String),
    /// A component was missing the value to the right of the `=`.
    #[error("distinguished name component missing value for attribute {0}")]
    MissingValue(String),
    /// The distinguished name ended with an escape character.
    #[error("distinguished name contains an unterminated escape sequence")]
    UnterminatedEscape,
    /// A `\XX` escape did not decode to valid UTF-8.
    #[error("distinguished name contains an invalid hex escape: {0}")]
    InvalidHexEscape(String),
}

impl From<DistinguishedNameError> for CoreError {
    fn from(err: DistinguishedNameError) -> Self {
        CoreError::InvalidRequest(err.to_string())
    }
}

/// Relative distinguished name (single attribute/value pair such as `CN=alice`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeDistinguishedName {
    attribute: String,
    value: String,
}

impl RelativeDistinguishedName {
    /// Create a new relative distinguished name from an unescaped value.
    #[must_use]
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Attribute portion of the RDN (e.g. `CN`).
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Unescaped attribute value portion of the RDN.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true if this RDN matches the provided attribute name (case-insensitive).
    #[must_use]
    pub fn matches_attribute(&self, attribute: &str) -> bool {
        self.attribute.eq_ignore_ascii_case(attribute)
    }
}

impl fmt::Display for RelativeDistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, escape(&self.value))
    }
}

/// Strongly-typed distinguished name wrapper.
///
/// Keeps a canonical string representation alongside the parsed relative distinguished names,
/// ordered leaf first (`CN=alice,OU=Staff,DC=example,DC=com` yields `CN=alice` at index 0).
/// Parsing follows RFC 4514 escaping, including `\XX` hex pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DistinguishedName {
    raw: String,
    rdns: Vec<Vec<RelativeDistinguishedName>>,
}

impl DistinguishedName {
    /// Parses a distinguished name from a string.
    ///
    /// # Errors
    ///
    /// Returns [`DistinguishedNameError`] if the distinguished name is empty or contains invalid
    /// syntax.
    pub fn parse(input: impl AsRef<str>) -> std::result::Result<Self, DistinguishedNameError> {
        let raw = trim_component(input.as_ref());
        if raw.is_empty() {
            return Err(DistinguishedNameError::Empty);
        }

        let mut rdns = Vec::new();
        for component in split_escaped(raw, ',')? {
            let mut rdn_components = Vec::new();
            for part in split_escaped(component, '+')? {
                let (attribute, value) = split_attribute_value(part)?;
                rdn_components.push(RelativeDistinguishedName::new(attribute, value));
            }
            rdns.push(rdn_components);
        }

        Ok(Self::from_rdns(rdns))
    }

    fn from_rdns(rdns: Vec<Vec<RelativeDistinguishedName>>) -> Self {
        Self {
            raw: rdns_to_string(&rdns),
            rdns,
        }
    }

    /// Borrows the canonical distinguished name string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the RDN sets in order (each set represents a `+`-joined group).
    #[must_use]
    pub fn rdns(&self) -> &[Vec<RelativeDistinguishedName>] {
        &self.rdns
    }

    /// Returns the leaf RDN (the first component of the first RDN set).
    #[must_use]
    pub fn rdn(&self) -> Option<&RelativeDistinguishedName> {
        self.rdns.first().and_then(|set| set.first())
    }

    /// Returns the container holding this entry, or `None` for a single-component DN.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.rdns.len() < 2 {
            return None;
        }
        Some(Self::from_rdns(self.rdns[1..].to_vec()))
    }

    /// Returns an iterator over all relative distinguished names in order.
    pub fn components(&self) -> impl Iterator<Item = &RelativeDistinguishedName> + '_ {
        self.rdns.iter().flat_map(|rdn| rdn.iter())
    }

    /// Looks up the value for the first attribute that matches `attribute` (case-insensitive).
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.components()
            .find(|rdn| rdn.matches_attribute(attribute))
            .map(RelativeDistinguishedName::value)
    }

    /// Creates a new distinguished name by prefixing the provided RDN.
    #[must_use]
    pub fn with_prefix(mut self, rdn: RelativeDistinguishedName) -> Self {
        self.rdns.insert(0, vec![rdn]);
        self.raw = rdns_to_string(&self.rdns);
        self
    }

    /// Returns true if both names refer to the same entry, ignoring attribute and value case.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.raw.eq_ignore_ascii_case(&other.raw)
    }

    /// Returns true if `self` lies strictly below `ancestor` in the tree.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &Self) -> bool {
        let depth = ancestor.rdns.len();
        if self.rdns.len() <= depth {
            return false;
        }
        let suffix = Self::from_rdns(self.rdns[self.rdns.len() - depth..].to_vec());
        suffix.matches(ancestor)
    }

    /// Derives the DNS domain from the `DC` components (`DC=corp,DC=example,DC=com` gives
    /// `corp.example.com`).
    #[must_use]
    pub fn dns_domain(&self) -> Option<String> {
        let labels = self
            .components()
            .filter(|rdn| rdn.matches_attribute("dc"))
            .map(RelativeDistinguishedName::value)
            .collect::<Vec<_>>();
        if labels.is_empty() {
            None
        } else {
            Some(labels.join("."))
        }
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DistinguishedName {
    type Err = DistinguishedNameError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DistinguishedName> for String {
    fn from(value: DistinguishedName) -> Self {
        value.raw
    }
}

impl TryFrom<String> for DistinguishedName {
    type Error = DistinguishedNameError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for DistinguishedName {
    type Error = DistinguishedNameError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// Splits on unescaped `delimiter`, leaving escape sequences intact for the value decoder.
fn split_escaped(
    input: &str,
    delimiter: char,
) -> std::result::Result<Vec<&str>, DistinguishedNameError> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escape = false;

    for (idx, ch) in input.char_indices() {
        if escape {
            escape = false;
        } else if ch == '\\' {
            escape = true;
        } else if ch == delimiter {
            parts.push(trim_component(&input[start..idx]));
            start = idx + ch.len_utf8();
        }
    }

    if escape {
        return Err(DistinguishedNameError::UnterminatedEscape);
    }

    parts.push(trim_component(&input[start..]));
    if parts.iter().any(|part| part.is_empty()) {
        return Err(DistinguishedNameError::InvalidComponent(input.to_string()));
    }
    Ok(parts)
}

/// Trims surrounding whitespace except a trailing space protected by a backslash.
fn trim_component(part: &str) -> &str {
    let leading_trimmed = part.trim_start();
    let trimmed = leading_trimmed.trim_end();
    let trailing_backslashes = trimmed.chars().rev().take_while(|c| *c == '\\').count();
    if trailing_backslashes % 2 == 0 {
        return trimmed;
    }
    let kept = leading_trimmed[trimmed.len()..]
        .chars()
        .next()
        .map_or(0, char::len_utf8);
    &leading_trimmed[..trimmed.len() + kept]
}

fn split_attribute_value(
    component: &str,
) -> std::result::Result<(String, String), DistinguishedNameError> {
    let (attribute, value_part) = component
        .split_once('=')
        .ok_or_else(|| DistinguishedNameError::InvalidComponent(component.to_string()))?;
    let attribute = attribute.trim();
    let value_part = value_part.trim_start();

    if attribute.is_empty() {
        return Err(DistinguishedNameError::MissingAttribute(
            component.to_string(),
        ));
    }

    if value_part.is_empty() {
        return Err(DistinguishedNameError::MissingValue(attribute.to_string()));
    }

    Ok((attribute.to_string(), unescape(value_part)?))
}

fn unescape(value: &str) -> std::result::Result<String, DistinguishedNameError> {
    let mut bytes = Vec::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let next = chars
            .next()
            .ok_or(DistinguishedNameError::UnterminatedEscape)?;
        match (next.to_digit(16), chars.peek().and_then(|c| c.to_digit(16))) {
            (Some(high), Some(low)) => {
                chars.next();
                // Both digits are < 16, so the pair always fits in a byte.
                bytes.push(u8::try_from(high * 16 + low).unwrap_or_default());
            }
            _ => {
                let mut buf = [0; 4];
                bytes.extend_from_slice(next.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    String::from_utf8(bytes)
        .map_err(|_| DistinguishedNameError::InvalidHexEscape(value.to_string()))
}

fn escape(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());

    for (idx, ch) in value.chars().enumerate() {
        match ch {
            '\0' => escaped.push_str("\\00"),
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            ' ' | '#' if idx == 0 => {
                escaped.push('\\');
                escaped.push(ch);
            }
            ' ' if idx == last => escaped.push_str("\\ "),
            _ => escaped.push(ch),
        }
    }

    escaped
}

fn rdns_to_string(rdns: &[Vec<RelativeDistinguishedName>]) -> String {
    rdns.iter()
        .map(|rdn| {
            rdn.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_dn() {
        let dn = DistinguishedName::parse("CN=alice,OU=Staff,DC=test,DC=com").unwrap();
        assert_eq!(dn.get("cn"), Some("alice"));
        assert_eq!(dn.get("ou"), Some("Staff"));
        assert_eq!(dn.rdn().map(RelativeDistinguishedName::attribute), Some("CN"));
        assert_eq!(dn.to_string(), "CN=alice,OU=Staff,DC=test,DC=com");
    }

    #[test]
    fn parse_dn_with_escapes() {
        let dn = DistinguishedName::parse("CN=Smith\\, John,OU=Staff,DC=test,DC=com").unwrap();
        assert_eq!(dn.get("cn"), Some("Smith, John"));
        assert!(dn.to_string().starts_with("CN=Smith\\, John,OU=Staff"));

        let hex = DistinguishedName::parse("CN=Smith\\2C John,OU=Staff,DC=test,DC=com").unwrap();
        assert_eq!(hex.get("cn"), Some("Smith, John"));
        assert_eq!(hex, dn);
    }

    #[test]
    fn parse_multi_valued_rdn() {
        let dn = DistinguishedName::parse("CN=John+UID=1234,OU=Staff,DC=test,DC=com").unwrap();
        assert_eq!(dn.rdns()[0].len(), 2);
        assert_eq!(dn.get("uid"), Some("1234"));
        assert_eq!(dn.to_string(), "CN=John+UID=1234,OU=Staff,DC=test,DC=com");
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(
            DistinguishedName::parse("CN=John,").unwrap_err(),
            DistinguishedNameError::InvalidComponent(_)
        ));
        assert_eq!(
            DistinguishedName::parse("   ").unwrap_err(),
            DistinguishedNameError::Empty
        );
        assert!(matches!(
            DistinguishedName::parse("=John").unwrap_err(),
            DistinguishedNameError::MissingAttribute(_)
        ));
        assert_eq!(
            DistinguishedName::parse("CN=John\\").unwrap_err(),
            DistinguishedNameError::UnterminatedEscape
        );
    }

    #[test]
    fn prefix_and_parent() {
        let ou = DistinguishedName::parse("OU=Staff,DC=test,DC=com").unwrap();
        let user = ou
            .clone()
            .with_prefix(RelativeDistinguishedName::new("CN", "Doe, Jane"));
        assert_eq!(user.to_string(), "CN=Doe\\, Jane,OU=Staff,DC=test,DC=com");
        assert_eq!(user.parent(), Some(ou.clone()));
        assert!(user.is_descendant_of(&ou));
        assert!(user.is_descendant_of(&DistinguishedName::parse("dc=TEST,dc=com").unwrap()));
        assert!(!ou.is_descendant_of(&user));
        assert!(DistinguishedName::parse("DC=com").unwrap().parent().is_none());
    }

    #[test]
    fn escapes_leading_and_trailing_characters() {
        let dn = DistinguishedName::parse("DC=test")
            .unwrap()
            .with_prefix(RelativeDistinguishedName::new("CN", "#admins "));
        assert_eq!(dn.as_str(), "CN=\\#admins\\ ,DC=test");
        assert_eq!(DistinguishedName::parse(dn.as_str()).unwrap(), dn);
    }

    #[test]
    fn dns_domain_from_dc_components() {
        let dn = DistinguishedName::parse("OU=Staff,DC=corp,DC=example,DC=com").unwrap();
        assert_eq!(dn.dns_domain().as_deref(), Some("corp.example.com"));
        assert!(DistinguishedName::parse("O=Example")
            .unwrap()
            .dns_domain()
            .is_none());
    }

    #[test]
    fn serde_uses_string_form() {
        let dn = DistinguishedName::parse("OU=Staff,DC=test,DC=com").unwrap();
        let json = serde_json::to_string(&dn).unwrap();
        assert_eq!(json, "\"OU=Staff,DC=test,DC=com\"");
        let back: DistinguishedName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dn);
        assert!(serde_json::from_str::<DistinguishedName>("\"\"").is_err());
    }
}

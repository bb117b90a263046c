use serde_json::Value;
use std::fmt;

/// 리스트 페이지에서 읽어 온 엔티티 uid
/// PageWalker에서 DetailCollector로 전달되며 한 번만 소비된다
///
/// The token is opaque: it is only ever used to build the detail URL. The
/// primary key of the stored record comes from the detail payload instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Trim a raw uid; blank input yields `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Read the `uid` field of one listing entry.
    ///
    /// Listing APIs are not consistent about quoting ids, so both JSON strings
    /// and JSON numbers are accepted. Anything else is treated as missing.
    pub fn from_listing_entry(entry: &Value) -> Option<Self> {
        match entry.get("uid")? {
            Value::String(raw) => Self::parse(raw),
            Value::Number(number) => Self::parse(&number.to_string()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Identifier> for String {
    fn from(identifier: Identifier) -> Self {
        identifier.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

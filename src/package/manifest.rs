//! Package metadata: the contents of an archive's `metadata.json`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version written into every archive produced by this crate.
pub const FORMAT_VERSION: &str = "1.0";

/// What a package archive contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Component,
    Assembly,
}

impl PackageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PackageKind::Component => "component",
            PackageKind::Assembly => "assembly",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive fields of an archive. Everything except `type`, `name`, and
/// `version` is optional on the wire and defaults to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageMeta {
    #[serde(rename = "type")]
    pub kind: PackageKind,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: i64,
}

impl PackageMeta {
    /// Placeholder for archives whose `metadata.json` is absent or
    /// unreadable; the caller's expectation supplies the kind.
    pub fn missing(kind: PackageKind) -> Self {
        Self {
            kind,
            name: String::new(),
            version: String::new(),
            export_date: None,
            author: String::new(),
            description: String::new(),
            price: 0,
        }
    }
}

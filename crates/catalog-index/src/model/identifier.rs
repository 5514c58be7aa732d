//! Typed identifiers found in document tags.
//!
//! Tags are opaque strings. Join resolution only needs to know which entity
//! type a tag designates, which is what [`TagResolver`] answers. The default
//! resolver understands URNs of the form
//! `URN:<kind>:<ENTITY_TYPE>:<tenant>:<uuid>:V<version>`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

/// Decides whether a tag is an identifier and of which entity type.
pub trait TagResolver: Send + Sync {
    /// Entity type encoded in `tag`, or `None` when the tag is not a valid identifier.
    fn entity_type<'a>(&self, tag: &'a str) -> Option<&'a str>;
}

static URN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^URN:(?P<kind>[A-Z]+):(?P<entity>[A-Z_]+):(?P<tenant>[^:]+):(?P<uuid>[0-9a-fA-F-]{36}):V(?P<version>\d{1,3})(?:,(?P<order>\d+))?(?::REV(?P<revision>.+))?$",
    )
    .unwrap_or_else(|e| panic!("invalid URN pattern: {}", e))
});

/// A parsed URN identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrnIdentifier<'a> {
    pub kind: &'a str,
    pub entity_type: &'a str,
    pub tenant: &'a str,
    pub uuid: Uuid,
    pub version: u32,
    pub order: Option<u64>,
    pub revision: Option<&'a str>,
}

impl<'a> UrnIdentifier<'a> {
    /// Parses a URN, returning `None` for anything malformed.
    pub fn parse(value: &'a str) -> Option<Self> {
        let captures = URN_PATTERN.captures(value)?;
        let uuid = Uuid::parse_str(captures.name("uuid")?.as_str()).ok()?;
        let version = captures.name("version")?.as_str().parse().ok()?;
        let order = match captures.name("order") {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        Some(Self {
            kind: captures.name("kind")?.as_str(),
            entity_type: captures.name("entity")?.as_str(),
            tenant: captures.name("tenant")?.as_str(),
            uuid,
            version,
            order,
            revision: captures.name("revision").map(|m| m.as_str()),
        })
    }
}

impl fmt::Display for UrnIdentifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "URN:{}:{}:{}:{}:V{}",
            self.kind, self.entity_type, self.tenant, self.uuid, self.version
        )?;
        if let Some(order) = self.order {
            write!(f, ",{}", order)?;
        }
        if let Some(revision) = self.revision {
            write!(f, ":REV{}", revision)?;
        }
        Ok(())
    }
}

/// Resolves tags written as URNs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrnTagResolver;

impl TagResolver for UrnTagResolver {
    fn entity_type<'a>(&self, tag: &'a str) -> Option<&'a str> {
        UrnIdentifier::parse(tag).map(|urn| urn.entity_type)
    }
}

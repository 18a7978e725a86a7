//! Compact identifiers for ontology URIs.
//!
//! Two URI conventions are recognised without per-ontology configuration:
//! hash fragments (`http://example.org/onto#ClassA`) and OBO style underscore
//! identifiers (`http://purl.obolibrary.org/obo/GO_0008150`).

use crate::ontology::{EntityKind, EntityRef, Iri};
use crate::{Error, Result};

/// Returns the text between the first `<` and the last `>`, or `raw` itself
/// when it carries no brackets.
///
/// # Errors
///
/// [`Error::MalformedIdentifier`] when only one bracket is present or the
/// closing bracket comes first.
pub fn extract_uri(raw: &str) -> Result<&str> {
    match (raw.find('<'), raw.rfind('>')) {
        (None, None) => Ok(raw),
        (Some(open), Some(close)) if open < close => Ok(&raw[open + 1..close]),
        _ => Err(Error::MalformedIdentifier(raw.to_string())),
    }
}

/// Maps URIs of one import run onto compact identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriNormalizer {
    base_uri: String,
    acronym: String,
}

impl UriNormalizer {
    /// `base_uri` is the importing ontology's IRI, `acronym` the prefix given
    /// to entities defined in it.
    #[must_use]
    pub fn new(base_uri: &str, acronym: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.trim_end_matches('#').to_string(),
            acronym: acronym.into(),
        }
    }

    /// Compact identifier for a bare URI.
    #[must_use]
    pub fn ont_id(&self, uri: &str) -> String {
        let (start, end) = tail_bounds(uri);
        let tail = &uri[start..end];

        let mut prefix: Option<&str> = None;
        let mut local = tail;

        if let Some(hash) = tail.find('#') {
            if hash + 1 < tail.len() {
                local = &tail[hash + 1..];
                if &uri[..start + hash] == self.base_uri.as_str() {
                    prefix = Some(self.acronym.as_str());
                }
            }
        }

        if prefix.is_none() {
            if let Some(underscore) = local.find('_') {
                if underscore > 0 && underscore + 1 < local.len() {
                    prefix = Some(&local[..underscore]);
                    local = &local[underscore + 1..];
                }
            }
        }

        match prefix {
            Some(prefix) => format!("{prefix}:{local}"),
            None => local.to_string(),
        }
    }

    /// Compact identifier for a possibly bracketed rendering of an entity.
    ///
    /// # Errors
    ///
    /// Propagates [`extract_uri`] failures.
    pub fn compact_id(&self, raw: &str) -> Result<String> {
        Ok(self.ont_id(extract_uri(raw)?))
    }

    /// Builds the [`EntityRef`] for `iri`.
    #[must_use]
    pub fn entity(&self, iri: &Iri, kind: EntityKind) -> EntityRef {
        EntityRef::new(iri.clone(), self.ont_id(iri.as_str()), kind)
    }
}

/// Byte range of the last non-empty `/`-delimited segment.
fn tail_bounds(uri: &str) -> (usize, usize) {
    let Some(last) = uri.rfind('/') else {
        return (0, uri.len());
    };
    if last + 1 < uri.len() {
        return (last + 1, uri.len());
    }
    let head = &uri[..last];
    let start = head.rfind('/').map_or(0, |previous| previous + 1);
    (start, last)
}

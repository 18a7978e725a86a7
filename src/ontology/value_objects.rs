use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use oxrdf::NamedNode;
use thiserror::Error;

/// Absolute IRI naming an ontology entity. Also the `uri` key of graph nodes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri {
    value: String,
}

impl Iri {
    /// The constructor rejects malformed identifiers so every entity that
    /// reaches the graph carries a canonical key.
    pub fn new(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        match NamedNode::new(value.as_str()) {
            Ok(_) => Ok(Self { value }),
            Err(_) => Err(IriError::Invalid { value }),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::new(text)
    }
}

impl TryFrom<String> for Iri {
    type Error = IriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NamedNode> for Iri {
    fn from(node: NamedNode) -> Self {
        Self {
            value: node.into_string(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    #[error("`{value}` is not an absolute IRI")]
    Invalid { value: String },
}

/// A class expression as seen by the reasoner: either a named class or an
/// anonymous expression (restriction, union, ...) identified by its blank node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassExpression {
    Named(Iri),
    Anonymous(String),
}

impl ClassExpression {
    #[must_use]
    pub fn as_named(&self) -> Option<&Iri> {
        match self {
            Self::Named(iri) => Some(iri),
            Self::Anonymous(_) => None,
        }
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous(_))
    }
}

impl From<Iri> for ClassExpression {
    fn from(iri: Iri) -> Self {
        Self::Named(iri)
    }
}

impl Display for ClassExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(iri) => write!(f, "<{iri}>"),
            Self::Anonymous(id) => write!(f, "_:{id}"),
        }
    }
}

/// Literal value attached to an individual or used as an annotation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LiteralValue {
    lexical: String,
    language: Option<String>,
    datatype: Option<Iri>,
}

impl LiteralValue {
    /// Plain literal without language tag or datatype.
    #[must_use]
    pub fn simple(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            language: None,
            datatype: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_datatype(mut self, datatype: Iri) -> Self {
        self.datatype = Some(datatype);
        self
    }

    #[must_use]
    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    #[must_use]
    pub fn datatype(&self) -> Option<&Iri> {
        self.datatype.as_ref()
    }
}

impl From<&oxrdf::Literal> for LiteralValue {
    fn from(literal: &oxrdf::Literal) -> Self {
        let value = Self::simple(literal.value());
        if let Some(language) = literal.language() {
            return value.with_language(language);
        }
        value.with_datatype(Iri::from(literal.datatype().into_owned()))
    }
}

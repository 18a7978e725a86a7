use std::path::PathBuf;

use thiserror::Error;

use crate::ontology::{IriError, OntologyError, ReasonerError};

/// Failure classes a run can end with. Every class is fatal; the category only
/// decides how the failure is described to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The store is unreachable or refused the credentials.
    Connectivity,
    /// The ontology document could not be read or parsed.
    OntologyLoad,
    /// The reasoner found the ontology inconsistent.
    Inconsistent,
    /// A statement could not be delivered while writing.
    Transport,
    /// The store rejected the transaction at commit time.
    Commit,
    /// Invalid settings supplied by the operator.
    Configuration,
    /// Anything else.
    Internal,
}

impl ErrorCategory {
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Connectivity => "graph store connection failed",
            Self::OntologyLoad => "error loading the ontology",
            Self::Inconsistent => "ontology is inconsistent",
            Self::Transport => "error writing to the graph store",
            Self::Commit => "error committing the transaction",
            Self::Configuration => "invalid configuration",
            Self::Internal => "internal error",
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("graph store at `{url}` is unreachable: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("graph store at `{url}` rejected the credentials (status {status})")]
    Unauthorized { url: String, status: u16 },

    #[error("failed to read ontology `{path}`: {source}")]
    OntologyIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse ontology `{path}`: {reason}")]
    OntologyParse { path: PathBuf, reason: String },

    #[error("unsupported ontology format for `{0}`")]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Ontology(#[from] OntologyError),

    #[error(transparent)]
    Iri(#[from] IriError),

    #[error("ontology `{0}` is inconsistent")]
    Inconsistent(String),

    #[error(transparent)]
    Reasoner(#[from] ReasonerError),

    #[error("malformed identifier `{0}`: unbalanced angle brackets")]
    MalformedIdentifier(String),

    #[error("request to `{url}` failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("graph store answered {status} for {operation}")]
    UnexpectedStatus { operation: String, status: u16 },

    #[error("malformed graph store response for {operation}: {reason}")]
    MalformedResponse { operation: String, reason: String },

    #[error("graph store rejected {operation}: {code}: {message}")]
    Statement {
        operation: String,
        code: String,
        message: String,
    },

    #[error("commit rejected by graph store: {code}: {message}")]
    CommitRejected { code: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read configuration `{path}`: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Maps the error onto the failure taxonomy used for reporting.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unreachable { .. } | Self::Unauthorized { .. } => ErrorCategory::Connectivity,
            Self::OntologyIo { .. }
            | Self::OntologyParse { .. }
            | Self::UnsupportedFormat(_)
            | Self::Ontology(_)
            | Self::Iri(_) => ErrorCategory::OntologyLoad,
            Self::Inconsistent(_) => ErrorCategory::Inconsistent,
            Self::Transport { .. }
            | Self::UnexpectedStatus { .. }
            | Self::MalformedResponse { .. }
            | Self::Statement { .. } => ErrorCategory::Transport,
            Self::CommitRejected { .. } => ErrorCategory::Commit,
            Self::Config(_) | Self::ConfigFile { .. } => ErrorCategory::Configuration,
            Self::Reasoner(_) | Self::MalformedIdentifier(_) | Self::Message(_) => {
                ErrorCategory::Internal
            }
        }
    }

    pub(crate) fn statement(operation: impl Into<String>, code: &str, message: &str) -> Self {
        Self::Statement {
            operation: operation.into(),
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn malformed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

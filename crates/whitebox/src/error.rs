//! Error taxonomy of the reflection engine

use std::fmt;

/// Kind of member a resolution was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Class lookup by name
    Class,
    /// Field lookup
    Field,
    /// Method lookup
    Method,
    /// Constructor lookup
    Constructor,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberKind::Class => "class",
            MemberKind::Field => "field",
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
        })
    }
}

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    /// No member satisfies the request in the searched scope
    #[error("no {kind} matching {request} found in {scope}")]
    NotFound {
        /// Member kind
        kind: MemberKind,
        /// Rendering of the request
        request: String,
        /// Searched scope (hierarchy or declaring level)
        scope: String,
    },

    /// More than one member equally satisfies the request at one level
    #[error(
        "{kind} request {request} is ambiguous in {scope}: candidates are {}; \
         supply explicit parameter types or a declaring class",
        .candidates.join(", ")
    )]
    Ambiguous {
        /// Member kind
        kind: MemberKind,
        /// Rendering of the request
        request: String,
        /// Level where the ambiguity was found
        scope: String,
        /// Rendering of each equally valid candidate
        candidates: Vec<String>,
    },

    /// Allocation or construction requested for a type that cannot be instantiated
    #[error("cannot instantiate {type_name}: {reason}")]
    NotInstantiable {
        /// Type name
        type_name: String,
        /// Why
        reason: String,
    },

    /// Value, receiver or argument does not fit the located member
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// A typed read found a value of another shape
    #[error("expected a value of type {expected}, found {found}")]
    ValueType {
        /// Requested shape
        expected: String,
        /// Stored value kind
        found: String,
    },

    /// The invoked method or constructor failed; this is the callee's own error
    #[error(transparent)]
    Callee(anyhow::Error),
}

impl ReflectError {
    /// Check if this is a not-found failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReflectError::NotFound { .. })
    }

    /// Check if this is an ambiguity failure
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ReflectError::Ambiguous { .. })
    }

    /// Borrow the callee's failure, if the callee failed
    pub fn callee(&self) -> Option<&anyhow::Error> {
        match self {
            ReflectError::Callee(err) => Some(err),
            _ => None,
        }
    }

    /// Take the callee's failure out unchanged; any other error is returned as is
    pub fn into_callee(self) -> Result<anyhow::Error, Self> {
        match self {
            ReflectError::Callee(err) => Ok(err),
            other => Err(other),
        }
    }
}

/// Engine result type
pub type ReflectResult<T> = Result<T, ReflectError>;

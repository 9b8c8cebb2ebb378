//! Error types for the host runtime and the probe engine

use std::path::PathBuf;

use crate::class::ClassId;

/// Host runtime result type
pub type HostResult<T> = Result<T, HostError>;

/// Engine result type
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Failures raised by the host object model itself
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// Class ID not present in the registry
    #[error("Unknown class id {0}")]
    UnknownClass(ClassId),

    /// A class with this name is already registered
    #[error("Class already registered: {0}")]
    DuplicateClass(String),

    /// Interfaces and unknown classes cannot be instantiated
    #[error("Class cannot be instantiated: {0}")]
    NotInstantiable(String),

    /// Non-public member touched through a handle that was not made accessible
    #[error("Illegal access to {class}.{member}")]
    IllegalAccess {
        /// Declaring class name
        class: String,
        /// Member name
        member: String,
    },

    /// Receiver is not an instance of the member's declaring class
    #[error("Object of class {actual} is not an instance of {expected}")]
    InstanceMismatch {
        /// Declaring class name
        expected: String,
        /// Receiver class name
        actual: String,
    },

    /// Value cannot be stored in a field of the declared type
    #[error("Cannot assign {actual} to field {field} of type {expected}")]
    TypeMismatch {
        /// Field name
        field: String,
        /// Declared field type name
        expected: String,
        /// Runtime type name of the rejected value
        actual: String,
    },

    /// Argument list does not fit the method's formal parameters
    #[error("Argument mismatch calling {method}: {reason}")]
    ArgumentMismatch {
        /// Method name
        method: String,
        /// What did not match
        reason: String,
    },

    /// Member accessed on a null receiver
    #[error("Null receiver")]
    NullReceiver,

    /// A method body failed while running
    #[error("Invocation of {method} failed: {reason}")]
    Invocation {
        /// Method name
        method: String,
        /// Failure reported by the method body
        reason: String,
    },
}

/// Failures surfaced by the probe engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// By-name field search exhausted the ancestor chain
    #[error("No field {name} on {class} or its ancestors")]
    FieldNotFound {
        /// Class the search started at
        class: String,
        /// Requested field name
        name: String,
    },

    /// Method search exhausted the ancestor chain
    #[error("No method {name} on {class} or its ancestors")]
    MethodNotFound {
        /// Class the search started at
        class: String,
        /// Requested method name
        name: String,
    },

    /// Host runtime failure
    #[error(transparent)]
    Host(#[from] HostError),

    /// Invariant violated inside the engine; never an ordinary absence
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors that can occur while loading engine configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    Validation(String),
}

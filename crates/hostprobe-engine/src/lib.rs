//! Hostprobe Engine
//!
//! Version-resilient structural introspection over a host runtime's object
//! graph. The engine never depends on host types at build time; it binds
//! them by name at startup and finds members by name, by declared type, or
//! by the shape of their live values.
//!
//! - **Host model**: classes, instances and values (`class`, `object`, `registry`)
//! - **Resolver**: symbolic type references bound once per host (`reflect::resolver`)
//! - **Search**: field and method lookup across the ancestor chain (`reflect::search`)
//! - **Navigator**: server wrapper down to the listener's acceptor (`reflect::navigator`)
//! - **Patch**: live overwrite of private instance state (`reflect::patch`)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hostprobe_engine::{HostNavigator, ProbeConfig};
//!
//! let config = ProbeConfig::load(Path::new("hostprobe.toml"))?;
//! let navigator = HostNavigator::new(Arc::new(registry), &config);
//!
//! if let Some(topology) = navigator.discover(&wrapper)? {
//!     navigator.set_remote_address(&accepted_channel, peer_address);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Host Object Model
// ============================================================================

/// Class metadata and builders
pub mod class;

/// Instances, lists and values
pub mod object;

/// Class registry and builtin classes
pub mod registry;

// ============================================================================
// Engine
// ============================================================================

/// Introspection, navigation and patching
pub mod reflect;

/// Engine configuration
pub mod config;

/// Error types
pub mod error;

// ============================================================================
// Re-exports
// ============================================================================

pub use class::{ClassBuilder, ClassId, ClassKind, FieldDecl, MethodDecl, NativeMethod, Visibility};
pub use config::{ProbeConfig, TypeCandidates};
pub use error::{ConfigError, HostError, HostResult, ProbeError, ProbeResult};
pub use object::{ListRef, ObjectRef, Value};
pub use reflect::{
    AcceptorBindings, FieldHandle, HostNavigator, HostRole, HostTypes, ListenerTopology,
    MethodHandle, SymbolicTypeRef,
};
pub use registry::{builtin, create_standard_registry, ClassRegistry};

//! Structural introspection over the host object model
//!
//! - [`resolver`]: symbolic type references and the host role bindings
//! - [`handles`]: field and method handles with access control
//! - [`search`]: name-directed and type-directed member search
//! - [`patch`]: live field overwrite
//! - [`navigator`]: the walk from the server wrapper to its listener

pub mod handles;
pub mod navigator;
pub mod patch;
pub mod resolver;
pub mod search;

pub use handles::{FieldHandle, MethodHandle};
pub use navigator::{AcceptorBindings, HostNavigator, ListenerTopology};
pub use patch::{overwrite_field, try_overwrite_field};
pub use resolver::{resolve, HostRole, HostTypes, SymbolicTypeRef, TypeBinding};
pub use search::{find_attribute, find_field_by_name, find_fields_by_type, find_method};

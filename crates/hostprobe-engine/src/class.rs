//! Class, field, and method declarations of the host type system

use std::fmt;
use std::sync::Arc;

use crate::error::HostResult;
use crate::object::{ObjectRef, Value};
use crate::registry::ClassRegistry;

/// Dense class identifier (index into the class registry)
pub type ClassId = usize;

/// Native method body
///
/// Receives the registry the receiver lives in, the receiver itself, and the
/// already type-checked arguments.
pub type NativeMethod =
    Arc<dyn Fn(&ClassRegistry, &ObjectRef, &[Value]) -> HostResult<Value> + Send + Sync>;

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Visible everywhere
    Public,
    /// Visible to subclasses
    Protected,
    /// Visible inside the declaring package
    #[default]
    Package,
    /// Visible only to the declaring class
    Private,
}

impl Visibility {
    /// Whether external code may touch the member without an access override
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

/// Class kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// Instantiable class
    Class,
    /// Interface (never instantiated, only implemented)
    Interface,
}

/// Declared instance field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared type
    pub type_id: ClassId,
    /// Visibility
    pub visibility: Visibility,
    /// Slot in the instance field vector (inherited slots come first)
    pub slot: usize,
}

/// Declared method
#[derive(Clone)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Formal parameter types
    pub params: Vec<ClassId>,
    /// Return type (None for void)
    pub return_type: Option<ClassId>,
    /// Visibility
    pub visibility: Visibility,
    /// Implementation
    pub body: NativeMethod,
}

impl MethodDecl {
    /// Create a public, parameterless, void method
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&ClassRegistry, &ObjectRef, &[Value]) -> HostResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            return_type: None,
            visibility: Visibility::Public,
            body: Arc::new(body),
        }
    }

    /// Set the formal parameter types
    pub fn params(mut self, params: &[ClassId]) -> Self {
        self.params = params.to_vec();
        self
    }

    /// Set the return type
    pub fn returns(mut self, type_id: ClassId) -> Self {
        self.return_type = Some(type_id);
        self
    }

    /// Set the visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Whether this declaration has exactly the given name and parameter list
    pub fn matches_exact(&self, name: &str, params: &[ClassId]) -> bool {
        self.name == name && self.params == params
    }
}

impl fmt::Debug for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

/// Class definition metadata
#[derive(Debug, Clone)]
pub struct Class {
    /// Class ID (unique identifier)
    pub id: ClassId,
    /// Fully-qualified class name
    pub name: String,
    /// Class or interface
    pub kind: ClassKind,
    /// Superclass (None for roots and interfaces)
    pub parent_id: Option<ClassId>,
    /// Directly implemented (or extended, for interfaces) interfaces
    pub interfaces: Vec<ClassId>,
    /// Declared fields in declaration order
    pub fields: Vec<FieldDecl>,
    /// Declared methods in declaration order
    pub methods: Vec<MethodDecl>,
    /// Number of instance fields (including inherited)
    pub field_count: usize,
}

impl Class {
    /// Whether this class is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// Field declared directly on this class
    pub fn declared_field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Method declared directly on this class with an exact signature
    pub fn declared_method(&self, name: &str, params: &[ClassId]) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.matches_exact(name, params))
    }
}

/// Builder for a class to be registered with [`ClassRegistry::define`]
///
/// Field slots are assigned at definition time, after the parent's slots.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    pub(crate) name: String,
    pub(crate) kind: ClassKind,
    pub(crate) parent_id: Option<ClassId>,
    pub(crate) interfaces: Vec<ClassId>,
    pub(crate) fields: Vec<(String, ClassId, Visibility)>,
    pub(crate) methods: Vec<MethodDecl>,
}

impl ClassBuilder {
    /// Start a root class
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ClassKind::Class,
            parent_id: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Start an interface
    pub fn interface(name: &str) -> Self {
        Self {
            kind: ClassKind::Interface,
            ..Self::new(name)
        }
    }

    /// Set the superclass
    pub fn extends(mut self, parent_id: ClassId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, interface_id: ClassId) -> Self {
        self.interfaces.push(interface_id);
        self
    }

    /// Declare an instance field
    pub fn field(mut self, name: &str, type_id: ClassId, visibility: Visibility) -> Self {
        self.fields.push((name.to_string(), type_id, visibility));
        self
    }

    /// Declare a method
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }
}

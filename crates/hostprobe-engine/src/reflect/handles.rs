//! Field and method handles
//!
//! Handles are derived on demand from class metadata and are cheap to
//! rebuild, so nothing caches them across unrelated instances.

use crate::class::{ClassId, FieldDecl, MethodDecl, Visibility};
use crate::error::{HostError, HostResult};
use crate::object::{ObjectRef, Value};
use crate::registry::ClassRegistry;

/// Receiver check shared by field and method handles
fn receiver<'v>(
    registry: &ClassRegistry,
    declaring: ClassId,
    instance: &'v Value,
) -> HostResult<&'v ObjectRef> {
    let obj = match instance {
        Value::Null => return Err(HostError::NullReceiver),
        Value::Object(obj) => obj,
        other => {
            return Err(HostError::InstanceMismatch {
                expected: registry.type_name(declaring).to_string(),
                actual: registry.describe(other),
            })
        }
    };

    if !registry.is_assignable(obj.class_id(), declaring) {
        return Err(HostError::InstanceMismatch {
            expected: registry.type_name(declaring).to_string(),
            actual: registry.type_name(obj.class_id()).to_string(),
        });
    }
    Ok(obj)
}

/// Handle to a declared instance field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHandle {
    declaring: ClassId,
    name: String,
    type_id: ClassId,
    visibility: Visibility,
    slot: usize,
    accessible: bool,
}

impl FieldHandle {
    /// Handle for a field declared on `declaring`
    pub fn new(declaring: ClassId, decl: &FieldDecl) -> Self {
        Self {
            declaring,
            name: decl.name.clone(),
            type_id: decl.type_id,
            visibility: decl.visibility,
            slot: decl.slot,
            accessible: false,
        }
    }

    /// Declaring class
    pub fn declaring_class(&self) -> ClassId {
        self.declaring
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub fn type_id(&self) -> ClassId {
        self.type_id
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether visibility checks are suppressed
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    /// Suppress (or restore) visibility checks for this handle
    pub fn set_accessible(&mut self, flag: bool) {
        self.accessible = flag;
    }

    /// Consuming form of [`set_accessible(true)`](Self::set_accessible)
    pub fn accessible(mut self) -> Self {
        self.accessible = true;
        self
    }

    fn check_access(&self, registry: &ClassRegistry) -> HostResult<()> {
        if self.accessible || self.visibility.is_public() {
            Ok(())
        } else {
            Err(HostError::IllegalAccess {
                class: registry.type_name(self.declaring).to_string(),
                member: self.name.clone(),
            })
        }
    }

    /// Read the field from `instance`
    pub fn get(&self, registry: &ClassRegistry, instance: &Value) -> HostResult<Value> {
        let obj = receiver(registry, self.declaring, instance)?;
        self.check_access(registry)?;
        obj.get_field(self.slot).ok_or_else(|| HostError::InstanceMismatch {
            expected: registry.type_name(self.declaring).to_string(),
            actual: registry.type_name(obj.class_id()).to_string(),
        })
    }

    /// Write `value` into the field of `instance`
    pub fn set(&self, registry: &ClassRegistry, instance: &Value, value: Value) -> HostResult<()> {
        let obj = receiver(registry, self.declaring, instance)?;
        self.check_access(registry)?;

        if !value.is_null() && !registry.is_instance(&value, self.type_id) {
            return Err(HostError::TypeMismatch {
                field: self.name.clone(),
                expected: registry.type_name(self.type_id).to_string(),
                actual: registry.describe(&value),
            });
        }

        obj.set_field(self.slot, value)
            .map_err(|_| HostError::InstanceMismatch {
                expected: registry.type_name(self.declaring).to_string(),
                actual: registry.type_name(obj.class_id()).to_string(),
            })
    }
}

/// Handle to a declared method
#[derive(Debug, Clone)]
pub struct MethodHandle {
    declaring: ClassId,
    decl: MethodDecl,
    accessible: bool,
}

impl MethodHandle {
    /// Handle for a method declared on `declaring`
    pub fn new(declaring: ClassId, decl: &MethodDecl) -> Self {
        Self {
            declaring,
            decl: decl.clone(),
            accessible: false,
        }
    }

    /// Declaring class
    pub fn declaring_class(&self) -> ClassId {
        self.declaring
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    /// Formal parameter types
    pub fn params(&self) -> &[ClassId] {
        &self.decl.params
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.decl.visibility
    }

    /// Whether visibility checks are suppressed
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    /// Suppress (or restore) visibility checks for this handle
    pub fn set_accessible(&mut self, flag: bool) {
        self.accessible = flag;
    }

    /// Consuming form of [`set_accessible(true)`](Self::set_accessible)
    pub fn accessible(mut self) -> Self {
        self.accessible = true;
        self
    }

    /// Invoke on `receiver`
    ///
    /// Non-private methods dispatch to the most-derived non-private
    /// declaration with the same signature in the receiver's class chain.
    /// Private redeclarations in subclasses do not override.
    pub fn invoke(
        &self,
        registry: &ClassRegistry,
        receiver_value: &Value,
        args: &[Value],
    ) -> HostResult<Value> {
        let obj = receiver(registry, self.declaring, receiver_value)?;

        if !self.accessible && !self.decl.visibility.is_public() {
            return Err(HostError::IllegalAccess {
                class: registry.type_name(self.declaring).to_string(),
                member: self.decl.name.clone(),
            });
        }

        if args.len() != self.decl.params.len() {
            return Err(HostError::ArgumentMismatch {
                method: self.decl.name.clone(),
                reason: format!(
                    "expected {} arguments, got {}",
                    self.decl.params.len(),
                    args.len()
                ),
            });
        }
        for (index, (arg, &param)) in args.iter().zip(&self.decl.params).enumerate() {
            if !arg.is_null() && !registry.is_instance(arg, param) {
                return Err(HostError::ArgumentMismatch {
                    method: self.decl.name.clone(),
                    reason: format!(
                        "argument {} is {}, expected {}",
                        index,
                        registry.describe(arg),
                        registry.type_name(param)
                    ),
                });
            }
        }

        let body = if self.decl.visibility == Visibility::Private {
            &self.decl.body
        } else {
            registry
                .ancestors(obj.class_id())
                .filter_map(|class| class.declared_method(&self.decl.name, &self.decl.params))
                .find(|m| m.visibility != Visibility::Private)
                .map_or(&self.decl.body, |m| &m.body)
        };

        body(registry, obj, args)
    }
}

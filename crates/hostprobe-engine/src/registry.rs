//! Class registry: the host runtime's type system
//!
//! Classes are registered once through [`ClassRegistry::define`] and never
//! change afterwards. Class ID 0 is the root class every class without an
//! explicit superclass extends.

use rustc_hash::FxHashMap;

use crate::class::{Class, ClassBuilder, ClassId, ClassKind, FieldDecl, MethodDecl};
use crate::error::{HostError, HostResult};
use crate::object::{List, ListRef, Object, ObjectRef, Value};

/// Builtin classes present in every standard registry
pub mod builtin {
    use crate::class::ClassId;

    /// Root class
    pub const OBJECT: ClassId = 0;
    /// Boxed boolean
    pub const BOOLEAN: ClassId = 1;
    /// Boxed integer
    pub const INTEGER: ClassId = 2;
    /// String
    pub const STRING: ClassId = 3;
    /// Sequence interface
    pub const LIST: ClassId = 4;
    /// Default sequence implementation
    pub const ARRAY_LIST: ClassId = 5;

    /// Name of [`OBJECT`]
    pub const OBJECT_NAME: &str = "lang.Object";
    /// Name of [`BOOLEAN`]
    pub const BOOLEAN_NAME: &str = "lang.Boolean";
    /// Name of [`INTEGER`]
    pub const INTEGER_NAME: &str = "lang.Integer";
    /// Name of [`STRING`]
    pub const STRING_NAME: &str = "lang.String";
    /// Name of [`LIST`]
    pub const LIST_NAME: &str = "util.List";
    /// Name of [`ARRAY_LIST`]
    pub const ARRAY_LIST_NAME: &str = "util.ArrayList";
}

/// Create a registry holding only the builtin classes
pub fn create_standard_registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    let root = |id, name: &str, parent, kind, interfaces| Class {
        id,
        name: name.to_string(),
        kind,
        parent_id: parent,
        interfaces,
        fields: Vec::new(),
        methods: Vec::new(),
        field_count: 0,
    };

    registry.insert(root(builtin::OBJECT, builtin::OBJECT_NAME, None, ClassKind::Class, vec![]));
    registry.insert(root(
        builtin::BOOLEAN,
        builtin::BOOLEAN_NAME,
        Some(builtin::OBJECT),
        ClassKind::Class,
        vec![],
    ));
    registry.insert(root(
        builtin::INTEGER,
        builtin::INTEGER_NAME,
        Some(builtin::OBJECT),
        ClassKind::Class,
        vec![],
    ));
    registry.insert(root(
        builtin::STRING,
        builtin::STRING_NAME,
        Some(builtin::OBJECT),
        ClassKind::Class,
        vec![],
    ));
    registry.insert(root(builtin::LIST, builtin::LIST_NAME, None, ClassKind::Interface, vec![]));
    registry.insert(root(
        builtin::ARRAY_LIST,
        builtin::ARRAY_LIST_NAME,
        Some(builtin::OBJECT),
        ClassKind::Class,
        vec![builtin::LIST],
    ));

    registry
}

/// Class registry for the host runtime
#[derive(Debug, Default)]
pub struct ClassRegistry {
    /// Classes indexed by ID
    classes: Vec<Class>,
    /// Class name to ID mapping
    name_to_id: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, class: Class) -> ClassId {
        let id = class.id;
        self.name_to_id.insert(class.name.clone(), id);
        self.classes.push(class);
        id
    }

    /// Register a class, laying out its field slots after its parent's
    pub fn define(&mut self, builder: ClassBuilder) -> HostResult<ClassId> {
        if self.name_to_id.contains_key(&builder.name) {
            return Err(HostError::DuplicateClass(builder.name));
        }

        let id = self.next_class_id();
        let parent_id = match (builder.parent_id, builder.kind) {
            (Some(parent), _) => Some(parent),
            (None, ClassKind::Class) if !self.classes.is_empty() => Some(0),
            (None, _) => None,
        };

        let base = match parent_id {
            Some(parent) => self.class(parent)?.field_count,
            None => 0,
        };
        for &interface in &builder.interfaces {
            self.class(interface)?;
        }

        let mut fields = Vec::with_capacity(builder.fields.len());
        for (offset, (name, type_id, visibility)) in builder.fields.into_iter().enumerate() {
            // A class may hold fields of its own type.
            if type_id != id {
                self.class(type_id)?;
            }
            fields.push(FieldDecl {
                name,
                type_id,
                visibility,
                slot: base + offset,
            });
        }

        let field_count = if builder.kind == ClassKind::Interface {
            0
        } else {
            base + fields.len()
        };

        Ok(self.insert(Class {
            id,
            name: builder.name,
            kind: builder.kind,
            parent_id,
            interfaces: builder.interfaces,
            fields,
            methods: builder.methods,
            field_count,
        }))
    }

    /// Get class by ID
    pub fn get_class(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(id)
    }

    /// Get class by ID, failing with [`HostError::UnknownClass`]
    pub fn class(&self, id: ClassId) -> HostResult<&Class> {
        self.classes.get(id).ok_or(HostError::UnknownClass(id))
    }

    /// Get class by name
    pub fn get_class_by_name(&self, name: &str) -> Option<&Class> {
        self.name_to_id
            .get(name)
            .and_then(|id| self.classes.get(*id))
    }

    /// Get next available class ID
    pub fn next_class_id(&self) -> ClassId {
        self.classes.len()
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class name, or `<unknown>` for an unregistered ID
    pub fn type_name(&self, id: ClassId) -> &str {
        self.get_class(id).map_or("<unknown>", |c| c.name.as_str())
    }

    /// Name of a value's runtime class, `null` for null
    pub fn describe(&self, value: &Value) -> String {
        match value.runtime_class() {
            Some(id) => self.type_name(id).to_string(),
            None => "null".to_string(),
        }
    }

    /// Superclass chain starting at `id` itself and ending at the root
    pub fn ancestors(&self, id: ClassId) -> Ancestors<'_> {
        Ancestors {
            registry: self,
            next: Some(id),
        }
    }

    /// Whether a value of class `from` can be stored where `to` is expected
    pub fn is_assignable(&self, from: ClassId, to: ClassId) -> bool {
        let Some(class) = self.get_class(from) else {
            return false;
        };
        if from == to || to == builtin::OBJECT {
            return true;
        }

        class.parent_id.is_some_and(|p| self.is_assignable(p, to))
            || class.interfaces.iter().any(|&i| self.is_assignable(i, to))
    }

    /// Whether `value` is a (non-null) instance of `class_id`
    pub fn is_instance(&self, value: &Value, class_id: ClassId) -> bool {
        value
            .runtime_class()
            .is_some_and(|c| self.is_assignable(c, class_id))
    }

    /// Public fields of the class and its ancestors, most-derived first
    pub fn public_fields(&self, id: ClassId) -> Vec<(ClassId, &FieldDecl)> {
        self.ancestors(id)
            .flat_map(|class| {
                class
                    .fields
                    .iter()
                    .filter(|f| f.visibility.is_public())
                    .map(move |f| (class.id, f))
            })
            .collect()
    }

    /// Public method with an exact signature, searching superclasses then interfaces
    pub fn public_method(
        &self,
        id: ClassId,
        name: &str,
        params: &[ClassId],
    ) -> Option<(ClassId, &MethodDecl)> {
        let is_match = |m: &MethodDecl| m.visibility.is_public() && m.matches_exact(name, params);

        for class in self.ancestors(id) {
            if let Some(m) = class.methods.iter().find(|&m| is_match(m)) {
                return Some((class.id, m));
            }
        }

        let mut pending: Vec<ClassId> = self
            .ancestors(id)
            .flat_map(|c| c.interfaces.iter().copied())
            .collect();
        let mut seen = Vec::new();
        while let Some(interface_id) = pending.pop() {
            if seen.contains(&interface_id) {
                continue;
            }
            seen.push(interface_id);
            let Some(interface) = self.get_class(interface_id) else {
                continue;
            };
            if let Some(m) = interface.methods.iter().find(|&m| is_match(m)) {
                return Some((interface_id, m));
            }
            pending.extend(interface.interfaces.iter().rev().copied());
        }

        None
    }

    /// Allocate an instance with all fields null
    pub fn new_object(&self, class_id: ClassId) -> HostResult<ObjectRef> {
        let class = self.class(class_id)?;
        if class.is_interface() {
            return Err(HostError::NotInstantiable(class.name.clone()));
        }
        Ok(ObjectRef::new(Object::new(class_id, class.field_count)))
    }

    /// Allocate a default list holding `elements`
    pub fn new_list(&self, elements: Vec<Value>) -> ListRef {
        ListRef::new(List::new(builtin::ARRAY_LIST, elements))
    }

    /// Allocate a list of a specific list class
    ///
    /// Lists carry no field slots, so list classes that declare or inherit
    /// fields must be allocated with [`new_object`](Self::new_object).
    pub fn new_list_of(&self, type_id: ClassId, elements: Vec<Value>) -> HostResult<ListRef> {
        let class = self.class(type_id)?;
        if class.is_interface()
            || class.field_count > 0
            || !self.is_assignable(type_id, builtin::LIST)
        {
            return Err(HostError::NotInstantiable(class.name.clone()));
        }
        Ok(ListRef::new(List::new(type_id, elements)))
    }
}

/// Iterator over a superclass chain
pub struct Ancestors<'a> {
    registry: &'a ClassRegistry,
    next: Option<ClassId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Class;

    fn next(&mut self) -> Option<Self::Item> {
        let class = self.registry.get_class(self.next?)?;
        self.next = class.parent_id;
        Some(class)
    }
}

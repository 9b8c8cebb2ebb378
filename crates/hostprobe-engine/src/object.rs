//! Object model: host values and live instances

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::class::ClassId;
use crate::registry::builtin;

/// Global counter for generating unique object IDs
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique object ID
fn generate_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Object instance
#[derive(Debug, Clone)]
pub struct Object {
    /// Unique object ID (assigned on creation)
    pub object_id: u64,
    /// Class ID (index into the class registry)
    pub class_id: ClassId,
    /// Field values, indexed by slot
    pub fields: Vec<Value>,
}

impl Object {
    /// Create a new object with null fields
    pub fn new(class_id: ClassId, field_count: usize) -> Self {
        Self {
            object_id: generate_object_id(),
            class_id,
            fields: vec![Value::Null; field_count],
        }
    }

    /// Get a field value by slot
    pub fn get_field(&self, slot: usize) -> Option<Value> {
        self.fields.get(slot).cloned()
    }

    /// Set a field value by slot
    pub fn set_field(&mut self, slot: usize, value: Value) -> Result<(), String> {
        if slot < self.fields.len() {
            self.fields[slot] = value;
            Ok(())
        } else {
            Err(format!(
                "Field slot {} out of bounds (object has {} fields)",
                slot,
                self.fields.len()
            ))
        }
    }
}

/// List instance (the host's sequence type)
#[derive(Debug, Clone)]
pub struct List {
    /// Unique object ID (assigned on creation)
    pub object_id: u64,
    /// Concrete list class
    pub type_id: ClassId,
    /// Elements
    pub elements: Vec<Value>,
}

impl List {
    /// Create a list of the given concrete class
    pub fn new(type_id: ClassId, elements: Vec<Value>) -> Self {
        Self {
            object_id: generate_object_id(),
            type_id,
            elements,
        }
    }

    /// Get list length
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if list is empty
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get element at index
    pub fn get(&self, index: usize) -> Option<Value> {
        self.elements.get(index).cloned()
    }

    /// Push element to end
    pub fn push(&mut self, value: Value) -> usize {
        self.elements.push(value);
        self.elements.len()
    }
}

/// Shared handle to a live object
///
/// Cloning the handle aliases the same instance.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    /// Wrap a freshly allocated object
    pub fn new(object: Object) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    /// Runtime class of the instance
    pub fn class_id(&self) -> ClassId {
        self.0.read().class_id
    }

    /// Identity of the instance
    pub fn object_id(&self) -> u64 {
        self.0.read().object_id
    }

    /// Raw slot read, no visibility or type checks
    pub fn get_field(&self, slot: usize) -> Option<Value> {
        self.0.read().get_field(slot)
    }

    /// Raw slot write, no visibility or type checks
    pub fn set_field(&self, slot: usize, value: Value) -> Result<(), String> {
        self.0.write().set_field(slot, value)
    }

    /// Whether both handles refer to the same instance
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    // Object graphs are routinely cyclic, so never recurse into fields.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let obj = self.0.read();
        write!(f, "Object#{}(class {})", obj.object_id, obj.class_id)
    }
}

/// Shared handle to a live list
#[derive(Clone)]
pub struct ListRef(Arc<RwLock<List>>);

impl ListRef {
    /// Wrap a freshly allocated list
    pub fn new(list: List) -> Self {
        Self(Arc::new(RwLock::new(list)))
    }

    /// Concrete list class
    pub fn type_id(&self) -> ClassId {
        self.0.read().type_id
    }

    /// Get list length
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Check if list is empty
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Get element at index
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index)
    }

    /// Get the first element
    pub fn first(&self) -> Option<Value> {
        self.get(0)
    }

    /// Push element to end
    pub fn push(&self, value: Value) -> usize {
        self.0.write().push(value)
    }

    /// Whether both handles refer to the same list
    pub fn ptr_eq(&self, other: &ListRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = self.0.read();
        write!(
            f,
            "List#{}(class {}, len {})",
            list.object_id,
            list.type_id,
            list.elements.len()
        )
    }
}

/// Host value
///
/// Primitives compare by value, references by identity.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent reference
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// String
    Str(Arc<str>),
    /// Object reference
    Object(ObjectRef),
    /// List reference
    List(ListRef),
}

impl Value {
    /// Create a string value
    pub fn string(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as object reference
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get as list reference
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Runtime class of the value; None for null
    pub fn runtime_class(&self) -> Option<ClassId> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(builtin::BOOLEAN),
            Value::Int(_) => Some(builtin::INTEGER),
            Value::Str(_) => Some(builtin::STRING),
            Value::Object(obj) => Some(obj.class_id()),
            Value::List(list) => Some(list.type_id()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<ListRef> for Value {
    fn from(list: ListRef) -> Self {
        Value::List(list)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_fields() {
        let mut obj = Object::new(7, 2);
        assert_eq!(obj.fields.len(), 2);
        assert_eq!(obj.get_field(0), Some(Value::Null));

        obj.set_field(1, Value::Int(42)).unwrap();
        assert_eq!(obj.get_field(1), Some(Value::Int(42)));
        assert!(obj.set_field(2, Value::Int(1)).is_err());
        assert_eq!(obj.get_field(2), None);
    }

    #[test]
    fn test_object_ids_are_unique() {
        let a = Object::new(0, 0);
        let b = Object::new(0, 0);
        assert_ne!(a.object_id, b.object_id);
    }

    #[test]
    fn test_object_ref_aliases_instance() {
        let obj = ObjectRef::new(Object::new(3, 1));
        let alias = obj.clone();

        alias.set_field(0, Value::string("patched")).unwrap();
        assert_eq!(obj.get_field(0), Some(Value::string("patched")));
        assert!(obj.ptr_eq(&alias));
        assert_eq!(obj.class_id(), 3);
    }

    #[test]
    fn test_reference_equality_is_identity() {
        let a = ObjectRef::new(Object::new(3, 0));
        let b = ObjectRef::new(Object::new(3, 0));

        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
        assert_eq!(Value::string("x"), Value::string("x"));
        assert_ne!(Value::Int(1), Value::Bool(true));
    }

    #[test]
    fn test_list_ref() {
        let list = ListRef::new(List::new(builtin::ARRAY_LIST, Vec::new()));
        assert!(list.is_empty());
        assert_eq!(list.first(), None);

        list.push(Value::Int(5));
        assert_eq!(list.len(), 1);
        assert_eq!(list.first(), Some(Value::Int(5)));
        assert_eq!(list.type_id(), builtin::ARRAY_LIST);
    }

    #[test]
    fn test_runtime_class() {
        assert_eq!(Value::Null.runtime_class(), None);
        assert_eq!(Value::Bool(true).runtime_class(), Some(builtin::BOOLEAN));
        assert_eq!(Value::Int(1).runtime_class(), Some(builtin::INTEGER));
        assert_eq!(Value::string("a").runtime_class(), Some(builtin::STRING));

        let obj = ObjectRef::new(Object::new(9, 0));
        assert_eq!(Value::Object(obj).runtime_class(), Some(9));
    }

    #[test]
    fn test_debug_does_not_recurse() {
        let obj = ObjectRef::new(Object::new(1, 1));
        obj.set_field(0, Value::Object(obj.clone())).unwrap();
        let text = format!("{:?}", obj);
        assert!(text.starts_with("Object#"));
    }
}

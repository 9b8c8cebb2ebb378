//! Member search over a class and its ancestor chain
//!
//! Two families of search live here:
//!
//! - **Name-directed**: [`find_field_by_name`] and [`find_method`] walk the
//!   superclass chain looking for a member with a known name.
//! - **Type-directed**: [`find_fields_by_type`] and [`find_attribute`] look
//!   for members whose declared type fits a target type, for hosts where the
//!   member was renamed but kept its shape.
//!
//! Nothing in this module mutates instances. Ordinary absence is reported
//! as `None` (or [`ProbeError::MethodNotFound`] for methods).

use tracing::trace;

use crate::class::ClassId;
use crate::error::{ProbeError, ProbeResult};
use crate::object::Value;
use crate::registry::ClassRegistry;
use crate::reflect::handles::{FieldHandle, MethodHandle};

/// Find a field by name, most-derived declaration first
pub fn find_field_by_name(
    registry: &ClassRegistry,
    class_id: ClassId,
    name: &str,
) -> Option<FieldHandle> {
    let found = registry.ancestors(class_id).find_map(|class| {
        class
            .declared_field(name)
            .map(|decl| FieldHandle::new(class.id, decl))
    });
    trace!(
        class = registry.type_name(class_id),
        field = name,
        found = found.is_some(),
        "field search by name"
    );
    found
}

/// Fields whose declared type is assignable to `target`
///
/// Yields every match lazily: most-derived class first, each class's fields
/// in declaration order.
pub fn find_fields_by_type<'r>(
    registry: &'r ClassRegistry,
    class_id: ClassId,
    target: ClassId,
) -> impl Iterator<Item = FieldHandle> + 'r {
    registry.ancestors(class_id).flat_map(move |class| {
        class
            .fields
            .iter()
            .filter(move |f| registry.is_assignable(f.type_id, target))
            .map(move |f| FieldHandle::new(class.id, f))
    })
}

/// Find a method by name and call-site parameter types
///
/// Tries an exact public lookup first. Then, at each level of the
/// superclass chain, an exact declared lookup followed by a structural scan
/// that accepts a same-name, same-arity method when every formal parameter
/// is assignable from the corresponding call-site type.
pub fn find_method(
    registry: &ClassRegistry,
    class_id: ClassId,
    name: &str,
    params: &[ClassId],
) -> ProbeResult<MethodHandle> {
    if let Some((owner, decl)) = registry.public_method(class_id, name, params) {
        return Ok(MethodHandle::new(owner, decl));
    }

    for class in registry.ancestors(class_id) {
        if let Some(decl) = class.declared_method(name, params) {
            return Ok(MethodHandle::new(class.id, decl));
        }

        let structural = class.methods.iter().find(|m| {
            m.name == name
                && m.params.len() == params.len()
                && m
                    .params
                    .iter()
                    .zip(params)
                    .all(|(&formal, &actual)| registry.is_assignable(actual, formal))
        });
        if let Some(decl) = structural {
            trace!(
                class = class.name.as_str(),
                method = name,
                "structural method match"
            );
            return Ok(MethodHandle::new(class.id, decl));
        }
    }

    Err(ProbeError::MethodNotFound {
        class: registry.type_name(class_id).to_string(),
        name: name.to_string(),
    })
}

/// Extract the first field value of `instance` that is a `child` instance
///
/// Scans the public fields of `parent` (including inherited ones) and then
/// every field declared directly on `parent`. A field qualifies when its
/// declared type is assignable to `child`; its live value is accepted only
/// if it really is a `child` instance.
pub fn find_attribute(
    registry: &ClassRegistry,
    parent: ClassId,
    child: ClassId,
    instance: &Value,
) -> Option<Value> {
    let public = registry
        .public_fields(parent)
        .into_iter()
        .map(|(owner, decl)| FieldHandle::new(owner, decl));
    let declared = registry
        .get_class(parent)
        .into_iter()
        .flat_map(|class| class.fields.iter().map(move |decl| FieldHandle::new(class.id, decl)));

    public
        .chain(declared)
        .filter(|field| registry.is_assignable(field.type_id(), child))
        .find_map(|field| {
            let value = field.accessible().get(registry, instance).ok()?;
            registry.is_instance(&value, child).then_some(value)
        })
}

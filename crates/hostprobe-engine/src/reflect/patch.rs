//! Live patching of foreign instance state
//!
//! This is the only place the engine writes into host objects. Writes go
//! through an access-overridden handle, so private fields are reachable;
//! the caller is responsible for having located the right field of the
//! right instance.

use tracing::{debug, warn};

use crate::error::HostResult;
use crate::object::Value;
use crate::reflect::handles::FieldHandle;
use crate::registry::ClassRegistry;

/// Overwrite a field on a live instance, reporting the failure reason
pub fn try_overwrite_field(
    registry: &ClassRegistry,
    instance: &Value,
    field: &FieldHandle,
    new_value: Value,
) -> HostResult<()> {
    let mut handle = field.clone();
    handle.set_accessible(true);
    handle.set(registry, instance, new_value)
}

/// Overwrite a field on a live instance
///
/// Returns false on any failure (type mismatch, unrelated instance, null
/// receiver) and logs it; never fails the caller.
pub fn overwrite_field(
    registry: &ClassRegistry,
    instance: &Value,
    field: &FieldHandle,
    new_value: Value,
) -> bool {
    match try_overwrite_field(registry, instance, field, new_value) {
        Ok(()) => {
            debug!(
                class = registry.type_name(field.declaring_class()),
                field = field.name(),
                "overwrote field"
            );
            true
        }
        Err(error) => {
            warn!(
                class = registry.type_name(field.declaring_class()),
                field = field.name(),
                %error,
                "failed to overwrite field"
            );
            false
        }
    }
}

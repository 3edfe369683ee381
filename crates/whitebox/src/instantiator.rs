//! Constructor-free instantiation
//!
//! Allocates an instance whose fields all hold their type's default value
//! without running any constructor or initializer of the class or its
//! ancestors.

use whitebox_runtime::{ClassId, Instance, ObjectRef, TypeEnv, TypeRef};

use crate::error::{MemberKind, ReflectError, ReflectResult};

/// Allocate a default-initialized instance of `class`
pub fn allocate(env: &dyn TypeEnv, class: ClassId) -> ReflectResult<ObjectRef> {
    let info = env.class(class).ok_or_else(|| ReflectError::NotFound {
        kind: MemberKind::Class,
        request: class.to_string(),
        scope: "the type environment".to_string(),
    })?;
    if !info.is_instantiable() {
        return Err(ReflectError::NotInstantiable {
            type_name: info.name.clone(),
            reason: format!("{} is {}", info.name, info.kind.label()),
        });
    }

    let obj = Instance::allocate(info);
    tracing::debug!(class = %info.name, object = obj.object_id(), "allocated without constructor");
    Ok(obj)
}

/// Allocate an instance of an arbitrary type reference; only classes qualify
pub fn allocate_type(env: &dyn TypeEnv, ty: &TypeRef) -> ReflectResult<ObjectRef> {
    match ty {
        TypeRef::Class(id) => allocate(env, *id),
        other => Err(ReflectError::NotInstantiable {
            type_name: other.display_name(env),
            reason: "only class types can be allocated".to_string(),
        }),
    }
}

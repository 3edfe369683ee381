//! Member accessor
//!
//! Reads and writes located fields and invokes located methods and
//! constructors, bypassing visibility. A failure raised by an invoked member
//! surfaces as [`ReflectError::Callee`] with the member's own error inside.

use whitebox_runtime::{
    accepts_value, is_subclass_of, ArrayRef, ClassId, ClassInfo, FieldInfo, InvocationError,
    ObjectRef, TypeEnv, TypeRef, Value,
};

use crate::error::{MemberKind, ReflectError, ReflectResult};
use crate::locator::{ConstructorCandidate, MethodCandidate};
use crate::matcher::CallForm;

/// Subject of a field access or method invocation
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A live instance; instance and static members are reachable
    Instance(&'a ObjectRef),
    /// A type; only static members are reachable
    Class(ClassId),
}

impl<'a> Target<'a> {
    /// Class whose hierarchy is searched
    pub fn class_id(&self) -> ClassId {
        match self {
            Target::Instance(obj) => obj.class_id(),
            Target::Class(id) => *id,
        }
    }

    /// Receiver for instance members
    pub fn instance(&self) -> Option<&'a ObjectRef> {
        match self {
            Target::Instance(obj) => Some(obj),
            Target::Class(_) => None,
        }
    }

    /// Whether the target is type-scoped
    pub fn is_class(&self) -> bool {
        matches!(self, Target::Class(_))
    }
}

impl<'a> From<&'a ObjectRef> for Target<'a> {
    fn from(obj: &'a ObjectRef) -> Self {
        Target::Instance(obj)
    }
}

impl From<ClassId> for Target<'_> {
    fn from(id: ClassId) -> Self {
        Target::Class(id)
    }
}

fn field_label(env: &dyn TypeEnv, field: &FieldInfo) -> String {
    format!(
        "{}.{}",
        TypeRef::Class(field.declaring_class).display_name(env),
        field.name
    )
}

fn owner<'env>(env: &'env dyn TypeEnv, field: &FieldInfo) -> ReflectResult<&'env ClassInfo> {
    env.class(field.declaring_class).ok_or_else(|| ReflectError::NotFound {
        kind: MemberKind::Class,
        request: field.declaring_class.to_string(),
        scope: "the type environment".to_string(),
    })
}

/// Fail unless `class` carries the field's declaring class in its chain
fn check_membership(env: &dyn TypeEnv, field: &FieldInfo, class: ClassId) -> ReflectResult<()> {
    if is_subclass_of(env, class, field.declaring_class) {
        return Ok(());
    }
    tracing::warn!(
        field = %field.name,
        target = %class,
        "field does not belong to the target's hierarchy"
    );
    Err(ReflectError::NotFound {
        kind: MemberKind::Field,
        request: format!("named \"{}\"", field.name),
        scope: format!("the hierarchy of {}", TypeRef::Class(class).display_name(env)),
    })
}

/// Receiver whose class must carry the field's declaring class in its chain
fn receiver<'a>(env: &dyn TypeEnv, field: &FieldInfo, target: Target<'a>) -> ReflectResult<&'a ObjectRef> {
    let obj = target.instance().ok_or_else(|| {
        ReflectError::IllegalArgument(format!(
            "instance field {} requires an object target",
            field_label(env, field)
        ))
    })?;
    check_membership(env, field, obj.class_id())?;
    Ok(obj)
}

/// Class holding the storage of a static field reachable from the target
fn static_owner<'env>(
    env: &'env dyn TypeEnv,
    field: &FieldInfo,
    target: Target<'_>,
) -> ReflectResult<&'env ClassInfo> {
    check_membership(env, field, target.class_id())?;
    owner(env, field)
}

// ============================================================================
// Fields
// ============================================================================

/// Read the current value of a located field
pub fn read_field(env: &dyn TypeEnv, field: &FieldInfo, target: Target<'_>) -> ReflectResult<Value> {
    let missing = || {
        ReflectError::NotFound {
            kind: MemberKind::Field,
            request: format!("slot {}", field.slot),
            scope: field_label(env, field),
        }
    };
    if field.is_static() {
        return static_owner(env, field, target)?
            .get_static(field.slot)
            .ok_or_else(missing);
    }
    receiver(env, field, target)?
        .get_slot(field.slot)
        .ok_or_else(missing)
}

/// Store a value into a located field.
///
/// Readonly fields are written too; the value must be assignable to the
/// field's declared type.
pub fn write_field(
    env: &dyn TypeEnv,
    field: &FieldInfo,
    target: Target<'_>,
    value: Value,
) -> ReflectResult<()> {
    if !accepts_value(env, &field.ty, &value) {
        return Err(ReflectError::IllegalArgument(format!(
            "cannot assign {} to {} of type {}",
            value.kind_name(),
            field_label(env, field),
            field.ty.display_name(env)
        )));
    }
    let stored = if field.is_static() {
        static_owner(env, field, target)?.set_static(field.slot, value)
    } else {
        receiver(env, field, target)?.set_slot(field.slot, value)
    };
    stored.map_err(ReflectError::IllegalArgument)?;
    tracing::trace!(field = %field_label(env, field), "field written");
    Ok(())
}

// ============================================================================
// Invocation
// ============================================================================

/// Pack the trailing arguments of a spread call into the variable-arity array
pub fn pack_arguments(params: &[TypeRef], form: CallForm, mut args: Vec<Value>) -> Vec<Value> {
    if form == CallForm::Direct {
        return args;
    }
    let Some(element) = params.last().and_then(TypeRef::element_type) else {
        return args;
    };
    let fixed = params.len() - 1;
    let rest = args.split_off(fixed.min(args.len()));
    args.push(Value::Array(ArrayRef::new(element.clone(), rest)));
    args
}

fn from_invocation(err: InvocationError) -> ReflectError {
    match err {
        InvocationError::Target(inner) => ReflectError::Callee(inner),
        InvocationError::IllegalArgument(msg) => ReflectError::IllegalArgument(msg),
        InvocationError::Instantiation(reason) => ReflectError::NotInstantiable {
            type_name: String::new(),
            reason,
        },
    }
}

/// Invoke exactly the located method implementation on the target
pub fn invoke_method(
    env: &dyn TypeEnv,
    candidate: &MethodCandidate<'_>,
    target: Target<'_>,
    args: Vec<Value>,
) -> ReflectResult<Value> {
    let method = candidate.method;
    if !method.is_static() && target.is_class() {
        return Err(ReflectError::IllegalArgument(format!(
            "instance method {} invoked on a type",
            method.signature(env)
        )));
    }
    let args = pack_arguments(&method.params, candidate.form, args);
    tracing::trace!(method = %method.signature(env), "invoking method");
    method
        .invoke(env, target.instance(), args)
        .map_err(from_invocation)
}

/// Run the located constructor and return the new instance
pub fn invoke_constructor(
    env: &dyn TypeEnv,
    candidate: &ConstructorCandidate<'_>,
    args: Vec<Value>,
) -> ReflectResult<ObjectRef> {
    let constructor = candidate.constructor;
    let args = pack_arguments(&constructor.params, candidate.form, args);
    tracing::trace!(constructor = %constructor.signature(env), "invoking constructor");
    constructor.invoke(env, args).map_err(|err| match from_invocation(err) {
        ReflectError::NotInstantiable { reason, .. } => ReflectError::NotInstantiable {
            type_name: TypeRef::Class(constructor.declaring_class).display_name(env),
            reason,
        },
        other => other,
    })
}

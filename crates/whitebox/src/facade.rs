//! The `Whitebox` façade
//!
//! Entry points for tests and tools: reach private state, call private or
//! overloaded members, and instantiate classes with or without running their
//! constructors. Every operation resolves a unique member first; nothing is
//! read, written or invoked when the resolution is not unique.

use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use whitebox_runtime::{
    ClassId, ConstructorInfo, FromValue, MethodInfo, ObjectRef, TypeEnv, TypeRef, TypeRegistry,
    Value,
};

use crate::accessor::{self, Target};
use crate::config::WhiteboxOptions;
use crate::error::{MemberKind, ReflectError, ReflectResult};
use crate::instantiator;
use crate::locator::Locator;
use crate::matcher::CallForm;
use crate::resolution::{
    ConstructorSelector, FieldRequest, FieldScope, MethodRequest, MethodSelector,
};

/// Reflective access to the classes of a type registry
pub struct Whitebox {
    registry: Arc<TypeRegistry>,
    options: WhiteboxOptions,
    serial: ReentrantMutex<()>,
}

impl Whitebox {
    /// Create a façade with default options
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_options(registry, WhiteboxOptions::default())
    }

    /// Create a façade with explicit options
    pub fn with_options(registry: Arc<TypeRegistry>, options: WhiteboxOptions) -> Self {
        Self {
            registry,
            options,
            serial: ReentrantMutex::new(()),
        }
    }

    /// The underlying registry
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Active options
    pub fn options(&self) -> &WhiteboxOptions {
        &self.options
    }

    fn env(&self) -> &dyn TypeEnv {
        &*self.registry
    }

    fn locator(&self) -> Locator<'_> {
        Locator::new(self.env(), self.options.specificity_tie_break)
    }

    /// Held for the duration of a field write or invocation; re-entrant so a
    /// callee may call back into the façade on the same thread
    fn serialized(&self) -> Option<ReentrantMutexGuard<'_, ()>> {
        self.options
            .serialize_mutations
            .then(|| self.serial.lock())
    }

    fn field_scope(&self, target: &Target<'_>) -> FieldScope {
        match target {
            Target::Class(_) => FieldScope::StaticOnly,
            Target::Instance(_) if self.options.statics_via_instance => FieldScope::Any,
            Target::Instance(_) => FieldScope::InstanceOnly,
        }
    }

    // ========================================================================
    // Classes and members
    // ========================================================================

    /// Look a class up by name
    pub fn class(&self, name: &str) -> ReflectResult<ClassId> {
        self.registry
            .lookup_class(name)
            .ok_or_else(|| ReflectError::NotFound {
                kind: MemberKind::Class,
                request: format!("named \"{}\"", name),
                scope: "the type registry".to_string(),
            })
    }

    /// Get a method of `class` or its ancestors.
    ///
    /// With explicit parameter types the first level declaring that exact
    /// signature wins; without them the name must be unique at the first
    /// level declaring it.
    pub fn get_method(
        &self,
        class: ClassId,
        name: &str,
        params: Option<&[TypeRef]>,
    ) -> ReflectResult<&MethodInfo> {
        let selector = match params {
            Some(params) => MethodSelector::Signature(name, params),
            None => MethodSelector::Name(name),
        };
        self.locator()
            .resolve_method(class, &MethodRequest::new(selector))
            .map(|c| c.method)
    }

    /// Get a constructor declared by `class`; without parameter types the
    /// class must declare exactly one
    pub fn get_constructor(
        &self,
        class: ClassId,
        params: Option<&[TypeRef]>,
    ) -> ReflectResult<&ConstructorInfo> {
        let selector = match params {
            Some(params) => ConstructorSelector::Signature(params),
            None => ConstructorSelector::Any,
        };
        self.locator()
            .resolve_constructor(class, &selector)
            .map(|c| c.constructor)
    }

    /// First declared constructor of the direct ancestor of `class`
    pub fn get_first_parent_constructor(&self, class: ClassId) -> ReflectResult<&ConstructorInfo> {
        self.locator().first_parent_constructor(class)
    }

    /// Every method of the hierarchy whose name is listed, self first
    pub fn get_methods(&self, class: ClassId, names: &[&str]) -> Vec<&MethodInfo> {
        self.locator().methods_named(class, names)
    }

    // ========================================================================
    // Instantiation
    // ========================================================================

    /// Allocate an instance without running any constructor
    pub fn new_instance(&self, class: ClassId) -> ReflectResult<ObjectRef> {
        instantiator::allocate(self.env(), class)
    }

    /// Allocate an instance of a type reference without running any constructor
    pub fn new_instance_of(&self, ty: &TypeRef) -> ReflectResult<ObjectRef> {
        instantiator::allocate_type(self.env(), ty)
    }

    /// Construct an instance with the constructor that fits `args`
    pub fn invoke_constructor(&self, class: ClassId, args: &[Value]) -> ReflectResult<ObjectRef> {
        let candidate = self
            .locator()
            .resolve_constructor(class, &ConstructorSelector::Arguments(args))?;
        let _guard = self.serialized();
        tracing::debug!(constructor = %candidate.constructor.signature(self.env()), "invoke constructor");
        accessor::invoke_constructor(self.env(), &candidate, args.to_vec())
    }

    /// Construct an instance with the constructor of exactly `params`
    pub fn invoke_constructor_with_types(
        &self,
        class: ClassId,
        params: &[TypeRef],
        args: &[Value],
    ) -> ReflectResult<ObjectRef> {
        let mut candidate = self
            .locator()
            .resolve_constructor(class, &ConstructorSelector::Signature(params))?;
        candidate.form = call_form(
            self.env(),
            &candidate.constructor.params,
            candidate.constructor.is_varargs,
            args,
        );
        let _guard = self.serialized();
        tracing::debug!(constructor = %candidate.constructor.signature(self.env()), "invoke constructor");
        accessor::invoke_constructor(self.env(), &candidate, args.to_vec())
    }

    // ========================================================================
    // Field writes
    // ========================================================================

    fn store(&self, target: Target<'_>, request: FieldRequest<'_>, value: Value) -> ReflectResult<()> {
        let request = request.scope(self.field_scope(&target));
        let field = self.locator().resolve_field(target.class_id(), &request)?;
        let _guard = self.serialized();
        tracing::debug!(field = %field.name, class = %field.declaring_class, "set internal state");
        accessor::write_field(self.env(), field, target, value)
    }

    /// Set the field named `name`, searching the whole hierarchy self first
    pub fn set_internal_state<'a>(
        &self,
        target: impl Into<Target<'a>>,
        name: &str,
        value: impl Into<Value>,
    ) -> ReflectResult<()> {
        self.store(target.into(), FieldRequest::named(name), value.into())
    }

    /// Set the field named `name` declared exactly by `declared_in`
    pub fn set_internal_state_in<'a>(
        &self,
        target: impl Into<Target<'a>>,
        name: &str,
        value: impl Into<Value>,
        declared_in: ClassId,
    ) -> ReflectResult<()> {
        self.store(
            target.into(),
            FieldRequest::named(name).declared_in(Some(declared_in)),
            value.into(),
        )
    }

    fn store_inferred(
        &self,
        target: Target<'_>,
        value: Value,
        declared_in: Option<ClassId>,
    ) -> ReflectResult<()> {
        let ty = value.runtime_type().ok_or_else(|| {
            ReflectError::IllegalArgument(
                "cannot infer the target field from a null value".to_string(),
            )
        })?;
        self.store(target, FieldRequest::typed(&ty).declared_in(declared_in), value)
    }

    /// Set the sole field that can hold `value`, inferred from its runtime type
    pub fn set_internal_state_inferred<'a>(
        &self,
        target: impl Into<Target<'a>>,
        value: impl Into<Value>,
    ) -> ReflectResult<()> {
        self.store_inferred(target.into(), value.into(), None)
    }

    /// Set the sole field of `declared_in` that can hold `value`
    pub fn set_internal_state_inferred_in<'a>(
        &self,
        target: impl Into<Target<'a>>,
        value: impl Into<Value>,
        declared_in: ClassId,
    ) -> ReflectResult<()> {
        self.store_inferred(target.into(), value.into(), Some(declared_in))
    }

    /// Set the sole field assignable from `ty`
    pub fn set_internal_state_by_type<'a>(
        &self,
        target: impl Into<Target<'a>>,
        ty: &TypeRef,
        value: impl Into<Value>,
    ) -> ReflectResult<()> {
        self.store(target.into(), FieldRequest::typed(ty), value.into())
    }

    /// Set the sole field of `declared_in` assignable from `ty`
    pub fn set_internal_state_by_type_in<'a>(
        &self,
        target: impl Into<Target<'a>>,
        ty: &TypeRef,
        value: impl Into<Value>,
        declared_in: ClassId,
    ) -> ReflectResult<()> {
        self.store(
            target.into(),
            FieldRequest::typed(ty).declared_in(Some(declared_in)),
            value.into(),
        )
    }

    // ========================================================================
    // Field reads
    // ========================================================================

    fn load(&self, target: Target<'_>, request: FieldRequest<'_>) -> ReflectResult<Value> {
        let request = request.scope(self.field_scope(&target));
        let field = self.locator().resolve_field(target.class_id(), &request)?;
        accessor::read_field(self.env(), field, target)
    }

    /// Read the field named `name`, searching the whole hierarchy self first
    pub fn get_internal_state<'a>(&self, target: impl Into<Target<'a>>, name: &str) -> ReflectResult<Value> {
        self.load(target.into(), FieldRequest::named(name))
    }

    /// Read the field named `name` declared exactly by `declared_in`
    pub fn get_internal_state_in<'a>(
        &self,
        target: impl Into<Target<'a>>,
        name: &str,
        declared_in: ClassId,
    ) -> ReflectResult<Value> {
        self.load(
            target.into(),
            FieldRequest::named(name).declared_in(Some(declared_in)),
        )
    }

    /// Read the field named `name` and convert it to `T`
    pub fn get_internal_state_as<'a, T: FromValue>(
        &self,
        target: impl Into<Target<'a>>,
        name: &str,
        declared_in: Option<ClassId>,
    ) -> ReflectResult<T> {
        let value = self.load(
            target.into(),
            FieldRequest::named(name).declared_in(declared_in),
        )?;
        T::from_value(&value).ok_or_else(|| ReflectError::ValueType {
            expected: T::expected().to_string(),
            found: value.kind_name().to_string(),
        })
    }

    /// Read the sole field assignable from `ty`
    pub fn get_internal_state_by_type<'a>(
        &self,
        target: impl Into<Target<'a>>,
        ty: &TypeRef,
    ) -> ReflectResult<Value> {
        self.load(target.into(), FieldRequest::typed(ty))
    }

    /// Read the sole field of `declared_in` assignable from `ty`
    pub fn get_internal_state_by_type_in<'a>(
        &self,
        target: impl Into<Target<'a>>,
        ty: &TypeRef,
        declared_in: ClassId,
    ) -> ReflectResult<Value> {
        self.load(
            target.into(),
            FieldRequest::typed(ty).declared_in(Some(declared_in)),
        )
    }

    // ========================================================================
    // Method invocation
    // ========================================================================

    fn call(&self, target: Target<'_>, request: MethodRequest<'_>, args: &[Value]) -> ReflectResult<Value> {
        let request = request.statics_only(target.is_class());
        let mut candidate = self.locator().resolve_method(target.class_id(), &request)?;
        if let MethodSelector::Signature(..) = request.selector {
            candidate.form = call_form(
                self.env(),
                &candidate.method.params,
                candidate.method.is_varargs,
                args,
            );
        }
        let _guard = self.serialized();
        tracing::debug!(method = %candidate.method.signature(self.env()), "invoke method");
        accessor::invoke_method(self.env(), &candidate, target, args.to_vec())
    }

    /// Invoke the method named `name` that fits `args`
    pub fn invoke_method<'a>(
        &self,
        target: impl Into<Target<'a>>,
        name: &str,
        args: &[Value],
    ) -> ReflectResult<Value> {
        self.call(
            target.into(),
            MethodRequest::new(MethodSelector::Arguments(name, args)),
            args,
        )
    }

    /// Invoke the method named `name` with exactly `params`
    pub fn invoke_method_with_types<'a>(
        &self,
        target: impl Into<Target<'a>>,
        name: &str,
        params: &[TypeRef],
        args: &[Value],
    ) -> ReflectResult<Value> {
        self.call(
            target.into(),
            MethodRequest::new(MethodSelector::Signature(name, params)),
            args,
        )
    }

    /// Invoke the method named `name` that fits `args`, searching from
    /// `declared_in` upwards
    pub fn invoke_method_in<'a>(
        &self,
        target: impl Into<Target<'a>>,
        declared_in: ClassId,
        name: &str,
        args: &[Value],
    ) -> ReflectResult<Value> {
        self.call(
            target.into(),
            MethodRequest::new(MethodSelector::Arguments(name, args)).start_at(Some(declared_in)),
            args,
        )
    }

    /// Invoke the method named `name` with exactly `params`, searching from
    /// `declared_in` upwards
    pub fn invoke_method_in_with_types<'a>(
        &self,
        target: impl Into<Target<'a>>,
        declared_in: ClassId,
        name: &str,
        params: &[TypeRef],
        args: &[Value],
    ) -> ReflectResult<Value> {
        self.call(
            target.into(),
            MethodRequest::new(MethodSelector::Signature(name, params)).start_at(Some(declared_in)),
            args,
        )
    }
}

/// Form for a member selected by signature; the host reports a mismatch
fn call_form(env: &dyn TypeEnv, params: &[TypeRef], is_varargs: bool, args: &[Value]) -> CallForm {
    crate::matcher::match_arguments(env, params, is_varargs, args)
        .map(|m| m.form)
        .unwrap_or(CallForm::Direct)
}

impl std::fmt::Debug for Whitebox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Whitebox")
            .field("classes", &self.registry.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

//! Class descriptors and their definitions
//!
//! A [`ClassDefinition`] is the mutable builder handed to
//! [`TypeRegistry::define_class`](crate::TypeRegistry::define_class); the
//! registry turns it into an immutable [`ClassInfo`] with slot indices and
//! declaring-class back references filled in.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::invoke::{CallFrame, InvocationError};
use crate::object::{Instance, ObjectRef};
use crate::registry::TypeEnv;
use crate::types::{accepts_value, is_subclass_of, ClassId, TypeRef};
use crate::value::Value;

/// Native implementation of a method
pub type MethodBody = Arc<dyn Fn(&mut CallFrame<'_>) -> anyhow::Result<Value> + Send + Sync>;

/// Native implementation of a constructor; `this` is the freshly allocated instance
pub type ConstructorBody = Arc<dyn Fn(&mut CallFrame<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Kind of class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassKind {
    /// Instantiable class
    #[default]
    Concrete,
    /// Abstract class
    Abstract,
    /// Interface-only type
    Interface,
}

impl ClassKind {
    /// Predicate form used in messages
    pub fn label(self) -> &'static str {
        match self {
            ClassKind::Concrete => "concrete",
            ClassKind::Abstract => "abstract",
            ClassKind::Interface => "an interface",
        }
    }
}

/// Modifier flags for class members
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Public visibility
    pub is_public: bool,
    /// Private visibility
    pub is_private: bool,
    /// Protected visibility
    pub is_protected: bool,
    /// Static member
    pub is_static: bool,
    /// Readonly (final) field
    pub is_readonly: bool,
    /// Abstract member
    pub is_abstract: bool,
}

impl Modifiers {
    /// Source-like visibility keyword
    pub fn visibility(&self) -> &'static str {
        if self.is_public {
            "public"
        } else if self.is_private {
            "private"
        } else if self.is_protected {
            "protected"
        } else {
            "package-private"
        }
    }

    fn set_visibility(&mut self, public: bool, protected: bool, private: bool) {
        self.is_public = public;
        self.is_protected = protected;
        self.is_private = private;
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// Field descriptor
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Modifier flags
    pub modifiers: Modifiers,
    /// Class that declares the field
    pub declaring_class: ClassId,
    /// Slot in instance storage, or in class storage for static fields
    pub slot: usize,
}

impl FieldInfo {
    /// Whether the field lives in class-level storage
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }
}

/// Method descriptor
#[derive(Clone)]
pub struct MethodInfo {
    /// Method name
    pub name: String,
    /// Declared parameter types
    pub params: Vec<TypeRef>,
    /// Modifier flags
    pub modifiers: Modifiers,
    /// Whether the last parameter is a variable-arity array
    pub is_varargs: bool,
    /// Class that declares the method
    pub declaring_class: ClassId,
    body: Option<MethodBody>,
}

impl MethodInfo {
    /// Whether the method is type-scoped
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }

    /// `name(T1, T2)` rendering
    pub fn signature(&self, env: &dyn TypeEnv) -> String {
        format!("{}({})", self.name, render_params(env, &self.params, self.is_varargs))
    }

    /// Host reflective call of exactly this implementation.
    ///
    /// Checks receiver and argument shapes, then runs the body. A failure
    /// raised by the body is wrapped in [`InvocationError::Target`].
    pub fn invoke(
        &self,
        env: &dyn TypeEnv,
        this: Option<&ObjectRef>,
        args: Vec<Value>,
    ) -> Result<Value, InvocationError> {
        let receiver = if self.is_static() {
            None
        } else {
            let this = this.ok_or_else(|| {
                InvocationError::IllegalArgument(format!(
                    "instance method {} invoked without a receiver",
                    self.signature(env)
                ))
            })?;
            if !is_subclass_of(env, this.class_id(), self.declaring_class) {
                return Err(InvocationError::IllegalArgument(format!(
                    "receiver of class {} is not an instance of the declaring class of {}",
                    TypeRef::Class(this.class_id()).display_name(env),
                    self.signature(env)
                )));
            }
            Some(this.clone())
        };
        check_arguments(env, &self.params, &args, || self.signature(env))?;

        let body = self.body.as_ref().ok_or_else(|| {
            InvocationError::IllegalArgument(format!(
                "abstract method {} has no implementation",
                self.signature(env)
            ))
        })?;
        let mut frame = CallFrame::new(env, receiver, self.declaring_class, args);
        body(&mut frame).map_err(InvocationError::Target)
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("modifiers", &self.modifiers)
            .field("is_varargs", &self.is_varargs)
            .field("declaring_class", &self.declaring_class)
            .finish_non_exhaustive()
    }
}

/// Constructor descriptor
#[derive(Clone)]
pub struct ConstructorInfo {
    /// Declared parameter types
    pub params: Vec<TypeRef>,
    /// Modifier flags
    pub modifiers: Modifiers,
    /// Whether the last parameter is a variable-arity array
    pub is_varargs: bool,
    /// Class that declares the constructor
    pub declaring_class: ClassId,
    /// Synthesized no-arg constructor of a class that declares none
    pub is_implicit: bool,
    body: Option<ConstructorBody>,
}

impl ConstructorInfo {
    /// `ClassName(T1, T2)` rendering
    pub fn signature(&self, env: &dyn TypeEnv) -> String {
        format!(
            "{}({})",
            TypeRef::Class(self.declaring_class).display_name(env),
            render_params(env, &self.params, self.is_varargs)
        )
    }

    /// Host reflective construction: allocate, then run the body on the new instance.
    pub fn invoke(&self, env: &dyn TypeEnv, args: Vec<Value>) -> Result<ObjectRef, InvocationError> {
        let class = env.class(self.declaring_class).ok_or_else(|| {
            InvocationError::Instantiation(format!("unknown class {}", self.declaring_class))
        })?;
        if !class.is_instantiable() {
            return Err(InvocationError::Instantiation(format!(
                "{} is {}",
                class.name,
                class.kind.label()
            )));
        }
        check_arguments(env, &self.params, &args, || self.signature(env))?;

        let instance = Instance::allocate(class);
        if let Some(body) = &self.body {
            let mut frame =
                CallFrame::new(env, Some(instance.clone()), self.declaring_class, args);
            body(&mut frame).map_err(InvocationError::Target)?;
        }
        Ok(instance)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("params", &self.params)
            .field("modifiers", &self.modifiers)
            .field("is_varargs", &self.is_varargs)
            .field("declaring_class", &self.declaring_class)
            .field("is_implicit", &self.is_implicit)
            .finish_non_exhaustive()
    }
}

fn render_params(env: &dyn TypeEnv, params: &[TypeRef], varargs: bool) -> String {
    let mut rendered: Vec<String> = params.iter().map(|p| p.display_name(env)).collect();
    if varargs {
        if let (Some(last), Some(TypeRef::Array(elem))) = (rendered.last_mut(), params.last()) {
            *last = format!("{}...", elem.display_name(env));
        }
    }
    rendered.join(", ")
}

fn check_arguments(
    env: &dyn TypeEnv,
    params: &[TypeRef],
    args: &[Value],
    signature: impl Fn() -> String,
) -> Result<(), InvocationError> {
    if params.len() != args.len() {
        return Err(InvocationError::IllegalArgument(format!(
            "{} expects {} argument(s), got {}",
            signature(),
            params.len(),
            args.len()
        )));
    }
    for (index, (param, arg)) in params.iter().zip(args).enumerate() {
        if !accepts_value(env, param, arg) {
            return Err(InvocationError::IllegalArgument(format!(
                "argument {} of {}: {} is not assignable to {}",
                index,
                signature(),
                arg.kind_name(),
                param.display_name(env)
            )));
        }
    }
    Ok(())
}

/// Class descriptor
pub struct ClassInfo {
    /// Class ID
    pub id: ClassId,
    /// Class name
    pub name: String,
    /// Class kind
    pub kind: ClassKind,
    /// Direct ancestor (None for root classes)
    pub parent: Option<ClassId>,
    /// Declared fields, in declaration order
    pub fields: Vec<FieldInfo>,
    /// Declared methods, in declaration order
    pub methods: Vec<MethodInfo>,
    /// Declared constructors (plus the implicit one, if synthesized)
    pub constructors: Vec<ConstructorInfo>,
    /// Instance slot types, inherited first
    layout: Vec<TypeRef>,
    /// Static field values
    statics: RwLock<Vec<Value>>,
}

impl ClassInfo {
    /// Instance slot types, inherited slots first
    pub fn layout(&self) -> &[TypeRef] {
        &self.layout
    }

    /// Field declared directly on this class
    pub fn declared_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get a static field value by slot
    pub fn get_static(&self, slot: usize) -> Option<Value> {
        self.statics.read().get(slot).cloned()
    }

    /// Set a static field value by slot
    pub fn set_static(&self, slot: usize, value: Value) -> Result<(), String> {
        let mut statics = self.statics.write();
        let count = statics.len();
        match statics.get_mut(slot) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(format!(
                "Static slot {} out of bounds (class has {} static fields)",
                slot, count
            )),
        }
    }

    /// Whether instances may be allocated
    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Concrete
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("constructors", &self.constructors)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Definitions
// ============================================================================

/// Definition for a field
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Initial value of a static field
    pub initial_value: Option<Value>,
    /// Modifier flags
    pub modifiers: Modifiers,
}

impl FieldDefinition {
    /// Create a new package-private instance field
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            initial_value: None,
            modifiers: Modifiers::default(),
        }
    }

    /// Set the initial value (static fields only)
    pub fn initial_value(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// Mark as static field
    pub fn as_static(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    /// Mark as readonly
    pub fn as_readonly(mut self) -> Self {
        self.modifiers.is_readonly = true;
        self
    }

    /// Mark as private
    pub fn private(mut self) -> Self {
        self.modifiers.set_visibility(false, false, true);
        self
    }

    /// Mark as protected
    pub fn protected(mut self) -> Self {
        self.modifiers.set_visibility(false, true, false);
        self
    }

    /// Mark as public
    pub fn public(mut self) -> Self {
        self.modifiers.set_visibility(true, false, false);
        self
    }
}

/// Definition for a method
#[derive(Clone)]
pub struct MethodDefinition {
    /// Method name
    pub name: String,
    /// Parameter types
    pub params: Vec<TypeRef>,
    /// Modifier flags
    pub modifiers: Modifiers,
    /// Whether the last parameter is a variable-arity array
    pub is_varargs: bool,
    /// Implementation (None for abstract methods)
    pub body: Option<MethodBody>,
}

impl MethodDefinition {
    /// Create a new package-private instance method without a body
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            modifiers: Modifiers::default(),
            is_varargs: false,
            body: None,
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, ty: TypeRef) -> Self {
        self.params.push(ty);
        self
    }

    /// Set the implementation
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut CallFrame<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    /// Mark as static method
    pub fn as_static(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    /// Mark as abstract method
    pub fn as_abstract(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self
    }

    /// Mark the last parameter as variable arity
    pub fn as_varargs(mut self) -> Self {
        self.is_varargs = true;
        self
    }

    /// Mark as private
    pub fn private(mut self) -> Self {
        self.modifiers.set_visibility(false, false, true);
        self
    }

    /// Mark as protected
    pub fn protected(mut self) -> Self {
        self.modifiers.set_visibility(false, true, false);
        self
    }

    /// Mark as public
    pub fn public(mut self) -> Self {
        self.modifiers.set_visibility(true, false, false);
        self
    }
}

/// Definition for a constructor
#[derive(Clone, Default)]
pub struct ConstructorDefinition {
    /// Parameter types
    pub params: Vec<TypeRef>,
    /// Modifier flags
    pub modifiers: Modifiers,
    /// Whether the last parameter is a variable-arity array
    pub is_varargs: bool,
    /// Implementation
    pub body: Option<ConstructorBody>,
}

impl ConstructorDefinition {
    /// Create a new package-private constructor without parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn with_param(mut self, ty: TypeRef) -> Self {
        self.params.push(ty);
        self
    }

    /// Set the implementation
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut CallFrame<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    /// Mark the last parameter as variable arity
    pub fn as_varargs(mut self) -> Self {
        self.is_varargs = true;
        self
    }

    /// Mark as private
    pub fn private(mut self) -> Self {
        self.modifiers.set_visibility(false, false, true);
        self
    }

    /// Mark as public
    pub fn public(mut self) -> Self {
        self.modifiers.set_visibility(true, false, false);
        self
    }
}

/// Complete definition for a class
#[derive(Clone)]
pub struct ClassDefinition {
    /// Class name (unique within a registry)
    pub name: String,
    /// Class kind
    pub kind: ClassKind,
    /// Direct ancestor
    pub parent: Option<ClassId>,
    /// Fields declared at this level
    pub fields: Vec<FieldDefinition>,
    /// Methods declared at this level
    pub methods: Vec<MethodDefinition>,
    /// Constructors declared by this class
    pub constructors: Vec<ConstructorDefinition>,
}

impl ClassDefinition {
    /// Create a new root class definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Concrete,
            parent: None,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Set the direct ancestor
    pub fn extends(mut self, parent: ClassId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Mark as abstract class
    pub fn as_abstract(mut self) -> Self {
        self.kind = ClassKind::Abstract;
        self
    }

    /// Mark as interface
    pub fn as_interface(mut self) -> Self {
        self.kind = ClassKind::Interface;
        self
    }

    /// Add a field to the definition
    pub fn add_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a method to the definition
    pub fn add_method(mut self, method: MethodDefinition) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a constructor to the definition
    pub fn add_constructor(mut self, constructor: ConstructorDefinition) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Build the descriptor; `parent` must be the already registered ancestor
    pub(crate) fn build(self, id: ClassId, parent: Option<&ClassInfo>) -> ClassInfo {
        let mut layout: Vec<TypeRef> = parent.map(|p| p.layout.clone()).unwrap_or_default();
        let mut statics = Vec::new();
        let mut fields = Vec::with_capacity(self.fields.len());

        for def in self.fields {
            let slot = if def.modifiers.is_static {
                statics.push(
                    def.initial_value
                        .clone()
                        .unwrap_or_else(|| def.ty.default_value()),
                );
                statics.len() - 1
            } else {
                layout.push(def.ty.clone());
                layout.len() - 1
            };
            fields.push(FieldInfo {
                name: def.name,
                ty: def.ty,
                modifiers: def.modifiers,
                declaring_class: id,
                slot,
            });
        }

        let methods = self
            .methods
            .into_iter()
            .map(|def| MethodInfo {
                name: def.name,
                params: def.params,
                modifiers: def.modifiers,
                is_varargs: def.is_varargs,
                declaring_class: id,
                body: def.body,
            })
            .collect();

        let mut constructors: Vec<ConstructorInfo> = self
            .constructors
            .into_iter()
            .map(|def| ConstructorInfo {
                params: def.params,
                modifiers: def.modifiers,
                is_varargs: def.is_varargs,
                declaring_class: id,
                is_implicit: false,
                body: def.body,
            })
            .collect();

        if constructors.is_empty() && self.kind != ClassKind::Interface {
            constructors.push(ConstructorInfo {
                params: Vec::new(),
                modifiers: Modifiers {
                    is_public: true,
                    ..Modifiers::default()
                },
                is_varargs: false,
                declaring_class: id,
                is_implicit: true,
                body: None,
            });
        }

        ClassInfo {
            id,
            name: self.name,
            kind: self.kind,
            parent: self.parent,
            fields,
            methods,
            constructors,
            layout,
            statics: RwLock::new(statics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;

    fn counter_registry() -> (TypeRegistry, ClassId) {
        let mut registry = TypeRegistry::new();
        let id = registry
            .define_class(
                ClassDefinition::new("Counter")
                    .add_field(FieldDefinition::new("value", TypeRef::INT).private())
                    .add_method(
                        MethodDefinition::new("add")
                            .with_param(TypeRef::INT)
                            .private()
                            .body(|frame| {
                                let current = frame.get("value")?.as_int().unwrap_or(0);
                                let delta = frame.arg(0).as_int().unwrap_or(0);
                                frame.set("value", Value::Int(current + delta))?;
                                Ok(Value::Int(current + delta))
                            }),
                    )
                    .add_method(
                        MethodDefinition::new("fail")
                            .private()
                            .body(|_| Err(anyhow::anyhow!("boom"))),
                    ),
            )
            .unwrap();
        (registry, id)
    }

    #[test]
    fn test_implicit_constructor_synthesized() {
        let (registry, id) = counter_registry();
        let class = registry.class(id).unwrap();
        assert_eq!(class.constructors.len(), 1);
        assert!(class.constructors[0].is_implicit);
        assert!(class.constructors[0].params.is_empty());
    }

    #[test]
    fn test_method_invoke_runs_body() {
        let (registry, id) = counter_registry();
        let class = registry.class(id).unwrap();
        let obj = class.constructors[0].invoke(&registry, vec![]).unwrap();

        let add = &class.methods[0];
        let result = add.invoke(&registry, Some(&obj), vec![Value::Int(4)]).unwrap();
        assert_eq!(result, Value::Int(4));
        assert_eq!(obj.get_slot(0), Some(Value::Int(4)));
    }

    #[test]
    fn test_method_invoke_wraps_callee_failure() {
        let (registry, id) = counter_registry();
        let class = registry.class(id).unwrap();
        let obj = Instance::allocate(class);

        let err = class.methods[1].invoke(&registry, Some(&obj), vec![]).unwrap_err();
        match err {
            InvocationError::Target(inner) => assert_eq!(inner.to_string(), "boom"),
            other => panic!("Expected target failure, got {:?}", other),
        }
    }

    #[test]
    fn test_method_invoke_checks_arguments() {
        let (registry, id) = counter_registry();
        let class = registry.class(id).unwrap();
        let obj = Instance::allocate(class);
        let add = &class.methods[0];

        assert!(matches!(
            add.invoke(&registry, Some(&obj), vec![]),
            Err(InvocationError::IllegalArgument(_))
        ));
        assert!(matches!(
            add.invoke(&registry, Some(&obj), vec![Value::from("x")]),
            Err(InvocationError::IllegalArgument(_))
        ));
        assert!(matches!(
            add.invoke(&registry, None, vec![Value::Int(1)]),
            Err(InvocationError::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_signature_rendering() {
        let mut registry = TypeRegistry::new();
        let id = registry
            .define_class(
                ClassDefinition::new("Printer").add_method(
                    MethodDefinition::new("print")
                        .with_param(TypeRef::String)
                        .with_param(TypeRef::array_of(TypeRef::Object))
                        .as_varargs(),
                ),
            )
            .unwrap();
        let class = registry.class(id).unwrap();
        assert_eq!(
            class.methods[0].signature(&registry),
            "print(String, Object...)"
        );
        assert_eq!(class.constructors[0].signature(&registry), "Printer()");
    }

    #[test]
    fn test_abstract_class_cannot_be_constructed() {
        let mut registry = TypeRegistry::new();
        let id = registry
            .define_class(ClassDefinition::new("Shape").as_abstract())
            .unwrap();
        let class = registry.class(id).unwrap();
        assert!(matches!(
            class.constructors[0].invoke(&registry, vec![]),
            Err(InvocationError::Instantiation(_))
        ));
    }

    #[test]
    fn test_static_field_initial_value() {
        let mut registry = TypeRegistry::new();
        let id = registry
            .define_class(
                ClassDefinition::new("Config").add_field(
                    FieldDefinition::new("LIMIT", TypeRef::INT)
                        .as_static()
                        .initial_value(Value::Int(10)),
                ),
            )
            .unwrap();
        let class = registry.class(id).unwrap();
        assert!(class.layout().is_empty());
        assert_eq!(class.get_static(0), Some(Value::Int(10)));
        class.set_static(0, Value::Int(11)).unwrap();
        assert_eq!(class.get_static(0), Some(Value::Int(11)));
        assert!(class.set_static(1, Value::Int(1)).is_err());
    }
}

//! Whitebox Runtime
//!
//! The in-process object model that the Whitebox reflection engine
//! introspects:
//! - **Types**: primitive, boxed, string, class and array type references
//!   plus the host assignability rules (`types` module)
//! - **Values**: null, primitives, strings, object and array handles
//! - **Classes**: immutable descriptors with declared fields, methods and
//!   constructors, built from definitions (`class` module)
//! - **Registry**: the `TypeEnv` capability and its `TypeRegistry`
//!   implementation
//! - **Invocation**: native bodies run inside a `CallFrame`; host reflective
//!   calls wrap callee failures in `InvocationError::Target`

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod class;
pub mod invoke;
pub mod object;
pub mod registry;
pub mod types;
pub mod value;

pub use class::{
    ClassDefinition, ClassInfo, ClassKind, ConstructorBody, ConstructorDefinition,
    ConstructorInfo, FieldDefinition, FieldInfo, MethodBody, MethodDefinition, MethodInfo,
    Modifiers,
};
pub use invoke::{CallFrame, InvocationError};
pub use object::{Instance, ObjectRef};
pub use registry::{DefineError, TypeEnv, TypeRegistry};
pub use types::{
    accepts_value, class_distance, is_assignable, is_subclass_of, ClassId, PrimitiveType, TypeRef,
};
pub use value::{ArrayRef, FromValue, Value};

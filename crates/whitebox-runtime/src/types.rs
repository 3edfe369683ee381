//! Type references and the host assignability rules
//!
//! `TypeRef` is the host's notion of a declared type: the type of a field, of a
//! method parameter, or the runtime type of a value.

use std::fmt;

use crate::registry::TypeEnv;
use crate::value::Value;

/// Opaque class identifier (index into the type registry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    /// Index of the class inside its registry
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Primitive value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `char`
    Char,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
}

impl PrimitiveType {
    /// Source name of the primitive form
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// Source name of the boxed wrapper form
    pub fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "Boolean",
            PrimitiveType::Byte => "Byte",
            PrimitiveType::Char => "Character",
            PrimitiveType::Short => "Short",
            PrimitiveType::Int => "Integer",
            PrimitiveType::Long => "Long",
            PrimitiveType::Float => "Float",
            PrimitiveType::Double => "Double",
        }
    }

    /// Zero value stored in an unassigned slot of this type
    pub fn zero(self) -> Value {
        match self {
            PrimitiveType::Boolean => Value::Boolean(false),
            PrimitiveType::Byte => Value::Byte(0),
            PrimitiveType::Char => Value::Char('\0'),
            PrimitiveType::Short => Value::Short(0),
            PrimitiveType::Int => Value::Int(0),
            PrimitiveType::Long => Value::Long(0),
            PrimitiveType::Float => Value::Float(0.0),
            PrimitiveType::Double => Value::Double(0.0),
        }
    }
}

/// A declared or runtime type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// Primitive form, e.g. `int`
    Primitive(PrimitiveType),
    /// Boxed wrapper form, e.g. `Integer`
    Boxed(PrimitiveType),
    /// Built-in string type
    String,
    /// Root of every non-primitive type
    Object,
    /// Registered class or interface
    Class(ClassId),
    /// Array of an element type
    Array(Box<TypeRef>),
}

impl TypeRef {
    /// `int`
    pub const INT: TypeRef = TypeRef::Primitive(PrimitiveType::Int);
    /// `long`
    pub const LONG: TypeRef = TypeRef::Primitive(PrimitiveType::Long);
    /// `boolean`
    pub const BOOLEAN: TypeRef = TypeRef::Primitive(PrimitiveType::Boolean);
    /// `double`
    pub const DOUBLE: TypeRef = TypeRef::Primitive(PrimitiveType::Double);
    /// `Integer`
    pub const INTEGER: TypeRef = TypeRef::Boxed(PrimitiveType::Int);

    /// Array type with the given element type
    pub fn array_of(element: TypeRef) -> TypeRef {
        TypeRef::Array(Box::new(element))
    }

    /// Whether this is a primitive form
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    /// Primitive kind shared by a primitive or boxed form
    pub fn primitive_kind(&self) -> Option<PrimitiveType> {
        match self {
            TypeRef::Primitive(p) | TypeRef::Boxed(p) => Some(*p),
            _ => None,
        }
    }

    /// Element type of an array type
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Default value of a slot declared with this type
    pub fn default_value(&self) -> Value {
        match self {
            TypeRef::Primitive(p) => p.zero(),
            _ => Value::Null,
        }
    }

    /// Human readable name, resolving class ids through `env`
    pub fn display_name(&self, env: &dyn TypeEnv) -> String {
        match self {
            TypeRef::Primitive(p) => p.name().to_string(),
            TypeRef::Boxed(p) => p.boxed_name().to_string(),
            TypeRef::String => "String".to_string(),
            TypeRef::Object => "Object".to_string(),
            TypeRef::Class(id) => env
                .class(*id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("<class {}>", id)),
            TypeRef::Array(elem) => format!("{}[]", elem.display_name(env)),
        }
    }
}

/// Number of inheritance steps from `sub` up to `sup` (0 when equal)
pub fn class_distance(env: &dyn TypeEnv, sub: ClassId, sup: ClassId) -> Option<u32> {
    let mut steps = 0;
    let mut current = Some(sub);
    while let Some(id) = current {
        if id == sup {
            return Some(steps);
        }
        current = env.class(id).and_then(|c| c.parent);
        steps += 1;
    }
    None
}

/// Check if a class is a subclass of (or the same as) another class
pub fn is_subclass_of(env: &dyn TypeEnv, sub: ClassId, sup: ClassId) -> bool {
    class_distance(env, sub, sup).is_some()
}

/// Host assignability: can a value of type `from` be stored into `to`
///
/// Includes boxing and unboxing between a primitive and its wrapper, class
/// inheritance, the universal `Object` root for non-primitives and covariance
/// of reference arrays. No primitive widening.
pub fn is_assignable(env: &dyn TypeEnv, from: &TypeRef, to: &TypeRef) -> bool {
    if from == to {
        return true;
    }
    match (from, to) {
        (TypeRef::Primitive(a), TypeRef::Boxed(b)) | (TypeRef::Boxed(a), TypeRef::Primitive(b)) => {
            a == b
        }
        (TypeRef::Primitive(_), _) | (_, TypeRef::Primitive(_)) => false,
        (_, TypeRef::Object) => true,
        (TypeRef::Class(sub), TypeRef::Class(sup)) => is_subclass_of(env, *sub, *sup),
        (TypeRef::Array(a), TypeRef::Array(b)) => {
            if a.is_primitive() || b.is_primitive() {
                a == b
            } else {
                is_assignable(env, a, b)
            }
        }
        _ => false,
    }
}

/// Host check used by field stores and reflective calls
pub fn accepts_value(env: &dyn TypeEnv, declared: &TypeRef, value: &Value) -> bool {
    match value.runtime_type() {
        None => !declared.is_primitive(),
        Some(actual) => is_assignable(env, &actual, declared),
    }
}

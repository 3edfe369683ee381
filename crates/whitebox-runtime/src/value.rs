//! Runtime values
//!
//! Primitive payloads are stored inline; strings are shared `Arc<str>`,
//! objects and arrays are reference-counted handles compared by identity.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::object::ObjectRef;
use crate::types::{PrimitiveType, TypeRef};

/// A runtime value
#[derive(Clone, Default)]
pub enum Value {
    /// The null reference
    #[default]
    Null,
    /// `boolean`
    Boolean(bool),
    /// `byte`
    Byte(i8),
    /// `char`
    Char(char),
    /// `short`
    Short(i16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// String
    Str(Arc<str>),
    /// Class instance
    Object(ObjectRef),
    /// Array instance
    Array(ArrayRef),
}

impl Value {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Primitive kind of an inline primitive payload
    pub fn primitive_kind(&self) -> Option<PrimitiveType> {
        Some(match self {
            Value::Boolean(_) => PrimitiveType::Boolean,
            Value::Byte(_) => PrimitiveType::Byte,
            Value::Char(_) => PrimitiveType::Char,
            Value::Short(_) => PrimitiveType::Short,
            Value::Int(_) => PrimitiveType::Int,
            Value::Long(_) => PrimitiveType::Long,
            Value::Float(_) => PrimitiveType::Float,
            Value::Double(_) => PrimitiveType::Double,
            _ => return None,
        })
    }

    /// Runtime type of the value; `None` for null
    ///
    /// Primitive payloads report their boxed type, which the host treats as
    /// interchangeable with the primitive form.
    pub fn runtime_type(&self) -> Option<TypeRef> {
        if let Some(kind) = self.primitive_kind() {
            return Some(TypeRef::Boxed(kind));
        }
        match self {
            Value::Str(_) => Some(TypeRef::String),
            Value::Object(obj) => Some(TypeRef::Class(obj.class_id())),
            Value::Array(arr) => Some(TypeRef::array_of(arr.element_type().clone())),
            _ => None,
        }
    }

    /// Get as `int`
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as `long`
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as `boolean`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as `double`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
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

    /// Get as array reference
    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Short kind label used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        if let Some(kind) = self.primitive_kind() {
            return kind.name();
        }
        match self {
            Value::Null => "null",
            Value::Str(_) => "String",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            _ => "unknown",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}b", v),
            Value::Char(v) => write!(f, "{:?}", v),
            Value::Short(v) => write!(f, "{}s", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}L", v),
            Value::Float(v) => write!(f, "{}f", v),
            Value::Double(v) => write!(f, "{}d", v),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Object(obj) => write!(f, "{:?}", obj),
            Value::Array(arr) => write!(f, "{:?}", arr),
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Boolean,
    i8 => Byte,
    char => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<ArrayRef> for Value {
    fn from(arr: ArrayRef) -> Self {
        Value::Array(arr)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// ============================================================================
// Arrays
// ============================================================================

/// Array storage
pub struct ArrayObject {
    element: TypeRef,
    elements: RwLock<Vec<Value>>,
}

/// Shared handle to an array; equality is identity
#[derive(Clone)]
pub struct ArrayRef(Arc<ArrayObject>);

impl ArrayRef {
    /// Create an array with the given element type and contents
    pub fn new(element: TypeRef, elements: Vec<Value>) -> Self {
        ArrayRef(Arc::new(ArrayObject {
            element,
            elements: RwLock::new(elements),
        }))
    }

    /// Declared element type
    pub fn element_type(&self) -> &TypeRef {
        &self.0.element
    }

    /// Get array length
    pub fn len(&self) -> usize {
        self.0.elements.read().len()
    }

    /// Check if array is empty
    pub fn is_empty(&self) -> bool {
        self.0.elements.read().is_empty()
    }

    /// Get element at index
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.elements.read().get(index).cloned()
    }

    /// Snapshot of the elements
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.elements.read().clone()
    }
}

impl PartialEq for ArrayRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.elements.read().iter()).finish()
    }
}

// ============================================================================
// Typed extraction
// ============================================================================

/// Convert a stored value into a Rust type.
///
/// Used for typed reads; `None` means the value does not have that shape.
pub trait FromValue: Sized {
    /// Name of the expected shape, for diagnostics
    fn expected() -> &'static str;

    /// Try to convert
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn expected() -> &'static str {
        "any value"
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for i32 {
    fn expected() -> &'static str {
        "int"
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FromValue for i64 {
    fn expected() -> &'static str {
        "long"
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_long()
    }
}

impl FromValue for bool {
    fn expected() -> &'static str {
        "boolean"
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for f64 {
    fn expected() -> &'static str {
        "double"
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for String {
    fn expected() -> &'static str {
        "String"
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for ObjectRef {
    fn expected() -> &'static str {
        "object"
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned()
    }
}

impl FromValue for ArrayRef {
    fn expected() -> &'static str {
        "array"
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_array().cloned()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn expected() -> &'static str {
        T::expected()
    }

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

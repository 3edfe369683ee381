//! Class registry for managing runtime class metadata

use rustc_hash::{FxHashMap, FxHashSet};

use crate::class::{ClassDefinition, ClassInfo};
use crate::types::{ClassId, TypeRef};

/// Read-only view of the class metadata.
///
/// This is the type capability the reflection engine depends on; the
/// registry is the in-process implementation.
pub trait TypeEnv {
    /// Class by ID
    fn class(&self, id: ClassId) -> Option<&ClassInfo>;

    /// Class ID by name
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
}

/// Errors raised while defining a class
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefineError {
    /// A class with the same name already exists
    #[error("class {0} is already defined")]
    DuplicateClass(String),

    /// The parent class ID is not registered
    #[error("class {class} extends unknown class {parent}")]
    UnknownParent {
        /// Class being defined
        class: String,
        /// Missing parent ID
        parent: ClassId,
    },

    /// Two fields with the same name at one level
    #[error("class {class} declares field {field} twice")]
    DuplicateField {
        /// Class being defined
        class: String,
        /// Field name
        field: String,
    },

    /// Two methods with the same name and parameter types, or two constructors
    /// with the same parameter types, at one level
    #[error("class {class} declares {member} twice")]
    DuplicateMember {
        /// Class being defined
        class: String,
        /// Member rendering
        member: String,
    },

    /// A varargs member whose last parameter is not an array
    #[error("{member} in class {class} is varargs but its last parameter is not an array")]
    InvalidVarargs {
        /// Class being defined
        class: String,
        /// Member rendering
        member: String,
    },
}

/// Class registry
#[derive(Debug, Default)]
pub struct TypeRegistry {
    /// Classes indexed by ID
    classes: Vec<ClassInfo>,
    /// Class name to ID mapping
    name_to_id: FxHashMap<String, ClassId>,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new class and return its ID
    pub fn define_class(&mut self, definition: ClassDefinition) -> Result<ClassId, DefineError> {
        if self.name_to_id.contains_key(&definition.name) {
            return Err(DefineError::DuplicateClass(definition.name));
        }

        let parent = match definition.parent {
            Some(parent_id) => Some(self.classes.get(parent_id.index()).ok_or_else(|| {
                DefineError::UnknownParent {
                    class: definition.name.clone(),
                    parent: parent_id,
                }
            })?),
            None => None,
        };

        let mut seen = FxHashSet::default();
        for field in &definition.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(DefineError::DuplicateField {
                    class: definition.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        let mut signatures = FxHashSet::default();
        for method in &definition.methods {
            if !signatures.insert((method.name.as_str(), method.params.as_slice())) {
                return Err(DefineError::DuplicateMember {
                    class: definition.name.clone(),
                    member: format!("method {}", method.name),
                });
            }
        }
        let mut ctor_signatures = FxHashSet::default();
        for ctor in &definition.constructors {
            if !ctor_signatures.insert(ctor.params.as_slice()) {
                return Err(DefineError::DuplicateMember {
                    class: definition.name.clone(),
                    member: "constructor".to_string(),
                });
            }
        }

        let varargs_ok = |is_varargs: bool, params: &[TypeRef]| {
            !is_varargs || matches!(params.last(), Some(TypeRef::Array(_)))
        };
        for method in &definition.methods {
            if !varargs_ok(method.is_varargs, &method.params) {
                return Err(DefineError::InvalidVarargs {
                    class: definition.name.clone(),
                    member: format!("method {}", method.name),
                });
            }
        }
        for (index, ctor) in definition.constructors.iter().enumerate() {
            if !varargs_ok(ctor.is_varargs, &ctor.params) {
                return Err(DefineError::InvalidVarargs {
                    class: definition.name.clone(),
                    member: format!("constructor #{}", index),
                });
            }
        }

        let id = ClassId(self.classes.len() as u32);
        let name = definition.name.clone();
        let class = definition.build(id, parent);

        self.classes.push(class);
        self.name_to_id.insert(name, id);

        Ok(id)
    }

    /// Get next available class ID
    pub fn next_class_id(&self) -> ClassId {
        ClassId(self.classes.len() as u32)
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterate over all classes
    pub fn iter(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.iter()
    }
}

impl TypeEnv for TypeRegistry {
    fn class(&self, id: ClassId) -> Option<&ClassInfo> {
        self.classes.get(id.index())
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.name_to_id.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{FieldDefinition, MethodDefinition};

    #[test]
    fn test_define_class() {
        let mut registry = TypeRegistry::new();
        let id = registry.define_class(ClassDefinition::new("Point")).unwrap();

        assert_eq!(id.index(), 0);
        assert_eq!(registry.class(id).unwrap().name, "Point");
        assert_eq!(registry.lookup_class("Point"), Some(id));
        assert_eq!(registry.next_class_id().index(), 1);
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let mut registry = TypeRegistry::new();
        registry.define_class(ClassDefinition::new("Point")).unwrap();
        assert_eq!(
            registry.define_class(ClassDefinition::new("Point")),
            Err(DefineError::DuplicateClass("Point".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let mut registry = TypeRegistry::new();
        let err = registry
            .define_class(ClassDefinition::new("Orphan").extends(ClassId(9)))
            .unwrap_err();
        assert!(matches!(err, DefineError::UnknownParent { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut registry = TypeRegistry::new();
        let err = registry
            .define_class(
                ClassDefinition::new("Twice")
                    .add_field(FieldDefinition::new("a", TypeRef::INT))
                    .add_field(FieldDefinition::new("a", TypeRef::String)),
            )
            .unwrap_err();
        assert!(matches!(err, DefineError::DuplicateField { .. }));
    }

    #[test]
    fn test_duplicate_overload_rejected() {
        let mut registry = TypeRegistry::new();
        let err = registry
            .define_class(
                ClassDefinition::new("Calc")
                    .add_method(MethodDefinition::new("add").with_param(TypeRef::INT))
                    .add_method(MethodDefinition::new("add").with_param(TypeRef::INTEGER))
                    .add_method(MethodDefinition::new("add").with_param(TypeRef::INT)),
            )
            .unwrap_err();
        assert!(matches!(err, DefineError::DuplicateMember { .. }));
    }

    #[test]
    fn test_varargs_requires_trailing_array() {
        let mut registry = TypeRegistry::new();
        let err = registry
            .define_class(
                ClassDefinition::new("Bad").add_method(
                    MethodDefinition::new("log")
                        .with_param(TypeRef::String)
                        .as_varargs(),
                ),
            )
            .unwrap_err();
        assert!(matches!(err, DefineError::InvalidVarargs { .. }));
    }

    #[test]
    fn test_child_layout_extends_parent() {
        let mut registry = TypeRegistry::new();
        let base = registry
            .define_class(
                ClassDefinition::new("Base").add_field(FieldDefinition::new("a", TypeRef::INT)),
            )
            .unwrap();
        let child = registry
            .define_class(
                ClassDefinition::new("Child")
                    .extends(base)
                    .add_field(FieldDefinition::new("b", TypeRef::String)),
            )
            .unwrap();

        let child_info = registry.class(child).unwrap();
        assert_eq!(child_info.layout(), &[TypeRef::INT, TypeRef::String]);
        assert_eq!(child_info.declared_field("b").unwrap().slot, 1);
        assert!(child_info.declared_field("a").is_none());
    }
}

//! Member locator
//!
//! Walks a class hierarchy self first and applies the selection rules for
//! fields, methods and constructors. The first level holding at least one
//! eligible candidate decides the outcome; nearer levels shadow farther ones
//! and ambiguity is judged within that level only.

use rustc_hash::FxHashSet;
use whitebox_runtime::{
    is_assignable, ClassId, ClassInfo, ConstructorInfo, FieldInfo, MethodInfo, TypeEnv, TypeRef,
    Value,
};

use crate::error::{MemberKind, ReflectError, ReflectResult};
use crate::hierarchy::chain_of;
use crate::matcher::{
    match_direct, match_spread, most_specific_spread, select_most_specific, CallForm,
};
use crate::resolution::{
    ConstructorSelector, FieldRequest, FieldSelector, MethodRequest, MethodSelector, Resolution,
};

/// A located method together with the call form that fits the arguments
#[derive(Debug, Clone, Copy)]
pub struct MethodCandidate<'env> {
    /// Located method
    pub method: &'env MethodInfo,
    /// How the arguments are passed
    pub form: CallForm,
}

/// A located constructor together with the call form that fits the arguments
#[derive(Debug, Clone, Copy)]
pub struct ConstructorCandidate<'env> {
    /// Located constructor
    pub constructor: &'env ConstructorInfo,
    /// How the arguments are passed
    pub form: CallForm,
}

/// Member locator over a type environment
#[derive(Clone, Copy)]
pub struct Locator<'env> {
    env: &'env dyn TypeEnv,
    tie_break: bool,
}

impl<'env> Locator<'env> {
    /// Create a locator; `tie_break` enables ordering of compatible overloads
    /// by argument distance
    pub fn new(env: &'env dyn TypeEnv, tie_break: bool) -> Self {
        Self { env, tie_break }
    }

    fn levels(&self, start: ClassId) -> Vec<&'env ClassInfo> {
        chain_of(self.env, start).iter().collect()
    }

    fn class_label(&self, class: ClassId) -> String {
        format!("class {}", TypeRef::Class(class).display_name(self.env))
    }

    fn hierarchy_label(&self, class: ClassId) -> String {
        format!(
            "the hierarchy of {}",
            TypeRef::Class(class).display_name(self.env)
        )
    }

    // ========================================================================
    // Fields
    // ========================================================================

    /// Find a field starting at `start`, or only at the requested declaring level
    pub fn find_field(&self, start: ClassId, request: &FieldRequest<'_>) -> Resolution<&'env FieldInfo> {
        let mut levels = self.levels(start);
        if let Some(class) = request.declared_in {
            levels.retain(|level| level.id == class);
        }

        for level in levels {
            let candidates: Vec<&'env FieldInfo> = level
                .fields
                .iter()
                .filter(|f| request.scope.admits(f.is_static()))
                .filter(|f| match request.selector {
                    FieldSelector::Name(name) => f.name == name,
                    FieldSelector::Type(ty) => is_assignable(self.env, ty, &f.ty),
                })
                .collect();
            if !candidates.is_empty() {
                return Resolution::from_level(candidates);
            }
        }
        Resolution::NotFound
    }

    /// Resolve a field, turning a non-unique outcome into an error
    pub fn resolve_field(
        &self,
        start: ClassId,
        request: &FieldRequest<'_>,
    ) -> ReflectResult<&'env FieldInfo> {
        let resolution = self.find_field(start, request);
        tracing::debug!(
            class = %start,
            request = %request.describe(self.env),
            unique = resolution.is_unique(),
            "resolved field"
        );
        resolution.into_result(
            MemberKind::Field,
            || request.describe(self.env),
            || match request.declared_in {
                Some(class) => self.class_label(class),
                None => self.hierarchy_label(start),
            },
            |f| {
                format!(
                    "{}.{}: {}",
                    TypeRef::Class(f.declaring_class).display_name(self.env),
                    f.name,
                    f.ty.display_name(self.env)
                )
            },
        )
    }

    // ========================================================================
    // Methods
    // ========================================================================

    /// Find a method in the hierarchy of `start`, beginning at the request's
    /// declaring class when one is given
    pub fn find_method(
        &self,
        start: ClassId,
        request: &MethodRequest<'_>,
    ) -> Resolution<MethodCandidate<'env>> {
        let name = request.selector.name();
        let chain = chain_of(self.env, start);
        let levels = match request.start_at {
            Some(class) => chain.starting_at(class),
            None => chain,
        };

        for level in levels.iter() {
            let named: Vec<&'env MethodInfo> = level
                .methods
                .iter()
                .filter(|m| m.name == name)
                .filter(|m| !request.statics_only || m.is_static())
                .collect();
            if named.is_empty() {
                continue;
            }

            let resolution = match request.selector {
                MethodSelector::Name(_) => Resolution::from_level(
                    named
                        .into_iter()
                        .map(|method| MethodCandidate {
                            method,
                            form: CallForm::Direct,
                        })
                        .collect(),
                ),
                MethodSelector::Signature(_, params) => {
                    match named.into_iter().find(|m| m.params == params) {
                        Some(method) => Resolution::Unique(MethodCandidate {
                            method,
                            form: CallForm::Direct,
                        }),
                        None => Resolution::NotFound,
                    }
                }
                MethodSelector::Arguments(_, args) => {
                    self.select_by_arguments(&named, |m| (&m.params, m.is_varargs), args)
                        .map(|(method, form)| MethodCandidate { method, form })
                }
            };
            if !matches!(resolution, Resolution::NotFound) {
                return resolution;
            }
        }
        Resolution::NotFound
    }

    /// Resolve a method, turning a non-unique outcome into an error
    pub fn resolve_method(
        &self,
        start: ClassId,
        request: &MethodRequest<'_>,
    ) -> ReflectResult<MethodCandidate<'env>> {
        let resolution = self.find_method(start, request);
        tracing::debug!(
            class = %start,
            request = %request.describe(self.env),
            unique = resolution.is_unique(),
            "resolved method"
        );
        resolution.into_result(
            MemberKind::Method,
            || request.describe(self.env),
            || self.hierarchy_label(request.start_at.unwrap_or(start)),
            |c| self.method_label(c.method),
        )
    }

    fn method_label(&self, method: &MethodInfo) -> String {
        format!(
            "{}.{}",
            TypeRef::Class(method.declaring_class).display_name(self.env),
            method.signature(self.env)
        )
    }

    /// Fixed-arity matches first; spread matches only when no member of the
    /// level accepts the arguments directly
    fn select_by_arguments<M>(
        &self,
        members: &[&'env M],
        shape: impl Fn(&'env M) -> (&'env Vec<TypeRef>, bool),
        args: &[Value],
    ) -> Resolution<(&'env M, CallForm)> {
        let direct: Vec<_> = members
            .iter()
            .filter_map(|&m| {
                let (params, _) = shape(m);
                match_direct(self.env, params, args).map(|d| ((m, CallForm::Direct), d))
            })
            .collect();
        if !direct.is_empty() {
            return select_most_specific(direct, self.tie_break);
        }

        let spread: Vec<_> = members
            .iter()
            .filter_map(|&m| {
                let (params, is_varargs) = shape(m);
                if !is_varargs {
                    return None;
                }
                match_spread(self.env, params, args).map(|d| ((m, CallForm::Spread), d))
            })
            .collect();
        match select_most_specific(spread, self.tie_break) {
            Resolution::Ambiguous(tied) if self.tie_break => most_specific_spread(
                self.env,
                tied.into_iter()
                    .map(|(m, form)| ((m, form), shape(m).0.as_slice()))
                    .collect(),
            ),
            other => other,
        }
    }

    /// All methods with one of the given names, self first
    pub fn methods_named(&self, start: ClassId, names: &[&str]) -> Vec<&'env MethodInfo> {
        let wanted: FxHashSet<&str> = names.iter().copied().collect();
        self.levels(start)
            .into_iter()
            .flat_map(|level| level.methods.iter())
            .filter(|m| wanted.contains(m.name.as_str()))
            .collect()
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    /// Find a constructor declared by `class` itself
    pub fn find_constructor(
        &self,
        class: ClassId,
        selector: &ConstructorSelector<'_>,
    ) -> Resolution<ConstructorCandidate<'env>> {
        let Some(info) = self.env.class(class) else {
            return Resolution::NotFound;
        };
        let declared: Vec<&'env ConstructorInfo> = info.constructors.iter().collect();

        match selector {
            ConstructorSelector::Any => Resolution::from_level(
                declared
                    .into_iter()
                    .map(|constructor| ConstructorCandidate {
                        constructor,
                        form: CallForm::Direct,
                    })
                    .collect(),
            ),
            ConstructorSelector::Signature(params) => {
                match declared.into_iter().find(|c| c.params == *params) {
                    Some(constructor) => Resolution::Unique(ConstructorCandidate {
                        constructor,
                        form: CallForm::Direct,
                    }),
                    None => Resolution::NotFound,
                }
            }
            ConstructorSelector::Arguments(args) => self
                .select_by_arguments(&declared, |c| (&c.params, c.is_varargs), args)
                .map(|(constructor, form)| ConstructorCandidate { constructor, form }),
        }
    }

    /// Resolve a constructor, turning a non-unique outcome into an error
    pub fn resolve_constructor(
        &self,
        class: ClassId,
        selector: &ConstructorSelector<'_>,
    ) -> ReflectResult<ConstructorCandidate<'env>> {
        let resolution = self.find_constructor(class, selector);
        tracing::debug!(
            class = %class,
            request = %selector.describe(self.env, class),
            unique = resolution.is_unique(),
            "resolved constructor"
        );
        resolution.into_result(
            MemberKind::Constructor,
            || selector.describe(self.env, class),
            || self.class_label(class),
            |c| c.constructor.signature(self.env),
        )
    }

    /// First declared constructor of the direct ancestor of `class`
    pub fn first_parent_constructor(&self, class: ClassId) -> ReflectResult<&'env ConstructorInfo> {
        self.env
            .class(class)
            .and_then(|info| info.parent)
            .and_then(|parent| self.env.class(parent))
            .and_then(|parent| parent.constructors.first())
            .ok_or_else(|| ReflectError::NotFound {
                kind: MemberKind::Constructor,
                request: "first parent constructor".to_string(),
                scope: self.class_label(class),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::FieldScope;
    use whitebox_runtime::{
        ClassDefinition, ConstructorDefinition, FieldDefinition, MethodDefinition,
        TypeRegistry,
    };

    struct Fixture {
        registry: TypeRegistry,
        base: ClassId,
        derived: ClassId,
    }

    fn fixture() -> Fixture {
        let mut registry = TypeRegistry::new();
        let base = registry
            .define_class(
                ClassDefinition::new("Base")
                    .add_field(FieldDefinition::new("name", TypeRef::String).private())
                    .add_field(FieldDefinition::new("size", TypeRef::INT).private())
                    .add_field(
                        FieldDefinition::new("INSTANCES", TypeRef::INT)
                            .as_static()
                            .private(),
                    )
                    .add_method(MethodDefinition::new("describe").private())
                    .add_method(
                        MethodDefinition::new("add")
                            .with_param(TypeRef::Object)
                            .private(),
                    )
                    .add_method(MethodDefinition::new("create").as_static())
                    .add_constructor(ConstructorDefinition::new().with_param(TypeRef::String))
                    .add_constructor(ConstructorDefinition::new()),
            )
            .unwrap();
        let derived = registry
            .define_class(
                ClassDefinition::new("Derived")
                    .extends(base)
                    .add_field(FieldDefinition::new("name", TypeRef::String).private())
                    .add_method(
                        MethodDefinition::new("add")
                            .with_param(TypeRef::INT)
                            .private(),
                    )
                    .add_method(
                        MethodDefinition::new("add")
                            .with_param(TypeRef::String)
                            .private(),
                    )
                    .add_method(
                        MethodDefinition::new("log")
                            .with_param(TypeRef::String)
                            .with_param(TypeRef::array_of(TypeRef::Object))
                            .as_varargs(),
                    ),
            )
            .unwrap();
        Fixture {
            registry,
            base,
            derived,
        }
    }

    #[test]
    fn test_field_by_name_nearest_level_wins() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);
        let field = locator
            .resolve_field(fx.derived, &FieldRequest::named("name"))
            .unwrap();
        assert_eq!(field.declaring_class, fx.derived);

        let field = locator
            .resolve_field(
                fx.derived,
                &FieldRequest::named("name").declared_in(Some(fx.base)),
            )
            .unwrap();
        assert_eq!(field.declaring_class, fx.base);
    }

    #[test]
    fn test_field_declared_in_must_be_on_chain() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);
        let request = FieldRequest::named("name").declared_in(Some(fx.derived));
        assert!(locator.resolve_field(fx.base, &request).unwrap_err().is_not_found());

        let request = FieldRequest::named("INSTANCES")
            .declared_in(Some(fx.base))
            .scope(FieldScope::StaticOnly);
        assert!(locator.resolve_field(fx.derived, &request).is_ok());
    }

    #[test]
    fn test_field_by_type_ambiguous_within_level() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);

        // Derived has one String field; it shadows Base's String field.
        let field = locator
            .resolve_field(fx.derived, &FieldRequest::typed(&TypeRef::String))
            .unwrap();
        assert_eq!(field.declaring_class, fx.derived);

        // Base has two int fields.
        let err = locator
            .resolve_field(fx.derived, &FieldRequest::typed(&TypeRef::INT))
            .unwrap_err();
        assert!(err.is_ambiguous());

        let field = locator
            .resolve_field(
                fx.derived,
                &FieldRequest::typed(&TypeRef::INT).scope(FieldScope::InstanceOnly),
            )
            .unwrap();
        assert_eq!(field.name, "size");
    }

    #[test]
    fn test_static_scope_hides_instance_fields() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);
        let request = FieldRequest::named("size").scope(FieldScope::StaticOnly);
        assert!(locator.resolve_field(fx.base, &request).unwrap_err().is_not_found());
    }

    #[test]
    fn test_method_by_arguments_per_level() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);

        let request = MethodRequest::new(MethodSelector::Arguments("add", &[Value::Int(1)]));
        let found = locator.resolve_method(fx.derived, &request).unwrap();
        assert_eq!(found.method.params, vec![TypeRef::INT]);

        // Nothing at Derived accepts a boolean; Base's add(Object) does.
        let args = [Value::Boolean(true)];
        let request = MethodRequest::new(MethodSelector::Arguments("add", &args));
        let found = locator.resolve_method(fx.derived, &request).unwrap();
        assert_eq!(found.method.declaring_class, fx.base);
    }

    #[test]
    fn test_method_start_at_declaring_class() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);
        let args = [Value::Int(1)];
        let request = MethodRequest::new(MethodSelector::Arguments("add", &args))
            .start_at(Some(fx.base));
        let found = locator.resolve_method(fx.derived, &request).unwrap();
        assert_eq!(found.method.params, vec![TypeRef::Object]);

        // A declaring class outside the hierarchy has nothing to offer.
        let request = MethodRequest::new(MethodSelector::Arguments("add", &args))
            .start_at(Some(fx.derived));
        assert!(locator.resolve_method(fx.base, &request).unwrap_err().is_not_found());
    }

    #[test]
    fn test_method_by_name_only() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);
        let request = MethodRequest::new(MethodSelector::Name("add"));
        assert!(locator.resolve_method(fx.derived, &request).unwrap_err().is_ambiguous());

        let request = MethodRequest::new(MethodSelector::Name("describe"));
        let found = locator.resolve_method(fx.derived, &request).unwrap();
        assert_eq!(found.method.declaring_class, fx.base);
    }

    #[test]
    fn test_method_by_signature() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);
        let params = [TypeRef::Object];
        let request = MethodRequest::new(MethodSelector::Signature("add", &params));
        let found = locator.resolve_method(fx.derived, &request).unwrap();
        assert_eq!(found.method.declaring_class, fx.base);

        let params = [TypeRef::LONG];
        let request = MethodRequest::new(MethodSelector::Signature("add", &params));
        assert!(locator.resolve_method(fx.derived, &request).unwrap_err().is_not_found());
    }

    #[test]
    fn test_varargs_spread() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);
        let args = [Value::from("fmt"), Value::Int(1), Value::from("x")];
        let request = MethodRequest::new(MethodSelector::Arguments("log", &args));
        let found = locator.resolve_method(fx.derived, &request).unwrap();
        assert_eq!(found.form, CallForm::Spread);
    }

    #[test]
    fn test_statics_only() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);
        let request = MethodRequest::new(MethodSelector::Name("describe")).statics_only(true);
        assert!(locator.resolve_method(fx.base, &request).unwrap_err().is_not_found());

        let request = MethodRequest::new(MethodSelector::Name("create")).statics_only(true);
        assert!(locator.resolve_method(fx.derived, &request).is_ok());
    }

    #[test]
    fn test_constructor_lookup_is_own_class_only() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);

        let args = [Value::from("n")];
        let found = locator
            .resolve_constructor(fx.base, &ConstructorSelector::Arguments(&args))
            .unwrap();
        assert_eq!(found.constructor.params, vec![TypeRef::String]);

        // Derived only has its implicit constructor.
        assert!(locator
            .resolve_constructor(fx.derived, &ConstructorSelector::Arguments(&args))
            .unwrap_err()
            .is_not_found());
        let implicit = locator
            .resolve_constructor(fx.derived, &ConstructorSelector::Any)
            .unwrap();
        assert!(implicit.constructor.is_implicit);

        assert!(locator
            .resolve_constructor(fx.base, &ConstructorSelector::Any)
            .unwrap_err()
            .is_ambiguous());
    }

    #[test]
    fn test_first_parent_constructor() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);
        let ctor = locator.first_parent_constructor(fx.derived).unwrap();
        assert_eq!(ctor.declaring_class, fx.base);
        assert_eq!(ctor.params, vec![TypeRef::String]);
        assert!(locator.first_parent_constructor(fx.base).unwrap_err().is_not_found());
    }

    #[test]
    fn test_methods_named_self_first() {
        let fx = fixture();
        let locator = Locator::new(&fx.registry, true);
        let methods = locator.methods_named(fx.derived, &["add", "describe"]);
        let owners: Vec<_> = methods.iter().map(|m| m.declaring_class).collect();
        assert_eq!(owners, vec![fx.derived, fx.derived, fx.base, fx.base]);
        assert!(locator.methods_named(fx.derived, &["missing"]).is_empty());
    }
}

//! Resolution requests and results
//!
//! Every lookup is driven by exactly one request shape and produces a
//! [`Resolution`]: a unique candidate, nothing, or several equally valid
//! candidates. Only a unique candidate is ever acted upon.

use whitebox_runtime::{ClassId, TypeEnv, TypeRef, Value};

use crate::error::{MemberKind, ReflectError, ReflectResult};

/// Outcome of a lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// Exactly one candidate
    Unique(T),
    /// No candidate in the searched scope
    NotFound,
    /// More than one equally valid candidate at the winning level
    Ambiguous(Vec<T>),
}

impl<T> Resolution<T> {
    /// Check if the lookup produced exactly one candidate
    pub fn is_unique(&self) -> bool {
        matches!(self, Resolution::Unique(_))
    }

    /// The unique candidate, if any
    pub fn unique(self) -> Option<T> {
        match self {
            Resolution::Unique(value) => Some(value),
            _ => None,
        }
    }

    /// Map the candidate type
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Unique(value) => Resolution::Unique(f(value)),
            Resolution::NotFound => Resolution::NotFound,
            Resolution::Ambiguous(values) => Resolution::Ambiguous(values.into_iter().map(f).collect()),
        }
    }

    /// Build a resolution from the candidates found at one level
    pub(crate) fn from_level(mut candidates: Vec<T>) -> Self {
        match candidates.len() {
            0 => Resolution::NotFound,
            1 => Resolution::Unique(candidates.remove(0)),
            _ => Resolution::Ambiguous(candidates),
        }
    }

    /// Turn the outcome into an engine result
    pub fn into_result(
        self,
        kind: MemberKind,
        request: impl FnOnce() -> String,
        scope: impl FnOnce() -> String,
        render: impl Fn(&T) -> String,
    ) -> ReflectResult<T> {
        match self {
            Resolution::Unique(value) => Ok(value),
            Resolution::NotFound => Err(ReflectError::NotFound {
                kind,
                request: request(),
                scope: scope(),
            }),
            Resolution::Ambiguous(values) => Err(ReflectError::Ambiguous {
                kind,
                request: request(),
                scope: scope(),
                candidates: values.iter().map(render).collect(),
            }),
        }
    }
}

/// Which storage a field lookup may return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope {
    /// Instance and static fields
    Any,
    /// Instance fields only
    InstanceOnly,
    /// Static fields only (type-scoped target)
    StaticOnly,
}

impl FieldScope {
    /// Whether a field with the given storage is eligible
    pub fn admits(self, is_static: bool) -> bool {
        match self {
            FieldScope::Any => true,
            FieldScope::InstanceOnly => !is_static,
            FieldScope::StaticOnly => is_static,
        }
    }
}

/// Field selection criterion
#[derive(Debug, Clone, Copy)]
pub enum FieldSelector<'a> {
    /// By field name
    Name(&'a str),
    /// By declared type: fields whose type is the requested type or assignable from it
    Type(&'a TypeRef),
}

/// Field resolution request
#[derive(Debug, Clone, Copy)]
pub struct FieldRequest<'a> {
    /// Selection criterion
    pub selector: FieldSelector<'a>,
    /// Search only this level instead of the whole hierarchy
    pub declared_in: Option<ClassId>,
    /// Eligible storage
    pub scope: FieldScope,
}

impl<'a> FieldRequest<'a> {
    /// Request a field by name anywhere in the hierarchy
    pub fn named(name: &'a str) -> Self {
        Self {
            selector: FieldSelector::Name(name),
            declared_in: None,
            scope: FieldScope::Any,
        }
    }

    /// Request the sole field assignable from `ty`
    pub fn typed(ty: &'a TypeRef) -> Self {
        Self {
            selector: FieldSelector::Type(ty),
            declared_in: None,
            scope: FieldScope::Any,
        }
    }

    /// Restrict the search to one declaring level
    pub fn declared_in(mut self, class: Option<ClassId>) -> Self {
        self.declared_in = class;
        self
    }

    /// Restrict eligible storage
    pub fn scope(mut self, scope: FieldScope) -> Self {
        self.scope = scope;
        self
    }

    /// Rendering used in diagnostics
    pub fn describe(&self, env: &dyn TypeEnv) -> String {
        match self.selector {
            FieldSelector::Name(name) => format!("named \"{}\"", name),
            FieldSelector::Type(ty) => format!("of type {}", ty.display_name(env)),
        }
    }
}

/// Method selection criterion
#[derive(Debug, Clone, Copy)]
pub enum MethodSelector<'a> {
    /// Name only; must be unique at the first level declaring it
    Name(&'a str),
    /// Name and exact parameter types
    Signature(&'a str, &'a [TypeRef]),
    /// Name and argument values, disambiguated by compatibility
    Arguments(&'a str, &'a [Value]),
}

impl<'a> MethodSelector<'a> {
    /// Requested method name
    pub fn name(&self) -> &'a str {
        match *self {
            MethodSelector::Name(name)
            | MethodSelector::Signature(name, _)
            | MethodSelector::Arguments(name, _) => name,
        }
    }
}

/// Method resolution request
#[derive(Debug, Clone, Copy)]
pub struct MethodRequest<'a> {
    /// Selection criterion
    pub selector: MethodSelector<'a>,
    /// Start the walk at this ancestor instead of the target's class
    pub start_at: Option<ClassId>,
    /// Only type-scoped methods are eligible
    pub statics_only: bool,
}

impl<'a> MethodRequest<'a> {
    /// Create a request over the whole hierarchy
    pub fn new(selector: MethodSelector<'a>) -> Self {
        Self {
            selector,
            start_at: None,
            statics_only: false,
        }
    }

    /// Start the walk at a declaring class
    pub fn start_at(mut self, class: Option<ClassId>) -> Self {
        self.start_at = class;
        self
    }

    /// Restrict to static methods
    pub fn statics_only(mut self, statics_only: bool) -> Self {
        self.statics_only = statics_only;
        self
    }

    /// Rendering used in diagnostics
    pub fn describe(&self, env: &dyn TypeEnv) -> String {
        match self.selector {
            MethodSelector::Name(name) => format!("\"{}\"", name),
            MethodSelector::Signature(name, params) => {
                format!("{}({})", name, render_types(env, params))
            }
            MethodSelector::Arguments(name, args) => {
                format!("{}({})", name, render_values(args))
            }
        }
    }
}

/// Constructor selection criterion
#[derive(Debug, Clone, Copy)]
pub enum ConstructorSelector<'a> {
    /// The sole declared constructor
    Any,
    /// Exact parameter types
    Signature(&'a [TypeRef]),
    /// Argument values, disambiguated by compatibility
    Arguments(&'a [Value]),
}

impl ConstructorSelector<'_> {
    /// Rendering used in diagnostics
    pub fn describe(&self, env: &dyn TypeEnv, class: ClassId) -> String {
        let class_name = TypeRef::Class(class).display_name(env);
        match self {
            ConstructorSelector::Any => format!("{}(..)", class_name),
            ConstructorSelector::Signature(params) => {
                format!("{}({})", class_name, render_types(env, params))
            }
            ConstructorSelector::Arguments(args) => {
                format!("{}({})", class_name, render_values(args))
            }
        }
    }
}

pub(crate) fn render_types(env: &dyn TypeEnv, types: &[TypeRef]) -> String {
    types
        .iter()
        .map(|t| t.display_name(env))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn render_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| format!("{:?}", v))
        .collect::<Vec<_>>()
        .join(", ")
}

//! Whitebox
//!
//! A reflective introspection and mutation engine for tests. Given an object
//! or a class of the `whitebox-runtime` object model it can:
//! - read and write fields regardless of visibility, by name, by declared
//!   type, or by inferring the field from the value's runtime type
//! - invoke methods and constructors regardless of visibility, picking the
//!   overload that fits the supplied arguments
//! - allocate instances without running any constructor
//!
//! # Architecture
//!
//! - **Walker** (`hierarchy`): self-first ancestor chain of a class
//! - **Matcher** (`matcher`): argument compatibility and overload specificity
//! - **Locator** (`locator`): per-level member selection over the chain
//! - **Accessor** (`accessor`): reads, writes and invocations
//! - **Instantiator** (`instantiator`): constructor-free allocation
//! - **Façade** (`facade`): the `Whitebox` entry point
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use whitebox::{Whitebox, runtime::*};
//!
//! let mut registry = TypeRegistry::new();
//! let counter = registry.define_class(
//!     ClassDefinition::new("Counter")
//!         .add_field(FieldDefinition::new("count", TypeRef::INT).private()),
//! )?;
//!
//! let wb = Whitebox::new(Arc::new(registry));
//! let obj = wb.new_instance(counter)?;
//! wb.set_internal_state(&obj, "count", 5)?;
//! assert_eq!(wb.get_internal_state_as::<i32>(&obj, "count", None)?, 5);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod accessor;
pub mod config;
pub mod error;
pub mod facade;
pub mod hierarchy;
pub mod instantiator;
pub mod locator;
pub mod matcher;
pub mod resolution;

pub use whitebox_runtime as runtime;

pub use accessor::Target;
pub use config::{ConfigError, WhiteboxOptions};
pub use error::{MemberKind, ReflectError, ReflectResult};
pub use facade::Whitebox;
pub use hierarchy::{chain_of, AncestorChain};
pub use locator::{ConstructorCandidate, Locator, MethodCandidate};
pub use matcher::{is_compatible, type_distance, value_distance, ArgumentMatch, CallForm};
pub use resolution::{
    ConstructorSelector, FieldRequest, FieldScope, FieldSelector, MethodRequest, MethodSelector,
    Resolution,
};

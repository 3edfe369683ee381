//! Shared class fixtures for the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use whitebox::runtime::{
    ClassDefinition, ClassId, ConstructorDefinition, FieldDefinition, MethodDefinition,
    PrimitiveType, TypeRef, TypeRegistry, Value,
};
use whitebox::{Whitebox, WhiteboxOptions};

/// Error raised by `Vault.open`
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("vault {0} is sealed")]
pub struct Sealed(pub i32);

pub struct Classes {
    pub counter: ClassId,
    pub boxed: ClassId,
    pub base: ClassId,
    pub derived: ClassId,
    pub b: ClassId,
    pub a: ClassId,
    pub t: ClassId,
    pub calc: ClassId,
    pub printer: ClassId,
    pub vault: ClassId,
    pub noisy: ClassId,
    pub shape: ClassId,
    pub settings: ClassId,
}

pub struct Fixture {
    pub wb: Whitebox,
    pub classes: Classes,
    pub constructor_runs: Arc<AtomicUsize>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_options(WhiteboxOptions::default())
    }

    pub fn with_options(options: WhiteboxOptions) -> Self {
        let constructor_runs = Arc::new(AtomicUsize::new(0));
        let (registry, classes) = define_all(constructor_runs.clone());
        Fixture {
            wb: Whitebox::with_options(Arc::new(registry), options),
            classes,
            constructor_runs,
        }
    }
}

pub fn define_all(constructor_runs: Arc<AtomicUsize>) -> (TypeRegistry, Classes) {
    let mut registry = TypeRegistry::new();

    // Counter { private int value; private int increment() }
    let counter = registry
        .define_class(
            ClassDefinition::new("Counter")
                .add_field(FieldDefinition::new("value", TypeRef::INT).private())
                .add_method(MethodDefinition::new("increment").private().body(|frame| {
                    let next = frame.get("value")?.as_int().unwrap_or(0) + 1;
                    frame.set("value", next)?;
                    Ok(Value::Int(next))
                })),
        )
        .unwrap();

    // Box { private String first; private String second }
    let boxed = registry
        .define_class(
            ClassDefinition::new("Box")
                .add_field(FieldDefinition::new("first", TypeRef::String).private())
                .add_field(FieldDefinition::new("second", TypeRef::String).private()),
        )
        .unwrap();

    // Base(int) with a String label; Derived without constructors
    let base = registry
        .define_class(
            ClassDefinition::new("Base")
                .add_field(FieldDefinition::new("label", TypeRef::String).private())
                .add_field(FieldDefinition::new("size", TypeRef::INT).private())
                .add_constructor(
                    ConstructorDefinition::new()
                        .with_param(TypeRef::INT)
                        .private()
                        .body(|frame| {
                            let size = frame.arg(0);
                            frame.set("size", size)
                        }),
                )
                .add_method(
                    MethodDefinition::new("describe")
                        .private()
                        .body(|_| Ok(Value::from("base"))),
                ),
        )
        .unwrap();
    let derived = registry
        .define_class(
            ClassDefinition::new("Derived")
                .extends(base)
                .add_field(FieldDefinition::new("label", TypeRef::String).private())
                .add_method(
                    MethodDefinition::new("describe")
                        .private()
                        .body(|_| Ok(Value::from("derived"))),
                ),
        )
        .unwrap();

    // T -> A -> B, with `secret` only on B
    let b = registry
        .define_class(
            ClassDefinition::new("B")
                .add_field(FieldDefinition::new("secret", TypeRef::String).private())
                .add_field(FieldDefinition::new("weight", TypeRef::LONG).private())
                .add_field(FieldDefinition::new("ratio", TypeRef::DOUBLE).private())
                .add_field(FieldDefinition::new("scale", TypeRef::DOUBLE).private()),
        )
        .unwrap();
    let a = registry
        .define_class(
            ClassDefinition::new("A")
                .extends(b)
                .add_field(FieldDefinition::new("weight", TypeRef::LONG).private()),
        )
        .unwrap();
    let t = registry
        .define_class(
            ClassDefinition::new("T")
                .extends(a)
                .add_field(FieldDefinition::new("enabled", TypeRef::BOOLEAN).private()),
        )
        .unwrap();

    // Calc with overloads add(int), add(Integer), sum(int, int), sum(long, long),
    // accept(Object), accept(String)
    let calc = registry
        .define_class(
            ClassDefinition::new("Calc")
                .add_method(
                    MethodDefinition::new("add")
                        .with_param(TypeRef::INT)
                        .private()
                        .body(|_| Ok(Value::from("int"))),
                )
                .add_method(
                    MethodDefinition::new("add")
                        .with_param(TypeRef::INTEGER)
                        .private()
                        .body(|_| Ok(Value::from("Integer"))),
                )
                .add_method(
                    MethodDefinition::new("sum")
                        .with_param(TypeRef::INT)
                        .with_param(TypeRef::INT)
                        .private()
                        .body(|frame| {
                            let a = frame.arg(0).as_int().unwrap_or(0);
                            let b = frame.arg(1).as_int().unwrap_or(0);
                            Ok(Value::Int(a + b))
                        }),
                )
                .add_method(
                    MethodDefinition::new("sum")
                        .with_param(TypeRef::LONG)
                        .with_param(TypeRef::LONG)
                        .private()
                        .body(|frame| {
                            let a = frame.arg(0).as_long().unwrap_or(0);
                            let b = frame.arg(1).as_long().unwrap_or(0);
                            Ok(Value::Long(a + b))
                        }),
                )
                .add_method(
                    MethodDefinition::new("accept")
                        .with_param(TypeRef::Object)
                        .private()
                        .body(|_| Ok(Value::from("Object"))),
                )
                .add_method(
                    MethodDefinition::new("accept")
                        .with_param(TypeRef::String)
                        .private()
                        .body(|_| Ok(Value::from("String"))),
                )
                .add_method(
                    MethodDefinition::new("twice")
                        .with_param(TypeRef::INT)
                        .as_static()
                        .private()
                        .body(|frame| Ok(Value::Int(frame.arg(0).as_int().unwrap_or(0) * 2))),
                ),
        )
        .unwrap();

    // Printer with a varargs format(String, Object...) and count(String...)
    let printer = registry
        .define_class(
            ClassDefinition::new("Printer")
                .add_method(
                    MethodDefinition::new("format")
                        .with_param(TypeRef::String)
                        .with_param(TypeRef::array_of(TypeRef::Object))
                        .as_varargs()
                        .private()
                        .body(|frame| {
                            let count = frame.arg(1).as_array().map(|a| a.len()).unwrap_or(0);
                            Ok(Value::from(format!(
                                "{}/{}",
                                frame.arg(0).as_str().unwrap_or(""),
                                count
                            )))
                        }),
                )
                .add_method(
                    MethodDefinition::new("count")
                        .with_param(TypeRef::array_of(TypeRef::String))
                        .as_varargs()
                        .private()
                        .body(|frame| {
                            let count = frame.arg(0).as_array().map(|a| a.len() as i32).unwrap_or(-1);
                            Ok(Value::Int(count))
                        }),
                )
                .add_constructor(
                    ConstructorDefinition::new()
                        .with_param(TypeRef::array_of(TypeRef::String))
                        .as_varargs()
                        .body(|_| Ok(())),
                ),
        )
        .unwrap();

    // Vault whose methods and constructor fail with their own errors
    let vault = registry
        .define_class(
            ClassDefinition::new("Vault")
                .add_field(FieldDefinition::new("id", TypeRef::INT).private())
                .add_method(MethodDefinition::new("open").private().body(|frame| {
                    let id = frame.get("id")?.as_int().unwrap_or(0);
                    Err(Sealed(id).into())
                }))
                .add_constructor(
                    ConstructorDefinition::new()
                        .with_param(TypeRef::INT)
                        .body(|frame| Err(Sealed(frame.arg(0).as_int().unwrap_or(0)).into())),
                )
                .add_constructor(ConstructorDefinition::new().private()),
        )
        .unwrap();

    // Noisy with a side-effecting constructor
    let runs = constructor_runs.clone();
    let noisy = registry
        .define_class(
            ClassDefinition::new("Noisy")
                .add_field(FieldDefinition::new("count", TypeRef::INT).private())
                .add_field(FieldDefinition::new("active", TypeRef::BOOLEAN).private())
                .add_field(FieldDefinition::new("name", TypeRef::String).private())
                .add_field(
                    FieldDefinition::new("initial", TypeRef::Primitive(PrimitiveType::Char)).private(),
                )
                .add_constructor(ConstructorDefinition::new().private().body(move |frame| {
                    runs.fetch_add(1, Ordering::SeqCst);
                    frame.set("count", 42)?;
                    frame.set("active", true)?;
                    frame.set("name", "noisy")
                })),
        )
        .unwrap();

    let shape = registry
        .define_class(
            ClassDefinition::new("Shape")
                .as_abstract()
                .add_method(MethodDefinition::new("area").as_abstract()),
        )
        .unwrap();

    // Settings with static state
    let settings = registry
        .define_class(
            ClassDefinition::new("Settings")
                .add_field(
                    FieldDefinition::new("LIMIT", TypeRef::INT)
                        .as_static()
                        .as_readonly()
                        .private()
                        .initial_value(Value::Int(10)),
                )
                .add_field(FieldDefinition::new("owner", TypeRef::String).private())
                .add_method(
                    MethodDefinition::new("limit")
                        .as_static()
                        .private()
                        .body(|frame| frame.get("LIMIT")),
                ),
        )
        .unwrap();

    (
        registry,
        Classes {
            counter,
            boxed,
            base,
            derived,
            b,
            a,
            t,
            calc,
            printer,
            vault,
            noisy,
            shape,
            settings,
        },
    )
}

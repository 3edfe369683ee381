//! Call frames handed to native method and constructor bodies

use crate::object::ObjectRef;
use crate::registry::TypeEnv;
use crate::types::{accepts_value, ClassId, TypeRef};
use crate::value::Value;

/// Failure of a host reflective call
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    /// The callee itself failed; the original error is wrapped unchanged
    #[error("invocation target failed: {0}")]
    Target(anyhow::Error),

    /// Receiver or arguments do not fit the declaration
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// The declaring class cannot be instantiated
    #[error("instantiation failed: {0}")]
    Instantiation(String),
}

/// Execution context of a single native call
pub struct CallFrame<'env> {
    env: &'env dyn TypeEnv,
    this: Option<ObjectRef>,
    declaring_class: ClassId,
    args: Vec<Value>,
}

impl<'env> CallFrame<'env> {
    pub(crate) fn new(
        env: &'env dyn TypeEnv,
        this: Option<ObjectRef>,
        declaring_class: ClassId,
        args: Vec<Value>,
    ) -> Self {
        Self {
            env,
            this,
            declaring_class,
            args,
        }
    }

    /// Type environment the call runs in
    pub fn env(&self) -> &'env dyn TypeEnv {
        self.env
    }

    /// Receiver of an instance call
    pub fn this(&self) -> anyhow::Result<&ObjectRef> {
        self.this
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no receiver in a static context"))
    }

    /// Class that declares the running member
    pub fn declaring_class(&self) -> ClassId {
        self.declaring_class
    }

    /// Argument by position; null when out of range
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::Null)
    }

    /// All arguments
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Plain field read as written inside the declaring class body.
    ///
    /// Looks the name up from the declaring class upwards; static fields are
    /// read from class storage.
    pub fn get(&self, name: &str) -> anyhow::Result<Value> {
        let (owner, field) = self.lexical_field(name)?;
        if field.is_static() {
            let class = self
                .env
                .class(owner)
                .ok_or_else(|| anyhow::anyhow!("unknown class {}", owner))?;
            return class
                .get_static(field.slot)
                .ok_or_else(|| anyhow::anyhow!("static slot {} missing", field.slot));
        }
        self.this()?
            .get_slot(field.slot)
            .ok_or_else(|| anyhow::anyhow!("slot {} missing", field.slot))
    }

    /// Plain field write as written inside the declaring class body.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> anyhow::Result<()> {
        let value = value.into();
        let (owner, field) = self.lexical_field(name)?;
        if !accepts_value(self.env, &field.ty, &value) {
            anyhow::bail!(
                "cannot assign {} to field {} of type {}",
                value.kind_name(),
                name,
                field.ty.display_name(self.env)
            );
        }
        if field.is_static() {
            let class = self
                .env
                .class(owner)
                .ok_or_else(|| anyhow::anyhow!("unknown class {}", owner))?;
            return class.set_static(field.slot, value).map_err(anyhow::Error::msg);
        }
        self.this()?
            .set_slot(field.slot, value)
            .map_err(anyhow::Error::msg)
    }

    fn lexical_field(&self, name: &str) -> anyhow::Result<(ClassId, crate::class::FieldInfo)> {
        let mut current = Some(self.declaring_class);
        while let Some(id) = current {
            let class = self
                .env
                .class(id)
                .ok_or_else(|| anyhow::anyhow!("unknown class {}", id))?;
            if let Some(field) = class.declared_field(name) {
                return Ok((id, field.clone()));
            }
            current = class.parent;
        }
        anyhow::bail!(
            "no field {} visible from {}",
            name,
            TypeRef::Class(self.declaring_class).display_name(self.env)
        )
    }
}

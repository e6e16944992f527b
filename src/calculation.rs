use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::CalcError;
use crate::operations;

/// Process-wide registry holding the built-in operations.
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::with_builtins);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub fn tag(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        }
    }

    /// The tag with its first letter upper-cased, e.g. `Add`.
    pub fn name(self) -> String {
        let mut chars = self.tag().chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn apply(self, a: f64, b: f64) -> Result<f64, CalcError> {
        match self {
            Operation::Add => Ok(operations::add(a, b)),
            Operation::Subtract => Ok(operations::subtract(a, b)),
            Operation::Multiply => Ok(operations::multiply(a, b)),
            Operation::Divide => operations::divide(a, b),
        }
    }
}

/// An operation bound to its two operands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calculation {
    operation: Operation,
    a: f64,
    b: f64,
}

impl Calculation {
    pub fn new(operation: Operation, a: f64, b: f64) -> Self {
        Self { operation, a, b }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn operands(&self) -> (f64, f64) {
        (self.a, self.b)
    }

    /// Recomputed on every call.
    pub fn compute(&self) -> Result<f64, CalcError> {
        self.operation.apply(self.a, self.b)
    }
}

impl fmt::Display for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = self.operands();
        write!(
            f,
            "{} {} {} = ",
            format_number(a),
            self.operation.name(),
            format_number(b)
        )?;
        match self.compute() {
            Ok(result) => f.write_str(&format_number(result)),
            Err(err) => write!(f, "<{}>", err),
        }
    }
}

/// Renders floats the way the calculator prints them: integral values keep
/// a trailing `.0` and NaN is lower-case.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    // Debug already keeps `.0` and switches to exponent form for very
    // large and very small magnitudes.
    format!("{:?}", value)
}

pub type Constructor = fn(f64, f64) -> Calculation;

#[derive(Debug, Default)]
pub struct Registry {
    constructors: IndexMap<String, Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, Constructor); 4] = [
            ("add", |a, b| Calculation::new(Operation::Add, a, b)),
            ("subtract", |a, b| Calculation::new(Operation::Subtract, a, b)),
            ("multiply", |a, b| Calculation::new(Operation::Multiply, a, b)),
            ("divide", |a, b| Calculation::new(Operation::Divide, a, b)),
        ];
        for (tag, constructor) in builtins {
            registry
                .register(tag, constructor)
                .expect("built-in tags are distinct");
        }
        registry
    }

    pub fn register(&mut self, tag: &str, constructor: Constructor) -> Result<(), CalcError> {
        let tag = tag.to_lowercase();
        if self.constructors.contains_key(&tag) {
            return Err(CalcError::DuplicateRegistration(tag));
        }
        debug!(%tag, "registered calculation type");
        self.constructors.insert(tag, constructor);
        Ok(())
    }

    pub fn create(&self, tag: &str, a: f64, b: f64) -> Result<Calculation, CalcError> {
        match self.constructors.get(&tag.to_lowercase()) {
            Some(constructor) => Ok(constructor(a, b)),
            None => {
                debug!(%tag, "unknown calculation type");
                Err(CalcError::UnsupportedOperation {
                    tag: tag.to_owned(),
                    available: self.tags().map(str::to_owned).collect(),
                })
            }
        }
    }

    /// Registered tags, in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

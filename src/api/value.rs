use std::collections::BTreeMap;
use std::fmt;

use super::foreign::ForeignHandle;

/// Dynamic category of a slot value, as seen by the contract checker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotType {
    Bool,
    Num,
    List,
    Map,
    Null,
    String,
    Foreign,
    Unknown,
}

impl SlotType {
    pub fn name(self) -> &'static str {
        match self {
            SlotType::Bool => "boolean",
            SlotType::Num => "number",
            SlotType::List => "list",
            SlotType::Map => "map",
            SlotType::Null => "null",
            SlotType::String => "string",
            SlotType::Foreign => "foreign",
            SlotType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value living in a call slot
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Foreign(ForeignHandle),
    /// Any script value the bridge has no native representation for.
    /// Holds the runtime's type name for error messages.
    Unknown(String),
}

impl Value {
    pub fn slot_type(&self) -> SlotType {
        match self {
            Value::Null => SlotType::Null,
            Value::Bool(_) => SlotType::Bool,
            Value::Num(_) => SlotType::Num,
            Value::Str(_) => SlotType::String,
            Value::List(_) => SlotType::List,
            Value::Map(_) => SlotType::Map,
            Value::Foreign(_) => SlotType::Foreign,
            Value::Unknown(_) => SlotType::Unknown,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Foreign(a), Value::Foreign(b)) => a.ptr_eq(b),
            (Value::Unknown(a), Value::Unknown(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Num(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Num(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

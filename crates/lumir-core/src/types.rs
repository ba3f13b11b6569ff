use serde::{Deserialize, Serialize};
use std::fmt;

/// Value types carried by instructions. A closed set: the source language's
/// scalar types plus the aggregate placeholders the front end may annotate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Pointer,
    Array,
    Struct,
}

impl Type {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Type::Bool | Type::Int8 | Type::Int16 | Type::Int32 | Type::Int64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float | Type::Double)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Type::Void => "void",
            Type::Bool => "i1",
            Type::Int8 => "i8",
            Type::Int16 => "i16",
            Type::Int32 => "i32",
            Type::Int64 => "i64",
            Type::Float => "float",
            Type::Double => "double",
            Type::Pointer => "ptr",
            Type::Array => "array",
            Type::Struct => "struct",
        };
        write!(f, "{}", s)
    }
}

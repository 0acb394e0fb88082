//! Dialect type mapping.
//!
//! Every dialect maps a [`NativeType`] to a closed [`HostType`] plus an
//! optional [`RewriteKind`]. Everything downstream (Go spelling, wire type,
//! zero literal, change predicate) is derived from those two values, never
//! from type-name strings.

pub mod document;
pub mod relational;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::NativeType;
use crate::dialect::Dialect;

pub const TIME_MODULE: &str = "time";
pub const SQL_MODULE: &str = "database/sql";
pub const PRIMITIVE_MODULE: &str = "go.mongodb.org/mongo-driver/bson/primitive";
pub const BSON_MODULE: &str = "go.mongodb.org/mongo-driver/bson";

/// Maps native column types of one dialect to host types.
pub trait TypeMapper: Sync {
    fn dialect(&self) -> Dialect;

    /// Map a column's native type. `None` means the type is unknown here.
    fn map(&self, column: &str, native: &NativeType) -> Option<Mapped>;
}

/// Result of mapping one native type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapped {
    pub host: HostType,
    pub rewrite: Option<RewriteKind>,
}

impl Mapped {
    pub fn plain(host: HostType) -> Self {
        Self {
            host,
            rewrite: None,
        }
    }

    pub fn rewritten(host: HostType, kind: RewriteKind) -> Self {
        Self {
            host,
            rewrite: Some(kind),
        }
    }
}

/// Target host types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Bool,
    String,
    Bytes,
    Time,
    ObjectId,
    Slice(Box<HostType>),
    /// Nested document, spelled as written (`Address`, `map[string]interface{}`).
    Object(String),
}

impl HostType {
    /// Go spelling of the bare type.
    pub fn go_name(&self) -> String {
        match self {
            HostType::Int8 => "int8".into(),
            HostType::Int16 => "int16".into(),
            HostType::Int32 => "int32".into(),
            HostType::Int64 => "int64".into(),
            HostType::UInt8 => "uint8".into(),
            HostType::UInt16 => "uint16".into(),
            HostType::UInt32 => "uint32".into(),
            HostType::UInt64 => "uint64".into(),
            HostType::Float32 => "float32".into(),
            HostType::Float64 => "float64".into(),
            HostType::Bool => "bool".into(),
            HostType::String => "string".into(),
            HostType::Bytes => "[]byte".into(),
            HostType::Time => "time.Time".into(),
            HostType::ObjectId => "primitive.ObjectID".into(),
            HostType::Slice(inner) => format!("[]{}", inner.go_name()),
            HostType::Object(name) => name.clone(),
        }
    }

    /// Import path the Go spelling needs, if any.
    pub fn module(&self) -> Option<&'static str> {
        match self {
            HostType::Time => Some(TIME_MODULE),
            HostType::ObjectId => Some(PRIMITIVE_MODULE),
            HostType::Slice(inner) => inner.module(),
            HostType::Object(name) if name.contains("bson.") => Some(BSON_MODULE),
            _ => None,
        }
    }

    /// Message wire projection. `None` for shapes protobuf cannot express.
    pub fn wire_type(&self) -> Option<WireType> {
        Some(match self {
            HostType::Int8 | HostType::Int16 | HostType::Int32 => WireType::Int32,
            HostType::Int64 => WireType::Int64,
            HostType::UInt8 | HostType::UInt16 | HostType::UInt32 => WireType::UInt32,
            HostType::UInt64 => WireType::UInt64,
            HostType::Float32 => WireType::Float,
            HostType::Float64 => WireType::Double,
            HostType::Bool => WireType::Bool,
            HostType::String
            | HostType::Bytes
            | HostType::Time
            | HostType::ObjectId
            | HostType::Object(_) => WireType::String,
            HostType::Slice(inner) => match inner.as_ref() {
                HostType::Slice(_) => return None,
                other => WireType::Repeated(Box::new(other.wire_type()?)),
            },
        })
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            HostType::Int8
                | HostType::Int16
                | HostType::Int32
                | HostType::Int64
                | HostType::UInt8
                | HostType::UInt16
                | HostType::UInt32
                | HostType::UInt64
        )
    }

    /// Integers and strings can identify a row.
    pub fn is_identifier_compatible(&self) -> bool {
        self.is_integer() || matches!(self, HostType::String)
    }

    /// Already nil-able in Go, so never pointer-wrapped.
    pub fn is_nilable(&self) -> bool {
        matches!(
            self,
            HostType::Bytes | HostType::Slice(_) | HostType::Object(_) | HostType::Time
        )
    }

    /// A nested struct rather than a map or interface.
    pub fn is_struct_object(&self) -> bool {
        match self {
            HostType::Object(name) => name.chars().next().is_some_and(char::is_uppercase),
            _ => false,
        }
    }

    /// `database/sql` wrapper used under the wrapper null policy.
    pub fn null_wrapper(&self) -> Option<NullWrapper> {
        Some(match self {
            HostType::Int8 | HostType::Int16 => NullWrapper::Int16,
            HostType::Int32 | HostType::UInt16 => NullWrapper::Int32,
            HostType::Int64 | HostType::UInt32 | HostType::UInt64 => NullWrapper::Int64,
            HostType::UInt8 => NullWrapper::Byte,
            HostType::Float32 | HostType::Float64 => NullWrapper::Float64,
            HostType::Bool => NullWrapper::Bool,
            HostType::String => NullWrapper::String,
            HostType::Time => NullWrapper::Time,
            _ => return None,
        })
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.go_name())
    }
}

/// Protobuf scalar types used on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireType {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float,
    Double,
    Bool,
    String,
    Repeated(Box<WireType>),
}

impl WireType {
    /// `.proto` spelling, `repeated` included.
    pub fn proto_name(&self) -> String {
        match self {
            WireType::Repeated(inner) => format!("repeated {}", inner.proto_name()),
            scalar => scalar.scalar_name().to_string(),
        }
    }

    /// Scalar name without the `repeated` label.
    pub fn scalar_name(&self) -> &'static str {
        match self {
            WireType::Int32 => "int32",
            WireType::Int64 => "int64",
            WireType::UInt32 => "uint32",
            WireType::UInt64 => "uint64",
            WireType::Float => "float",
            WireType::Double => "double",
            WireType::Bool => "bool",
            WireType::String => "string",
            WireType::Repeated(inner) => inner.scalar_name(),
        }
    }

    /// Go type protoc-gen-go generates for the field.
    pub fn go_name(&self) -> String {
        match self {
            WireType::Float => "float32".into(),
            WireType::Double => "float64".into(),
            WireType::Repeated(inner) => format!("[]{}", inner.go_name()),
            scalar => scalar.scalar_name().to_string(),
        }
    }

    /// Zero literal for the generated Go field.
    pub fn zero_literal(&self) -> &'static str {
        match self {
            WireType::Bool => "false",
            WireType::String => "\"\"",
            WireType::Repeated(_) => "nil",
            _ => "0",
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, WireType::String)
    }

    pub fn is_repeated(&self) -> bool {
        matches!(self, WireType::Repeated(_))
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.proto_name())
    }
}

/// Native types that need a value-object host representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteKind {
    Decimal,
    Json,
    Bool,
}

/// A rewrite resolved against configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRewrite {
    pub kind: RewriteKind,
    /// Qualified Go type, e.g. `sqltypes.Decimal`.
    pub type_name: String,
    pub module: String,
}

impl TypeRewrite {
    /// Text-backed rewrites travel as strings on the wire.
    pub fn is_text_backed(&self) -> bool {
        matches!(self.kind, RewriteKind::Decimal | RewriteKind::Json)
    }
}

/// How a nullable column is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NullForm {
    Plain,
    Wrapper(NullWrapper),
    Pointer,
}

/// `database/sql` nullable scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NullWrapper {
    Byte,
    Int16,
    Int32,
    Int64,
    Float64,
    Bool,
    String,
    Time,
}

impl NullWrapper {
    pub const ALL: [NullWrapper; 8] = [
        NullWrapper::Byte,
        NullWrapper::Int16,
        NullWrapper::Int32,
        NullWrapper::Int64,
        NullWrapper::Float64,
        NullWrapper::Bool,
        NullWrapper::String,
        NullWrapper::Time,
    ];

    pub fn go_name(&self) -> &'static str {
        match self {
            NullWrapper::Byte => "sql.NullByte",
            NullWrapper::Int16 => "sql.NullInt16",
            NullWrapper::Int32 => "sql.NullInt32",
            NullWrapper::Int64 => "sql.NullInt64",
            NullWrapper::Float64 => "sql.NullFloat64",
            NullWrapper::Bool => "sql.NullBool",
            NullWrapper::String => "sql.NullString",
            NullWrapper::Time => "sql.NullTime",
        }
    }
}

/// The Go value shape of an entity field.
///
/// Zero literal and non-zero predicate are both defined here so they cannot
/// drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Numeric,
    Text,
    Flag,
    Bytes,
    Slice,
    TimePtr,
    ObjectId,
    Wrapper(NullWrapper),
    Pointer,
    Nilable,
}

impl ValueShape {
    pub fn zero_literal(&self) -> String {
        match self {
            ValueShape::Numeric => "0".into(),
            ValueShape::Text => "\"\"".into(),
            ValueShape::Flag => "false".into(),
            ValueShape::Bytes => "[]byte{}".into(),
            ValueShape::ObjectId => "primitive.NilObjectID".into(),
            ValueShape::Wrapper(w) => format!("{}{{}}", w.go_name()),
            ValueShape::Slice | ValueShape::TimePtr | ValueShape::Pointer | ValueShape::Nilable => {
                "nil".into()
            }
        }
    }

    /// Go expression true when `access` differs from the zero literal.
    pub fn non_zero(&self, access: &str) -> String {
        match self {
            ValueShape::Numeric => format!("{access} != 0"),
            ValueShape::Text => format!("{access} != \"\""),
            ValueShape::Flag => access.to_string(),
            ValueShape::Bytes | ValueShape::Slice => {
                format!("{access} != nil && len({access}) > 0")
            }
            ValueShape::TimePtr => format!("{access} != nil && !{access}.IsZero()"),
            ValueShape::ObjectId => format!("{access} != primitive.NilObjectID"),
            ValueShape::Wrapper(_) => format!("{access}.Valid"),
            ValueShape::Pointer | ValueShape::Nilable => format!("{access} != nil"),
        }
    }
}

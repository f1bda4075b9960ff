//! Typed-value tree and semantic accessors

use std::collections::BTreeMap;
use std::fmt;

use amm_core::DecodeError;

use crate::principal::Principal;

/// Decoded ledger value. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Int(i128),
    UInt(u128),
    Bool(bool),
    Buffer(Vec<u8>),
    Text(String),
    Principal(Principal),
    Optional(Option<Box<TypedValue>>),
    Response(Result<Box<TypedValue>, Box<TypedValue>>),
    List(Vec<TypedValue>),
    Tuple(BTreeMap<String, TypedValue>),
}

impl TypedValue {
    pub fn some(value: TypedValue) -> Self {
        Self::Optional(Some(Box::new(value)))
    }

    pub fn none() -> Self {
        Self::Optional(None)
    }

    pub fn ok(value: TypedValue) -> Self {
        Self::Response(Ok(Box::new(value)))
    }

    pub fn err(value: TypedValue) -> Self {
        Self::Response(Err(Box::new(value)))
    }

    pub fn tuple<K: Into<String>>(fields: impl IntoIterator<Item = (K, TypedValue)>) -> Self {
        Self::Tuple(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Kind name used in mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Bool(_) => "bool",
            Self::Buffer(_) => "buffer",
            Self::Text(_) => "text",
            Self::Principal(_) => "principal",
            Self::Optional(_) => "optional",
            Self::Response(_) => "response",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
        }
    }

    fn mismatch(&self, expected: &'static str) -> DecodeError {
        DecodeError::TagMismatch {
            expected,
            found: self.kind(),
        }
    }

    /// Strip an `ok` wrapper if present; anything else but `err` passes through.
    ///
    /// Some ledger-client releases omit the wrapper on read-only success, so
    /// a bare value is accepted. An `err` is always surfaced.
    pub fn unwrap_response(&self) -> Result<&TypedValue, DecodeError> {
        match self {
            Self::Response(Ok(inner)) => Ok(inner.as_ref()),
            Self::Response(Err(inner)) => Err(DecodeError::ErrResponse(inner.to_string())),
            other => Ok(other),
        }
    }

    /// Strip a present `some`; `none` and non-optionals pass through.
    pub fn unwrap_optional_some(&self) -> &TypedValue {
        match self {
            Self::Optional(Some(inner)) => inner.as_ref(),
            other => other,
        }
    }

    /// Strip `ok` then `some`. `None` when the optional layer is `none`.
    pub fn unwrap_layers(&self) -> Result<Option<&TypedValue>, DecodeError> {
        match self.unwrap_response()? {
            Self::Optional(None) => Ok(None),
            other => Ok(Some(other.unwrap_optional_some())),
        }
    }

    pub fn as_tuple(&self) -> Result<&BTreeMap<String, TypedValue>, DecodeError> {
        match self {
            Self::Tuple(fields) => Ok(fields),
            other => Err(other.mismatch("tuple")),
        }
    }

    pub fn as_buffer(&self) -> Result<&[u8], DecodeError> {
        match self {
            Self::Buffer(bytes) => Ok(bytes.as_slice()),
            other => Err(other.mismatch("buffer")),
        }
    }

    pub fn as_uint(&self) -> Result<u128, DecodeError> {
        match self {
            Self::UInt(v) => Ok(*v),
            other => Err(other.mismatch("uint")),
        }
    }

    pub fn as_int(&self) -> Result<i128, DecodeError> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(other.mismatch("int")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, DecodeError> {
        match self {
            Self::Bool(v) => Ok(*v),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_text(&self) -> Result<&str, DecodeError> {
        match self {
            Self::Text(s) => Ok(s.as_str()),
            other => Err(other.mismatch("text")),
        }
    }

    pub fn as_principal(&self) -> Result<&Principal, DecodeError> {
        match self {
            Self::Principal(p) => Ok(p),
            other => Err(other.mismatch("principal")),
        }
    }

    pub fn as_list(&self) -> Result<&[TypedValue], DecodeError> {
        match self {
            Self::List(items) => Ok(items.as_slice()),
            other => Err(other.mismatch("list")),
        }
    }

    /// Named tuple member
    pub fn field(&self, name: &str) -> Result<&TypedValue, DecodeError> {
        self.as_tuple()?
            .get(name)
            .ok_or_else(|| DecodeError::MissingField(name.to_string()))
    }

    /// Named tuple member, `None` when absent
    pub fn opt_field(&self, name: &str) -> Result<Option<&TypedValue>, DecodeError> {
        Ok(self.as_tuple()?.get(name))
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "u{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Buffer(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Self::Text(s) => write!(f, "{:?}", s),
            Self::Principal(p) => write!(f, "'{}", p),
            Self::Optional(None) => write!(f, "none"),
            Self::Optional(Some(inner)) => write!(f, "(some {})", inner),
            Self::Response(Ok(inner)) => write!(f, "(ok {})", inner),
            Self::Response(Err(inner)) => write!(f, "(err {})", inner),
            Self::List(items) => {
                write!(f, "(list")?;
                for item in items {
                    write!(f, " {}", item)?;
                }
                write!(f, ")")
            }
            Self::Tuple(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

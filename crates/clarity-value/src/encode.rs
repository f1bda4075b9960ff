//! Binary typed-value encoding, used for read-only call arguments

use amm_core::ValidationError;

use crate::tags::Tag;
use crate::value::TypedValue;

/// Longest tuple field name the wire format carries
pub const MAX_FIELD_NAME_LEN: usize = 128;

impl TypedValue {
    /// Consensus serialization. Tuple fields are written in sorted name order.
    pub fn serialize(&self) -> Result<Vec<u8>, ValidationError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// `0x`-prefixed hex of [`TypedValue::serialize`]
    pub fn to_hex(&self) -> Result<String, ValidationError> {
        Ok(format!("0x{}", hex::encode(self.serialize()?)))
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<(), ValidationError> {
        match self {
            Self::Int(v) => {
                out.push(Tag::Int.prefix());
                out.extend_from_slice(&v.to_be_bytes());
            }
            Self::UInt(v) => {
                out.push(Tag::UInt.prefix());
                out.extend_from_slice(&v.to_be_bytes());
            }
            Self::Bool(true) => out.push(Tag::True.prefix()),
            Self::Bool(false) => out.push(Tag::False.prefix()),
            Self::Buffer(bytes) => {
                out.push(Tag::Buffer.prefix());
                write_sized(out, bytes)?;
            }
            Self::Text(s) => {
                let tag = if s.is_ascii() {
                    Tag::StringAscii
                } else {
                    Tag::StringUtf8
                };
                out.push(tag.prefix());
                write_sized(out, s.as_bytes())?;
            }
            Self::Principal(p) => p.write_consensus(out),
            Self::Optional(None) => out.push(Tag::OptionalNone.prefix()),
            Self::Optional(Some(inner)) => {
                out.push(Tag::OptionalSome.prefix());
                inner.write_to(out)?;
            }
            Self::Response(Ok(inner)) => {
                out.push(Tag::ResponseOk.prefix());
                inner.write_to(out)?;
            }
            Self::Response(Err(inner)) => {
                out.push(Tag::ResponseErr.prefix());
                inner.write_to(out)?;
            }
            Self::List(items) => {
                out.push(Tag::List.prefix());
                out.extend_from_slice(&length_u32(items.len())?.to_be_bytes());
                for item in items {
                    item.write_to(out)?;
                }
            }
            Self::Tuple(fields) => {
                out.push(Tag::Tuple.prefix());
                out.extend_from_slice(&length_u32(fields.len())?.to_be_bytes());
                for (name, value) in fields {
                    if name.is_empty() || name.len() > MAX_FIELD_NAME_LEN {
                        return Err(ValidationError::InvalidIdentifier {
                            value: name.clone(),
                            reason: format!("tuple field name must be 1-{} bytes", MAX_FIELD_NAME_LEN),
                        });
                    }
                    out.push(name.len() as u8);
                    out.extend_from_slice(name.as_bytes());
                    value.write_to(out)?;
                }
            }
        }
        Ok(())
    }
}

fn length_u32(len: usize) -> Result<u32, ValidationError> {
    u32::try_from(len).map_err(|_| ValidationError::InvalidAmount {
        message: format!("length {} exceeds u32", len),
    })
}

fn write_sized(out: &mut Vec<u8>, bytes: &[u8]) -> Result<(), ValidationError> {
    out.extend_from_slice(&length_u32(bytes.len())?.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

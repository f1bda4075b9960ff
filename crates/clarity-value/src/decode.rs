//! Binary typed-value decoding
//!
//! Consensus wire format, one type prefix byte per value:
//! ```text
//! 0x00 int          <i128 BE:16>
//! 0x01 uint         <u128 BE:16>
//! 0x02 buffer       <len:u32 BE> <bytes>
//! 0x03/0x04         true / false
//! 0x05/0x06         standard / contract principal
//! 0x07/0x08         (ok v) / (err v)
//! 0x09/0x0a         none / (some v)
//! 0x0b list         <count:u32 BE> <values>
//! 0x0c tuple        <count:u32 BE> (<name len:u8> <name> <value>)*
//! 0x0d/0x0e         string-ascii / string-utf8, <len:u32 BE> <bytes>
//! ```

use std::collections::BTreeMap;

use amm_core::DecodeError;

use crate::principal::{validate_contract_name, Principal, StandardPrincipal};
use crate::tags::Tag;
use crate::value::TypedValue;

/// Maximum nesting depth accepted while decoding
pub const MAX_DEPTH: usize = 32;

/// Decode one complete value. Trailing bytes are an error; nothing partial is returned.
pub fn normalize(bytes: &[u8]) -> Result<TypedValue, DecodeError> {
    let mut cursor = Cursor { bytes, pos: 0 };
    let value = cursor.read_value(0)?;
    let remaining = cursor.remaining();
    if remaining != 0 {
        return Err(DecodeError::TrailingBytes(remaining));
    }
    Ok(value)
}

/// Decode a hex string, with or without a `0x` prefix.
pub fn normalize_hex(hex_str: &str) -> Result<TypedValue, DecodeError> {
    let trimmed = hex_str.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|_| DecodeError::InvalidHex)?;
    normalize(&bytes)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf))
    }

    fn read_16(&mut self) -> Result<[u8; 16], DecodeError> {
        let mut buf = [0u8; 16];
        buf.copy_from_slice(self.take(16)?);
        Ok(buf)
    }

    /// Length-prefixed byte run, bounds-checked before slicing
    fn read_sized(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    fn read_standard_principal(&mut self) -> Result<StandardPrincipal, DecodeError> {
        let version = self.read_u8()?;
        let mut hash160 = [0u8; 20];
        hash160.copy_from_slice(self.take(20)?);
        StandardPrincipal::new(version, hash160)
    }

    fn read_value(&mut self, depth: usize) -> Result<TypedValue, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::DepthExceeded(MAX_DEPTH));
        }

        let prefix = self.read_u8()?;
        let tag = Tag::from_prefix(prefix).ok_or(DecodeError::UnknownTypePrefix(prefix))?;

        let value = match tag {
            Tag::Int => TypedValue::Int(i128::from_be_bytes(self.read_16()?)),
            Tag::UInt => TypedValue::UInt(u128::from_be_bytes(self.read_16()?)),
            Tag::Buffer => TypedValue::Buffer(self.read_sized()?.to_vec()),
            Tag::True => TypedValue::Bool(true),
            Tag::False => TypedValue::Bool(false),
            Tag::StandardPrincipal => {
                TypedValue::Principal(Principal::Standard(self.read_standard_principal()?))
            }
            Tag::ContractPrincipal => {
                let issuer = self.read_standard_principal()?;
                let len = self.read_u8()? as usize;
                let name = std::str::from_utf8(self.take(len)?)
                    .map_err(|_| DecodeError::InvalidString { kind: "contract name" })?;
                validate_contract_name(name)?;
                TypedValue::Principal(Principal::Contract(issuer, name.to_string()))
            }
            Tag::ResponseOk => TypedValue::ok(self.read_value(depth + 1)?),
            Tag::ResponseErr => TypedValue::err(self.read_value(depth + 1)?),
            Tag::OptionalNone => TypedValue::none(),
            Tag::OptionalSome => TypedValue::some(self.read_value(depth + 1)?),
            Tag::List => {
                let count = self.read_u32()? as usize;
                // Every element takes at least one byte
                if count > self.remaining() {
                    return Err(DecodeError::UnexpectedEof {
                        needed: count,
                        remaining: self.remaining(),
                    });
                }
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.read_value(depth + 1)?);
                }
                TypedValue::List(items)
            }
            Tag::Tuple => {
                let count = self.read_u32()? as usize;
                let mut fields = BTreeMap::new();
                for _ in 0..count {
                    let name_len = self.read_u8()? as usize;
                    let name = std::str::from_utf8(self.take(name_len)?)
                        .map_err(|_| DecodeError::InvalidString { kind: "tuple field" })?
                        .to_string();
                    let value = self.read_value(depth + 1)?;
                    if fields.contains_key(&name) {
                        return Err(DecodeError::DuplicateField(name));
                    }
                    fields.insert(name, value);
                }
                TypedValue::Tuple(fields)
            }
            Tag::StringAscii => {
                let bytes = self.read_sized()?;
                if !bytes.is_ascii() {
                    return Err(DecodeError::InvalidString { kind: "ascii" });
                }
                TypedValue::Text(String::from_utf8_lossy(bytes).into_owned())
            }
            Tag::StringUtf8 => {
                let text = std::str::from_utf8(self.read_sized()?)
                    .map_err(|_| DecodeError::InvalidString { kind: "utf8" })?;
                TypedValue::Text(text.to_string())
            }
            // from_prefix never yields the textual-only tags
            Tag::Bool | Tag::Principal | Tag::Optional | Tag::Response => {
                return Err(DecodeError::UnknownTypePrefix(prefix))
            }
        };

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_uint() {
        let v = normalize_hex("0x0100000000000000000000000000000006").unwrap();
        assert_eq!(v, TypedValue::UInt(6));
    }

    #[test]
    fn test_decode_ok_some_buffer() {
        // (ok (some 0xdeadbeef))
        let v = normalize_hex("070a0200000004deadbeef").unwrap();
        assert_eq!(
            v.unwrap_layers().unwrap().unwrap().as_buffer().unwrap(),
            &[0xde, 0xad, 0xbe, 0xef]
        );
    }

    #[test]
    fn test_decode_tuple_print_payload() {
        // {action: "create-pool", fee: u30}
        let mut bytes = vec![0x0c, 0, 0, 0, 2];
        bytes.push(6);
        bytes.extend_from_slice(b"action");
        bytes.push(0x0d);
        bytes.extend_from_slice(&11u32.to_be_bytes());
        bytes.extend_from_slice(b"create-pool");
        bytes.push(3);
        bytes.extend_from_slice(b"fee");
        bytes.push(0x01);
        bytes.extend_from_slice(&30u128.to_be_bytes());

        let v = normalize(&bytes).unwrap();
        assert_eq!(v.field("action").unwrap().as_text().unwrap(), "create-pool");
        assert_eq!(v.field("fee").unwrap().as_uint().unwrap(), 30);
    }

    #[test]
    fn test_decode_bools_and_none() {
        assert_eq!(normalize(&[0x03]).unwrap(), TypedValue::Bool(true));
        assert_eq!(normalize(&[0x04]).unwrap(), TypedValue::Bool(false));
        assert_eq!(normalize(&[0x09]).unwrap(), TypedValue::none());
        assert_eq!(
            normalize(&[0x08, 0x03]).unwrap(),
            TypedValue::err(TypedValue::Bool(true))
        );
    }

    #[test]
    fn test_decode_negative_int() {
        let mut bytes = vec![0x00];
        bytes.extend_from_slice(&(-5i128).to_be_bytes());
        assert_eq!(normalize(&bytes).unwrap(), TypedValue::Int(-5));
    }

    #[test]
    fn test_truncated_input_fails() {
        assert!(matches!(
            normalize_hex("0x01000000"),
            Err(DecodeError::UnexpectedEof { .. })
        ));
        // buffer claims 4 bytes, carries 2
        assert!(matches!(
            normalize_hex("020000000401ff"),
            Err(DecodeError::UnexpectedEof { needed: 4, remaining: 2 })
        ));
        assert!(normalize(&[]).is_err());
    }

    #[test]
    fn test_trailing_bytes_fail() {
        assert_eq!(normalize(&[0x03, 0x03]), Err(DecodeError::TrailingBytes(1)));
    }

    #[test]
    fn test_unknown_prefix() {
        assert_eq!(normalize(&[0x42]), Err(DecodeError::UnknownTypePrefix(0x42)));
    }

    #[test]
    fn test_invalid_hex() {
        assert_eq!(normalize_hex("0xzz"), Err(DecodeError::InvalidHex));
    }

    #[test]
    fn test_depth_limit() {
        let mut bytes = vec![0x0a; MAX_DEPTH + 2];
        bytes.push(0x03);
        assert_eq!(
            normalize(&bytes),
            Err(DecodeError::DepthExceeded(MAX_DEPTH))
        );
    }

    #[test]
    fn test_list_count_exceeding_input() {
        assert!(matches!(
            normalize_hex("0bffffffff03"),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_non_ascii_in_ascii_string() {
        assert_eq!(
            normalize_hex("0d00000001ff"),
            Err(DecodeError::InvalidString { kind: "ascii" })
        );
    }

    #[test]
    fn test_duplicate_tuple_field_rejected() {
        // {fee: u30, fee: u100}
        let mut bytes = vec![0x0c, 0, 0, 0, 2];
        for fee in [30u128, 100] {
            bytes.push(3);
            bytes.extend_from_slice(b"fee");
            bytes.push(0x01);
            bytes.extend_from_slice(&fee.to_be_bytes());
        }
        assert_eq!(
            normalize(&bytes),
            Err(DecodeError::DuplicateField("fee".into()))
        );
    }

    #[test]
    fn test_principal_version_out_of_range() {
        let mut bytes = vec![0x05, 22];
        bytes.extend_from_slice(&[0xa4; 20]);
        assert!(matches!(normalize(&bytes), Ok(TypedValue::Principal(_))));

        bytes[1] = 0x3f;
        assert!(matches!(
            normalize(&bytes),
            Err(DecodeError::InvalidPrincipal(_))
        ));
    }
}

/// Plutus-data CBOR helpers shared by the pool readers and datum builders.
use anyhow::{anyhow, Result};
use ciborium::value::{Integer, Value};
use num_bigint::BigUint;

use crate::error::DatumError;

/// Extract the inner field array from a Plutus constructor tag.
/// Plutus constructors are CBOR-tagged values: Tag(121+alt, Array([fields...])).
pub fn constr_fields(v: &Value) -> Result<&Vec<Value>> {
    match v {
        Value::Tag(_, inner) => match inner.as_ref() {
            Value::Array(fields) => Ok(fields),
            _ => Err(anyhow!("Expected array inside constr tag")),
        },
        _ => Err(anyhow!("Expected CBOR tag for constr, got {:?}", v)),
    }
}

/// Constructor index of a Plutus constr value.
pub fn constr_alternative(v: &Value) -> Option<u64> {
    match v {
        Value::Tag(tag @ 121..=127, _) => Some(tag - 121),
        Value::Tag(tag @ 1280..=1400, _) => Some(tag - 1280 + 7),
        _ => None,
    }
}

/// Read a u64 from a ciborium Integer value.
pub fn value_to_u64(v: &Value) -> Result<u64> {
    match v {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            if n < 0 {
                Err(anyhow!("Negative integer where u64 expected: {}", n))
            } else {
                Ok(n as u64)
            }
        }
        _ => Err(anyhow!("Expected integer, got {:?}", v)),
    }
}

/// Read a non-negative integer, including CBOR bignums (tag 2).
pub fn value_to_biguint(v: &Value) -> Result<BigUint> {
    match v {
        Value::Tag(2, inner) => match inner.as_ref() {
            Value::Bytes(b) => Ok(BigUint::from_bytes_be(b)),
            _ => Err(anyhow!("Expected bytes inside bignum tag")),
        },
        _ => value_to_u64(v).map(BigUint::from),
    }
}

/// Read bytes from a ciborium Bytes value and return them as a lowercase hex string.
pub fn value_to_hex(v: &Value) -> Result<String> {
    match v {
        Value::Bytes(b) => Ok(hex::encode(b)),
        _ => Err(anyhow!("Expected bytes, got {:?}", v)),
    }
}

/// Parse the two-element pair that represents a Cardano asset: (policy_bytes, name_bytes).
/// Accepts both the constr and the plain list encoding.
pub fn parse_asset_pair(v: &Value) -> Result<(String, String)> {
    let fields = match v {
        Value::Array(items) => items,
        _ => constr_fields(v)?,
    };
    if fields.len() != 2 {
        return Err(anyhow!("Asset pair expected 2 fields, got {}", fields.len()));
    }
    let policy = value_to_hex(&fields[0])?;
    let name = value_to_hex(&fields[1])?;
    Ok((policy, name))
}

/// Decode a CBOR hex string into a ciborium Value.
pub fn decode_cbor(cbor_hex: &str) -> Result<Value> {
    let bytes = hex::decode(cbor_hex)?;
    ciborium::de::from_reader(bytes.as_slice()).map_err(|e| anyhow!("CBOR decode error: {}", e))
}

/// Encode a Value as CBOR hex.
pub fn encode_cbor(value: &Value) -> Result<String, DatumError> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf).map_err(|e| DatumError::Encoding(e.to_string()))?;
    Ok(hex::encode(buf))
}

/// Plutus constructor `alt` with `fields`.
pub fn constr(alt: u64, fields: Vec<Value>) -> Value {
    let tag = if alt < 7 { 121 + alt } else { 1280 + alt - 7 };
    Value::Tag(tag, Box::new(Value::Array(fields)))
}

/// `Some(value)` / `None` in the Plutus `Option` encoding.
pub fn option(value: Option<Value>) -> Value {
    match value {
        Some(v) => constr(0, vec![v]),
        None => constr(1, vec![]),
    }
}

pub fn int(n: u64) -> Value {
    Value::Integer(Integer::from(n))
}

/// Non-negative integer; values beyond u64 become CBOR bignums.
pub fn big_int(n: &BigUint) -> Value {
    match u64::try_from(n) {
        Ok(small) => int(small),
        Err(_) => Value::Tag(2, Box::new(Value::Bytes(n.to_bytes_be()))),
    }
}

/// Byte string from hex; `field` names the value in the error.
pub fn bytes_from_hex(field: &'static str, hex_str: &str) -> Result<Value, DatumError> {
    hex::decode(hex_str)
        .map(Value::Bytes)
        .map_err(|_| DatumError::InvalidHex {
            field,
            value: hex_str.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constr_tags() {
        assert_eq!(constr_alternative(&constr(0, vec![])), Some(0));
        assert_eq!(constr_alternative(&constr(6, vec![])), Some(6));
        assert_eq!(constr_alternative(&constr(7, vec![])), Some(7));
        assert_eq!(constr_alternative(&int(3)), None);
    }

    #[test]
    fn test_encode_decode_constr() {
        let value = constr(1, vec![int(42), bytes_from_hex("test", "beef").unwrap()]);
        let hex = encode_cbor(&value).unwrap();
        assert_eq!(hex, "d87a82182a42beef");
        let decoded = decode_cbor(&hex).unwrap();
        let fields = constr_fields(&decoded).unwrap();
        assert_eq!(value_to_u64(&fields[0]).unwrap(), 42);
        assert_eq!(value_to_hex(&fields[1]).unwrap(), "beef");
    }

    #[test]
    fn test_big_int_beyond_u64() {
        let n = BigUint::from(u64::MAX) * 4u32;
        let value = big_int(&n);
        assert!(matches!(value, Value::Tag(2, _)));
        assert_eq!(value_to_biguint(&value).unwrap(), n);
        assert_eq!(value_to_biguint(&big_int(&BigUint::from(9u32))).unwrap(), BigUint::from(9u32));
    }

    #[test]
    fn test_bytes_from_hex_rejects_invalid() {
        assert!(bytes_from_hex("ident", "xyz").is_err());
    }
}

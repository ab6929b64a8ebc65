use std::fmt;

use anyhow::{anyhow, Result};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};

use crate::error::DatumError;

type Blake2b256 = Blake2b<U32>;

pub fn remove_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url[..url.len() - 1].to_string()
    } else {
        url.to_string()
    }
}

/// blake2b-256 of `bytes`, the hash Cardano uses for datums.
pub fn blake2b_256(bytes: &[u8]) -> [u8; 32] {
    Blake2b256::digest(bytes).into()
}

/// Datum hash (hex) of a cbor-hex datum.
pub fn datum_hash_hex(cbor_hex: &str) -> Result<String, DatumError> {
    let bytes = hex::decode(cbor_hex).map_err(|_| DatumError::InvalidHex {
        field: "datum cbor",
        value: cbor_hex.to_string(),
    })?;
    Ok(hex::encode(blake2b_256(&bytes)))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn id(&self) -> u8 {
        match self {
            Network::Mainnet => 1,
            Network::Testnet => 0,
        }
    }

    pub fn address_hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "addr",
            Network::Testnet => "addr_test",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" | "preview" | "preprod" => Ok(Network::Testnet),
            other => Err(format!("unknown network '{}'", other)),
        }
    }
}

/// Payment or staking credential, hash in hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Key(String),
    Script(String),
}

/// A decoded Shelley base or enterprise address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelleyAddress {
    pub network_id: u8,
    pub payment: Credential,
    pub stake: Option<Credential>,
}

/// Decode a bech32 Shelley address into its credentials.
///
/// Header byte: upper nibble is the address type, lower nibble the network
/// id. Types 0-3 are base addresses (payment + stake, 57 bytes), 6-7 are
/// enterprise addresses (29 bytes). Pointer, reward and Byron addresses are
/// rejected.
pub fn decode_address(address: &str) -> Result<ShelleyAddress, DatumError> {
    let invalid = |reason: String| DatumError::InvalidAddress {
        address: address.to_string(),
        reason,
    };
    let (_, bytes) = bech32::decode(address).map_err(|e| invalid(e.to_string()))?;
    let header = *bytes.first().ok_or_else(|| invalid("empty payload".to_string()))?;
    let addr_type = header >> 4;
    let network_id = header & 0x0f;

    let expected_len = match addr_type {
        0..=3 => 57,
        6 | 7 => 29,
        other => return Err(invalid(format!("unsupported address type {}", other))),
    };
    if bytes.len() != expected_len {
        return Err(invalid(format!(
            "expected {} bytes for type {}, got {}",
            expected_len,
            addr_type,
            bytes.len()
        )));
    }

    let payment_hash = hex::encode(&bytes[1..29]);
    let payment = if addr_type % 2 == 0 {
        Credential::Key(payment_hash)
    } else {
        Credential::Script(payment_hash)
    };
    let stake = (expected_len == 57).then(|| {
        let stake_hash = hex::encode(&bytes[29..57]);
        if addr_type < 2 {
            Credential::Key(stake_hash)
        } else {
            Credential::Script(stake_hash)
        }
    });

    Ok(ShelleyAddress {
        network_id,
        payment,
        stake,
    })
}

/// Convert a Plutus script hash (28 bytes hex) to an enterprise script address.
///
/// Header byte: upper nibble 0111 = type 7 (script credential, no staking),
/// lower nibble = network id.
pub fn script_hash_to_address(script_hash_hex: &str, network: Network) -> Result<String> {
    let hash_bytes = hex::decode(script_hash_hex)
        .map_err(|e| anyhow!("invalid script hash hex: {}", e))?;
    if hash_bytes.len() != 28 {
        return Err(anyhow!(
            "script hash must be 28 bytes, got {}",
            hash_bytes.len()
        ));
    }
    let mut payload = Vec::with_capacity(29);
    payload.push(0x70 | network.id());
    payload.extend_from_slice(&hash_bytes);
    let hrp = bech32::Hrp::parse(network.address_hrp())
        .map_err(|e| anyhow!("bech32 HRP error: {}", e))?;
    bech32::encode::<bech32::Bech32>(hrp, &payload)
        .map_err(|e| anyhow!("bech32 encode error: {}", e))
}

pub async fn retry<T, E, F, Fut>(mut retries: u32, base_delay_ms: u64, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    let mut attempt = 0u32;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if retries == 0 => return Err(e),
            Err(e) => {
                // Exponential backoff: base_delay * 2^attempt, capped at 30s
                let delay = (base_delay_ms * (1u64 << attempt.min(5))).min(30_000);
                tracing::warn!(attempt = attempt + 1, delay_ms = delay, error = ?e, "request failed, retrying");
                tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
                retries -= 1;
                attempt += 1;
            }
        }
    }
}

/// Serialize big integers as decimal strings; accept strings or numbers.
pub mod serde_biguint {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Q {
            Str(String),
            Num(u64),
        }
        match Q::deserialize(deserializer)? {
            Q::Str(s) => s.parse().map_err(serde::de::Error::custom),
            Q::Num(n) => Ok(BigUint::from(n)),
        }
    }
}

/// Mainnet base address with key credentials filled with `payment` and
/// `stake` bytes.
#[cfg(test)]
pub(crate) fn test_key_address(payment: u8, stake: u8) -> String {
    let mut payload = vec![0x01];
    payload.extend_from_slice(&[payment; 28]);
    payload.extend_from_slice(&[stake; 28]);
    let hrp = bech32::Hrp::parse("addr").unwrap();
    bech32::encode::<bech32::Bech32>(hrp, &payload).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_hash_to_address_known_addresses() {
        let addr1 = script_hash_to_address(
            "ea07914e72654ca5a5c5e26a95596e6fa0b5c4c317e43e2f92457ea1",
            Network::Mainnet,
        )
        .unwrap();
        assert_eq!(
            addr1,
            "addr1w84q0y2wwfj5efd9ch3x492edeh6pdwycvt7g030jfzhagg5ftr54"
        );

        let addr2 = script_hash_to_address(
            "8c66f1ac8b57debcab9a07b3b9b0a5595a5ad76e3bcae756c82efe4f",
            Network::Mainnet,
        )
        .unwrap();
        assert_eq!(
            addr2,
            "addr1wxxxdudv3dtaa09tngrm8wds54v45kkhdcau4e6keqh0uncksc7pn"
        );
    }

    #[test]
    fn test_script_hash_to_address_invalid_input() {
        assert!(script_hash_to_address("abcd", Network::Mainnet).is_err());
        assert!(script_hash_to_address(
            "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz",
            Network::Mainnet
        )
        .is_err());
    }

    #[test]
    fn test_decode_address_round_trips_script_address() {
        let hash = "ea07914e72654ca5a5c5e26a95596e6fa0b5c4c317e43e2f92457ea1";
        let testnet = script_hash_to_address(hash, Network::Testnet).unwrap();
        assert!(testnet.starts_with("addr_test1w"));
        let decoded = decode_address(&testnet).unwrap();
        assert_eq!(decoded.network_id, 0);
        assert_eq!(decoded.payment, Credential::Script(hash.to_string()));
        assert_eq!(decoded.stake, None);
    }

    #[test]
    fn test_decode_base_key_address() {
        let payment = [0x11u8; 28];
        let stake = [0x22u8; 28];
        let address = test_key_address(0x11, 0x22);

        let decoded = decode_address(&address).unwrap();
        assert_eq!(decoded.network_id, 1);
        assert_eq!(decoded.payment, Credential::Key(hex::encode(payment)));
        assert_eq!(decoded.stake, Some(Credential::Key(hex::encode(stake))));
    }

    #[test]
    fn test_decode_address_rejects_garbage() {
        assert!(decode_address("not-an-address").is_err());
    }

    #[test]
    fn test_blake2b_256_empty_input() {
        assert_eq!(
            hex::encode(blake2b_256(&[])),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }
}

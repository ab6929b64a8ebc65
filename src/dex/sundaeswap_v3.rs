use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ciborium::value::Value;
use num_bigint::BigUint;

use super::cbor::{
    big_int, bytes_from_hex, constr, constr_alternative, constr_fields, decode_cbor, int, option,
    parse_asset_pair, value_to_biguint, value_to_hex, value_to_u64,
};
use super::datum::{owner_key_hash, plutus_address};
use super::{asset_from_pair, reserve_of, PoolReader};
use crate::error::DatumError;
use crate::kupo::KupoApi;
use crate::models::{
    AssetAmount, AssetMetadata, ContractVersion, DestinationDatum, Fraction, Pool, SwapDatumArgs,
    Utxo,
};

// Two pool contract addresses: pools live at both
const POOL_ADDRESS_V1: &str =
    "addr1x8srqftqemf0mjlukfszd97ljuxdp44r372txfcr75wrz26rnxqnmtv3hdu2t6chcfhl2zzjh36a87nmd6dwsu3jenqsslnz7e";
const POOL_ADDRESS_V2: &str =
    "addr1z8srqftqemf0mjlukfszd97ljuxdp44r372txfcr75wrz2auzrlrz2kdd83wzt9u9n9qt2swgvhrmmn96k55nq6yuj4qw992w9";
/// Pool script hash; also the policy of pool NFTs and LP tokens.
const POOL_POLICY_ID: &str = "e0302560ced2fdcbfcb2602697df970cd0d6a38f94b32703f51c312b";
const POOL_NFT_PREFIX: &str = "000de140";
const POOL_LP_PREFIX: &str = "0014df10";
const IDENT_BYTES: usize = 28;

pub struct SundaeSwapV3 {
    kupo: KupoApi,
}

impl SundaeSwapV3 {
    pub fn new(kupo: KupoApi) -> Self {
        Self { kupo }
    }
}

/// Parsed SundaeSwapV3 pool datum.
///
/// Structure (constructor 0):
///   [0]: bytes, PoolIdentifier
///   [1]: list, [[policyA, nameA], [policyB, nameB]]
///   [2]: int, CirculatingLp (ignored)
///   [3]: int, BidFeesPer10Thousand (ignored)
///   [4]: int, AskFeesPer10Thousand
///   [5]:      FeeManager (ignored)
///   [6]: int, MarketOpen (ignored)
///   [7]: int, ProtocolFees, lovelace held in the pool but not tradeable
struct V3PoolDatum {
    ident: String,
    asset_a: AssetMetadata,
    asset_b: AssetMetadata,
    fee_bps: u64,
    protocol_fees: BigUint,
}

fn parse_pool_datum(cbor_hex: &str) -> Result<V3PoolDatum> {
    let value = decode_cbor(cbor_hex)?;
    let fields = constr_fields(&value)?;

    if fields.len() < 8 {
        return Err(anyhow!(
            "SundaeSwapV3 datum: expected >=8 fields, got {}",
            fields.len()
        ));
    }

    let ident = value_to_hex(&fields[0])?;
    let assets = match &fields[1] {
        Value::Array(items) => items,
        other => constr_fields(other)?,
    };
    if assets.len() != 2 {
        return Err(anyhow!("SundaeSwapV3 datum: expected 2 assets, got {}", assets.len()));
    }
    let (policy_a, name_a) = parse_asset_pair(&assets[0])?;
    let (policy_b, name_b) = parse_asset_pair(&assets[1])?;

    Ok(V3PoolDatum {
        ident,
        asset_a: asset_from_pair(&policy_a, &name_a),
        asset_b: asset_from_pair(&policy_b, &name_b),
        fee_bps: value_to_u64(&fields[4])?,
        protocol_fees: value_to_biguint(&fields[7])?,
    })
}

#[async_trait]
impl PoolReader for SundaeSwapV3 {
    fn version(&self) -> ContractVersion {
        ContractVersion::V3
    }

    fn kupo(&self) -> &KupoApi {
        &self.kupo
    }

    /// Fetch UTXOs from both pool addresses and merge.
    /// Kupo: bech32 addresses are queried directly (no /* wildcard)
    async fn pool_utxos(&self) -> Result<Vec<Utxo>> {
        let (v1, v2) = tokio::try_join!(
            self.kupo.get(POOL_ADDRESS_V1, true),
            self.kupo.get(POOL_ADDRESS_V2, true),
        )?;
        let mut all = v1;
        all.extend(v2);
        Ok(all)
    }

    fn pool_pattern(&self, ident: &str) -> String {
        format!("{}.{}{}", POOL_POLICY_ID, POOL_NFT_PREFIX, ident)
    }

    /// Reserves come from the output's value; the ADA side is reduced by the
    /// protocol fees the pool has accrued.
    fn pool_from_datum(&self, utxo: &Utxo, datum_cbor: &str) -> Result<Option<Pool>> {
        let datum = parse_pool_datum(datum_cbor)?;
        let nft = format!("{}{}{}", POOL_POLICY_ID, POOL_NFT_PREFIX, datum.ident);
        if utxo.get_asset(&nft).is_none() {
            return Ok(None);
        }

        let deduct = |asset: &AssetMetadata, reserve: BigUint| {
            if asset.is_ada() {
                if reserve > datum.protocol_fees {
                    reserve - &datum.protocol_fees
                } else {
                    BigUint::default()
                }
            } else {
                reserve
            }
        };
        let quantity_a = deduct(&datum.asset_a, reserve_of(utxo, &datum.asset_a));
        let quantity_b = deduct(&datum.asset_b, reserve_of(utxo, &datum.asset_b));
        let asset_lp = AssetMetadata::new(
            &format!("{}.{}{}", POOL_POLICY_ID, POOL_LP_PREFIX, datum.ident),
            0,
        );

        Ok(Some(Pool::new(
            &datum.ident,
            datum.asset_a,
            datum.asset_b,
            asset_lp,
            quantity_a,
            quantity_b,
            Fraction::from_bps(datum.fee_bps)?,
            ContractVersion::V3,
        )))
    }
}

fn ident_bytes(ident: &str) -> Result<Value, DatumError> {
    match hex::decode(ident) {
        Ok(bytes) if bytes.len() == IDENT_BYTES => Ok(Value::Bytes(bytes)),
        _ => Err(DatumError::InvalidIdent {
            ident: ident.to_string(),
            version: ContractVersion::V3,
        }),
    }
}

/// `(policy, name, amount)` as a plain list.
fn asset_tuple(amount: &AssetAmount) -> Result<Value, DatumError> {
    Ok(Value::Array(vec![
        bytes_from_hex("policy id", amount.metadata.policy_id())?,
        bytes_from_hex("asset name", amount.metadata.name_hex())?,
        big_int(&amount.amount),
    ]))
}

fn destination_datum(datum: &DestinationDatum) -> Result<Value, DatumError> {
    match datum {
        DestinationDatum::None => Ok(constr(0, vec![])),
        DestinationDatum::Hash(hash) => Ok(constr(1, vec![bytes_from_hex("datum hash", hash)?])),
        DestinationDatum::Inline(cbor) => {
            let data = decode_cbor(cbor).map_err(|_| DatumError::InvalidHex {
                field: "inline datum",
                value: cbor.clone(),
            })?;
            Ok(constr(2, vec![data]))
        }
    }
}

/// V3 swap order datum.
///
/// ```text
/// Constr0[ Some(ident), Signature(owner key hash), max protocol fee,
///          Fixed(address, destination datum), Swap(offer, min received),
///          extension ]
/// ```
pub fn swap_datum(args: &SwapDatumArgs) -> Result<Value, DatumError> {
    let ident = ident_bytes(&args.pool.ident)?;
    let owner = owner_key_hash(&args.owner_address)?;
    let destination = constr(
        0,
        vec![
            plutus_address(&args.destination.address)?,
            destination_datum(&args.destination.datum)?,
        ],
    );
    let swap = constr(
        1,
        vec![asset_tuple(&args.offered)?, asset_tuple(&args.min_received)?],
    );

    Ok(constr(
        0,
        vec![
            option(Some(ident)),
            constr(0, vec![bytes_from_hex("owner", &owner)?]),
            int(args.scooper_fee),
            destination,
            swap,
            constr(0, vec![]),
        ],
    ))
}

/// Datum hash committed in a V3 order's fixed destination.
pub fn destination_datum_hash(order: &Value) -> Option<String> {
    let fields = constr_fields(order).ok()?;
    let destination = constr_fields(fields.get(3)?).ok()?;
    let datum = destination.get(1)?;
    if constr_alternative(datum)? != 1 {
        return None;
    }
    value_to_hex(constr_fields(datum).ok()?.first()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::cbor::encode_cbor;
    use crate::models::Unit;

    const IDENT: &str = "64f35d26b237ad58e099041bc14c687ea7fdc58969d7d5b66e2540ef";
    const TOKEN_POLICY: &str = "f13ac4d66b3ee19a6aa0f2a22298737bd907cc95121662fc971b5275";
    const TOKEN_NAME: &str = "535452494b45";

    fn pool_datum_cbor(fee_bps: u64, protocol_fees: u64) -> String {
        let bytes = |h: &str| Value::Bytes(hex::decode(h).unwrap());
        let value = constr(
            0,
            vec![
                bytes(IDENT),
                Value::Array(vec![
                    Value::Array(vec![bytes(""), bytes("")]),
                    Value::Array(vec![bytes(TOKEN_POLICY), bytes(TOKEN_NAME)]),
                ]),
                int(1_000),
                int(fee_bps),
                int(fee_bps),
                option(None),
                int(0),
                int(protocol_fees),
            ],
        );
        encode_cbor(&value).unwrap()
    }

    fn pool_utxo(nft: &str) -> Utxo {
        let unit = |unit: String, quantity: &str| Unit {
            unit,
            quantity: quantity.to_string(),
        };
        Utxo {
            address: POOL_ADDRESS_V1.to_string(),
            tx_hash: "00".repeat(32),
            output_index: 0,
            amount: vec![
                unit("lovelace".to_string(), "502000000"),
                unit(format!("{}{}", POOL_POLICY_ID, nft), "1"),
                unit(format!("{}{}", TOKEN_POLICY, TOKEN_NAME), "250000000"),
            ],
            data_hash: Some("11".repeat(32)),
            reference_script_hash: None,
        }
    }

    fn reader() -> SundaeSwapV3 {
        SundaeSwapV3::new(KupoApi::with_client("http://localhost:1442", reqwest::Client::new()))
    }

    #[test]
    fn test_pool_from_datum_deducts_protocol_fees() {
        let utxo = pool_utxo(&format!("{}{}", POOL_NFT_PREFIX, IDENT));
        let pool = reader()
            .pool_from_datum(&utxo, &pool_datum_cbor(30, 2_000_000))
            .unwrap()
            .unwrap();

        assert_eq!(pool.ident, IDENT);
        assert!(pool.asset_a.is_ada());
        assert_eq!(pool.asset_b.asset_id, format!("{}.{}", TOKEN_POLICY, TOKEN_NAME));
        assert_eq!(pool.quantity_a, BigUint::from(500_000_000u64));
        assert_eq!(pool.quantity_b, BigUint::from(250_000_000u64));
        assert_eq!(pool.fee, Fraction::from_bps(30).unwrap());
        assert_eq!(pool.asset_lp.policy_id(), POOL_POLICY_ID);
        assert_eq!(pool.version, ContractVersion::V3);
    }

    #[test]
    fn test_pool_from_datum_requires_pool_nft() {
        let utxo = pool_utxo("000de140ffff");
        assert!(reader()
            .pool_from_datum(&utxo, &pool_datum_cbor(30, 0))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_pool_pattern() {
        assert_eq!(
            reader().pool_pattern(IDENT),
            format!("{}.000de140{}", POOL_POLICY_ID, IDENT)
        );
    }
}

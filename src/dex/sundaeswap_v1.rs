use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ciborium::value::Value;

use super::cbor::{
    big_int, bytes_from_hex, constr, constr_alternative, constr_fields, decode_cbor, int, option,
    parse_asset_pair, value_to_hex, value_to_u64,
};
use super::datum::{owner_key_hash, plutus_address};
use super::{asset_from_pair, reserve_of, PoolReader};
use crate::error::DatumError;
use crate::kupo::KupoApi;
use crate::models::{AssetMetadata, ContractVersion, DestinationDatum, Fraction, Pool, SwapDatumArgs, Utxo};

const POOL_ADDRESS: &str = "addr1w9qzpelu9hn45pefc0xr4ac4kdxeswq7pndul2vuj59u8tqaxdznu";
/// Policy of V1 pool NFTs (`"p " + ident`) and LP tokens (`"lp " + ident`).
const LP_TOKEN_POLICY_ID: &str = "0029cb7c88c7567b63d1a512c0ed626aa169688ec980730c0473b913";
const POOL_NFT_PREFIX: &str = "7020";
const POOL_LP_PREFIX: &str = "6c7020";

pub struct SundaeSwapV1 {
    kupo: KupoApi,
}

impl SundaeSwapV1 {
    pub fn new(kupo: KupoApi) -> Self {
        Self { kupo }
    }
}

/// Parsed SundaeSwapV1 pool datum.
///
/// Structure (constructor 0):
///   [0]: constr, asset pair: two sub-constrs { policy, name }
///   [1]: bytes, pool identifier
///   [2]: int, TotalLpTokens (ignored)
///   [3]: constr, fee: { LpFeeNumerator, LpFeeDenominator }
struct V1PoolDatum {
    ident: String,
    asset_a: AssetMetadata,
    asset_b: AssetMetadata,
    fee: Fraction,
}

fn parse_pool_datum(cbor_hex: &str) -> Result<V1PoolDatum> {
    let value = decode_cbor(cbor_hex)?;
    let fields = constr_fields(&value)?;

    if fields.len() < 4 {
        return Err(anyhow!("SundaeSwapV1 datum: expected >=4 fields, got {}", fields.len()));
    }

    let pair = constr_fields(&fields[0])?;
    if pair.len() != 2 {
        return Err(anyhow!("SundaeSwapV1 asset pair: expected 2 assets, got {}", pair.len()));
    }
    let (policy_a, name_a) = parse_asset_pair(&pair[0])?;
    let (policy_b, name_b) = parse_asset_pair(&pair[1])?;

    let ident = value_to_hex(&fields[1])?;

    // fields[3]: constr { numerator, denominator }
    let fee_fields = constr_fields(&fields[3])?;
    if fee_fields.len() < 2 {
        return Err(anyhow!("SundaeSwapV1 fee constr: expected 2 fields, got {}", fee_fields.len()));
    }
    let fee = Fraction::new(value_to_u64(&fee_fields[0])?, value_to_u64(&fee_fields[1])?)?;

    Ok(V1PoolDatum {
        ident,
        asset_a: asset_from_pair(&policy_a, &name_a),
        asset_b: asset_from_pair(&policy_b, &name_b),
        fee,
    })
}

#[async_trait]
impl PoolReader for SundaeSwapV1 {
    fn version(&self) -> ContractVersion {
        ContractVersion::V1
    }

    fn kupo(&self) -> &KupoApi {
        &self.kupo
    }

    async fn pool_utxos(&self) -> Result<Vec<Utxo>> {
        // Kupo: bech32 addresses are queried directly (no /* wildcard)
        self.kupo.get(POOL_ADDRESS, true).await
    }

    fn pool_pattern(&self, ident: &str) -> String {
        format!("{}.{}{}", LP_TOKEN_POLICY_ID, POOL_NFT_PREFIX, ident)
    }

    fn pool_from_datum(&self, utxo: &Utxo, datum_cbor: &str) -> Result<Option<Pool>> {
        let datum = parse_pool_datum(datum_cbor)?;
        let nft = format!("{}{}{}", LP_TOKEN_POLICY_ID, POOL_NFT_PREFIX, datum.ident);
        if utxo.get_asset(&nft).is_none() {
            return Ok(None);
        }

        let quantity_a = reserve_of(utxo, &datum.asset_a);
        let quantity_b = reserve_of(utxo, &datum.asset_b);
        let asset_lp = AssetMetadata::new(
            &format!("{}.{}{}", LP_TOKEN_POLICY_ID, POOL_LP_PREFIX, datum.ident),
            0,
        );

        Ok(Some(Pool::new(
            &datum.ident,
            datum.asset_a,
            datum.asset_b,
            asset_lp,
            quantity_a,
            quantity_b,
            datum.fee,
            ContractVersion::V1,
        )))
    }
}

fn ident_bytes(ident: &str) -> Result<Value, DatumError> {
    match hex::decode(ident) {
        Ok(bytes) if !bytes.is_empty() => Ok(Value::Bytes(bytes)),
        _ => Err(DatumError::InvalidIdent {
            ident: ident.to_string(),
            version: ContractVersion::V1,
        }),
    }
}

/// V1 swap order datum.
///
/// ```text
/// Constr0[ ident,
///          Constr0[ Constr0[destination address, Option(datum hash)],
///                   Option(alternate cancel key hash) ],
///          scooper fee,
///          Constr0[ direction (A->B = Constr0, B->A = Constr1), offered, Option(min received) ] ]
/// ```
pub fn swap_datum(args: &SwapDatumArgs) -> Result<Value, DatumError> {
    let ident = ident_bytes(&args.pool.ident)?;
    let owner = owner_key_hash(&args.owner_address)?;

    let datum_hash = match &args.destination.datum {
        DestinationDatum::None => option(None),
        DestinationDatum::Hash(hash) => option(Some(bytes_from_hex("datum hash", hash)?)),
        DestinationDatum::Inline(_) => {
            return Err(DatumError::UnsupportedDestination {
                version: ContractVersion::V1,
            })
        }
    };
    let addresses = constr(
        0,
        vec![
            constr(0, vec![plutus_address(&args.destination.address)?, datum_hash]),
            option(Some(bytes_from_hex("owner", &owner)?)),
        ],
    );

    let direction = if args.offered.asset_id() == args.pool.asset_a.asset_id {
        constr(0, vec![])
    } else {
        constr(1, vec![])
    };
    let swap = constr(
        0,
        vec![
            direction,
            big_int(&args.offered.amount),
            option(Some(big_int(&args.min_received.amount))),
        ],
    );

    Ok(constr(0, vec![ident, addresses, int(args.scooper_fee), swap]))
}

/// Datum hash a V1 order's destination commits to.
pub fn destination_datum_hash(order: &Value) -> Option<String> {
    let fields = constr_fields(order).ok()?;
    let addresses = constr_fields(fields.get(1)?).ok()?;
    let destination = constr_fields(addresses.first()?).ok()?;
    let datum_hash = destination.get(1)?;
    if constr_alternative(datum_hash)? != 0 {
        return None;
    }
    value_to_hex(constr_fields(datum_hash).ok()?.first()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::cbor::encode_cbor;
    use crate::models::{AssetAmount, Destination, Unit};
    use crate::utils::test_key_address;
    use num_bigint::BigUint;

    const TOKEN_POLICY: &str = "f13ac4d66b3ee19a6aa0f2a22298737bd907cc95121662fc971b5275";
    const TOKEN_NAME: &str = "535452494b45";

    fn pool_datum_cbor(ident: &str) -> String {
        let bytes = |h: &str| Value::Bytes(hex::decode(h).unwrap());
        let value = constr(
            0,
            vec![
                constr(
                    0,
                    vec![
                        constr(0, vec![bytes(""), bytes("")]),
                        constr(0, vec![bytes(TOKEN_POLICY), bytes(TOKEN_NAME)]),
                    ],
                ),
                bytes(ident),
                int(1_000),
                constr(0, vec![int(3), int(1_000)]),
            ],
        );
        encode_cbor(&value).unwrap()
    }

    fn reader() -> SundaeSwapV1 {
        SundaeSwapV1::new(KupoApi::with_client("http://localhost:1442", reqwest::Client::new()))
    }

    #[test]
    fn test_pool_from_datum() {
        let utxo = Utxo {
            address: POOL_ADDRESS.to_string(),
            tx_hash: "00".repeat(32),
            output_index: 1,
            amount: vec![
                Unit {
                    unit: "lovelace".to_string(),
                    quantity: "900000000".to_string(),
                },
                Unit {
                    unit: format!("{}{}", TOKEN_POLICY, TOKEN_NAME),
                    quantity: "300000000".to_string(),
                },
                Unit {
                    unit: format!("{}702003", LP_TOKEN_POLICY_ID),
                    quantity: "1".to_string(),
                },
            ],
            data_hash: Some("22".repeat(32)),
            reference_script_hash: None,
        };
        let pool = reader().pool_from_datum(&utxo, &pool_datum_cbor("03")).unwrap().unwrap();
        assert_eq!(pool.ident, "03");
        assert_eq!(pool.fee, Fraction::new(3, 1_000).unwrap());
        assert_eq!(pool.quantity_a, BigUint::from(900_000_000u64));
        assert_eq!(pool.quantity_b, BigUint::from(300_000_000u64));
        assert_eq!(pool.asset_lp.name_hex(), "6c702003");

        assert!(reader().pool_from_datum(&utxo, &pool_datum_cbor("04")).unwrap().is_none());
    }

    #[test]
    fn test_swap_direction_follows_offered_asset() {
        let datum = parse_pool_datum(&pool_datum_cbor("03")).unwrap();
        let pool = Pool::new(
            "03",
            datum.asset_a.clone(),
            datum.asset_b.clone(),
            AssetMetadata::new("ff.00", 0),
            900_000_000u64,
            300_000_000u64,
            datum.fee,
            ContractVersion::V1,
        );
        let args = SwapDatumArgs {
            pool,
            owner_address: test_key_address(0x11, 0x22),
            destination: Destination::to_owner(&test_key_address(0x11, 0x22)),
            offered: AssetAmount::new(10u64, datum.asset_b.clone()),
            min_received: AssetAmount::lovelace(1u64),
            scooper_fee: 2_500_000,
        };
        let value = swap_datum(&args).unwrap();
        let fields = constr_fields(&value).unwrap();
        assert_eq!(value_to_u64(&fields[2]).unwrap(), 2_500_000);
        let swap = constr_fields(&fields[3]).unwrap();
        assert_eq!(constr_alternative(&swap[0]), Some(1));
        assert_eq!(destination_datum_hash(&value), None);
    }
}

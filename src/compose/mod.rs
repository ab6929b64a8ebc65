//! Chained two-order composition.
//!
//! Leg A is funded by the user and pays out to leg B's order script; leg B
//! pays the user. Leg A's payout commits to leg B's datum by hash, and leg
//! B's datum itself travels in the transaction metadata so a scooper can
//! rebuild leg B once leg A settles.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::dex::{DatumBuilder, OrderDatum, PlutusDatumBuilder, ProtocolParams, QueryProvider};
use crate::error::{ComposeError, DatumError};
use crate::models::{
    AssetAmount, ContractVersion, DatumHashReference, Destination, DestinationDatum, OrderMode, Pool,
    ReferralFee, SwapDatumArgs,
};
use crate::pricing::QuoteEngine;
use crate::utils::datum_hash_hex;

pub mod fees;
pub mod metadata;

pub use metadata::{TransactionMetadata, ORDER_DATUM_METADATA_LABEL};

/// First leg: what the user supplies and how it is priced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegA {
    pub pool: Pool,
    pub supplied: AssetAmount,
    pub mode: OrderMode,
    pub referral: Option<ReferralFee>,
}

/// Second leg, funded by the first leg's guaranteed minimum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegB {
    pub pool: Pool,
    pub mode: OrderMode,
    pub referral: Option<ReferralFee>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComposedLeg {
    /// Order script address the leg's output is sent to.
    pub order_address: String,
    pub args: SwapDatumArgs,
    pub datum: OrderDatum,
}

/// Both orders of a routed swap, ready to be placed in one transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComposedOrders {
    pub leg_a: ComposedLeg,
    pub leg_b: ComposedLeg,
    /// Value of leg A's output: supplied asset, deposit and both legs'
    /// scooper fees.
    pub locked_value: Vec<AssetAmount>,
    pub metadata: TransactionMetadata,
    pub scooper_fee: AssetAmount,
    pub deposit: AssetAmount,
    pub referral: Option<ReferralFee>,
}

pub struct RouteComposer<Q, D = PlutusDatumBuilder> {
    provider: Q,
    datum_builder: D,
    engine: QuoteEngine,
    params: RwLock<HashMap<ContractVersion, ProtocolParams>>,
}

impl<Q: QueryProvider> RouteComposer<Q, PlutusDatumBuilder> {
    pub fn with_plutus_datums(provider: Q) -> Self {
        Self::new(provider, PlutusDatumBuilder)
    }
}

impl<Q: QueryProvider, D: DatumBuilder> RouteComposer<Q, D> {
    pub fn new(provider: Q, datum_builder: D) -> Self {
        Self {
            provider,
            datum_builder,
            engine: QuoteEngine::default(),
            params: RwLock::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> &Q {
        &self.provider
    }

    /// Protocol parameters of `version`, looked up once per composer.
    pub async fn protocol_params(&self, version: ContractVersion) -> Result<ProtocolParams, ComposeError> {
        if let Some(params) = self.params.read().await.get(&version) {
            return Ok(params.clone());
        }
        let params = self.provider.protocol_params(version).await.map_err(|e| {
            tracing::error!(%version, error = %e, "protocol parameters unavailable");
            ComposeError::UnresolvedScript(version)
        })?;
        self.params.write().await.insert(version, params.clone());
        Ok(params)
    }

    async fn order_address(&self, version: ContractVersion) -> Result<(ProtocolParams, String), ComposeError> {
        let params = self.protocol_params(version).await?;
        let address = params.order_address().map_err(|e| {
            tracing::error!(%version, script = %params.order_script_hash, error = %e, "order script address");
            ComposeError::UnresolvedScript(version)
        })?;
        Ok((params, address))
    }

    /// Worst-case amount an order on `pool` supplying `supplied` may settle
    /// for under `mode`.
    pub fn min_received(&self, pool: &Pool, supplied: &AssetAmount, mode: &OrderMode) -> Result<AssetAmount, ComposeError> {
        if !pool.has_asset(supplied.asset_id()) {
            return Err(DatumError::AssetNotInPool {
                asset: supplied.asset_id().to_string(),
                ident: pool.ident.clone(),
            }
            .into());
        }
        let min = match mode {
            OrderMode::Market { slippage } => self.engine.min_receivable(pool, supplied, slippage),
            OrderMode::Limit { ratio } => supplied.exchange_at(ratio),
        };
        let expected = pool.other_asset(supplied.asset_id());
        if min.metadata.asset_id != expected.asset_id {
            return Err(DatumError::AssetNotInPool {
                asset: min.metadata.asset_id,
                ident: pool.ident.clone(),
            }
            .into());
        }
        Ok(min)
    }

    async fn build_verified(&self, args: &SwapDatumArgs) -> Result<OrderDatum, ComposeError> {
        let datum = self.datum_builder.build_swap_datum(args).await?;
        let computed = datum_hash_hex(&datum.cbor)?;
        if computed != datum.hash {
            return Err(ComposeError::DatumHashMismatch {
                reported: datum.hash,
                computed,
            });
        }
        Ok(datum)
    }

    /// Compose leg A into leg B for `owner_address`.
    pub async fn compose_route(
        &self,
        owner_address: &str,
        leg_a: LegA,
        leg_b: LegB,
    ) -> Result<ComposedOrders, ComposeError> {
        let (version_a, version_b) = (leg_a.pool.version, leg_b.pool.version);
        let ((params_a, address_a), (params_b, address_b)) =
            tokio::try_join!(self.order_address(version_a), self.order_address(version_b))?;

        // Leg B is funded by leg A's guaranteed minimum, never its expected output.
        let min_a = self.min_received(&leg_a.pool, &leg_a.supplied, &leg_a.mode)?;
        if !leg_b.pool.has_asset(min_a.asset_id()) {
            return Err(ComposeError::RouteDiscontinuity {
                pool: leg_b.pool.ident.clone(),
                asset: min_a.asset_id().to_string(),
            });
        }
        let min_b = self.min_received(&leg_b.pool, &min_a, &leg_b.mode)?;

        let args_a = SwapDatumArgs {
            pool: leg_a.pool,
            owner_address: owner_address.to_string(),
            destination: Destination {
                address: address_b.clone(),
                datum: DestinationDatum::None,
            },
            offered: leg_a.supplied,
            min_received: min_a.clone(),
            scooper_fee: params_a.scooper_fee,
        };
        let args_b = SwapDatumArgs {
            pool: leg_b.pool,
            owner_address: owner_address.to_string(),
            destination: Destination::to_owner(owner_address),
            offered: min_a,
            min_received: min_b,
            scooper_fee: params_b.scooper_fee,
        };
        let (_, datum_b) =
            tokio::try_join!(self.build_verified(&args_a), self.build_verified(&args_b))?;

        let args_a = SwapDatumArgs {
            destination: DatumHashReference {
                hash: datum_b.hash.clone(),
                destination_address: address_b.clone(),
            }
            .into(),
            ..args_a
        };
        let datum_a = self.build_verified(&args_a).await?;
        let embedded = datum_a.destination_hash(version_a);
        if embedded.as_deref() != Some(datum_b.hash.as_str()) {
            return Err(ComposeError::CommitmentMismatch {
                expected: datum_b.hash,
                embedded,
            });
        }
        let referral = fees::merge_referrals([leg_a.referral.as_ref(), leg_b.referral.as_ref()])?;

        let metadata = TransactionMetadata::new().with_datum(&datum_b.hash, &datum_b.cbor);

        let scooper_fee = fees::total_lovelace(&[params_a.scooper_fee, params_b.scooper_fee]);
        let deposit = params_a.deposit;
        let locked_value = fees::merge_amounts([
            args_a.offered.clone(),
            AssetAmount::lovelace(deposit),
            AssetAmount::lovelace(scooper_fee),
        ]);

        tracing::debug!(
            leg_a = %datum_a.hash,
            leg_b = %datum_b.hash,
            scooper_fee,
            deposit,
            "composed routed orders"
        );

        Ok(ComposedOrders {
            leg_a: ComposedLeg {
                order_address: address_a,
                args: args_a,
                datum: datum_a,
            },
            leg_b: ComposedLeg {
                order_address: address_b,
                args: args_b,
                datum: datum_b,
            },
            locked_value,
            metadata,
            scooper_fee: AssetAmount::lovelace(scooper_fee),
            deposit: AssetAmount::lovelace(deposit),
            referral,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;
    use async_trait::async_trait;

    use super::*;
    use crate::config::default_deployments;
    use crate::models::{AssetMetadata, AssetRatio, Fraction};
    use crate::utils::{test_key_address, Network};

    const TOKEN: &str = "f13ac4d66b3ee19a6aa0f2a22298737bd907cc95121662fc971b5275.535452494b45";
    const OTHER: &str = "8c66f1ac8b57debcab9a07b3b9b0a5595a5ad76e3bcae756c82efe4f.4f54484552";
    const V3_IDENT_A: &str = "64f35d26b237ad58e099041bc14c687ea7fdc58969d7d5b66e2540ef";
    const V3_IDENT_B: &str = "2baab4c73a1cd60176f903a29a9c92ed4237c88622da51e9179121a3";

    struct MockProvider {
        deployments: Vec<ProtocolParams>,
        lookups: AtomicUsize,
    }

    impl MockProvider {
        fn new(deployments: Vec<ProtocolParams>) -> Self {
            Self {
                deployments,
                lookups: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QueryProvider for MockProvider {
        async fn find_pool(&self, ident: &str, _version: ContractVersion) -> anyhow::Result<Pool> {
            Err(anyhow!("no pool {}", ident))
        }

        async fn protocol_params(&self, version: ContractVersion) -> anyhow::Result<ProtocolParams> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.deployments
                .iter()
                .find(|d| d.version == version)
                .cloned()
                .ok_or_else(|| anyhow!("no deployment"))
        }
    }

    enum Tamper {
        Hash,
        DropCommitment,
    }

    struct TamperingBuilder(Tamper);

    #[async_trait]
    impl DatumBuilder for TamperingBuilder {
        async fn build_swap_datum(&self, args: &SwapDatumArgs) -> Result<OrderDatum, DatumError> {
            match self.0 {
                Tamper::Hash => {
                    let datum = PlutusDatumBuilder.build_swap_datum(args).await?;
                    Ok(OrderDatum {
                        hash: "00".repeat(32),
                        ..datum
                    })
                }
                Tamper::DropCommitment => {
                    let mut args = args.clone();
                    args.destination.datum = DestinationDatum::None;
                    PlutusDatumBuilder.build_swap_datum(&args).await
                }
            }
        }
    }

    fn pool(ident: &str, a: AssetMetadata, b: AssetMetadata, version: ContractVersion) -> Pool {
        Pool::new(
            ident,
            a,
            b,
            AssetMetadata::new("ff.00", 0),
            500_000_000u64,
            250_000_000u64,
            Fraction::new(1, 100).unwrap(),
            version,
        )
    }

    fn token() -> AssetMetadata {
        AssetMetadata::new(TOKEN, 0)
    }

    fn other() -> AssetMetadata {
        AssetMetadata::new(OTHER, 0)
    }

    fn market() -> OrderMode {
        OrderMode::Market {
            slippage: Fraction::new(1, 10).unwrap(),
        }
    }

    fn legs(version_b: ContractVersion, ident_b: &str) -> (LegA, LegB) {
        (
            LegA {
                pool: pool(V3_IDENT_A, AssetMetadata::ada(), token(), ContractVersion::V3),
                supplied: AssetAmount::lovelace(20_000_000u64),
                mode: market(),
                referral: None,
            },
            LegB {
                pool: pool(ident_b, token(), other(), version_b),
                mode: market(),
                referral: None,
            },
        )
    }

    fn owner() -> String {
        test_key_address(0x11, 0x22)
    }

    fn composer() -> RouteComposer<MockProvider> {
        RouteComposer::with_plutus_datums(MockProvider::new(default_deployments(Network::Mainnet)))
    }

    #[tokio::test]
    async fn test_leg_a_commits_to_leg_b_datum() {
        let (a, b) = legs(ContractVersion::V3, V3_IDENT_B);
        let composed = composer().compose_route(&owner(), a, b).await.unwrap();

        let datum_b = &composed.leg_b.datum;
        assert_eq!(datum_hash_hex(&datum_b.cbor).unwrap(), datum_b.hash);
        assert_eq!(
            composed.leg_a.datum.destination_hash(ContractVersion::V3),
            Some(datum_b.hash.clone())
        );
        assert_eq!(composed.metadata.label, ORDER_DATUM_METADATA_LABEL);
        assert_eq!(composed.metadata.datum(&datum_b.hash), Some(datum_b.cbor.clone()));
        assert_eq!(composed.leg_a.args.destination.address, composed.leg_b.order_address);
        assert_eq!(composed.leg_b.args.destination, Destination::to_owner(&owner()));
        assert_eq!(composed.leg_a.args.owner_address, owner());
    }

    #[tokio::test]
    async fn test_leg_b_funded_by_guaranteed_minimum() {
        let (a, b) = legs(ContractVersion::V3, V3_IDENT_B);
        let composed = composer().compose_route(&owner(), a, b).await.unwrap();

        assert_eq!(composed.leg_a.args.min_received, AssetAmount::new(8_910_000u64, token()));
        assert_eq!(composed.leg_b.args.offered, composed.leg_a.args.min_received);
        assert_eq!(composed.leg_b.args.min_received.metadata, other());
    }

    #[tokio::test]
    async fn test_fees_sum_and_deposit_is_not_doubled() {
        let (a, b) = legs(ContractVersion::V1, "03");
        let composed = composer().compose_route(&owner(), a, b).await.unwrap();

        assert_eq!(composed.scooper_fee, AssetAmount::lovelace(3_500_000u64));
        assert_eq!(composed.deposit, AssetAmount::lovelace(2_000_000u64));
        assert_eq!(
            composed.locked_value,
            vec![AssetAmount::lovelace(25_500_000u64)]
        );
        assert_eq!(
            composed.leg_a.datum.destination_hash(ContractVersion::V3),
            Some(composed.leg_b.datum.hash.clone())
        );
    }

    #[tokio::test]
    async fn test_protocol_params_are_memoized() {
        let composer = composer();
        for _ in 0..2 {
            let (a, b) = legs(ContractVersion::V1, "03");
            composer.compose_route(&owner(), a, b).await.unwrap();
        }
        assert_eq!(composer.provider().lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_limit_leg_uses_ratio() {
        let (mut a, b) = legs(ContractVersion::V3, V3_IDENT_B);
        a.mode = OrderMode::Limit {
            ratio: AssetRatio::new(AssetAmount::new(1u64, token()), AssetAmount::lovelace(4u64)),
        };
        let composed = composer().compose_route(&owner(), a, b).await.unwrap();
        assert_eq!(composed.leg_b.args.offered, AssetAmount::new(5_000_000u64, token()));
    }

    #[tokio::test]
    async fn test_invalid_ident_blocks_composition() {
        let (a, b) = legs(ContractVersion::V3, "abcd");
        let err = composer().compose_route(&owner(), a, b).await.unwrap_err();
        assert!(matches!(
            err,
            ComposeError::Datum(DatumError::InvalidIdent { version: ContractVersion::V3, .. })
        ));
    }

    #[tokio::test]
    async fn test_unresolved_script_blocks_composition() {
        let v3_only = default_deployments(Network::Mainnet)
            .into_iter()
            .filter(|d| d.version == ContractVersion::V3)
            .collect();
        let composer = RouteComposer::with_plutus_datums(MockProvider::new(v3_only));
        let (a, b) = legs(ContractVersion::V1, "03");
        let err = composer.compose_route(&owner(), a, b).await.unwrap_err();
        assert!(matches!(err, ComposeError::UnresolvedScript(ContractVersion::V1)));

        let mut broken = default_deployments(Network::Mainnet);
        broken[1].order_script_hash = "abcd".to_string();
        let composer = RouteComposer::with_plutus_datums(MockProvider::new(broken));
        let (a, b) = legs(ContractVersion::V3, V3_IDENT_B);
        let err = composer.compose_route(&owner(), a, b).await.unwrap_err();
        assert!(matches!(err, ComposeError::UnresolvedScript(ContractVersion::V3)));
    }

    #[tokio::test]
    async fn test_discontinuous_legs_are_rejected() {
        let (a, mut b) = legs(ContractVersion::V3, V3_IDENT_B);
        b.pool = pool(V3_IDENT_B, AssetMetadata::ada(), other(), ContractVersion::V3);
        let err = composer().compose_route(&owner(), a, b).await.unwrap_err();
        assert!(matches!(err, ComposeError::RouteDiscontinuity { .. }));
    }

    #[tokio::test]
    async fn test_tampered_datums_are_rejected() {
        let provider = || MockProvider::new(default_deployments(Network::Mainnet));

        let composer = RouteComposer::new(provider(), TamperingBuilder(Tamper::Hash));
        let (a, b) = legs(ContractVersion::V3, V3_IDENT_B);
        let err = composer.compose_route(&owner(), a, b).await.unwrap_err();
        assert!(matches!(err, ComposeError::DatumHashMismatch { .. }));

        let composer = RouteComposer::new(provider(), TamperingBuilder(Tamper::DropCommitment));
        let (a, b) = legs(ContractVersion::V3, V3_IDENT_B);
        let err = composer.compose_route(&owner(), a, b).await.unwrap_err();
        assert!(matches!(err, ComposeError::CommitmentMismatch { embedded: None, .. }));
    }

    #[tokio::test]
    async fn test_referrals_merge_or_conflict() {
        let referral = |destination: &str, amount: u64| ReferralFee {
            destination: destination.to_string(),
            payment: AssetAmount::lovelace(amount),
        };

        let (mut a, mut b) = legs(ContractVersion::V3, V3_IDENT_B);
        a.referral = Some(referral("addr1frontend", 1_000_000));
        b.referral = Some(referral("addr1frontend", 500_000));
        let composed = composer().compose_route(&owner(), a, b).await.unwrap();
        assert_eq!(composed.referral, Some(referral("addr1frontend", 1_500_000)));

        let (mut a, mut b) = legs(ContractVersion::V3, V3_IDENT_B);
        a.referral = Some(referral("addr1frontend", 1));
        b.referral = Some(referral("addr1other", 1));
        let err = composer().compose_route(&owner(), a, b).await.unwrap_err();
        assert!(matches!(err, ComposeError::ReferralConflict { .. }));
    }
}

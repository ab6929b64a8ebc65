use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sundae_route_core::compose::{LegA, LegB, RouteComposer};
use sundae_route_core::config::SdkConfig;
use sundae_route_core::dex::{KupoQueryProvider, QueryProvider};
use sundae_route_core::models::{
    AssetAmount, AssetMetadata, AssetRatio, ContractVersion, Fraction, OrderMode, OrderRoute,
    Pool,
};
use sundae_route_core::pricing::QuoteEngine;
use sundae_route_core::{save_to_file, KupoApi};

#[derive(Parser)]
#[command(name = "sundae-route")]
#[command(about = "Quote and compose SundaeSwap orders against a Kupo indexer")]
struct Cli {
    /// Configuration file path (JSON); defaults to mainnet deployments
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List pools trading a pair. Use 'lovelace' for ADA.
    Pool {
        #[arg(long, default_value = "v3")]
        version: ContractVersion,
        asset_a: String,
        asset_b: String,
    },
    /// Quote a swap against one pool.
    Quote {
        #[arg(long, default_value = "v3")]
        version: ContractVersion,
        #[arg(long)]
        pool: String,
        /// Amount given, in the asset's smallest unit
        #[arg(long)]
        give: u64,
        #[arg(long, default_value = "lovelace")]
        asset: String,
        #[arg(long, default_value_t = 100)]
        slippage_bps: u64,
    },
    /// Compose two chained orders: pool A's output funds an order on pool B.
    Compose {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        pool_a: String,
        #[arg(long, default_value = "v3")]
        version_a: ContractVersion,
        #[arg(long)]
        pool_b: String,
        #[arg(long, default_value = "v3")]
        version_b: ContractVersion,
        #[arg(long)]
        give: u64,
        #[arg(long, default_value = "lovelace")]
        asset: String,
        #[arg(long, default_value_t = 100)]
        slippage_bps: u64,
        /// Write the composed orders to this file instead of stdout
        #[arg(long)]
        out: Option<String>,
    },
}

#[derive(Serialize)]
struct QuoteReport {
    pool: Pool,
    given: AssetAmount,
    taken: Option<AssetAmount>,
    min_received: AssetAmount,
    spot_ratio: AssetRatio,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SdkConfig::load(cli.config.as_deref())?;
    init_logging(&config);

    let kupo = KupoApi::new(&config.kupo_url)?;
    let provider = KupoQueryProvider::new(kupo, config.deployments.clone());
    info!(kupo_url = %config.kupo_url, network = %config.network, "sundae-route");

    match cli.command {
        Command::Pool {
            version,
            asset_a,
            asset_b,
        } => {
            let pools = provider
                .reader(version)
                .pools_for_pair(&asset_a, &asset_b)
                .await?;
            info!(count = pools.len(), "pools found");
            println!("{}", serde_json::to_string_pretty(&pools)?);
        }
        Command::Quote {
            version,
            pool,
            give,
            asset,
            slippage_bps,
        } => {
            let pool = provider.find_pool(&pool, version).await?;
            let given = amount_in_pool(&pool, give, &asset)?;
            let slippage = Fraction::from_bps(slippage_bps)?;
            let engine: QuoteEngine = QuoteEngine::default();
            let route = OrderRoute::single(pool.clone());
            let report = QuoteReport {
                taken: engine.quote_taken_from_given(Some(&given), Some(&route), None, false, None),
                min_received: engine.min_receivable(&pool, &given, &slippage),
                spot_ratio: engine.spot_ratio(&route, given.asset_id()),
                given,
                pool,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Compose {
            owner,
            pool_a,
            version_a,
            pool_b,
            version_b,
            give,
            asset,
            slippage_bps,
            out,
        } => {
            let (pool_a, pool_b) = tokio::try_join!(
                provider.find_pool(&pool_a, version_a),
                provider.find_pool(&pool_b, version_b),
            )?;
            let supplied = amount_in_pool(&pool_a, give, &asset)?;
            let mode = OrderMode::Market {
                slippage: Fraction::from_bps(slippage_bps)?,
            };
            let leg_a = LegA {
                pool: pool_a,
                supplied,
                mode: mode.clone(),
                referral: None,
            };
            let leg_b = LegB {
                pool: pool_b,
                mode,
                referral: None,
            };

            let composer = RouteComposer::with_plutus_datums(provider);
            let composed = composer.compose_route(&owner, leg_a, leg_b).await?;
            match out {
                Some(path) => {
                    save_to_file(&composed, &path)?;
                    info!(path = %path, "composed orders written");
                }
                None => println!("{}", serde_json::to_string_pretty(&composed)?),
            }
        }
    }

    Ok(())
}

fn init_logging(config: &SdkConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// `amount` of whichever pool asset `asset` names.
fn amount_in_pool(pool: &Pool, amount: u64, asset: &str) -> Result<AssetAmount> {
    let asset_id = AssetMetadata::from_identifier(asset, 0)?.asset_id;
    [&pool.asset_a, &pool.asset_b]
        .into_iter()
        .find(|a| a.asset_id == asset_id)
        .map(|metadata| AssetAmount::new(amount, metadata.clone()))
        .ok_or_else(|| anyhow!("pool {} does not trade {}", pool.ident, asset_id))
}

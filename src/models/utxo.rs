use std::collections::HashMap;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub unit: String,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub quantity: String,
}

fn deserialize_quantity<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Q {
        Str(String),
        Num(u64),
    }
    let q = Q::deserialize(deserializer)?;
    Ok(match q {
        Q::Str(s) => s,
        Q::Num(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utxo {
    pub address: String,
    pub tx_hash: String,
    pub output_index: u32,
    pub amount: Vec<Unit>,
    pub data_hash: Option<String>,
    pub reference_script_hash: Option<String>,
}

impl Utxo {
    pub fn get_asset(&self, unit: &str) -> Option<&Unit> {
        self.amount.iter().find(|u| u.unit == unit)
    }

    pub fn quantity_of(&self, unit: &str) -> Option<BigUint> {
        self.get_asset(unit)
            .and_then(|u| u.quantity.parse::<BigUint>().ok())
    }

    pub fn out_ref(&self) -> String {
        format!("{}#{}", self.tx_hash, self.output_index)
    }
}

/// One entry of Kupo's `/matches` response.
#[derive(Debug, Clone, Deserialize)]
pub struct KupoMatch {
    pub address: String,
    pub transaction_id: String,
    pub output_index: u32,
    pub value: KupoValue,
    pub datum_hash: Option<String>,
    pub script_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KupoValue {
    #[serde(deserialize_with = "deserialize_quantity")]
    pub coins: String,
    #[serde(default)]
    pub assets: HashMap<String, serde_json::Value>,
}

impl From<KupoMatch> for Utxo {
    fn from(m: KupoMatch) -> Self {
        let mut amount = vec![Unit {
            unit: "lovelace".to_string(),
            quantity: m.value.coins,
        }];
        let mut assets: Vec<_> = m.value.assets.into_iter().collect();
        assets.sort_by(|a, b| a.0.cmp(&b.0));
        for (unit, qty) in assets {
            let quantity = match qty {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                _ => "0".to_string(),
            };
            amount.push(Unit {
                unit: unit.replace('.', ""),
                quantity,
            });
        }
        Utxo {
            address: m.address,
            tx_hash: m.transaction_id,
            output_index: m.output_index,
            amount,
            data_hash: m.datum_hash,
            reference_script_hash: m.script_hash,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KupoDatumResponse {
    pub datum: String,
}

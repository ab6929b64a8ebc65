use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::models::{AssetAmount, AssetMetadata, Pool};

/// One or two pools traded in sequence.
///
/// For two hops the pools must share an asset; hop 1 is the pool holding
/// the asset the user gives, and its output feeds hop 2.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<Pool>", into = "Vec<Pool>")]
pub struct OrderRoute {
    pools: Vec<Pool>,
}

impl OrderRoute {
    pub fn new(pools: Vec<Pool>) -> Result<Self, RouteError> {
        match pools.as_slice() {
            [_] => Ok(Self { pools }),
            [first, second] => {
                if shared_asset(first, second).is_none() {
                    return Err(RouteError::Discontinuous {
                        first: first.ident.clone(),
                        second: second.ident.clone(),
                    });
                }
                Ok(Self { pools })
            }
            _ => Err(RouteError::InvalidLength(pools.len())),
        }
    }

    pub fn single(pool: Pool) -> Self {
        Self { pools: vec![pool] }
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn is_two_hop(&self) -> bool {
        self.pools.len() == 2
    }

    pub fn first(&self) -> &Pool {
        &self.pools[0]
    }

    pub fn last(&self) -> &Pool {
        &self.pools[self.pools.len() - 1]
    }

    /// Asset hop 1 hands to hop 2. `None` for single-hop routes.
    pub fn intermediate(&self) -> Option<&AssetMetadata> {
        match self.pools.as_slice() {
            [first, second] => shared_asset(first, second),
            _ => None,
        }
    }

    /// The two outer assets of the route: `(entry, exit)`.
    ///
    /// For one pool this is `(asset_a, asset_b)`; for two pools the entry is
    /// hop 1's non-shared asset and the exit hop 2's non-shared asset.
    pub fn endpoints(&self) -> (&AssetMetadata, &AssetMetadata) {
        match self.intermediate() {
            Some(shared) => (
                self.first().other_asset(&shared.asset_id),
                self.last().other_asset(&shared.asset_id),
            ),
            None => (&self.first().asset_a, &self.first().asset_b),
        }
    }

    pub fn has_endpoint(&self, asset_id: &str) -> bool {
        let (entry, exit) = self.endpoints();
        entry.asset_id == asset_id || exit.asset_id == asset_id
    }

    /// Unordered comparison of the route's outer pair with `(first, second)`.
    pub fn matches_pair(&self, first: &str, second: &str) -> bool {
        let (entry, exit) = self.endpoints();
        (entry.asset_id == first && exit.asset_id == second)
            || (entry.asset_id == second && exit.asset_id == first)
    }

    /// Pools in trading order for an order giving `asset_id`.
    pub fn hops_from(&self, asset_id: &str) -> Vec<&Pool> {
        match self.pools.as_slice() {
            [first, second] if !first.has_asset(asset_id) && second.has_asset(asset_id) => {
                vec![second, first]
            }
            _ => self.pools.iter().collect(),
        }
    }

    /// Pools in trading order for an order receiving `asset_id`.
    pub fn hops_towards(&self, asset_id: &str) -> Vec<&Pool> {
        match self.pools.as_slice() {
            [first, second] if !second.has_asset(asset_id) && first.has_asset(asset_id) => {
                vec![second, first]
            }
            _ => self.pools.iter().collect(),
        }
    }
}

impl TryFrom<Vec<Pool>> for OrderRoute {
    type Error = RouteError;

    fn try_from(pools: Vec<Pool>) -> Result<Self, Self::Error> {
        OrderRoute::new(pools)
    }
}

impl From<OrderRoute> for Vec<Pool> {
    fn from(route: OrderRoute) -> Self {
        route.pools
    }
}

fn shared_asset<'a>(first: &'a Pool, second: &Pool) -> Option<&'a AssetMetadata> {
    [&first.asset_a, &first.asset_b]
        .into_iter()
        .find(|asset| second.has_asset(&asset.asset_id))
}

/// What one hop consumes and produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwapOutcome {
    pub input: AssetAmount,
    pub output: AssetAmount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContractVersion, Fraction};

    fn pool(ident: &str, a: &str, b: &str) -> Pool {
        Pool::new(
            ident,
            AssetMetadata::new(a, 0),
            AssetMetadata::new(b, 0),
            AssetMetadata::new("ff.00", 0),
            1_000u64,
            1_000u64,
            Fraction::zero(),
            ContractVersion::V3,
        )
    }

    #[test]
    fn test_two_hop_endpoints() {
        let route = OrderRoute::new(vec![pool("1", "aa.01", "ada.lovelace"), pool("2", "ada.lovelace", "bb.02")])
            .unwrap();
        let (entry, exit) = route.endpoints();
        assert_eq!(entry.asset_id, "aa.01");
        assert_eq!(exit.asset_id, "bb.02");
        assert_eq!(route.intermediate().unwrap().asset_id, "ada.lovelace");
        assert!(route.matches_pair("bb.02", "aa.01"));

        let from_exit: Vec<_> = route.hops_from("bb.02").iter().map(|p| p.ident.clone()).collect();
        assert_eq!(from_exit, vec!["2", "1"]);
        let towards_entry: Vec<_> = route.hops_towards("aa.01").iter().map(|p| p.ident.clone()).collect();
        assert_eq!(towards_entry, vec!["2", "1"]);
        let natural: Vec<_> = route.hops_from("aa.01").iter().map(|p| p.ident.clone()).collect();
        assert_eq!(natural, vec!["1", "2"]);
    }

    #[test]
    fn test_rejects_discontinuous_and_bad_lengths() {
        assert!(matches!(
            OrderRoute::new(vec![pool("1", "aa.01", "bb.02"), pool("2", "cc.03", "dd.04")]),
            Err(RouteError::Discontinuous { .. })
        ));
        assert_eq!(OrderRoute::new(vec![]), Err(RouteError::InvalidLength(0)));
        let three = vec![pool("1", "a.1", "b.2"), pool("2", "b.2", "c.3"), pool("3", "c.3", "d.4")];
        assert_eq!(OrderRoute::new(three), Err(RouteError::InvalidLength(3)));
    }
}

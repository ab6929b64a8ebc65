//! Fee and referral aggregation across the legs of a composed order.

use crate::error::ComposeError;
use crate::models::{AssetAmount, ReferralFee};

/// Sum lovelace amounts.
pub fn total_lovelace<'a>(amounts: impl IntoIterator<Item = &'a u64>) -> u64 {
    amounts.into_iter().fold(0u64, |acc, fee| acc.saturating_add(*fee))
}

/// Fold amounts into one entry per asset, keeping first-seen order.
pub fn merge_amounts(amounts: impl IntoIterator<Item = AssetAmount>) -> Vec<AssetAmount> {
    amounts.into_iter().fold(Vec::new(), |acc: Vec<AssetAmount>, amount| {
        if acc.iter().any(|a| a.same_asset(&amount)) {
            acc.into_iter()
                .map(|a| a.checked_add(&amount).unwrap_or(a))
                .collect()
        } else {
            acc.into_iter().chain(std::iter::once(amount)).collect()
        }
    })
}

/// Merge per-leg referral fees into the one payout of the transaction.
///
/// Fees to the same destination in the same asset are summed; a fee on one
/// leg only is kept as is. Fees to different destinations, or in different
/// assets, are refused.
pub fn merge_referrals<'a>(
    fees: impl IntoIterator<Item = Option<&'a ReferralFee>>,
) -> Result<Option<ReferralFee>, ComposeError> {
    fees.into_iter()
        .flatten()
        .try_fold(None, |acc: Option<ReferralFee>, fee| match acc {
            None => Ok(Some(fee.clone())),
            Some(merged) => {
                let summed = (merged.destination == fee.destination)
                    .then(|| merged.payment.checked_add(&fee.payment))
                    .flatten();
                match summed {
                    Some(payment) => Ok(Some(ReferralFee {
                        destination: merged.destination,
                        payment,
                    })),
                    None => Err(ComposeError::ReferralConflict {
                        first: format!("{} to {}", merged.payment, merged.destination),
                        second: format!("{} to {}", fee.payment, fee.destination),
                    }),
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetMetadata;

    fn referral(destination: &str, amount: u64) -> ReferralFee {
        ReferralFee {
            destination: destination.to_string(),
            payment: AssetAmount::lovelace(amount),
        }
    }

    #[test]
    fn test_merge_referrals_sums_same_destination() {
        let a = referral("addr1a", 1_000_000);
        let b = referral("addr1a", 500_000);
        let merged = merge_referrals([Some(&a), Some(&b)]).unwrap().unwrap();
        assert_eq!(merged, referral("addr1a", 1_500_000));
    }

    #[test]
    fn test_merge_referrals_single_leg() {
        let b = referral("addr1b", 7);
        assert_eq!(merge_referrals([None, Some(&b)]).unwrap(), Some(b));
        assert_eq!(merge_referrals([None, None]).unwrap(), None);
    }

    #[test]
    fn test_merge_referrals_conflicts() {
        let a = referral("addr1a", 1);
        let b = referral("addr1b", 1);
        assert!(matches!(
            merge_referrals([Some(&a), Some(&b)]),
            Err(ComposeError::ReferralConflict { .. })
        ));

        let token = ReferralFee {
            destination: "addr1a".to_string(),
            payment: AssetAmount::new(1u64, AssetMetadata::new("aa.bb", 0)),
        };
        assert!(merge_referrals([Some(&a), Some(&token)]).is_err());
    }

    #[test]
    fn test_merge_amounts_and_totals() {
        let token = AssetMetadata::new("aa.bb", 0);
        let merged = merge_amounts([
            AssetAmount::new(5u64, token.clone()),
            AssetAmount::lovelace(2u64),
            AssetAmount::lovelace(3u64),
        ]);
        assert_eq!(merged, vec![AssetAmount::new(5u64, token), AssetAmount::lovelace(5u64)]);
        assert_eq!(total_lovelace(&[1_000_000, 2_500_000]), 3_500_000);
    }
}

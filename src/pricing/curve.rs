use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::Zero;

use crate::error::CurveError;
use crate::models::Fraction;

/// Amounts on both sides of one constant-product swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveQuote {
    pub input: BigUint,
    pub output: BigUint,
}

/// Pricing curve of a two-asset pool.
pub trait AmmCurve {
    /// Output received for exactly `input`.
    fn quote_output(
        &self,
        input: &BigUint,
        reserve_in: &BigUint,
        reserve_out: &BigUint,
        fee: &Fraction,
    ) -> Result<CurveQuote, CurveError>;

    /// Input required to receive exactly `output`. Fails with
    /// [`CurveError::InsufficientReserve`] unless `output < reserve_out`.
    fn quote_input(
        &self,
        output: &BigUint,
        reserve_in: &BigUint,
        reserve_out: &BigUint,
        fee: &Fraction,
    ) -> Result<CurveQuote, CurveError>;
}

/// `x * y = k` with the fee taken from the input side.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantProductCurve;

impl AmmCurve for ConstantProductCurve {
    fn quote_output(
        &self,
        input: &BigUint,
        reserve_in: &BigUint,
        reserve_out: &BigUint,
        fee: &Fraction,
    ) -> Result<CurveQuote, CurveError> {
        if input.is_zero() {
            return Ok(CurveQuote {
                input: BigUint::zero(),
                output: BigUint::zero(),
            });
        }
        let input_after_fee = input * fee.complement();
        let numerator = reserve_out * &input_after_fee;
        let denominator = reserve_in * fee.denominator() + &input_after_fee;
        Ok(CurveQuote {
            input: input.clone(),
            output: numerator / denominator,
        })
    }

    fn quote_input(
        &self,
        output: &BigUint,
        reserve_in: &BigUint,
        reserve_out: &BigUint,
        fee: &Fraction,
    ) -> Result<CurveQuote, CurveError> {
        if output >= reserve_out {
            return Err(CurveError::InsufficientReserve {
                requested: output.clone(),
                reserve: reserve_out.clone(),
            });
        }
        if output.is_zero() {
            return Ok(CurveQuote {
                input: BigUint::zero(),
                output: BigUint::zero(),
            });
        }
        let numerator = reserve_in * output * fee.denominator();
        let denominator = (reserve_out - output) * fee.complement();
        Ok(CurveQuote {
            input: numerator.div_ceil(&denominator),
            output: output.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    fn one_percent() -> Fraction {
        Fraction::new(1, 100).unwrap()
    }

    #[test]
    fn test_quote_output_matches_constant_product() {
        // 19_800_000 * 250_000_000 / (500_000_000 + 19_800_000)
        let quote = ConstantProductCurve
            .quote_output(&big(20_000_000), &big(500_000_000), &big(250_000_000), &one_percent())
            .unwrap();
        assert_eq!(quote.output, big(9_522_893));
        assert!(quote.output < big(250_000_000));
    }

    #[test]
    fn test_quote_input_covers_requested_output() {
        let curve = ConstantProductCurve;
        let fee = one_percent();
        let needed = curve
            .quote_input(&big(9_522_893), &big(500_000_000), &big(250_000_000), &fee)
            .unwrap();
        let check = curve
            .quote_output(&needed.input, &big(500_000_000), &big(250_000_000), &fee)
            .unwrap();
        assert!(check.output >= big(9_522_893));
        assert!(needed.input <= big(20_000_000));
    }

    #[test]
    fn test_quote_input_fails_at_reserve() {
        let curve = ConstantProductCurve;
        for requested in [250_000_000u64, 300_000_000] {
            let err = curve
                .quote_input(&big(requested), &big(500_000_000), &big(250_000_000), &one_percent())
                .unwrap_err();
            assert_eq!(
                err,
                CurveError::InsufficientReserve {
                    requested: big(requested),
                    reserve: big(250_000_000)
                }
            );
        }
    }

    #[test]
    fn test_zero_amounts() {
        let curve = ConstantProductCurve;
        let out = curve
            .quote_output(&big(0), &big(0), &big(0), &Fraction::zero())
            .unwrap();
        assert!(out.output.is_zero());
        let inp = curve
            .quote_input(&big(0), &big(10), &big(10), &Fraction::zero())
            .unwrap();
        assert!(inp.input.is_zero());
    }
}

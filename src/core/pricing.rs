//! Tiered profit curve and two-leg conversion through the bridge asset.

use super::error::ExchangeError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Profit anchors on the destination-fiat axis as `(amount, profit)`.
/// Amounts must be strictly increasing.
const PROFIT_ANCHORS: [(f64, f64); 4] = [
    (180.0, 30.0),
    (500_000.0, 87_000.0),
    (1_000_000.0, 98_000.0),
    (3_000_000.0, 160_000.0),
];

/// Beyond the last anchor profit grows by `TAIL_STEP_PROFIT` per `TAIL_STEP`.
const TAIL_STEP: f64 = 1_000_000.0;
const TAIL_STEP_PROFIT: f64 = 20_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Local fiat (TZS) into destination fiat (IDR).
    #[serde(rename = "TZS_TO_IDR")]
    TzsToIdr,
    /// Destination fiat (IDR) into local fiat (TZS).
    #[serde(rename = "IDR_TO_TZS")]
    IdrToTzs,
}

impl Direction {
    /// Currency codes of the `(from, to)` legs.
    pub fn legs(&self) -> (&'static str, &'static str) {
        match self {
            Direction::TzsToIdr => ("TZS", "IDR"),
            Direction::IdrToTzs => ("IDR", "TZS"),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::TzsToIdr => "TZS_TO_IDR",
                Direction::IdrToTzs => "IDR_TO_TZS",
            }
        )
    }
}

impl FromStr for Direction {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "TZS_TO_IDR" => Ok(Direction::TzsToIdr),
            "IDR_TO_TZS" => Ok(Direction::IdrToTzs),
            _ => Err(ExchangeError::InvalidDirection(s.to_string())),
        }
    }
}

/// Outcome of a single conversion before any rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub bridge_units: f64,
    pub gross_amount: f64,
    pub profit: f64,
    pub converted_amount: f64,
}

/// Rejects amounts that are not finite or not positive.
pub fn validate_amount(amount: f64) -> Result<f64, ExchangeError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(ExchangeError::InvalidAmount(amount.to_string()))
    }
}

fn interpolate((x_lo, y_lo): (f64, f64), (x_hi, y_hi): (f64, f64), x: f64) -> f64 {
    y_lo + (y_hi - y_lo) * ((x - x_lo) / (x_hi - x_lo))
}

fn extrapolate_tail(x: f64) -> f64 {
    let (x_last, y_last) = PROFIT_ANCHORS[PROFIT_ANCHORS.len() - 1];
    y_last + ((x - x_last) / TAIL_STEP) * TAIL_STEP_PROFIT
}

/// Profit deducted for a gross amount expressed in destination fiat.
///
/// Flat at the first anchor's profit up to its amount, linear between
/// neighbouring anchors and linear with a fixed slope past the last one.
pub fn compute_profit(amount: f64) -> f64 {
    let (x_first, y_first) = PROFIT_ANCHORS[0];
    if amount <= x_first {
        return y_first;
    }

    for window in PROFIT_ANCHORS.windows(2) {
        let (lo, hi) = (window[0], window[1]);
        if amount <= hi.0 {
            return interpolate(lo, hi, amount);
        }
    }

    extrapolate_tail(amount)
}

/// Converts `amount` along `direction` through the bridge asset.
///
/// `bridge_to_local_rate` prices one bridge unit in local fiat and
/// `market_price` prices one bridge unit in destination fiat. The profit basis
/// differs per leg: TZS→IDR charges on the gross IDR output, IDR→TZS charges on
/// the raw IDR input. The net amount never drops below zero, and amounts that
/// overflow on either leg are rejected rather than quoted.
pub fn convert(
    amount: f64,
    direction: Direction,
    bridge_to_local_rate: f64,
    market_price: f64,
) -> Result<Conversion, ExchangeError> {
    let amount = validate_amount(amount)?;
    if !(bridge_to_local_rate.is_finite() && bridge_to_local_rate > 0.0) {
        return Err(ExchangeError::SettingsInvalid);
    }
    if !(market_price.is_finite() && market_price > 0.0) {
        return Err(ExchangeError::MarketUnavailable(format!(
            "unusable market price {market_price}"
        )));
    }

    let (bridge_units, gross_amount, profit) = match direction {
        Direction::TzsToIdr => {
            let bridge_units = amount / bridge_to_local_rate;
            let gross = bridge_units * market_price;
            (bridge_units, gross, compute_profit(gross))
        }
        Direction::IdrToTzs => {
            let bridge_units = amount / market_price;
            let gross = bridge_units * bridge_to_local_rate;
            (bridge_units, gross, compute_profit(amount))
        }
    };
    if !(bridge_units.is_finite() && gross_amount.is_finite()) {
        return Err(ExchangeError::InvalidAmount(format!("{amount:e} is out of range")));
    }

    Ok(Conversion {
        bridge_units,
        gross_amount,
        profit,
        converted_amount: (gross_amount - profit).max(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_profit_is_continuous_at_anchors() {
        let (x_first, y_first) = PROFIT_ANCHORS[0];
        assert_close(interpolate(PROFIT_ANCHORS[0], PROFIT_ANCHORS[1], x_first), y_first);

        for window in PROFIT_ANCHORS.windows(3) {
            let (left, mid, right) = (window[0], window[1], window[2]);
            let from_left = interpolate(left, mid, mid.0);
            let from_right = interpolate(mid, right, mid.0);
            assert_close(from_left, from_right);
            assert_close(compute_profit(mid.0), mid.1);
        }

        let (x_last, y_last) = PROFIT_ANCHORS[PROFIT_ANCHORS.len() - 1];
        let from_left = interpolate(
            PROFIT_ANCHORS[PROFIT_ANCHORS.len() - 2],
            PROFIT_ANCHORS[PROFIT_ANCHORS.len() - 1],
            x_last,
        );
        assert_close(from_left, extrapolate_tail(x_last));
        assert_close(compute_profit(x_last), y_last);
    }

    #[test]
    fn test_profit_is_monotonic() {
        let mut previous = compute_profit(0.0);
        let mut x = 0.0;
        while x <= 6_000_000.0 {
            let current = compute_profit(x);
            assert!(current >= previous, "profit decreased at {x}");
            previous = current;
            x += 997.0;
        }
    }

    #[test]
    fn test_profit_floor() {
        for x in [0.01, 1.0, 50.0, 179.99, 180.0] {
            assert_eq!(compute_profit(x), 30.0);
        }
        assert!(compute_profit(180.01) > 30.0);
    }

    #[test]
    fn test_profit_interpolates_between_anchors() {
        assert_close(compute_profit(1_620_000.0), 117_220.0);
        assert_close(compute_profit(750_000.0), 92_500.0);
    }

    #[test]
    fn test_profit_tail_slope() {
        assert_eq!(compute_profit(4_000_000.0), 180_000.0);
        assert_eq!(compute_profit(5_000_000.0), 200_000.0);
    }

    #[test]
    fn test_convert_tzs_to_idr_charges_gross_output() {
        let result = convert(260_000.0, Direction::TzsToIdr, 2600.0, 16_200.0).unwrap();
        assert_close(result.bridge_units, 100.0);
        assert_close(result.gross_amount, 1_620_000.0);
        assert_close(result.profit, 117_220.0);
        assert_close(result.converted_amount, 1_502_780.0);
    }

    #[test]
    fn test_convert_small_gross_uses_profit_floor() {
        // 20 TZS is ~124.6 IDR gross, below the first anchor.
        let result = convert(20.0, Direction::TzsToIdr, 2600.0, 16_200.0).unwrap();
        assert_eq!(result.profit, 30.0);
        assert_close(result.converted_amount, result.gross_amount - 30.0);
    }

    #[test]
    fn test_convert_idr_to_tzs_charges_raw_input() {
        let result = convert(180.0, Direction::IdrToTzs, 2600.0, 16_200.0).unwrap();
        assert_eq!(result.profit, 30.0);
        assert_close(result.gross_amount, 180.0 / 16_200.0 * 2600.0);
        // Profit exceeds the ~28.9 TZS gross, so the output floors at zero.
        assert_eq!(result.converted_amount, 0.0);
    }

    #[test]
    fn test_profit_basis_differs_per_direction() {
        let amount = 1_000_000.0;
        let forward = convert(amount, Direction::TzsToIdr, 2600.0, 16_200.0).unwrap();
        let backward = convert(amount, Direction::IdrToTzs, 2600.0, 16_200.0).unwrap();

        assert_close(forward.profit, compute_profit(forward.gross_amount));
        assert_close(backward.profit, compute_profit(amount));
        assert!((forward.profit - backward.profit).abs() > 1.0);
    }

    #[test]
    fn test_converted_amount_is_never_negative() {
        let rates = [1.0, 2600.0, 50_000.0];
        let prices = [0.5, 16_200.0, 1_000_000.0];
        for amount in [0.001, 1.0, 20.0, 180.0, 10_000.0, 5_000_000.0, 1e12] {
            for direction in [Direction::TzsToIdr, Direction::IdrToTzs] {
                for &rate in &rates {
                    for &price in &prices {
                        let result = convert(amount, direction, rate, price).unwrap();
                        assert!(
                            result.converted_amount >= 0.0 && result.converted_amount.is_finite(),
                            "{direction} {amount} at rate {rate}, price {price}: {result:?}"
                        );
                    }
                }
            }
        }

        // Gross IDR of 20 TZS at 50,000 TZS/USDT and 0.5 IDR/USDT is far below the floor.
        let tiny = convert(20.0, Direction::TzsToIdr, 50_000.0, 0.5).unwrap();
        assert!(tiny.gross_amount < tiny.profit);
        assert_eq!(tiny.converted_amount, 0.0);
    }

    #[test]
    fn test_convert_rejects_overflowing_amounts() {
        let err = convert(1e308, Direction::TzsToIdr, 2600.0, 16_200.0).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidAmount(_)), "{err:?}");
        let err = convert(1e308, Direction::IdrToTzs, 50_000.0, 1.0).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidAmount(_)), "{err:?}");

        // Valid but extreme rates or prices overflow on either leg.
        let err = convert(260_000.0, Direction::TzsToIdr, 1e-300, 16_200.0).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidAmount(_)));
        let err = convert(1e300, Direction::IdrToTzs, 1e300, 1e-10).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidAmount(_)));
    }

    #[test]
    fn test_convert_rejects_invalid_amounts() {
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = convert(amount, Direction::TzsToIdr, 2600.0, 16_200.0).unwrap_err();
            assert!(matches!(err, ExchangeError::InvalidAmount(_)));
        }
    }

    #[test]
    fn test_convert_rejects_unusable_rate_and_price() {
        let err = convert(100.0, Direction::TzsToIdr, 0.0, 16_200.0).unwrap_err();
        assert!(matches!(err, ExchangeError::SettingsInvalid));

        let err = convert(100.0, Direction::IdrToTzs, 2600.0, -1.0).unwrap_err();
        assert!(matches!(err, ExchangeError::MarketUnavailable(_)));
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("TZS_TO_IDR".parse::<Direction>().unwrap(), Direction::TzsToIdr);
        assert_eq!("idr-to-tzs".parse::<Direction>().unwrap(), Direction::IdrToTzs);
        assert_eq!(Direction::TzsToIdr.to_string(), "TZS_TO_IDR");
        assert_eq!(Direction::IdrToTzs.legs(), ("IDR", "TZS"));

        let err = "USD_TO_EUR".parse::<Direction>().unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidDirection(ref d) if d == "USD_TO_EUR"));
    }
}

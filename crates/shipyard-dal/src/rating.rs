use rust_decimal::prelude::{FromPrimitive as _, ToPrimitive as _};
use rust_decimal::{Decimal, RoundingStrategy};

/// Last year a ship can be produced in, also the reference year for rating.
pub const CURRENT_YEAR: i32 = 3019;
/// Rating is rounded to this number of fractional digits.
pub const RATING_SCALE: u32 = 2;

const SPEED_COEFFICIENT: i64 = 80;

/// Derives ship rating from its speed, usage and production year:
///
/// `80 * speed * (0.5 if used else 1) / (3019 - year + 1)`
///
/// rounded half up to two decimal places. Arithmetic is done in decimal,
/// so a ratio like 1.005 rounds to 1.01 regardless of how the speed is
/// represented in binary floating point.
///
/// Inputs are expected to be validated already. Outside of valid ranges the
/// function does not fail: zero denominator or non finite speed gives 0.
pub fn calculate_rating(speed: f64, is_used: bool, production_year: i32) -> f64 {
    let speed = Decimal::from_f64(speed).unwrap_or(Decimal::ZERO);
    let usage = if is_used {
        Decimal::new(5, 1)
    } else {
        Decimal::ONE
    };
    let age = Decimal::from(i64::from(CURRENT_YEAR) - i64::from(production_year) + 1);

    (Decimal::from(SPEED_COEFFICIENT) * speed * usage)
        .checked_div(age)
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(RATING_SCALE, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

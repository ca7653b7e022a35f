/// Rounds to `dp` decimals. An exact binary tie goes to the even neighbour.
pub(crate) fn round_dp(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    let scaled = value * factor;
    let rounded = if scaled.fract().abs() == 0.5 {
        scaled.round_ties_even()
    } else {
        scaled.round()
    };
    rounded / factor
}

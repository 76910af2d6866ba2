/// Deterministic value in `[0, 1)` for `(seed, offset)`.
///
/// Pure and stateless: the same inputs always produce the same bits. The fractional part is
/// taken with a truncating remainder, so a negative sine maps to `0.0`.
pub fn seeded_unit(seed: u64, offset: u32) -> f64 {
    let x = ((seed as f64) + f64::from(offset)).sin() * 10_000.0;
    (x % 1.0).max(0.0)
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;

//! Travel position math: bias percentage to stepper position and back to
//! sane bounds.

use crate::{MAX_BIAS, MIN_BIAS};
use bias_traits::BiasState;

/// Clamp a requested bias percentage into the mechanical range. Requests
/// outside the range are never rejected, only truncated.
#[inline]
pub fn clamp_bias(percent: u8) -> u8 {
    percent.clamp(MIN_BIAS, MAX_BIAS)
}

/// Linear interpolation of a bias percentage onto the calibrated travel,
/// rounding down. `MIN_BIAS` maps to step 0, `MAX_BIAS` to `step_range`.
///
/// Integer-only: `travel * step_range` fits in u32 for any u16 range, and
/// the quotient is bounded by `step_range`, so the final cast is lossless.
#[inline]
pub fn target_steps(percent: u8, step_range: u16) -> u16 {
    let clamped = clamp_bias(percent);
    let travel = u32::from(clamped - MIN_BIAS);
    let span = u32::from(MAX_BIAS - MIN_BIAS);
    ((travel * u32::from(step_range)) / span) as u16
}

/// Power-on defaults used when no persisted state exists yet: a nominal
/// 100-step range, homed to the left, at minimum bias.
pub fn boot_default() -> BiasState {
    BiasState {
        step_range: 100,
        step_pos: 0,
        bias_actual: MIN_BIAS,
    }
}

/// Clamp a loaded record back into the documented invariants. Persisted
/// data predating a mechanical change may violate them.
pub(crate) fn sanitize(mut state: BiasState) -> BiasState {
    if state.step_pos > state.step_range {
        state.step_pos = state.step_range;
    }
    state.bias_actual = clamp_bias(state.bias_actual);
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_spans_the_range() {
        assert_eq!(target_steps(70, 100), 100);
        assert_eq!(target_steps(30, 100), 0);
        assert_eq!(target_steps(50, 100), 50);
    }

    #[test]
    fn interpolation_rounds_down() {
        // 50% of a 3-step range: 20 * 3 / 40 = 1.5 -> 1
        assert_eq!(target_steps(50, 3), 1);
        assert_eq!(target_steps(31, 100), 2);
    }

    #[test]
    fn out_of_range_requests_clamp() {
        assert_eq!(target_steps(85, 100), target_steps(70, 100));
        assert_eq!(target_steps(10, 100), target_steps(30, 100));
        assert_eq!(clamp_bias(85), 70);
        assert_eq!(clamp_bias(10), 30);
        assert_eq!(clamp_bias(50), 50);
    }

    #[test]
    fn zero_range_maps_everything_to_zero() {
        assert_eq!(target_steps(70, 0), 0);
        assert_eq!(target_steps(30, 0), 0);
    }

    #[test]
    fn sanitize_restores_invariants() {
        let fixed = sanitize(BiasState {
            step_range: 50,
            step_pos: 80,
            bias_actual: 90,
        });
        assert_eq!(fixed.step_pos, 50);
        assert_eq!(fixed.bias_actual, MAX_BIAS);

        let ok = BiasState {
            step_range: 100,
            step_pos: 40,
            bias_actual: 55,
        };
        assert_eq!(sanitize(ok), ok);
    }
}

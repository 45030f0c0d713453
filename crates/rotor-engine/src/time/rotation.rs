/// Rotation speed of the model, in degrees per second.
pub const DEGREES_PER_SECOND: f64 = 60.0;

/// Accumulated rotation about the view axis.
///
/// The angle grows without bound; it is never wrapped to `[0, 360)`. At 60°/s an
/// `f64` keeps sub-millidegree precision for far longer than any session runs.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct RotationState {
    angle_degrees: f64,
}

impl RotationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_angle(angle_degrees: f64) -> Self {
        Self { angle_degrees }
    }

    /// Advances the angle by `elapsed_ms` at [`DEGREES_PER_SECOND`].
    pub fn advance(&mut self, elapsed_ms: f64) {
        self.angle_degrees += elapsed_ms * DEGREES_PER_SECOND * 0.001;
    }

    #[inline]
    pub fn degrees(&self) -> f64 {
        self.angle_degrees
    }

    #[inline]
    pub fn radians(&self) -> f64 {
        self.angle_degrees.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_ms_is_point_nine_six_degrees() {
        let mut r = RotationState::new();
        r.advance(16.0);
        assert_eq!(r.degrees(), 0.96);
    }

    #[test]
    fn zero_elapsed_keeps_angle() {
        let mut r = RotationState::with_angle(12.5);
        r.advance(0.0);
        assert_eq!(r.degrees(), 12.5);
    }

    #[test]
    fn one_second_is_sixty_degrees() {
        let mut r = RotationState::new();
        for _ in 0..4 {
            r.advance(250.0);
        }
        assert!((r.degrees() - 60.0).abs() < 1e-9);
        assert!((r.radians() - std::f64::consts::FRAC_PI_3).abs() < 1e-12);
    }

    #[test]
    fn angle_is_not_wrapped() {
        let mut r = RotationState::new();
        r.advance(10_000.0);
        assert!((r.degrees() - 600.0).abs() < 1e-9);
    }
}

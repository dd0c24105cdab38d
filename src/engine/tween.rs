// Time-bounded eased interpolation.
//
// A Tween is advanced once per frame by its owner. Nothing runs on its own:
// completion is observed by the caller checking is_finished() after advance(),
// and replacing a tween is the only way to cancel one.

use glam::Vec3;

/// Easing curves. Input and output are both in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    /// Slow start, fast middle, slow end (cubic).
    CubicInOut,
    /// Fast start, slow end (quadratic).
    QuadOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Ease::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// Values a tween can interpolate.
pub trait Interpolate: Copy {
    fn interpolate(from: Self, to: Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(from: Self, to: Self, t: f32) -> Self {
        from + (to - from) * t
    }
}

impl Interpolate for Vec3 {
    fn interpolate(from: Self, to: Self, t: f32) -> Self {
        from.lerp(to, t)
    }
}

/// Identifies one started tween so its outcome can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenId(pub u64);

/// How a tween ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenOutcome {
    /// Ran for its full duration and reached its destination.
    Completed,
    /// Replaced by a newer tween before finishing.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct Tween<T: Interpolate> {
    pub id: TweenId,
    pub from: T,
    pub to: T,
    pub duration: f32,
    pub ease: Ease,
    elapsed: f32,
}

impl<T: Interpolate> Tween<T> {
    pub fn new(id: TweenId, from: T, to: T, duration: f32, ease: Ease) -> Self {
        Self { id, from, to, duration: duration.max(0.0), ease, elapsed: 0.0 }
    }

    /// Advance by `dt` seconds and return the interpolated value.
    /// The final value is exactly `to`.
    pub fn advance(&mut self, dt: f32) -> T {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.value()
    }

    pub fn value(&self) -> T {
        if self.is_finished() {
            return self.to;
        }
        T::interpolate(self.from, self.to, self.ease.apply(self.progress()))
    }

    /// Linear progress in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_in_out_endpoints_and_midpoint() {
        assert_eq!(Ease::CubicInOut.apply(0.0), 0.0);
        assert_eq!(Ease::CubicInOut.apply(1.0), 1.0);
        assert!((Ease::CubicInOut.apply(0.5) - 0.5).abs() < 1e-6);
        // Slow start
        assert!(Ease::CubicInOut.apply(0.1) < 0.1);
    }

    #[test]
    fn quad_out_is_front_loaded() {
        assert!(Ease::QuadOut.apply(0.25) > 0.25);
        assert_eq!(Ease::QuadOut.apply(1.0), 1.0);
    }

    #[test]
    fn tween_lands_exactly_on_destination() {
        let to = Vec3::new(2.65, 3.5, -12.3);
        let mut tween = Tween::new(TweenId(1), Vec3::ZERO, to, 1.0, Ease::CubicInOut);
        for _ in 0..7 {
            tween.advance(1.0 / 60.0);
        }
        assert!(!tween.is_finished());
        // Overshooting dt never moves past the destination.
        let v = tween.advance(5.0);
        assert!(tween.is_finished());
        assert_eq!(v, to);
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let tween = Tween::new(TweenId(2), 0.0_f32, 1.0, 0.0, Ease::QuadOut);
        assert!(tween.is_finished());
        assert_eq!(tween.value(), 1.0);
    }
}

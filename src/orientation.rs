use serde::{Deserialize, Serialize};

use crate::config::IrradianceConfig;
use crate::irradiance;

// Grid resolution the optimum is snapped to
const TILT_GRID_STEP: f64 = 0.5;
const AZ_GRID_STEP: f64 = 1.0;

/// Constraints for orientation search (tilt and azimuth ranges)
#[derive(Debug, Clone, Copy)]
pub struct OrientationConstraints {
    /// Minimum allowed tilt (degrees)
    pub tilt_min: f64,
    /// Maximum allowed tilt (degrees)
    pub tilt_max: f64,
    /// Minimum allowed azimuth (degrees)
    pub azimuth_min: f64,
    /// Maximum allowed azimuth (degrees)
    pub azimuth_max: f64,
}

impl Default for OrientationConstraints {
    fn default() -> Self {
        Self { tilt_min: 0.0, tilt_max: 90.0, azimuth_min: 0.0, azimuth_max: 360.0 }
    }
}

impl OrientationConstraints {
    pub fn with_tilt_range(mut self, min: f64, max: f64) -> Self {
        self.tilt_min = min.clamp(0.0, 90.0);
        self.tilt_max = max.clamp(self.tilt_min, 90.0);
        self
    }
}

/// Best plane orientation found for a site
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationOptimum {
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub multiplier: f64,
    pub evaluations: usize,
}

impl OrientationOptimum {
    /// Share of the optimal multiplier reached by a plane with `multiplier`
    pub fn efficiency_of(&self, multiplier: f64) -> f64 {
        if self.multiplier > 0.0 { (multiplier / self.multiplier).min(1.0) } else { 0.0 }
    }
}

/// Search the tilt range first (at the azimuth range centre), then the
/// azimuth range at the best tilt. Both factors are separable and unimodal
/// over their ranges, so two golden-section passes reach the optimum.
pub fn optimal_orientation(
    latitude: f64,
    constraints: &OrientationConstraints,
    config: &IrradianceConfig,
) -> OrientationOptimum {
    let mut evaluations = 0;
    let mut multiplier = |tilt: f64, az: f64| -> f64 {
        evaluations += 1;
        irradiance::irradiance(latitude, tilt, az, config).multiplier()
    };

    let initial_az = (constraints.azimuth_min + constraints.azimuth_max) / 2.0;

    let (raw_tilt, _) =
        golden_section_search(constraints.tilt_min, constraints.tilt_max, 0.1, |t| {
            multiplier(t, initial_az)
        });
    let best_tilt = ((raw_tilt / TILT_GRID_STEP).round() * TILT_GRID_STEP)
        .clamp(constraints.tilt_min, constraints.tilt_max);

    let best_az = if constraints.azimuth_max - constraints.azimuth_min > AZ_GRID_STEP {
        let (raw_az, _) =
            golden_section_search(constraints.azimuth_min, constraints.azimuth_max, 0.2, |a| {
                multiplier(best_tilt, a)
            });
        ((raw_az / AZ_GRID_STEP).round() * AZ_GRID_STEP)
            .clamp(constraints.azimuth_min, constraints.azimuth_max)
    } else {
        initial_az
    };

    let best = multiplier(best_tilt, best_az);

    OrientationOptimum { tilt_deg: best_tilt, azimuth_deg: best_az, multiplier: best, evaluations }
}

/// Generic Golden Section Search for finding the maximum of a unimodal function `f`
/// within the range `[min, max]`.
///
/// Returns (x_at_max, max_value)
fn golden_section_search<F>(min: f64, max: f64, tol: f64, mut f: F) -> (f64, f64)
where
    F: FnMut(f64) -> f64,
{
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let resphi = 2.0 - phi;

    let mut a = min;
    let mut b = max;

    let mut c = a + resphi * (b - a);
    let mut d = b - resphi * (b - a);

    let mut fc = f(c);
    let mut fd = f(d);

    while (b - a).abs() > tol {
        if fc < fd {
            // Max is in [c, b]
            a = c;
            c = d;
            fc = fd;
            d = b - resphi * (b - a);
            fd = f(d);
        } else {
            // Max is in [a, d]
            b = d;
            d = c;
            fd = fc;
            c = a + resphi * (b - a);
            fc = f(c);
        }
    }

    ((a + b) / 2.0, fc.max(fd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimum_tilt_matches_latitude() {
        let config = IrradianceConfig::default();
        let opt = optimal_orientation(37.7749, &OrientationConstraints::default(), &config);

        assert!((opt.tilt_deg - 38.0).abs() < 0.51, "Optimal tilt {} should be ~38°", opt.tilt_deg);
        assert!((opt.azimuth_deg - 180.0).abs() < 1.01, "Optimal azimuth {}", opt.azimuth_deg);
        // Tilt factor 1.0 and azimuth factor 1.0 at the 1600 kWh/m² band
        assert!((opt.multiplier - 1.6).abs() < 1e-3, "Multiplier {}", opt.multiplier);
        assert!(opt.evaluations > 2);
    }

    #[test]
    fn test_constrained_tilt_stays_in_range() {
        let config = IrradianceConfig::default();
        let constraints = OrientationConstraints::default().with_tilt_range(10.0, 30.0);
        let opt = optimal_orientation(50.0, &constraints, &config);

        assert!((opt.tilt_deg - 30.0).abs() < 0.51, "Tilt {} should hit the upper limit", opt.tilt_deg);
        assert!(opt.tilt_deg <= 30.0);
    }

    #[test]
    fn test_efficiency_of_plane() {
        let config = IrradianceConfig::default();
        let opt = optimal_orientation(37.7749, &OrientationConstraints::default(), &config);
        let east = irradiance::irradiance(37.7749, 25.0, 90.0, &config).multiplier();

        let eff = opt.efficiency_of(east);
        assert!(eff > 0.15 && eff < 0.25, "East roof efficiency {}", eff);
        assert_eq!(opt.efficiency_of(opt.multiplier * 2.0), 1.0);
    }

    #[test]
    fn test_golden_section_search_basic() {
        // f(x) = -(x - 3)^2 + 10 has its maximum at x = 3.0 with value 10.0
        let tolerance = 1e-6;
        let (x, y) = golden_section_search(0.0, 6.0, tolerance, |x| -(x - 3.0).powi(2) + 10.0);

        assert!((x - 3.0).abs() < 1e-5, "Expected maximum at x=3.0, got x={:.5}", x);
        assert!((y - 10.0).abs() < 1e-8, "Expected max value y=10.0, got y={:.5}", y);
    }
}

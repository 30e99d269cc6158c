//! Bounding box accumulator for extruded geometry.

use serde::Serialize;

/// Axis-aligned bounds in G-code coordinates (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Bounds {
    pub fn new() -> Self {
        Self {
            min_x: f64::MAX,
            max_x: f64::MIN,
            min_y: f64::MAX,
            max_y: f64::MIN,
            min_z: f64::MAX,
            max_z: f64::MIN,
        }
    }

    /// Grow to include a point. NaN coordinates are ignored by `min`/`max`.
    pub fn update(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    pub fn is_valid(&self) -> bool {
        self.min_x.is_finite()
            && self.max_x.is_finite()
            && self.min_y.is_finite()
            && self.max_y.is_finite()
            && self.min_z.is_finite()
            && self.max_z.is_finite()
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
            // Single-layer prints have min_z == max_z
            && self.min_z <= self.max_z
    }

    pub fn size(&self) -> (f64, f64, f64) {
        (
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        )
    }

    pub fn center(&self) -> (f64, f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
            (self.min_z + self.max_z) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bounds_are_invalid() {
        assert!(!Bounds::new().is_valid());
    }

    #[test]
    fn test_update_and_size() {
        let mut bounds = Bounds::new();
        bounds.update(0.0, 0.0, 0.2);
        bounds.update(10.0, 20.0, 0.2);
        assert!(bounds.is_valid());
        assert_eq!(bounds.size(), (10.0, 20.0, 0.0));
        assert_eq!(bounds.center(), (5.0, 10.0, 0.2));
    }

    #[test]
    fn test_nan_points_do_not_poison_bounds() {
        let mut bounds = Bounds::new();
        bounds.update(1.0, 1.0, 1.0);
        bounds.update(f64::NAN, 2.0, 1.0);
        assert!(bounds.is_valid());
        assert_eq!(bounds.max_y, 2.0);
        assert_eq!(bounds.max_x, 1.0);
    }
}

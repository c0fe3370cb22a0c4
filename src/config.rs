//! Immutable configuration of a cut.

use crate::errors::CutError;
use crate::float_types::Real;
use std::ops::RangeInclusive;

/// Default inflation of the cutting volumes relative to the tight bounds
pub const DEFAULT_SCALE_FACTOR: Real = 1.1;

/// Accepted range for [`CutConfig::scale_factor`]
pub const SCALE_FACTOR_RANGE: RangeInclusive<Real> = 1.0..=2.0;

/// Default tolerance for matching a face normal to an axis direction
pub const DEFAULT_NORMAL_TOLERANCE: Real = 1e-4;

/// Proportions of the peg/socket connectors, relative to the cutting-volume
/// extents on the relevant axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorSpec {
    /// Footprint of Z-axis (top/bottom) connectors
    pub base_xy_scale: Real,
    /// Footprint of X- and Y-axis (side) connectors
    pub connector_xy_scale: Real,
    /// Connector depth along the cut normal
    pub connector_z_depth: Real,
    /// Shrink of the connector tip on the two cross axes
    pub taper_scale: Real,
    /// Enlargement applied to socket dimensions only
    pub clearance_scale: Real,
}

impl Default for ConnectorSpec {
    fn default() -> Self {
        Self {
            base_xy_scale: 1.0 / 3.0,
            connector_xy_scale: 1.0 / 6.0,
            connector_z_depth: 1.0 / 20.0,
            taper_scale: 0.9,
            clearance_scale: 1.05,
        }
    }
}

/// Everything that parameterises a cut.
///
/// ```rust
/// # use octacut::config::CutConfig;
/// let config = CutConfig::new(1.25).unwrap().with_normal_tolerance(1e-3);
/// assert_eq!(config.scale_factor(), 1.25);
/// assert!(CutConfig::new(2.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutConfig {
    scale_factor: Real,
    pub connector: ConnectorSpec,
    pub normal_tolerance: Real,
}

impl Default for CutConfig {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            connector: ConnectorSpec::default(),
            normal_tolerance: DEFAULT_NORMAL_TOLERANCE,
        }
    }
}

impl CutConfig {
    /// Configuration with default connectors and the given scale factor.
    pub fn new(scale_factor: Real) -> Result<Self, CutError> {
        Self::default().with_scale_factor(scale_factor)
    }

    pub const fn scale_factor(&self) -> Real {
        self.scale_factor
    }

    pub fn with_scale_factor(mut self, scale_factor: Real) -> Result<Self, CutError> {
        if !SCALE_FACTOR_RANGE.contains(&scale_factor) {
            return Err(CutError::ScaleFactorOutOfRange(scale_factor));
        }
        self.scale_factor = scale_factor;
        Ok(self)
    }

    pub const fn with_connector(mut self, connector: ConnectorSpec) -> Self {
        self.connector = connector;
        self
    }

    pub const fn with_normal_tolerance(mut self, tolerance: Real) -> Self {
        self.normal_tolerance = tolerance;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_factor_bounds_are_inclusive() {
        assert!(CutConfig::new(1.0).is_ok());
        assert!(CutConfig::new(2.0).is_ok());
        assert_eq!(
            CutConfig::new(0.99),
            Err(CutError::ScaleFactorOutOfRange(0.99))
        );
        assert!(CutConfig::new(Real::NAN).is_err());
    }

    #[test]
    fn defaults() {
        let config = CutConfig::default();
        assert_eq!(config.scale_factor(), 1.1);
        assert_eq!(config.connector.clearance_scale, 1.05);
        assert_eq!(config.normal_tolerance, 1e-4);
    }
}

//! One-dimensional potentials `V(x)` selected by tag.
//!
//! Requests name a potential by a [`PotentialKind`] tag plus a loose
//! [`PotentialParams`] record; [`Potential::new`] turns the pair into a
//! strongly-typed [`Potential`], filling in defaults and rejecting bad values.

use serde::{ Deserialize, Serialize };
use crate::{
    error::ValidationError,
    grid::Grid,
};

/// Potential family tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotentialKind {
    /// `½ ω² x²`
    Harmonic,
    /// Zero inside `|x| < width/2`, `height` outside.
    SquareWell,
    /// `height` inside `|x| < width/2`, zero outside.
    Barrier,
    /// `a x⁴`
    Quartic,
    /// Identically zero.
    Free,
}

/// Untyped potential parameters as they arrive over the wire.
///
/// Fields irrelevant to the chosen [`PotentialKind`] are ignored.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct PotentialParams {
    pub omega: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub a: Option<f64>,
}

/// A potential with its parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Potential {
    Harmonic { omega: f64 },
    SquareWell { width: f64, height: f64 },
    Barrier { width: f64, height: f64 },
    Quartic { a: f64 },
    Free,
}

impl Potential {
    /// Build a potential from a tag and parameter record, applying defaults
    /// for missing parameters.
    pub fn new(kind: PotentialKind, params: &PotentialParams)
        -> Result<Self, ValidationError>
    {
        let pot
            = match kind {
                PotentialKind::Harmonic => {
                    let omega = params.omega.unwrap_or(1.0);
                    ValidationError::check_positive("omega", omega)?;
                    Self::Harmonic { omega }
                },
                PotentialKind::SquareWell => {
                    let width = params.width.unwrap_or(2.0);
                    let height = params.height.unwrap_or(100.0);
                    ValidationError::check_positive("width", width)?;
                    ValidationError::check_finite("height", height)?;
                    Self::SquareWell { width, height }
                },
                PotentialKind::Barrier => {
                    let width = params.width.unwrap_or(1.0);
                    let height = params.height.unwrap_or(5.0);
                    ValidationError::check_positive("width", width)?;
                    ValidationError::check_finite("height", height)?;
                    Self::Barrier { width, height }
                },
                PotentialKind::Quartic => {
                    let a = params.a.unwrap_or(1.0);
                    ValidationError::check_positive("a", a)?;
                    Self::Quartic { a }
                },
                PotentialKind::Free => Self::Free,
            };
        Ok(pot)
    }

    /// Get the tag for this potential.
    pub fn kind(&self) -> PotentialKind {
        match self {
            Self::Harmonic { .. } => PotentialKind::Harmonic,
            Self::SquareWell { .. } => PotentialKind::SquareWell,
            Self::Barrier { .. } => PotentialKind::Barrier,
            Self::Quartic { .. } => PotentialKind::Quartic,
            Self::Free => PotentialKind::Free,
        }
    }

    /// Evaluate the potential at a single point.
    pub fn eval(&self, x: f64) -> f64 {
        match *self {
            Self::Harmonic { omega } => 0.5 * omega.powi(2) * x.powi(2),
            Self::SquareWell { width, height } => {
                if x.abs() < width / 2.0 { 0.0 } else { height }
            },
            Self::Barrier { width, height } => {
                if x.abs() < width / 2.0 { height } else { 0.0 }
            },
            Self::Quartic { a } => a * x.powi(4),
            Self::Free => 0.0,
        }
    }

    /// Sample the potential over a grid.
    pub fn sample(&self, grid: &Grid) -> ndarray::Array1<f64> {
        grid.sample(|x| self.eval(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let p = PotentialParams::default();
        assert_eq!(
            Potential::new(PotentialKind::Harmonic, &p).unwrap(),
            Potential::Harmonic { omega: 1.0 },
        );
        assert_eq!(
            Potential::new(PotentialKind::SquareWell, &p).unwrap(),
            Potential::SquareWell { width: 2.0, height: 100.0 },
        );
        assert_eq!(
            Potential::new(PotentialKind::Barrier, &p).unwrap(),
            Potential::Barrier { width: 1.0, height: 5.0 },
        );
    }

    #[test]
    fn rejects_nonpositive_parameters() {
        let p = PotentialParams { omega: Some(-1.0), ..Default::default() };
        assert!(Potential::new(PotentialKind::Harmonic, &p).is_err());
        let p = PotentialParams { width: Some(0.0), ..Default::default() };
        assert!(Potential::new(PotentialKind::Barrier, &p).is_err());
    }

    #[test]
    fn evaluates_piecewise_shapes() {
        let well = Potential::SquareWell { width: 2.0, height: 10.0 };
        assert_eq!(well.eval(0.5), 0.0);
        assert_eq!(well.eval(1.5), 10.0);
        let barrier = Potential::Barrier { width: 1.0, height: 5.0 };
        assert_eq!(barrier.eval(0.0), 5.0);
        assert_eq!(barrier.eval(-0.75), 0.0);
        let ho = Potential::Harmonic { omega: 2.0 };
        assert!((ho.eval(1.0) - 2.0).abs() < 1e-15);
    }

    #[test]
    fn unknown_tags_do_not_deserialize() {
        let kind: Result<PotentialKind, _> = serde_json::from_str("\"morse\"");
        assert!(kind.is_err());
        let kind: PotentialKind = serde_json::from_str("\"square_well\"").unwrap();
        assert_eq!(kind, PotentialKind::SquareWell);
    }
}

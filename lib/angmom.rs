//! Angular momentum matrices for arbitrary spin `j`.
//!
//! All matrices are expressed in the `|j, m⟩` basis ordered by *descending*
//! `m`, i.e. index `k` holds `m = j - k`, with ħ = 1.

use ndarray as nd;
use num_complex::Complex64 as C64;
use serde::{ Deserialize, Serialize };
use crate::error::ValidationError;

/// A Cartesian axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis { X, Y, Z }

/// Largest accepted `2j`.
pub const MAX_TWICE_J: usize = 1 << 16;

/// Check that `j` is a non-negative half-integer no larger than
/// `MAX_TWICE_J / 2` and return `2j`.
pub fn twice_j(what: &'static str, j: f64) -> Result<usize, ValidationError> {
    ValidationError::check_finite(what, j)?;
    let tj = 2.0 * j;
    if j < 0.0 || (tj - tj.round()).abs() > 1e-9 {
        return Err(ValidationError::NotHalfInteger { what, value: j });
    }
    // compared as f64 so the cast below cannot saturate
    if tj > MAX_TWICE_J as f64 {
        return Err(ValidationError::LimitExceeded {
            what, limit: MAX_TWICE_J, got: tj.min(usize::MAX as f64) as usize,
        });
    }
    Ok(tj.round() as usize)
}

/// The `m` values `j, j - 1, ..., -j` labelling basis index `k`.
pub fn m_values(j: f64) -> Vec<f64> {
    let n = (2.0 * j).round() as usize + 1;
    (0..n).map(|k| j - k as f64).collect()
}

/// `Jx`, `Jy`, `Jz` and ladder operators for a single spin.
#[derive(Clone, Debug)]
pub struct SpinMatrices {
    j: f64,
    jx: nd::Array2<C64>,
    jy: nd::Array2<C64>,
    jz: nd::Array2<C64>,
    jp: nd::Array2<C64>,
    jm: nd::Array2<C64>,
}

impl SpinMatrices {
    /// Build the matrices for spin `j`.
    pub fn new(j: f64) -> Result<Self, ValidationError> {
        let tj = twice_j("j", j)?;
        Ok(Self::from_twice_j(tj))
    }

    /// Build the matrices for the spin whose multiplet has dimension `n`, i.e.
    /// `j = (n - 1) / 2`.
    pub fn from_dim(n: usize) -> Result<Self, ValidationError> {
        ValidationError::check_min("N", 1, n)?;
        Ok(Self::from_twice_j(n - 1))
    }

    fn from_twice_j(tj: usize) -> Self {
        let j = tj as f64 / 2.0;
        let n = tj + 1;
        let m = m_values(j);
        let mdiag: nd::Array1<C64> = m.iter().map(|&mk| C64::from(mk)).collect();
        let jz: nd::Array2<C64> = nd::Array2::from_diag(&mdiag);
        // J₊|j, m⟩ = √(j(j+1) - m(m+1)) |j, m+1⟩, and m + 1 sits one index up
        let mut jp: nd::Array2<C64> = nd::Array2::zeros((n, n));
        for k in 1..n {
            let mk = m[k];
            jp[[k - 1, k]] = C64::from((j * (j + 1.0) - mk * (mk + 1.0)).sqrt());
        }
        let jm: nd::Array2<C64> = jp.t().mapv(|z| z.conj());
        let jx: nd::Array2<C64> = (&jp + &jm).mapv(|z| z * 0.5);
        let jy: nd::Array2<C64> = (&jp - &jm).mapv(|z| z * C64::new(0.0, -0.5));
        Self { j, jx, jy, jz, jp, jm }
    }

    /// Get the spin quantum number.
    pub fn j(&self) -> f64 { self.j }

    /// Get the multiplet dimension `2j + 1`.
    pub fn dim(&self) -> usize { self.jz.nrows() }

    pub fn jx(&self) -> &nd::Array2<C64> { &self.jx }

    pub fn jy(&self) -> &nd::Array2<C64> { &self.jy }

    pub fn jz(&self) -> &nd::Array2<C64> { &self.jz }

    /// Raising operator.
    pub fn jp(&self) -> &nd::Array2<C64> { &self.jp }

    /// Lowering operator.
    pub fn jm(&self) -> &nd::Array2<C64> { &self.jm }

    /// Get the generator for rotations about `axis`.
    pub fn along(&self, axis: Axis) -> &nd::Array2<C64> {
        match axis {
            Axis::X => &self.jx,
            Axis::Y => &self.jy,
            Axis::Z => &self.jz,
        }
    }

    /// `n̂·J` for a field-like vector `(nx, ny, nz)` (not necessarily unit).
    pub fn dot(&self, v: [f64; 3]) -> nd::Array2<C64> {
        &self.jx.mapv(|z| z * v[0])
            + &self.jy.mapv(|z| z * v[1])
            + &self.jz.mapv(|z| z * v[2])
    }

    /// `J² = Jx² + Jy² + Jz²`.
    pub fn j_squared(&self) -> nd::Array2<C64> {
        self.jx.dot(&self.jx) + self.jy.dot(&self.jy) + self.jz.dot(&self.jz)
    }
}

/// Kronecker product of two square matrices.
pub fn kron(a: &nd::Array2<C64>, b: &nd::Array2<C64>) -> nd::Array2<C64> {
    let (na, nb) = (a.nrows(), b.nrows());
    nd::Array2::from_shape_fn((na * nb, na * nb), |(i, j)| {
        a[[i / nb, j / nb]] * b[[i % nb, j % nb]]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::max_abs_diff;

    #[test]
    fn spin_half_matches_pauli() {
        let s = SpinMatrices::new(0.5).unwrap();
        let half = C64::from(0.5);
        let i_half = C64::new(0.0, 0.5);
        let z = C64::from(0.0);
        assert!(max_abs_diff(s.jx(), &nd::array![[z, half], [half, z]]) < 1e-15);
        assert!(max_abs_diff(s.jy(), &nd::array![[z, -i_half], [i_half, z]]) < 1e-15);
        assert!(max_abs_diff(s.jz(), &nd::array![[half, z], [z, -half]]) < 1e-15);
    }

    #[test]
    fn commutation_relation_holds() {
        for n in 2..6 {
            let s = SpinMatrices::from_dim(n).unwrap();
            let comm = s.jx().dot(s.jy()) - s.jy().dot(s.jx());
            let expected = s.jz().mapv(|z| z * C64::i());
            assert!(max_abs_diff(&comm, &expected) < 1e-12);
        }
    }

    #[test]
    fn casimir_is_j_j_plus_one() {
        let s = SpinMatrices::new(1.5).unwrap();
        let jsq = s.j_squared();
        let expected: nd::Array2<C64>
            = nd::Array2::from_diag_elem(4, C64::from(1.5 * 2.5));
        assert!(max_abs_diff(&jsq, &expected) < 1e-12);
    }

    #[test]
    fn rejects_non_half_integers() {
        assert!(SpinMatrices::new(0.3).is_err());
        assert!(SpinMatrices::new(-0.5).is_err());
        assert_eq!(twice_j("j", 2.5).unwrap(), 5);
    }

    #[test]
    fn twice_j_is_capped() {
        let top = MAX_TWICE_J as f64 / 2.0;
        assert_eq!(twice_j("j", top).unwrap(), MAX_TWICE_J);
        assert!(matches!(
            twice_j("j", top + 0.5),
            Err(ValidationError::LimitExceeded { limit: MAX_TWICE_J, .. })
        ));
        for j in [1e20, f64::MAX / 4.0, f64::MAX] {
            assert!(twice_j("j", j).is_err());
        }
    }

    #[test]
    fn kron_dimensions_multiply() {
        let a = SpinMatrices::new(0.5).unwrap();
        let b = SpinMatrices::new(1.0).unwrap();
        let k = kron(a.jz(), b.jz());
        assert_eq!(k.dim(), (6, 6));
        assert!((k[[0, 0]].re - 0.5).abs() < 1e-15);
        assert!((k[[5, 5]].re - 0.5).abs() < 1e-15);
    }
}

//! Exponentials `exp(-i s H)` of Hermitian generators via a single
//! eigendecomposition.
//!
//! With `H = V diag(λ) V†`, every `exp(-i s H) = V diag(exp(-i s λ)) V†` for any
//! real `s`, so one diagonalization serves a whole time series (or a whole
//! sweep of rotation angles). The result is unitary to floating-point
//! precision regardless of `|s|`.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    Arr1,
    Arr2,
    error::{ LengthError, QResult },
    spectrum::{ self, Spectrum },
};

/// Cached eigendecomposition of a Hermitian generator.
#[derive(Clone, Debug)]
pub struct HermitianExp {
    spec: Spectrum<C64>,
    // V†, cached
    vh: nd::Array2<C64>,
}

impl HermitianExp {
    /// Diagonalize `h`, which is assumed Hermitian.
    pub fn new<S>(h: &Arr2<S>) -> QResult<Self>
    where S: nd::Data<Elem = C64>
    {
        let spec: Spectrum<C64> = spectrum::eigh(h)?;
        Ok(Self::from_spectrum(spec))
    }

    /// Reuse an existing decomposition of a Hermitian generator.
    pub fn from_spectrum(spec: Spectrum<C64>) -> Self {
        let vh: nd::Array2<C64> = spec.vectors.t().mapv(|z| z.conj());
        Self { spec, vh }
    }

    /// Get the underlying decomposition.
    pub fn spectrum(&self) -> &Spectrum<C64> { &self.spec }

    /// Get the dimension of the generator.
    pub fn dim(&self) -> usize { self.spec.dim() }

    fn phases(&self, s: f64) -> nd::Array1<C64> {
        self.spec.values.mapv(|l| C64::cis(-s * l))
    }

    /// Compute the full matrix `exp(-i s H)`.
    pub fn unitary(&self, s: f64) -> nd::Array2<C64> {
        let scaled: nd::Array2<C64>
            = &self.spec.vectors * &self.phases(s).insert_axis(nd::Axis(0));
        scaled.dot(&self.vh)
    }

    /// Eigenbasis coefficients `V† ψ`.
    pub fn coefficients<S>(&self, psi: &Arr1<S>) -> Result<nd::Array1<C64>, LengthError>
    where S: nd::Data<Elem = C64>
    {
        if psi.len() != self.dim() {
            return Err(LengthError(self.dim(), psi.len()));
        }
        Ok(self.vh.dot(psi))
    }

    /// Evolve eigenbasis coefficients (as returned by
    /// [`coefficients`][Self::coefficients]) back into the original basis:
    /// `V (exp(-i s λ) ⊙ c)`.
    pub fn evolve_coefficients<S>(&self, c: &Arr1<S>, s: f64) -> nd::Array1<C64>
    where S: nd::Data<Elem = C64>
    {
        self.spec.vectors.dot(&(&self.phases(s) * c))
    }

    /// Compute `exp(-i s H) ψ`.
    pub fn evolve<S>(&self, psi: &Arr1<S>, s: f64) -> Result<nd::Array1<C64>, LengthError>
    where S: nd::Data<Elem = C64>
    {
        let c = self.coefficients(psi)?;
        Ok(self.evolve_coefficients(&c, s))
    }

    /// Express an operator in the eigenbasis of the generator, `V† A V`.
    pub fn to_eigenbasis<S>(&self, a: &Arr2<S>) -> Result<nd::Array2<C64>, LengthError>
    where S: nd::Data<Elem = C64>
    {
        if a.nrows() != self.dim() {
            return Err(LengthError(self.dim(), a.nrows()));
        }
        if a.ncols() != self.dim() {
            return Err(LengthError(self.dim(), a.ncols()));
        }
        Ok(self.vh.dot(a).dot(&self.spec.vectors))
    }

    /// Return an operator from the eigenbasis, `V A V†`.
    pub fn from_eigenbasis<S>(&self, a_eig: &Arr2<S>) -> nd::Array2<C64>
    where S: nd::Data<Elem = C64>
    {
        self.spec.vectors.dot(a_eig).dot(&self.vh)
    }

    /// Heisenberg-evolve an operator already expressed in the eigenbasis:
    /// element `(j, k)` picks up `exp(i s (λ_j - λ_k))`.
    pub fn conjugate_eigenbasis<S>(&self, a_eig: &Arr2<S>, s: f64) -> nd::Array2<C64>
    where S: nd::Data<Elem = C64>
    {
        let phases = self.phases(s);
        nd::Array2::from_shape_fn(a_eig.raw_dim(), |(j, k)| {
            phases[j].conj() * a_eig[[j, k]] * phases[k]
        })
    }

    /// Heisenberg-picture conjugation `U† A U` with `U = exp(-i s H)`.
    pub fn conjugate<S>(&self, a: &Arr2<S>, s: f64) -> Result<nd::Array2<C64>, LengthError>
    where S: nd::Data<Elem = C64>
    {
        let a_eig = self.to_eigenbasis(a)?;
        Ok(self.from_eigenbasis(&self.conjugate_eigenbasis(&a_eig, s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{ c64_identity, dagger, max_abs_diff };

    fn generator() -> nd::Array2<C64> {
        nd::array![
            [C64::new(1.0, 0.0), C64::new(0.2, -0.7), C64::new(0.0, 0.0)],
            [C64::new(0.2, 0.7), C64::new(-0.5, 0.0), C64::new(0.3, 0.0)],
            [C64::new(0.0, 0.0), C64::new(0.3, 0.0), C64::new(2.0, 0.0)],
        ]
    }

    #[test]
    fn unitary_is_unitary_for_large_arguments() {
        let ex = HermitianExp::new(&generator()).unwrap();
        for s in [0.0, 0.3, -4.0, 1e4] {
            let u = ex.unitary(s);
            let uu = dagger(&u).dot(&u);
            assert!(max_abs_diff(&uu, &c64_identity(3)) < 1e-10);
        }
    }

    #[test]
    fn evolve_matches_unitary_action() {
        let ex = HermitianExp::new(&generator()).unwrap();
        let psi = nd::array![C64::new(1.0, 0.0), C64::new(0.0, 1.0), C64::new(0.5, 0.0)];
        let direct = ex.unitary(1.7).dot(&psi);
        let evolved = ex.evolve(&psi, 1.7).unwrap();
        assert!(max_abs_diff(&direct, &evolved) < 1e-12);
    }

    #[test]
    fn conjugation_matches_explicit_product() {
        let h = generator();
        let ex = HermitianExp::new(&h).unwrap();
        let a = nd::array![
            [C64::new(0.0, 0.0), C64::new(1.0, 0.0), C64::new(0.0, 0.0)],
            [C64::new(1.0, 0.0), C64::new(0.0, 0.0), C64::new(0.0, 1.0)],
            [C64::new(0.0, 0.0), C64::new(0.0, -1.0), C64::new(0.0, 0.0)],
        ];
        let u = ex.unitary(0.9);
        let explicit = dagger(&u).dot(&a).dot(&u);
        assert!(max_abs_diff(&explicit, &ex.conjugate(&a, 0.9).unwrap()) < 1e-12);
        // H commutes with itself
        assert!(max_abs_diff(&h, &ex.conjugate(&h, 5.0).unwrap()) < 1e-12);
    }

    #[test]
    fn reused_decomposition_matches_fresh_one() {
        let h = generator();
        let fresh = HermitianExp::new(&h).unwrap();
        let reused = HermitianExp::from_spectrum(spectrum::eigh(&h).unwrap());
        assert!(max_abs_diff(&fresh.unitary(2.5), &reused.unitary(2.5)) < 1e-12);
    }

    #[test]
    fn rejects_mismatched_state() {
        let ex = HermitianExp::new(&generator()).unwrap();
        let psi = nd::array![C64::new(1.0, 0.0)];
        assert!(ex.evolve(&psi, 1.0).is_err());
    }
}

//! Miscellaneous tools.

use std::f64::consts::TAU;
use ndarray::{ self as nd, Ix1, Ix2 };
use ndarray_linalg::Scalar;
use num_complex::Complex64 as C64;
use num_traits::{ One, Zero };
use rustfft as fft;
use crate::{
    Arr1,
    Arr2,
    error::{ LengthError, ValidationError },
};

/// Integrate using the trapezoidal rule.
///
/// *Panics if `y` has length less than 2*.
pub fn trapz<S, A>(y: &nd::ArrayBase<S, Ix1>, dx: A) -> A
where
    S: nd::Data<Elem = A>,
    A: Scalar,
{
    let n: usize = y.len();
    let two = A::one() + A::one();
    (dx / two) * (y[0] + two * y.slice(nd::s![1..n - 1]).sum() + y[n - 1])
}

/// Calculate the squared norm `Σ |q[k]|² dx` of a wavefunction sampled on a
/// uniform grid.
///
/// This is the norm under which grid propagation is exactly unitary.
pub fn wf_norm_sqr<S, A>(q: &nd::ArrayBase<S, Ix1>, dx: A::Real) -> A::Real
where
    S: nd::Data<Elem = A>,
    A: Scalar,
{
    q.iter()
        .map(|qk| qk.square())
        .fold(<A as Scalar>::Real::zero(), |acc, qk2| acc + qk2)
        * dx
}

/// Renormalize a wavefunction in place.
pub fn wf_renormalize<S, A>(q: &mut nd::ArrayBase<S, Ix1>, dx: A::Real)
where
    S: nd::DataMut<Elem = A>,
    A: Scalar,
{
    let norm = A::from_real(wf_norm_sqr(q, dx).sqrt());
    q.iter_mut().for_each(|qk| { *qk /= norm; });
}

/// Return a normalized copy of a wavefunction.
pub fn wf_normalized<S, A>(q: &nd::ArrayBase<S, Ix1>, dx: A::Real)
    -> nd::Array1<A>
where
    S: nd::Data<Elem = A>,
    A: Scalar,
{
    let norm = A::from_real(wf_norm_sqr(q, dx).sqrt());
    q.mapv(|qk| qk / norm)
}

/// Return a unit-norm copy of a finite-dimensional state vector, or
/// [`ValidationError::ZeroNorm`] if it has none.
pub fn normalized<S>(what: &'static str, psi: &Arr1<S>)
    -> Result<nd::Array1<C64>, ValidationError>
where S: nd::Data<Elem = C64>
{
    let norm = psi.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
    if !norm.is_finite() || norm <= f64::EPSILON {
        return Err(ValidationError::ZeroNorm(what));
    }
    Ok(psi.mapv(|z| z / norm))
}

/// `‖ψ‖²` for a finite-dimensional state.
pub fn norm_sqr<S>(psi: &Arr1<S>) -> f64
where S: nd::Data<Elem = C64>
{
    psi.iter().map(|z| z.norm_sqr()).sum()
}

/// `⟨ψ|A|ψ⟩` for a Hermitian `A`, returning the real part.
pub fn expectation<S, T>(a: &Arr2<S>, psi: &Arr1<T>) -> f64
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    psi.iter().zip(a.dot(psi).iter())
        .map(|(pk, apk)| pk.conj() * apk)
        .sum::<C64>()
        .re
}

/// Conjugate transpose.
pub fn dagger<S, A>(a: &nd::ArrayBase<S, Ix2>) -> nd::Array2<A>
where
    S: nd::Data<Elem = A>,
    A: Scalar,
{
    a.t().mapv(|z| z.conj())
}

/// Largest elementwise modulus of `A - A†`.
pub fn hermitian_deviation<S, A>(a: &nd::ArrayBase<S, Ix2>) -> A::Real
where
    S: nd::Data<Elem = A>,
    A: Scalar,
{
    nd::Zip::from(a).and(a.t())
        .fold(<A as Scalar>::Real::zero(), |acc, &aij, &aji| {
            let d = (aij - aji.conj()).abs();
            if d > acc { d } else { acc }
        })
}

/// Largest elementwise modulus of `A`.
pub fn max_abs<S, A, D>(a: &nd::ArrayBase<S, D>) -> A::Real
where
    S: nd::Data<Elem = A>,
    A: Scalar,
    D: nd::Dimension,
{
    // NaN propagates, so a non-finite result flags a non-finite input
    a.iter().fold(<A as Scalar>::Real::zero(), |acc, z| {
        let m = z.abs();
        if m > acc || num_traits::Float::is_nan(m) { m } else { acc }
    })
}

/// Largest elementwise modulus of `A - B`.
pub fn max_abs_diff<S, T, D>(a: &nd::ArrayBase<S, D>, b: &nd::ArrayBase<T, D>)
    -> f64
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = C64>,
    D: nd::Dimension,
{
    nd::Zip::from(a).and(b)
        .fold(0.0_f64, |acc, x, y| acc.max((x - y).norm()))
}

/// Assemble a complex vector from real and (optional) imaginary parts.
pub fn complex_vector(re: &[f64], im: Option<&[f64]>)
    -> Result<nd::Array1<C64>, LengthError>
{
    match im {
        Some(im) => {
            if re.len() != im.len() {
                return Err(LengthError(re.len(), im.len()));
            }
            Ok(re.iter().zip(im).map(|(&r, &i)| C64::new(r, i)).collect())
        },
        None => Ok(re.iter().map(|&r| C64::from(r)).collect()),
    }
}

/// Assemble a complex square matrix from nested real and (optional)
/// imaginary rows.
pub fn complex_matrix(
    what: &'static str,
    re: &[Vec<f64>],
    im: Option<&[Vec<f64>]>,
) -> Result<nd::Array2<C64>, ValidationError>
{
    let n = re.len();
    ValidationError::check_min(what, 1, n)?;
    let check_rows = |rows: &[Vec<f64>]| -> Result<(), ValidationError> {
        if rows.len() != n {
            return Err(LengthError(n, rows.len()).into());
        }
        rows.iter()
            .find(|row| row.len() != n)
            .map_or(Ok(()), |row| {
                Err(ValidationError::NotSquare { what, rows: n, cols: row.len() })
            })
    };
    check_rows(re)?;
    if let Some(im) = im { check_rows(im)?; }
    ValidationError::check_all_finite(what, re.iter().flatten())?;
    if let Some(im) = im {
        ValidationError::check_all_finite(what, im.iter().flatten())?;
    }
    let a: nd::Array2<C64>
        = nd::Array2::from_shape_fn((n, n), |(i, j)| {
            let imij = im.map_or(0.0, |im| im[i][j]);
            C64::new(re[i][j], imij)
        });
    Ok(a)
}

/// Split a complex vector into real and imaginary parts.
pub fn split_vector<S>(psi: &Arr1<S>) -> (Vec<f64>, Vec<f64>)
where S: nd::Data<Elem = C64>
{
    psi.iter().map(|z| (z.re, z.im)).unzip()
}

/// Split a complex matrix into nested real and imaginary rows.
pub fn split_matrix<S>(a: &Arr2<S>) -> (Vec<Vec<f64>>, Vec<Vec<f64>>)
where S: nd::Data<Elem = C64>
{
    a.outer_iter()
        .map(|row| split_vector(&row))
        .unzip()
}

/// Convert the rows of a real 2D array to nested `Vec`s.
pub fn rows_to_vecs<S>(a: &Arr2<S>) -> Vec<Vec<f64>>
where S: nd::Data<Elem = f64>
{
    a.outer_iter().map(|row| row.to_vec()).collect()
}

/// Generate the angular wavenumbers `2π f` accompanying an FFT of `n` points
/// with spacing `dx`, in FFT (unshifted) order.
pub fn fft_wavenumbers(n: usize, dx: f64) -> nd::Array1<f64> {
    let m = if n % 2 == 0 { n / 2 } else { (n + 1) / 2 };
    let dk = TAU * (n as f64 * dx).recip();
    (0..n)
        .map(|i| if i < m { i as f64 * dk } else { -((n - i) as f64) * dk })
        .collect()
}

/// Perform the one-dimensional, complex-valued FFT in place.
pub fn fft_inplace<S>(f: &mut nd::ArrayBase<S, Ix1>)
where S: nd::DataMut<Elem = C64>
{
    let n: usize = f.len();
    let mut plan = fft::FftPlanner::new();
    let fft_plan = plan.plan_fft_forward(n);
    match f.as_slice_mut() {
        Some(buf) => fft_plan.process(buf),
        None => {
            let mut buf: Vec<C64> = f.to_vec();
            fft_plan.process(&mut buf);
            f.iter_mut().zip(buf).for_each(|(fk, bk)| { *fk = bk; });
        },
    }
}

/// Perform the one-dimensional, complex-valued inverse FFT in place.
pub fn ifft_inplace<S>(x: &mut nd::ArrayBase<S, Ix1>)
where S: nd::DataMut<Elem = C64>
{
    let n: usize = x.len();
    let mut plan = fft::FftPlanner::new();
    let ifft_plan = plan.plan_fft_inverse(n);
    match x.as_slice_mut() {
        Some(buf) => ifft_plan.process(buf),
        None => {
            let mut buf: Vec<C64> = x.to_vec();
            ifft_plan.process(&mut buf);
            x.iter_mut().zip(buf).for_each(|(xk, bk)| { *xk = bk; });
        },
    }
    let n = n as f64;
    x.map_inplace(|xk| { *xk /= n; });
}

/// Index of the smallest non-NaN element, if any.
pub fn argmin(values: &[f64]) -> Option<usize> {
    values.iter().enumerate()
        .filter(|(_, v)| !v.is_nan())
        .min_by(|(_, l), (_, r)| l.total_cmp(r))
        .map(|(k, _)| k)
}

pub(crate) fn c64_identity(n: usize) -> nd::Array2<C64> {
    nd::Array2::from_diag_elem(n, C64::one())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trapz_integrates_linear_exactly() {
        let x: nd::Array1<f64> = nd::Array1::linspace(0.0, 2.0, 11);
        let dx = x[1] - x[0];
        assert!((trapz(&x, dx) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn wavenumbers_are_symmetric() {
        let k = fft_wavenumbers(4, 0.5);
        let dk = TAU / 2.0;
        assert_eq!(k.to_vec(), vec![0.0, dk, -2.0 * dk, -dk]);
        let k = fft_wavenumbers(5, 1.0);
        assert!(k[3] < 0.0 && k[2] > 0.0);
    }

    #[test]
    fn fft_roundtrip_restores_signal() {
        let x: nd::Array1<C64>
            = (0..16).map(|k| C64::new((k as f64).sin(), 0.5 * k as f64)).collect();
        let mut y = x.clone();
        fft_inplace(&mut y);
        ifft_inplace(&mut y);
        assert!(max_abs_diff(&x, &y) < 1e-12);
    }

    #[test]
    fn complex_matrix_rejects_ragged_rows() {
        let re = vec![vec![1.0, 0.0], vec![0.0]];
        assert!(matches!(
            complex_matrix("H", &re, None),
            Err(ValidationError::NotSquare { .. })
        ));
        let im = vec![vec![0.0, 1.0]];
        let re = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert!(complex_matrix("H", &re, Some(&im)).is_err());
    }

    #[test]
    fn hermitian_deviation_detects_asymmetry() {
        let a = nd::array![
            [C64::new(1.0, 0.0), C64::new(0.0, 1.0)],
            [C64::new(0.0, -1.0), C64::new(2.0, 0.0)],
        ];
        assert!(hermitian_deviation(&a) < 1e-15);
        let b = nd::array![
            [C64::new(1.0, 0.0), C64::new(0.0, 1.0)],
            [C64::new(0.0, 1.0), C64::new(2.0, 0.0)],
        ];
        assert!((hermitian_deviation(&b) - 2.0).abs() < 1e-15);
    }

    #[test]
    fn argmin_skips_nan() {
        assert_eq!(argmin(&[3.0, f64::NAN, 1.0, 2.0]), Some(2));
        assert_eq!(argmin(&[]), None);
    }
}

#![allow(dead_code, non_snake_case)]

//! Provides a numerical engine for introductory quantum mechanics, along with a
//! JSON-over-HTTP interface to it.
//!
//! Provides implementations for the following:
//! - Time-independent:
//!     - Finite-difference and matrix Numerov[^1] grid spectra
//!     - Hermitian eigendecomposition with measurement statistics
//!     - Variational sweeps (Gaussian trial states, helium-like atoms)
//!     - WKB and transfer-matrix tunneling probabilities
//! - Time-dependent:
//!     - Exact eigenbasis propagation of finite-dimensional states, in the
//!       Schrödinger and Heisenberg pictures
//!     - Pseudo-spectral split-step propagation of grid wavefunctions
//!     - Spin precession
//! - Angular momentum and symmetry:
//!     - Spin-*j* matrices, Clebsch-Gordan coupling, spin-orbit splitting
//!     - Rotation, parity, and time-reversal operators
//!
//! Every engine entry point validates its inputs against a set of [`Limits`]
//! and returns an [`Error`] instead of panicking. See [`docs`] for
//! conventions and theoretical background.
//!
//! [^1]: M. Pillai, J. Goglio, and T. Walker, "Matrix Numerov method for
//! solving Schrödinger's equation." American Journal of Physics **80** 11
//! 1017-1019 (2012).
//!
//! [`Limits`]: limits::Limits
//! [`Error`]: error::Error

pub mod error;
pub mod limits;
pub mod utils;
pub mod grid;
pub mod potential;
pub mod angmom;
pub mod spectrum;
pub mod eigexp;
pub mod operators;
pub mod propagate;
pub mod spin;
pub mod symmetry;
pub mod variational;
pub mod wkb;
pub mod api;

pub mod docs;

pub type Arr1<S> = ndarray::ArrayBase<S, ndarray::Ix1>;
pub type Arr2<S> = ndarray::ArrayBase<S, ndarray::Ix2>;

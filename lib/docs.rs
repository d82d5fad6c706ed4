//! Theoretical background and conventions.
//!
//! # Contents
//! - [Units](#units)
//! - [Grid Hamiltonians](#grid-hamiltonians)
//! - [Time dependence](#time-dependence)
//! - [Angular momentum](#angular-momentum)
//! - [Symmetries](#symmetries)
//! - [Approximation methods](#approximation-methods)
//!
//! # Units
//! Everything in this crate works in natural units with *ħ* = *m* = 1, so that
//! the time-dependent Schrödinger equation reads
//! ```text
//!   ∂ψ      1 ∂²ψ
//! i -- = - --- --- + V(x) ψ
//!   ∂t      2  ∂x²
//! ```
//! and spin operators are *S* = *σ*/2. Helium-like energies are reported in
//! Hartree.
//!
//! Finite-dimensional operators are passed around as dense
//! [`Array2`][ndarray::Array2]s; complex entries are split into separate real
//! and imaginary arrays at the [API boundary][crate::api].
//!
//! # Grid Hamiltonians
//! On a uniform grid
//! ```text
//! x[i] = x₀ + i δx, i ∊ {0, ..., N - 1}
//! ```
//! with Dirichlet boundaries, the central finite difference gives the
//! tridiagonal Hamiltonian
//! ```text
//! H[i, i] = 1/δx² + V[i]
//! H[i, i ± 1] = -1/(2 δx²)
//! ```
//! whose eigenvalues carry an *O*(*δx*²) error. Numerov's scheme[^1] instead
//! writes the second derivative in terms of three-point operators
//! ```text
//! A = (I₋₁ - 2 I + I₊₁) / δx²
//! B = (I₋₁ + 10 I + I₊₁) / 12
//! ```
//! so that, following the matrix formulation of Pillai, Goglio, and Walker[^2],
//! ```text
//! H = -(1/2) B⁻¹ A + V
//! ```
//! with an *O*(*δx*⁴) error. This *H* is not exactly symmetric, so it is
//! symmetrized before diagonalization. Eigenvectors are normalized so that
//! ∫|*ψ*|² d*x* = 1 (trapezoidal rule) and have their first significant
//! component made real and positive.
//!
//! # Time dependence
//! For a time-independent Hermitian *H* = *V* *D* *V*†, evolution is computed
//! exactly in the eigenbasis:
//! ```text
//! ψ(t) = V exp(-i D t) V† ψ(0)
//! A_H(t) = V exp(i D t) V† A V exp(-i D t) V†
//! ```
//! The Schrödinger and Heisenberg pictures then agree, ⟨*ψ*(*t*)|*A*|*ψ*(*t*)⟩
//! = ⟨*ψ*(0)|*A*<sub>H</sub>(*t*)|*ψ*(0)⟩, to rounding error.
//!
//! Grid wavefunctions may also be advanced with the pseudo-spectral split-step
//! operator. Sandwiching the kinetic step between two half-sized potential
//! steps cancels the leading Baker-Campbell-Hausdorff commutator,
//! ```text
//!               -i V dt/2  -i k² dt/2  -i V dt/2
//! ψ(t + dt) = [e          e           e         ] ψ(t) + O(dt³)
//! ```
//! where the kinetic factor is applied pointwise in momentum space:
//! ```text
//!        ψ(t, x)
//!           |
//!           V
//!      -i V(x) dt/2
//!    e
//!           |
//!           '--> FFT ---.
//!                       |
//!                       V
//!                  -i k² dt/2
//!                 e
//!                       |
//!           .-- iFFT <--'
//!           |
//!           V
//!      -i V(x) dt/2
//!    e
//!           |
//!           V
//!     ψ(t + dt, x)
//! ```
//! This treats the grid as periodic, so the two propagators differ once a
//! packet reaches the grid edges.
//!
//! # Angular momentum
//! A spin-*j* multiplet has dimension 2*j* + 1 with basis |*j*, *m*⟩ ordered
//! by descending *m*. The ladder operators follow the Condon-Shortley
//! convention,
//! ```text
//! J₊ |j, m⟩ = √(j (j + 1) - m (m + 1)) |j, m + 1⟩
//! ```
//! with *J*<sub>x</sub> = (*J*₊ + *J*₋)/2 and *J*<sub>y</sub> = (*J*₊ -
//! *J*₋)/2*i*. Coupled states |*J*, *M*⟩ of *j*₁ ⊗ *j*₂ are built by taking
//! the highest-*M* state of each *J* orthogonal to all larger *J* and lowering
//! with *J*₋ = *J*₁₋ + *J*₂₋; the resulting coefficients are Clebsch-Gordan
//! coefficients in the same phase convention.
//!
//! # Symmetries
//! Rotations act on an *N*-dimensional space by identifying it with the
//! spin-(*N* - 1)/2 multiplet, *R*(*n*, *θ*) = exp(-*i* *θ* *J*<sub>n</sub>).
//! Parity reverses the basis order. Time reversal is antiunitary, Θ = *U* *K*
//! with *K* complex conjugation; with spin flip *U* = exp(-*i* *π*
//! *J*<sub>y</sub>), so that Θ² = (-1)<sup>2*j*</sup>, giving Kramers
//! degeneracy for half-integer *j*.
//!
//! # Approximation methods
//! The variational energy of the Gaussian trial state
//! *ψ*<sub>*α*</sub>(*x*) = (*α*/*π*)<sup>1/4</sup> exp(-*α* *x*²/2) is
//! ```text
//! E(α) = α/4 + ⟨V⟩_α
//! ```
//! and bounds the ground-state energy from above. For helium-like atoms with
//! product hydrogenic trial orbitals of effective charge *Z*,
//! ```text
//! E(Z) = Z² - 2 Z_nuc Z + (5/8) Z
//! ```
//! minimized at *Z* = *Z*<sub>nuc</sub> - 5/16.
//!
//! The WKB transmission through a barrier is
//! ```text
//! T ≈ exp(-2 ∫ √(2 (V(x) - E)) dx)
//! ```
//! integrated over the classically forbidden region(s). It is compared to the
//! exact transmission of the potential approximated as piecewise constant over
//! grid cells, computed from products of 2×2 transfer matrices[^3].
//!
//! [^1]: B. Numerov, "Note on the numerical integration of d2x/dt2 = f(x,t)."
//! Astronomische Nachrichten **230** 19 (1927).
//!
//! [^2]: M. Pillai, J. Goglio, and T. Walker, "Matrix Numerov method for
//! solving Schrödinger's equation." American Journal of Physics **80** 11
//! 1017-1019 (2012).
//!
//! [^3]: D. J. Griffiths and C. A. Steinke, "Waves in locally periodic media."
//! American Journal of Physics **69** 137 (2001).

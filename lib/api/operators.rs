//! Observables in a truncated oscillator basis, and basis changes.

use axum::extract::State;
use serde::{ Deserialize, Serialize };
use crate::{
    operators::{ self, OperatorKind, OscillatorBasis, StateKind },
    utils::{ split_matrix, split_vector },
};
use super::{ compute, matrix_input, vector_input, ApiJson, ApiResult, AppState };

fn def_dim() -> usize { 5 }
fn def_operator() -> OperatorKind { OperatorKind::Position }
fn def_state() -> StateKind { StateKind::Superposition }
fn def_scale() -> f64 { 1.0 }

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservableRequest {
    #[serde(rename = "N", default = "def_dim")]
    pub N: usize,
    #[serde(default = "def_operator")]
    pub operator_type: OperatorKind,
    #[serde(default = "def_state")]
    pub state_type: StateKind,
    /// Basis index for `stateType: "basis"`.
    #[serde(default)]
    pub n: usize,
    pub seed: Option<u64>,
    #[serde(default = "def_scale")]
    pub length: f64,
    #[serde(default = "def_scale")]
    pub omega: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ObservableResponse {
    pub eigenvalues: Vec<f64>,
    pub probabilities: Vec<f64>,
    pub expectation: f64,
    pub variance: f64,
    pub matrix_real: Vec<Vec<f64>>,
    pub matrix_imag: Vec<Vec<f64>>,
    /// Column `k` is the eigenvector for `eigenvalues[k]`.
    pub eigenvectors_real: Vec<Vec<f64>>,
    pub eigenvectors_imag: Vec<Vec<f64>>,
    pub seed: u64,
}

/// `POST /api/operators/observable`
pub async fn observable(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ObservableRequest>,
) -> ApiResult<ObservableResponse>
{
    let basis = OscillatorBasis::new(req.N, req.length, req.omega, &state.limits)?;
    compute("observable", move || {
        let (mut rng, seed) = operators::seeded_rng(req.seed);
        let obs = operators::observe(
            &basis, req.operator_type, req.state_type, req.n, &mut rng)?;
        let (matrix_real, matrix_imag) = split_matrix(&obs.operator);
        let (eigenvectors_real, eigenvectors_imag) = split_matrix(&obs.spectrum.vectors);
        Ok(ObservableResponse {
            eigenvalues: obs.spectrum.values.to_vec(),
            probabilities: obs.measurement.probabilities.to_vec(),
            expectation: obs.measurement.expectation,
            variance: obs.measurement.variance,
            matrix_real,
            matrix_imag,
            eigenvectors_real,
            eigenvectors_imag,
            seed,
        })
    }).await
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasisChangeRequest {
    pub state: Vec<f64>,
    pub state_imag: Option<Vec<f64>>,
    #[serde(rename = "U")]
    pub U: Vec<Vec<f64>>,
    #[serde(rename = "UImag")]
    pub U_imag: Option<Vec<Vec<f64>>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasisChangeResponse {
    pub new_state: Vec<f64>,
    pub new_state_imag: Vec<f64>,
    pub probabilities_invariant: bool,
}

/// `POST /api/operators/basis-change`
pub async fn basis_change(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BasisChangeRequest>,
) -> ApiResult<BasisChangeResponse>
{
    let u = matrix_input("U", &req.U, req.U_imag.as_deref(), &state.limits)?;
    let psi = vector_input("state", &req.state, req.state_imag.as_deref())?;
    compute("basis-change", move || {
        let change = operators::change_basis(&u, &psi)?;
        let (new_state, new_state_imag) = split_vector(&change.state);
        Ok(BasisChangeResponse {
            new_state,
            new_state_imag,
            probabilities_invariant: change.probabilities_invariant,
        })
    }).await
}

//! Rotation, parity, and time reversal.

use std::f64::consts::FRAC_PI_4;
use axum::extract::State;
use serde::{ Deserialize, Serialize };
use crate::{
    angmom::Axis,
    symmetry::{ self as engine, TimeReversal },
    utils::{ rows_to_vecs, split_matrix, split_vector },
};
use super::{ compute, matrix_input, vector_input, ApiJson, ApiResult, AppState };

fn def_dim() -> usize { 5 }
fn def_angle() -> f64 { FRAC_PI_4 }
fn def_axis() -> Axis { Axis::Z }
fn def_spin_flip() -> bool { true }

#[derive(Clone, Debug, Deserialize)]
pub struct RotationRequest {
    #[serde(default = "def_angle")]
    pub angle: f64,
    #[serde(default = "def_axis")]
    pub axis: Axis,
    #[serde(rename = "N", default = "def_dim")]
    pub N: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationResponse {
    /// Real parts, ordered by phase.
    pub eigenvalues: Vec<f64>,
    pub eigenvalues_imag: Vec<f64>,
    pub moduli: Vec<f64>,
    #[serde(rename = "operator_real")]
    pub operator_real: Vec<Vec<f64>>,
    #[serde(rename = "operator_imag")]
    pub operator_imag: Vec<Vec<f64>>,
}

/// `POST /api/symmetry/rotation`
pub async fn rotation(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RotationRequest>,
) -> ApiResult<RotationResponse>
{
    let limits = state.limits;
    limits.check_dim("N", req.N)?;
    compute("rotation", move || {
        let rot = engine::rotation(req.N, req.axis, req.angle, &limits)?;
        let (eigenvalues, eigenvalues_imag) = split_vector(&rot.eigenvalues);
        let (operator_real, operator_imag) = split_matrix(&rot.operator);
        Ok(RotationResponse {
            eigenvalues,
            eigenvalues_imag,
            moduli: rot.moduli().to_vec(),
            operator_real,
            operator_imag,
        })
    }).await
}

#[derive(Clone, Debug, Deserialize)]
pub struct ParityRequest {
    #[serde(rename = "N", default = "def_dim")]
    pub N: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct ParityResponse {
    pub eigenvalues: Vec<f64>,
    pub operator: Vec<Vec<f64>>,
}

/// `POST /api/symmetry/parity`
pub async fn parity(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ParityRequest>,
) -> ApiResult<ParityResponse>
{
    let limits = state.limits;
    limits.check_dim("N", req.N)?;
    compute("parity", move || {
        let p = engine::parity(req.N, &limits)?;
        Ok(ParityResponse {
            eigenvalues: p.eigenvalues.to_vec(),
            operator: rows_to_vecs(&p.operator),
        })
    }).await
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeReversalRequest {
    #[serde(rename = "N", default = "def_dim")]
    pub N: usize,
    #[serde(default = "def_spin_flip")]
    pub spin_flip: bool,
    #[serde(rename = "H")]
    pub H: Option<Vec<Vec<f64>>>,
    #[serde(rename = "HImag")]
    pub H_imag: Option<Vec<Vec<f64>>>,
    pub psi: Option<Vec<f64>>,
    pub psi_imag: Option<Vec<f64>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeReversalResponse {
    /// Eigenvalues of the unitary part, ordered by phase.
    pub eigenvalues: Vec<f64>,
    pub eigenvalues_imag: Vec<f64>,
    pub theta_squared: f64,
    pub psi_reversed: Option<Vec<f64>>,
    pub psi_reversed_imag: Option<Vec<f64>>,
    pub hamiltonian_invariant: Option<bool>,
}

/// `POST /api/symmetry/time-reversal`
pub async fn time_reversal(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TimeReversalRequest>,
) -> ApiResult<TimeReversalResponse>
{
    let limits = state.limits;
    limits.check_dim("N", req.N)?;
    let h = req.H.as_deref()
        .map(|re| matrix_input("H", re, req.H_imag.as_deref(), &limits))
        .transpose()?;
    let psi = req.psi.as_deref()
        .map(|re| vector_input("psi", re, req.psi_imag.as_deref()))
        .transpose()?;
    compute("time-reversal", move || {
        let theta = TimeReversal::new(req.N, req.spin_flip, &limits)?;
        let (eigenvalues, eigenvalues_imag) = split_vector(&theta.eigenvalues);
        let (psi_reversed, psi_reversed_imag)
            = match psi {
                Some(psi) => {
                    let (re, im) = split_vector(&theta.apply_state(&psi)?);
                    (Some(re), Some(im))
                },
                None => (None, None),
            };
        let hamiltonian_invariant
            = h.map(|h| theta.is_invariant(&h)).transpose()?;
        Ok(TimeReversalResponse {
            eigenvalues,
            eigenvalues_imag,
            theta_squared: theta.theta_squared,
            psi_reversed,
            psi_reversed_imag,
            hamiltonian_invariant,
        })
    }).await
}

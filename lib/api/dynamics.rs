//! Finite-dimensional dynamics in the Schrödinger and Heisenberg pictures.

use axum::extract::State;
use serde::{ Deserialize, Serialize };
use crate::{
    grid::TimeGrid,
    propagate,
    utils::{ rows_to_vecs, split_matrix },
};
use super::{ compute, matrix_input, vector_input, ApiJson, ApiResult, AppState };

fn def_t_max() -> f64 { 10.0 }
fn def_n_steps() -> usize { 100 }

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchrodingerRequest {
    #[serde(rename = "H")]
    pub H: Vec<Vec<f64>>,
    #[serde(rename = "HImag")]
    pub H_imag: Option<Vec<Vec<f64>>>,
    pub psi0: Vec<f64>,
    pub psi0_imag: Option<Vec<f64>>,
    #[serde(default = "def_t_max")]
    pub t_max: f64,
    #[serde(default = "def_n_steps")]
    pub n_steps: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct SchrodingerResponse {
    pub t: Vec<f64>,
    /// `|⟨k|ψ(t)⟩|²`, one row per time.
    pub probabilities: Vec<Vec<f64>>,
    pub frames_real: Vec<Vec<f64>>,
    pub frames_imag: Vec<Vec<f64>>,
    pub norms: Vec<f64>,
}

/// `POST /api/dynamics/schrodinger`
pub async fn schrodinger(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SchrodingerRequest>,
) -> ApiResult<SchrodingerResponse>
{
    let limits = state.limits;
    let h = matrix_input("H", &req.H, req.H_imag.as_deref(), &limits)?;
    let psi0 = vector_input("psi0", &req.psi0, req.psi0_imag.as_deref())?;
    let times = TimeGrid::new("nSteps", req.t_max, req.n_steps, &limits)?;
    limits.check_samples("probabilities", times.len(), h.nrows())?;
    compute("dynamics/schrodinger", move || {
        let traj = propagate::evolve_basis(&h, &psi0, &times)?;
        let (frames_real, frames_imag) = split_matrix(&traj.states);
        Ok(SchrodingerResponse {
            t: traj.t.to_vec(),
            probabilities: rows_to_vecs(&traj.probabilities),
            frames_real,
            frames_imag,
            norms: traj.norms.to_vec(),
        })
    }).await
}

#[derive(Clone, Debug, Deserialize)]
pub struct HeisenbergRequest {
    #[serde(rename = "A")]
    pub A: Vec<Vec<f64>>,
    #[serde(rename = "AImag")]
    pub A_imag: Option<Vec<Vec<f64>>>,
    #[serde(rename = "H")]
    pub H: Vec<Vec<f64>>,
    #[serde(rename = "HImag")]
    pub H_imag: Option<Vec<Vec<f64>>>,
    pub t: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct HeisenbergResponse {
    pub A_t_real: Vec<Vec<f64>>,
    pub A_t_imag: Vec<Vec<f64>>,
}

/// `POST /api/dynamics/heisenberg`
pub async fn heisenberg(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<HeisenbergRequest>,
) -> ApiResult<HeisenbergResponse>
{
    let limits = state.limits;
    let a = matrix_input("A", &req.A, req.A_imag.as_deref(), &limits)?;
    let h = matrix_input("H", &req.H, req.H_imag.as_deref(), &limits)?;
    compute("dynamics/heisenberg", move || {
        let a_t = propagate::heisenberg(&a, &h, req.t)?;
        let (A_t_real, A_t_imag) = split_matrix(&a_t);
        Ok(HeisenbergResponse { A_t_real, A_t_imag })
    }).await
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EhrenfestRequest {
    #[serde(rename = "A")]
    pub A: Vec<Vec<f64>>,
    #[serde(rename = "AImag")]
    pub A_imag: Option<Vec<Vec<f64>>>,
    #[serde(rename = "H")]
    pub H: Vec<Vec<f64>>,
    #[serde(rename = "HImag")]
    pub H_imag: Option<Vec<Vec<f64>>>,
    pub psi0: Vec<f64>,
    pub psi0_imag: Option<Vec<f64>>,
    #[serde(default = "def_t_max")]
    pub t_max: f64,
    #[serde(default = "def_n_steps")]
    pub n_steps: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EhrenfestResponse {
    pub t: Vec<f64>,
    pub schrodinger: Vec<f64>,
    pub heisenberg: Vec<f64>,
    pub max_deviation: f64,
}

/// `POST /api/dynamics/ehrenfest`
pub async fn ehrenfest(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<EhrenfestRequest>,
) -> ApiResult<EhrenfestResponse>
{
    let limits = state.limits;
    let a = matrix_input("A", &req.A, req.A_imag.as_deref(), &limits)?;
    let h = matrix_input("H", &req.H, req.H_imag.as_deref(), &limits)?;
    let psi0 = vector_input("psi0", &req.psi0, req.psi0_imag.as_deref())?;
    let times = TimeGrid::new("nSteps", req.t_max, req.n_steps, &limits)?;
    compute("dynamics/ehrenfest", move || {
        let cmp = propagate::compare_pictures(&a, &h, &psi0, &times)?;
        Ok(EhrenfestResponse {
            t: cmp.t.to_vec(),
            schrodinger: cmp.schrodinger.to_vec(),
            heisenberg: cmp.heisenberg.to_vec(),
            max_deviation: cmp.max_deviation,
        })
    }).await
}

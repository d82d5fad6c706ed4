//! Spin precession and angular momentum coupling.

use std::f64::consts::FRAC_PI_4;
use axum::extract::State;
use serde::{ Deserialize, Serialize };
use crate::{
    grid::TimeGrid,
    spin::{ self as engine, DEF_GAMMA },
};
use super::{ compute, ApiJson, ApiResult, AppState };

fn def_bz() -> f64 { 1.0 }
fn def_theta0() -> f64 { FRAC_PI_4 }
fn def_t_max() -> f64 { 10.0 }
fn def_n_steps() -> usize { 100 }
fn def_spin() -> f64 { 0.5 }
fn def_gamma() -> f64 { DEF_GAMMA }

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicsRequest {
    #[serde(rename = "Bx", default)]
    pub Bx: f64,
    #[serde(rename = "By", default)]
    pub By: f64,
    #[serde(rename = "Bz", default = "def_bz")]
    pub Bz: f64,
    #[serde(default = "def_theta0")]
    pub theta0: f64,
    #[serde(default)]
    pub phi0: f64,
    #[serde(default = "def_t_max")]
    pub t_max: f64,
    #[serde(default = "def_n_steps")]
    pub n_steps: usize,
    #[serde(default = "def_spin")]
    pub spin: f64,
    #[serde(default = "def_gamma")]
    pub gamma: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct DynamicsResponse {
    pub t: Vec<f64>,
    pub sx: Vec<f64>,
    pub sy: Vec<f64>,
    pub sz: Vec<f64>,
    pub magnitude: Vec<f64>,
}

/// `POST /api/spin/dynamics`
pub async fn dynamics(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<DynamicsRequest>,
) -> ApiResult<DynamicsResponse>
{
    let limits = state.limits;
    let times = TimeGrid::new("nSteps", req.t_max, req.n_steps, &limits)?;
    compute("spin/dynamics", move || {
        let traj = engine::precess(
            req.spin,
            req.gamma,
            [req.Bx, req.By, req.Bz],
            req.theta0,
            req.phi0,
            &times,
            &limits,
        )?;
        Ok(DynamicsResponse {
            t: traj.t.to_vec(),
            sx: traj.sx.to_vec(),
            sy: traj.sy.to_vec(),
            sz: traj.sz.to_vec(),
            magnitude: traj.magnitude.to_vec(),
        })
    }).await
}

#[derive(Clone, Debug, Deserialize)]
pub struct CouplingRequest {
    pub j1: f64,
    pub j2: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct CoupledStateResponse {
    pub j: f64,
    pub m: f64,
    pub coefficients: Vec<f64>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouplingResponse {
    /// `[m1, m2]` for each product state.
    pub product_basis: Vec<[f64; 2]>,
    #[serde(rename = "totalJ")]
    pub total_j: Vec<f64>,
    pub eigenvalues: Vec<f64>,
    pub states: Vec<CoupledStateResponse>,
}

/// `POST /api/spin/coupling`
pub async fn coupling(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CouplingRequest>,
) -> ApiResult<CouplingResponse>
{
    let limits = state.limits;
    compute("spin/coupling", move || {
        let c = engine::couple(req.j1, req.j2, &limits)?;
        let states: Vec<CoupledStateResponse>
            = c.states.into_iter()
            .map(|s| CoupledStateResponse { j: s.j, m: s.m, coefficients: s.coefficients })
            .collect();
        Ok(CouplingResponse {
            product_basis: c.product_basis.into_iter().map(|(m1, m2)| [m1, m2]).collect(),
            total_j: c.total_j,
            eigenvalues: c.eigenvalues,
            states,
        })
    }).await
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinOrbitRequest {
    pub l: f64,
    pub s: f64,
    pub lambda_array: Vec<f64>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinOrbitResponse {
    pub lambda_array: Vec<f64>,
    pub j_values: Vec<f64>,
    /// `E_j(λ)` for each `j`, as a series over `lambdaArray`.
    pub energies_per_level: Vec<Vec<f64>>,
}

/// `POST /api/spin/spin-orbit`
pub async fn spin_orbit(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SpinOrbitRequest>,
) -> ApiResult<SpinOrbitResponse>
{
    let so = engine::spin_orbit(req.l, req.s, &req.lambda_array, &state.limits)?;
    let energies_per_level: Vec<Vec<f64>>
        = (0..so.j_values.len())
        .map(|k| so.energies.iter().map(|row| row[k]).collect())
        .collect();
    Ok(ApiJson(SpinOrbitResponse {
        lambda_array: req.lambda_array,
        j_values: so.j_values,
        energies_per_level,
    }))
}

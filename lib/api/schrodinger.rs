//! Grid spectra and wavefunction propagation.

use axum::extract::State;
use serde::{ Deserialize, Serialize };
use crate::{
    grid::{ Grid, TimeGrid },
    potential::{ Potential, PotentialKind, PotentialParams },
    propagate::{ self, InitialWavefunction, Propagation, DEF_MAX_DT },
    spectrum::{ solve_grid, Discretization },
    utils::rows_to_vecs,
};
use super::{ compute, ApiJson, ApiResult, AppState };

fn def_potential() -> PotentialKind { PotentialKind::Harmonic }
fn def_x_min() -> f64 { -5.0 }
fn def_x_max() -> f64 { 5.0 }
fn def_n_points() -> usize { 200 }
fn def_n_levels() -> usize { 5 }
fn def_t_max() -> f64 { 10.0 }
fn def_n_frames() -> usize { 50 }
fn def_max_dt() -> f64 { DEF_MAX_DT }

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumRequest {
    #[serde(default = "def_potential")]
    pub potential_type: PotentialKind,
    #[serde(default)]
    pub params: PotentialParams,
    #[serde(default = "def_x_min")]
    pub x_min: f64,
    #[serde(default = "def_x_max")]
    pub x_max: f64,
    #[serde(default = "def_n_points")]
    pub n_points: usize,
    #[serde(default = "def_n_levels")]
    pub n_levels: usize,
    #[serde(default)]
    pub method: Discretization,
}

#[derive(Clone, Debug, Serialize)]
pub struct SpectrumResponse {
    pub x: Vec<f64>,
    #[serde(rename = "V")]
    pub V: Vec<f64>,
    pub energies: Vec<f64>,
    /// One normalized wavefunction per level.
    pub eigenfuncs: Vec<Vec<f64>>,
}

/// `POST /api/schrodinger/spectrum`
pub async fn spectrum(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SpectrumRequest>,
) -> ApiResult<SpectrumResponse>
{
    let limits = state.limits;
    let potential = Potential::new(req.potential_type, &req.params)?;
    let grid = Grid::new(req.x_min, req.x_max, req.n_points, &limits)?;
    limits.check_samples("eigenfuncs", req.n_levels, grid.len())?;
    compute("spectrum", move || {
        let V = potential.sample(&grid);
        let sols = solve_grid(&grid, &V, req.method, req.n_levels)?;
        Ok(SpectrumResponse {
            x: grid.x().to_vec(),
            V: V.to_vec(),
            energies: sols.energies.to_vec(),
            eigenfuncs: rows_to_vecs(&sols.wavefunctions),
        })
    }).await
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEvolutionRequest {
    #[serde(default = "def_potential")]
    pub potential_type: PotentialKind,
    #[serde(default)]
    pub params: PotentialParams,
    #[serde(default = "def_x_min")]
    pub x_min: f64,
    #[serde(default = "def_x_max")]
    pub x_max: f64,
    #[serde(default = "def_n_points")]
    pub n_points: usize,
    #[serde(default)]
    pub psi0: InitialWavefunction,
    #[serde(default = "def_t_max")]
    pub t_max: f64,
    #[serde(default = "def_n_frames")]
    pub n_frames: usize,
    #[serde(default)]
    pub method: Propagation,
    #[serde(default = "def_max_dt")]
    pub max_dt: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEvolutionResponse {
    pub x: Vec<f64>,
    pub t: Vec<f64>,
    /// `|ψ(x, t)|²`, one frame per time.
    pub density_frames: Vec<Vec<f64>>,
    pub norms: Vec<f64>,
    pub expectation_x: Vec<f64>,
    pub expectation_p: Vec<f64>,
}

/// `POST /api/schrodinger/time-evolution`
pub async fn time_evolution(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TimeEvolutionRequest>,
) -> ApiResult<TimeEvolutionResponse>
{
    let limits = state.limits;
    let potential = Potential::new(req.potential_type, &req.params)?;
    let grid = Grid::new(req.x_min, req.x_max, req.n_points, &limits)?;
    let times = TimeGrid::new("nFrames", req.t_max, req.n_frames, &limits)?;
    compute("time-evolution", move || {
        let V = potential.sample(&grid);
        let evo = propagate::evolve_grid(
            &grid, &V, &req.psi0, &times, req.method, req.max_dt, &limits)?;
        Ok(TimeEvolutionResponse {
            x: grid.x().to_vec(),
            t: evo.t.to_vec(),
            density_frames: rows_to_vecs(&evo.density),
            norms: evo.norms.to_vec(),
            expectation_x: evo.expectation_x.to_vec(),
            expectation_p: evo.expectation_p.to_vec(),
        })
    }).await
}

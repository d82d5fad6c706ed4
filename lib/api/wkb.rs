//! Barrier tunneling.

use axum::extract::State;
use serde::{ Deserialize, Serialize };
use crate::{
    grid::Grid,
    potential::{ Potential, PotentialKind, PotentialParams },
    wkb as engine,
};
use super::{ compute, ApiJson, ApiResult, AppState };

fn def_potential() -> PotentialKind { PotentialKind::Barrier }
fn def_x_min() -> f64 { -5.0 }
fn def_x_max() -> f64 { 5.0 }
// dx = 0.01 puts the default barrier's edges on grid points
fn def_n_points() -> usize { 1001 }

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelingRequest {
    #[serde(default = "def_potential")]
    pub potential_type: PotentialKind,
    #[serde(default)]
    pub barrier_params: PotentialParams,
    #[serde(rename = "EArray")]
    pub energies: Vec<f64>,
    #[serde(default = "def_x_min")]
    pub x_min: f64,
    #[serde(default = "def_x_max")]
    pub x_max: f64,
    #[serde(default = "def_n_points")]
    pub n_points: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct TunnelingResponse {
    #[serde(rename = "EArray")]
    pub energies: Vec<f64>,
    pub T_wkb: Vec<f64>,
    pub T_num: Vec<f64>,
    /// `null` where no wave propagates at the grid ends.
    pub actions: Vec<Option<f64>>,
}

/// `POST /api/wkb/tunneling`
pub async fn tunneling(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TunnelingRequest>,
) -> ApiResult<TunnelingResponse>
{
    let limits = state.limits;
    let potential = Potential::new(req.potential_type, &req.barrier_params)?;
    let grid = Grid::new(req.x_min, req.x_max, req.n_points, &limits)?;
    compute("tunneling", move || {
        let sweep = engine::tunneling(&potential, &grid, &req.energies, &limits)?;
        Ok(TunnelingResponse {
            energies: req.energies,
            T_wkb: sweep.t_wkb,
            T_num: sweep.t_num,
            actions: sweep.actions.into_iter().map(|a| a.is_finite().then_some(a)).collect(),
        })
    }).await
}

//! Variational energy sweeps.

use axum::extract::State;
use serde::{ Deserialize, Serialize };
use crate::{
    grid::Grid,
    potential::{ Potential, PotentialKind, PotentialParams },
    variational::{ self as engine, DEF_NUCLEAR_CHARGE },
};
use super::{ compute, ApiJson, ApiResult, AppState };

fn def_potential() -> PotentialKind { PotentialKind::Harmonic }
fn def_nuclear_charge() -> f64 { DEF_NUCLEAR_CHARGE }

/// Integration grid for `⟨V⟩`.
#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSpec {
    pub x_min: f64,
    pub x_max: f64,
    pub n_points: usize,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OscillatorRequest {
    pub alpha_array: Vec<f64>,
    #[serde(default = "def_potential")]
    pub potential_type: PotentialKind,
    #[serde(default)]
    pub potential_params: PotentialParams,
    pub grid: Option<GridSpec>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OscillatorResponse {
    pub alpha_array: Vec<f64>,
    pub energies: Vec<f64>,
    pub min_index: usize,
    /// `null` when no reference is available (free particle).
    pub exact_energy: Option<f64>,
}

/// `POST /api/variational/oscillator`
pub async fn oscillator(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<OscillatorRequest>,
) -> ApiResult<OscillatorResponse>
{
    let limits = state.limits;
    let potential = Potential::new(req.potential_type, &req.potential_params)?;
    let grid
        = req.grid
        .map(|g| Grid::new(g.x_min, g.x_max, g.n_points, &limits))
        .transpose()?;
    compute("variational/oscillator", move || {
        let sweep = engine::oscillator(&req.alpha_array, &potential, grid.as_ref(), &limits)?;
        Ok(OscillatorResponse {
            alpha_array: req.alpha_array,
            energies: sweep.energies,
            min_index: sweep.min_index,
            exact_energy: sweep.reference,
        })
    }).await
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeliumRequest {
    #[serde(rename = "ZArray")]
    pub z_array: Vec<f64>,
    #[serde(default = "def_nuclear_charge")]
    pub nuclear_charge: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeliumResponse {
    #[serde(rename = "ZArray")]
    pub z_array: Vec<f64>,
    pub energies: Vec<f64>,
    pub min_index: usize,
    /// Only reported for helium itself.
    pub ref_energy: Option<f64>,
}

/// `POST /api/variational/helium`
pub async fn helium(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<HeliumRequest>,
) -> ApiResult<HeliumResponse>
{
    let limits = state.limits;
    compute("variational/helium", move || {
        let sweep = engine::helium(&req.z_array, req.nuclear_charge, &limits)?;
        Ok(HeliumResponse {
            z_array: req.z_array,
            energies: sweep.energies,
            min_index: sweep.min_index,
            ref_energy: sweep.reference,
        })
    }).await
}

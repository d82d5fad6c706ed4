//! JSON-over-HTTP interface to the engine.
//!
//! Every endpoint is a `POST` taking and returning a JSON object. Requests are
//! deserialized and checked against the router's [`Limits`] on the async
//! side; the computation itself runs on the blocking thread pool.
//!
//! | Route | Handler |
//! |---|---|
//! | `/api/schrodinger/spectrum` | [`schrodinger::spectrum`] |
//! | `/api/schrodinger/time-evolution` | [`schrodinger::time_evolution`] |
//! | `/api/dynamics/schrodinger` | [`dynamics::schrodinger`] |
//! | `/api/dynamics/heisenberg` | [`dynamics::heisenberg`] |
//! | `/api/dynamics/ehrenfest` | [`dynamics::ehrenfest`] |
//! | `/api/operators/observable` | [`operators::observable`] |
//! | `/api/operators/basis-change` | [`operators::basis_change`] |
//! | `/api/spin/dynamics` | [`spin::dynamics`] |
//! | `/api/spin/coupling` | [`spin::coupling`] |
//! | `/api/spin/spin-orbit` | [`spin::spin_orbit`] |
//! | `/api/symmetry/rotation` | [`symmetry::rotation`] |
//! | `/api/symmetry/parity` | [`symmetry::parity`] |
//! | `/api/symmetry/time-reversal` | [`symmetry::time_reversal`] |
//! | `/api/variational/oscillator` | [`variational::oscillator`] |
//! | `/api/variational/helium` | [`variational::helium`] |
//! | `/api/wkb/tunneling` | [`wkb::tunneling`] |

use ndarray as nd;
use num_complex::Complex64 as C64;
use axum::{
    extract::FromRequest,
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use serde::Serialize;
use tracing::error;
use crate::{
    error::{ QResult, ValidationError },
    limits::Limits,
    utils::{ complex_matrix, complex_vector },
};

pub mod error;
pub mod schrodinger;
pub mod dynamics;
pub mod operators;
pub mod spin;
pub mod symmetry;
pub mod variational;
pub mod wkb;

pub use error::{ ApiError, ErrorKind };

/// Shared, immutable router state.
#[derive(Copy, Clone, Debug, Default)]
pub struct AppState {
    pub limits: Limits,
}

/// [`Json`] with rejections reported as [`ApiError`]s.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T> IntoResponse for ApiJson<T>
where T: Serialize
{
    fn into_response(self) -> Response { Json(self.0).into_response() }
}

pub type ApiResult<T> = Result<ApiJson<T>, ApiError>;

/// Run `f` on the blocking pool and convert its result for `endpoint`.
pub(crate) async fn compute<T, F>(endpoint: &'static str, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> QResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(res) => res.map(ApiJson).map_err(|e| ApiError::from_engine(endpoint, e)),
        Err(join_err) => {
            error!(endpoint, error = %join_err, "compute task failed");
            Err(ApiError::internal())
        },
    }
}

// square complex matrix from split parts, with its dimension checked
pub(crate) fn matrix_input(
    what: &'static str,
    re: &[Vec<f64>],
    im: Option<&[Vec<f64>]>,
    limits: &Limits,
) -> Result<nd::Array2<C64>, ValidationError>
{
    let a = complex_matrix(what, re, im)?;
    limits.check_dim(what, a.nrows())?;
    Ok(a)
}

pub(crate) fn vector_input(what: &'static str, re: &[f64], im: Option<&[f64]>)
    -> Result<nd::Array1<C64>, ValidationError>
{
    let psi = complex_vector(re, im)?;
    ValidationError::check_all_finite(what, re.iter().chain(im.unwrap_or(&[])))?;
    Ok(psi)
}

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
    version: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "qplay quantum mechanics engine",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> { Json(HealthResponse { status: "ok" }) }

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/schrodinger/spectrum", post(schrodinger::spectrum))
        .route("/api/schrodinger/time-evolution", post(schrodinger::time_evolution))
        .route("/api/dynamics/schrodinger", post(dynamics::schrodinger))
        .route("/api/dynamics/heisenberg", post(dynamics::heisenberg))
        .route("/api/dynamics/ehrenfest", post(dynamics::ehrenfest))
        .route("/api/operators/observable", post(operators::observable))
        .route("/api/operators/basis-change", post(operators::basis_change))
        .route("/api/spin/dynamics", post(spin::dynamics))
        .route("/api/spin/coupling", post(spin::coupling))
        .route("/api/spin/spin-orbit", post(spin::spin_orbit))
        .route("/api/symmetry/rotation", post(symmetry::rotation))
        .route("/api/symmetry/parity", post(symmetry::parity))
        .route("/api/symmetry/time-reversal", post(symmetry::time_reversal))
        .route("/api/variational/oscillator", post(variational::oscillator))
        .route("/api/variational/helium", post(variational::helium))
        .route("/api/wkb/tunneling", post(wkb::tunneling))
        .with_state(state)
}

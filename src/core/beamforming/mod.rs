//! Frequency-domain adaptive beamforming
//!
//! Contains:
//! - Layout adapters between transform buffers and per-bin channel vectors
//! - Mask-weighted spatial covariance estimation
//! - Steering vectors from principal eigenvectors
//! - MVDR weights with diagonal loading
//! - Weighted channel combination

mod beamform;
mod covariance;
pub mod hermitian;
mod mvdr;
mod reshape;
mod steering;

pub use beamform::{beamform, beamform_packed};
pub use covariance::CovarianceEstimator;
pub use hermitian::is_hermitian;
pub use mvdr::{BinSolve, MvdrSolution, MvdrWeightSolver};
pub use reshape::ChannelReshaper;
pub use steering::{estimate_steer_vector, principal_eigenvector};

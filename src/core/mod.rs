//! Core transform and beamforming modules

pub mod beamforming;
pub mod dsp;
pub mod pipeline;

pub use beamforming::{
    beamform, beamform_packed, estimate_steer_vector, ChannelReshaper, CovarianceEstimator,
    MvdrSolution, MvdrWeightSolver,
};
pub use dsp::{StftStats, WindowType, WindowedTransform};
pub use pipeline::{Enhancement, MvdrPipeline};

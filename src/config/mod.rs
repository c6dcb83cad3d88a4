//! Configuration for the transform engine and the beamformer

mod options;

pub use options::{BeamformerOptions, FrontendConfig, StftOptions, INT16_MAX};

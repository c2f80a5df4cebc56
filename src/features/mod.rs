//! Binary permission features: user × permission membership matrix.

mod matrix;

pub use matrix::{FeatureMatrix, NoSignal};

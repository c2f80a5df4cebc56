//! Unsupervised outlier detection: seeded isolation forest.

mod forest;

pub use forest::{ForestParams, IsolationForest, ModelError};

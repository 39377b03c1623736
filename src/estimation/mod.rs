pub mod client;

pub use client::{EstimationConfig, HttpEstimationClient, VitalsEstimator};

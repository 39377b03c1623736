pub mod config;
pub mod controller;
pub mod loop_worker;
pub mod state;

pub use config::ScanConfig;
pub use controller::{ScanController, ScanEvent};
pub use state::{ScanPhase, ScanSnapshot, ScanState};

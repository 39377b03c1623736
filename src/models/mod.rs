pub mod vitals;

pub use vitals::{VitalsResult, VitalsStatus};

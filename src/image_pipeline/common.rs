//! Common utilities module
//!
//! Error types and the plane container shared by every stage.

pub mod error;
pub mod plane;

pub use error::{CalibrationError, Result};
pub use plane::{BayerPlane, FloatPlane, Plane};

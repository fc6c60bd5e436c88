//! Data preprocessing module
//!
//! Every candidate pipeline standardizes its inputs before fitting, with the
//! scaler fitted on the training rows only.

mod scaler;

pub use scaler::StandardScaler;

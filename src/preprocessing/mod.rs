//! Feature standardization
//!
//! One fitted transform is shared between training and inference: fit once on
//! the training partition, persisted next to the model, never refit.

mod scaler;

pub use scaler::StandardScaler;

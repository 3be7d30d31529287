//! Feature assembly, the model ensemble, and bracket-probability
//! integration.

pub mod brackets;
pub mod ensemble;
pub mod feature;
pub mod pipeline;
pub mod regressor;

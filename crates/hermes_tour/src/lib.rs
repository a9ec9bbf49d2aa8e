//! Job and activity model of the hermes routing engine, together with the
//! time-window propagation used to validate and time candidate routes.

pub mod json;
pub mod problem;
pub mod solution;
mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

//! Observability support: metric recording helpers.

pub mod metrics;

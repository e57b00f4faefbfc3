//! Static analysis of a registry's dependency structure.
pub mod topology;

//! The `rflinac` crate simulates the dynamics of electron beams in RF linear accelerators.
pub mod beam;
pub mod constants;
pub mod error;
pub mod field;
pub mod integration;
pub mod interpolation;
pub mod io;
pub mod kinematics;
pub mod separatrix;
pub mod simulation;
pub mod statistics;
pub mod structure;

//! Cut a closed solid mesh into eight octant parts that plug back together.
//!
//! The model's bounding box is split on its three mid-planes. Each of the
//! eight cutting volumes grows a tapered peg or carves a slightly larger
//! socket on every cut face, is intersected with the model, and the result
//! is repaired into a closed, consistently wound solid.
//!
//! The pipeline, in order:
//! - [`octant::partition`] places the eight cutting volumes
//! - [`connector::add_connectors`] shapes each volume's pegs and sockets
//! - [`boolean::extract`] intersects the model with one volume through a
//!   pluggable [`boolean::BooleanSolver`]
//! - [`repair::ManifoldRepairEngine`] closes whatever the cut left open
//! - [`cutter::Cutter`] runs the above per octant and collects the parts
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` import/export and the `octacut` binary
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon to run the octant pipelines concurrently

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod boolean;
pub mod config;
pub mod connector;
pub mod cutter;
pub mod diagnostics;
pub mod errors;
pub mod float_types;
pub mod io;
pub mod mesh;
pub mod octant;
pub mod repair;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use cutter::{CutOutcome, Cutter, Part, SourceModel, cut};
pub use mesh::Mesh;

//! Core compute primitives (Vector, Matrix).
//!
//! Encoded feature matrices and target vectors flow through these types
//! between the encoder, the forest and the metrics.

mod matrix;
mod vector;

pub use matrix::Matrix;
pub use vector::Vector;

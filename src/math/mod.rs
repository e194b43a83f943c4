//! Numeric building blocks for the distortion solver.
//!
//! * [`polynomial`] - real polynomials and their complex roots.
//! * [`golden`] - bounded golden-section line searches.

pub mod golden;
pub mod polynomial;

pub use golden::{line_search_max_golden, line_search_min_golden};
pub use polynomial::Polynomial;

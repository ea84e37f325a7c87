//! MODIT cross-section synthesis engine.
//!
//! Turns a molecular line list and an atmospheric temperature/pressure profile
//! into a `[layer x wavenumber]` absorption cross-section matrix. Line profiles
//! are not evaluated per line: strengths are binned on a grid of broadening
//! parameters and convolved with a Voigt kernel per grid point through FFTs.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;

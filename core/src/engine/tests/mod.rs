//! Tests for the execution engine
//!
//! Organized by feature area

mod helpers;

mod block_tests;
mod lifecycle_tests;
mod procedure_tests;

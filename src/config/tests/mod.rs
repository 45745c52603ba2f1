//! Unit tests for configuration loading and precedence.
//!
//! Tests are organised into modules by functional area:
//! - `helpers`: Shared test utilities
//! - `precedence`: Layer precedence tests
//! - `field_resolution`: Token, repository list and settings resolution
//! - `loading`: Environment and CLI loading through `load_from_iter`

mod field_resolution;
mod helpers;

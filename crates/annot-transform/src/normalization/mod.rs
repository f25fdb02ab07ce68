//! Parsing of raw cell text into typed values.

pub mod boolean;
pub mod datetime;
pub mod numeric;

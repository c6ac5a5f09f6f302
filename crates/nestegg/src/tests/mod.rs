//! Host crate tests
//!
//! - `input` - Scenario and tax configuration loading
//! - `report` - Table, JSON and comparison rendering

mod input;

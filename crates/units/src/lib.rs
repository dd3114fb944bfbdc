//! `larder-units` — measurement units and the conversion registry.
//!
//! Conversion is a pure function over a read-only unit catalog. Cross-type
//! conversion (e.g. kilograms into liters) is rejected, never guessed.

pub mod registry;
pub mod unit;

pub use registry::UnitRegistry;
pub use unit::{MeasurementUnit, UnitType};

use std::collections::HashMap;

use rust_decimal::Decimal;

use larder_core::{canonical, LedgerError, LedgerResult, UnitId};

use crate::unit::{MeasurementUnit, UnitType};

/// Read-only catalog of measurement units with conversion between them.
///
/// Built once per request from the persisted unit catalog; conversion itself
/// has no side effects.
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    units: HashMap<UnitId, MeasurementUnit>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an already-validated unit catalog.
    pub fn from_units(units: impl IntoIterator<Item = MeasurementUnit>) -> Self {
        Self {
            units: units.into_iter().map(|u| (u.id, u)).collect(),
        }
    }

    /// Register a unit. Re-registering the same id replaces the entry, which
    /// is only legal before the unit is referenced by ledger history.
    pub fn register(&mut self, unit: MeasurementUnit) {
        self.units.insert(unit.id, unit);
    }

    pub fn get(&self, id: UnitId) -> LedgerResult<&MeasurementUnit> {
        self.units
            .get(&id)
            .ok_or_else(|| LedgerError::unknown("unit", id))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Convert a non-negative quantity from one unit into another.
    ///
    /// Succeeds only when both units share the same `UnitType`; the result is
    /// `quantity * from.factor / to.factor`, normalized to canonical
    /// precision. `convert(x, u, u) == x` for any registered unit `u` (up to
    /// canonical rounding of the input).
    pub fn convert(&self, quantity: Decimal, from: UnitId, to: UnitId) -> LedgerResult<Decimal> {
        if quantity < Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "cannot convert negative quantity {quantity}"
            )));
        }

        let from = self.get(from)?;
        let to = self.get(to)?;

        if from.unit_type != to.unit_type {
            return Err(LedgerError::incompatible_units(
                from.unit_type.to_string(),
                to.unit_type.to_string(),
            ));
        }

        // factor > 0 is enforced at unit construction, so this never divides
        // by zero.
        Ok(canonical(quantity * from.factor / to.factor))
    }

    /// Convert a quantity into the canonical unit of its type.
    pub fn to_canonical(&self, quantity: Decimal, from: UnitId) -> LedgerResult<Decimal> {
        if quantity < Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "cannot convert negative quantity {quantity}"
            )));
        }
        let from = self.get(from)?;
        Ok(canonical(quantity * from.factor))
    }

    /// The standard catalog a restaurant deployment starts from.
    ///
    /// Canonical units carry factor 1: kilogram (weight), liter (volume),
    /// piece (quantity), meter (length).
    pub fn standard() -> Self {
        use rust_decimal_macros::dec;

        let defs: [(&str, &str, UnitType, Decimal); 12] = [
            ("kilogram", "kg", UnitType::Weight, dec!(1)),
            ("gram", "g", UnitType::Weight, dec!(0.001)),
            ("milligram", "mg", UnitType::Weight, dec!(0.000001)),
            ("pound", "lb", UnitType::Weight, dec!(0.4536)),
            ("ounce", "oz", UnitType::Weight, dec!(0.0283)),
            ("liter", "l", UnitType::Volume, dec!(1)),
            ("milliliter", "ml", UnitType::Volume, dec!(0.001)),
            ("piece", "pcs", UnitType::Quantity, dec!(1)),
            ("dozen", "dz", UnitType::Quantity, dec!(12)),
            ("meter", "m", UnitType::Length, dec!(1)),
            ("centimeter", "cm", UnitType::Length, dec!(0.01)),
            ("millimeter", "mm", UnitType::Length, dec!(0.001)),
        ];

        let mut registry = Self::new();
        for (name, abbr, unit_type, factor) in defs {
            // Static catalog entries always pass validation.
            if let Ok(unit) = MeasurementUnit::new(UnitId::new(), name, abbr, unit_type, factor) {
                registry.register(unit);
            }
        }
        registry
    }

    /// Look up a standard-catalog unit by abbreviation (test/seed helper).
    pub fn find_by_abbreviation(&self, abbr: &str) -> Option<&MeasurementUnit> {
        self.units.values().find(|u| u.abbreviation == abbr)
    }

    pub fn units(&self) -> impl Iterator<Item = &MeasurementUnit> {
        self.units.values()
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larder_core::{LedgerError, LedgerResult, UnitId};

/// Closed set of measurement types.
///
/// Conversion is only defined within one type; the registry rejects anything
/// else with `IncompatibleUnitType`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Weight,
    Volume,
    Quantity,
    Length,
}

impl UnitType {
    /// Name of the type's canonical reference unit (factor 1).
    pub fn canonical_unit_name(&self) -> &'static str {
        match self {
            UnitType::Weight => "kilogram",
            UnitType::Volume => "liter",
            UnitType::Quantity => "piece",
            UnitType::Length => "meter",
        }
    }
}

impl core::fmt::Display for UnitType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            UnitType::Weight => "weight",
            UnitType::Volume => "volume",
            UnitType::Quantity => "quantity",
            UnitType::Length => "length",
        };
        f.write_str(s)
    }
}

/// A measurement unit with its factor to the type's canonical unit.
///
/// `factor` is multiplicative: `1 <unit> == factor <canonical unit>`
/// (gram has factor 0.001 against the kilogram).
///
/// Units are immutable once referenced by ledger entries or recipes; changing
/// a factor retroactively would corrupt history. The registry therefore has
/// no update operation, only registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementUnit {
    pub id: UnitId,
    pub name: String,
    pub abbreviation: String,
    pub unit_type: UnitType,
    pub factor: Decimal,
}

impl MeasurementUnit {
    pub fn new(
        id: UnitId,
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        unit_type: UnitType,
        factor: Decimal,
    ) -> LedgerResult<Self> {
        let name = name.into();
        let abbreviation = abbreviation.into();

        if name.trim().is_empty() {
            return Err(LedgerError::validation("unit name cannot be empty"));
        }
        if abbreviation.trim().is_empty() {
            return Err(LedgerError::validation("unit abbreviation cannot be empty"));
        }
        if factor <= Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "unit factor must be positive, got {factor}"
            )));
        }

        Ok(Self {
            id,
            name,
            abbreviation,
            unit_type,
            factor,
        })
    }

    /// Whether this is the canonical unit of its type.
    pub fn is_canonical(&self) -> bool {
        self.factor == Decimal::ONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_non_positive_factor() {
        let err = MeasurementUnit::new(UnitId::new(), "gram", "g", UnitType::Weight, dec!(0))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn rejects_blank_name() {
        let err = MeasurementUnit::new(UnitId::new(), "  ", "g", UnitType::Weight, dec!(0.001))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn canonical_unit_has_factor_one() {
        let kg =
            MeasurementUnit::new(UnitId::new(), "kilogram", "kg", UnitType::Weight, dec!(1))
                .unwrap();
        assert!(kg.is_canonical());
    }
}

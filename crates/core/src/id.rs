//! Strongly-typed identifiers used across the ledger core.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

macro_rules! impl_uuid_id {
    ($t:ident, $name:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in
            /// tests for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|_| LedgerError::unknown($name, s))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_id!(IngredientId, "ingredient", "Identifier of an ingredient.");
impl_uuid_id!(UnitId, "unit", "Identifier of a measurement unit.");
impl_uuid_id!(RecipeId, "recipe", "Identifier of a recipe.");
impl_uuid_id!(
    FoodItemId,
    "food item",
    "Identifier of a menu food item (owned by the menu subsystem)."
);
impl_uuid_id!(
    OrderItemId,
    "order item",
    "Identifier of an order line item (owned by the order subsystem).\n\nDoubles as the idempotency key for order-driven consumption."
);
impl_uuid_id!(
    TransactionId,
    "transaction",
    "Identifier of an inventory ledger transaction."
);

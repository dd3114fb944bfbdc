//! End-to-end tests over the in-memory store: the ledger invariants, the
//! manual paths, order-driven deduction, idempotency, and concurrency.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use larder_core::{FoodItemId, IngredientId, LedgerError, OrderItemId, UnitId};
use larder_inventory::{AdjustmentDirection, BackorderPolicy, TransactionType};
use larder_recipes::{OrderItem, RecipeIngredient};
use larder_units::UnitType;

use crate::ledger::{NewIngredient, StockLedger};
use crate::store::{ConsumptionCommit, HistoryQuery, InMemoryInventoryStore, Pagination, TimeRange};

struct Harness {
    ledger: StockLedger<InMemoryInventoryStore>,
    kg: UnitId,
    g: UnitId,
}

fn harness(policy: BackorderPolicy) -> Harness {
    let ledger = StockLedger::with_policy(InMemoryInventoryStore::new(), policy);
    let kg = ledger
        .register_unit("kilogram", "kg", UnitType::Weight, dec!(1))
        .unwrap()
        .id;
    let g = ledger
        .register_unit("gram", "g", UnitType::Weight, dec!(0.001))
        .unwrap()
        .id;
    Harness { ledger, kg, g }
}

fn beef(h: &Harness, stock: Decimal) -> IngredientId {
    h.ledger
        .create_ingredient(NewIngredient {
            name: "Beef".to_string(),
            category: "Meat".to_string(),
            unit_id: h.kg,
            opening_stock: stock,
            reorder_level: dec!(2),
            cost_per_unit: dec!(8.00),
        })
        .unwrap()
        .id
}

/// Re-derive the balance from history and compare against the materialized
/// value and the per-entry identity.
fn assert_ledger_consistent(h: &Harness, ingredient_id: IngredientId) {
    let ingredient = h.ledger.ingredient(ingredient_id).unwrap();
    let page = h
        .ledger
        .history(
            ingredient_id,
            &HistoryQuery {
                pagination: Pagination::new(Some(500), None),
                ..Default::default()
            },
        )
        .unwrap();

    for tx in &page.transactions {
        assert!(tx.is_balanced(), "entry {:?} violates balance identity", tx.id);
    }
    if let Some(newest) = page.transactions.first() {
        assert_eq!(
            ingredient.stock_quantity, newest.new_quantity,
            "materialized balance must equal the latest entry's new_quantity"
        );
    }
    assert_eq!(ingredient.version, page.total);
}

#[test]
fn scenario_manual_delivery_adjustment() {
    // Beef at 10 kg; adjust +5 "delivery" -> 15 kg.
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(10));

    let tx = h
        .ledger
        .adjust_stock(
            id,
            AdjustmentDirection::Add,
            dec!(5),
            Some("delivery".to_string()),
            "admin",
        )
        .unwrap();

    assert_eq!(tx.kind, TransactionType::Adjustment);
    assert_eq!(tx.previous_quantity, dec!(10));
    assert_eq!(tx.new_quantity, dec!(15));
    assert_eq!(tx.quantity, dec!(5));
    assert_eq!(h.ledger.ingredient(id).unwrap().stock_quantity, dec!(15));
    assert_ledger_consistent(&h, id);
}

#[test]
fn scenario_order_deducts_recipe_quantities() {
    // 0.2 kg/serving, 3 servings -> one consumption of 0.6; 15 -> 14.4.
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(15));
    let food = FoodItemId::new();
    h.ledger
        .create_recipe(
            food,
            1,
            vec![RecipeIngredient {
                ingredient_id: id,
                quantity: dec!(0.2),
                unit_id: h.kg,
            }],
        )
        .unwrap();

    let txs = h
        .ledger
        .apply_order_item_consumption(
            &OrderItem {
                id: OrderItemId::new(),
                food_item_id: food,
                quantity: 3,
            },
            "kitchen",
        )
        .unwrap()
        .into_transactions();

    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].kind, TransactionType::Consumption);
    assert_eq!(txs[0].quantity, dec!(-0.6));
    assert_eq!(h.ledger.ingredient(id).unwrap().stock_quantity, dec!(14.4));
    assert_ledger_consistent(&h, id);
}

#[test]
fn scenario_recipe_line_in_grams_converts_to_kilograms() {
    // 500 g/serving against a kg-canonical ingredient, 2 servings -> 1.0 kg.
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(15));
    let food = FoodItemId::new();
    h.ledger
        .create_recipe(
            food,
            1,
            vec![RecipeIngredient {
                ingredient_id: id,
                quantity: dec!(500),
                unit_id: h.g,
            }],
        )
        .unwrap();

    let txs = h
        .ledger
        .apply_order_item_consumption(
            &OrderItem {
                id: OrderItemId::new(),
                food_item_id: food,
                quantity: 2,
            },
            "kitchen",
        )
        .unwrap()
        .into_transactions();

    assert_eq!(txs[0].quantity, dec!(-1.0));
    assert_eq!(h.ledger.ingredient(id).unwrap().stock_quantity, dec!(14));
}

#[test]
fn scenario_waste_records_negative_entry() {
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(10));

    let tx = h
        .ledger
        .record_waste(id, dec!(1), Some("spoiled".to_string()), "kitchen")
        .unwrap();

    assert_eq!(tx.kind, TransactionType::Waste);
    assert_eq!(tx.quantity, dec!(-1));
    assert_eq!(h.ledger.ingredient(id).unwrap().stock_quantity, dec!(9));
    assert_ledger_consistent(&h, id);
}

#[test]
fn consumption_is_idempotent_per_order_item() {
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(15));
    let food = FoodItemId::new();
    h.ledger
        .create_recipe(
            food,
            1,
            vec![RecipeIngredient {
                ingredient_id: id,
                quantity: dec!(0.2),
                unit_id: h.kg,
            }],
        )
        .unwrap();

    let order = OrderItem {
        id: OrderItemId::new(),
        food_item_id: food,
        quantity: 3,
    };

    let first = h.ledger.apply_order_item_consumption(&order, "kitchen").unwrap();
    let second = h.ledger.apply_order_item_consumption(&order, "kitchen").unwrap();

    // The outcome distinguishes a fresh deduction from a replay; the entries
    // are the ones the first call wrote either way.
    assert!(matches!(first, ConsumptionCommit::Applied(_)));
    assert!(matches!(second, ConsumptionCommit::AlreadyApplied(_)));
    assert_eq!(first.into_transactions(), second.into_transactions());
    assert_eq!(h.ledger.ingredient(id).unwrap().stock_quantity, dec!(14.4));
    assert_ledger_consistent(&h, id);
}

#[test]
fn racing_consumers_get_exactly_one_applied_outcome() {
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(15));
    let food = FoodItemId::new();
    h.ledger
        .create_recipe(
            food,
            1,
            vec![RecipeIngredient {
                ingredient_id: id,
                quantity: dec!(0.2),
                unit_id: h.kg,
            }],
        )
        .unwrap();

    let ledger = Arc::new(h.ledger);
    let order_item_id = OrderItemId::new();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                ledger
                    .apply_order_item_consumption(
                        &OrderItem {
                            id: order_item_id,
                            food_item_id: food,
                            quantity: 1,
                        },
                        "kitchen",
                    )
                    .unwrap()
            })
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();
    let applied = outcomes
        .iter()
        .filter(|o| matches!(o, ConsumptionCommit::Applied(_)))
        .count();
    assert_eq!(applied, 1, "only one racer may report a fresh deduction");
    assert_eq!(ledger.ingredient(id).unwrap().stock_quantity, dec!(14.8));
}

#[test]
fn consumption_beyond_stock_fails_without_writes() {
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(0.5));
    let food = FoodItemId::new();
    h.ledger
        .create_recipe(
            food,
            1,
            vec![RecipeIngredient {
                ingredient_id: id,
                quantity: dec!(0.2),
                unit_id: h.kg,
            }],
        )
        .unwrap();

    let err = h
        .ledger
        .apply_order_item_consumption(
            &OrderItem {
                id: OrderItemId::new(),
                food_item_id: food,
                quantity: 3,
            },
            "kitchen",
        )
        .unwrap_err();

    assert!(matches!(err, LedgerError::InsufficientStock { .. }));
    // Nothing was written.
    let ingredient = h.ledger.ingredient(id).unwrap();
    assert_eq!(ingredient.stock_quantity, dec!(0.5));
    assert_eq!(ingredient.version, 0);
}

#[test]
fn multi_ingredient_shortfall_deducts_nothing() {
    // Two-ingredient recipe where only the second lacks stock: all-or-nothing
    // means the first must stay untouched.
    let h = harness(BackorderPolicy::Reject);
    let beef_id = beef(&h, dec!(10));
    let onion_id = h
        .ledger
        .create_ingredient(NewIngredient {
            name: "Onion".to_string(),
            category: "Vegetables".to_string(),
            unit_id: h.kg,
            opening_stock: dec!(0.1),
            reorder_level: dec!(1),
            cost_per_unit: dec!(1.20),
        })
        .unwrap()
        .id;

    let food = FoodItemId::new();
    h.ledger
        .create_recipe(
            food,
            1,
            vec![
                RecipeIngredient {
                    ingredient_id: beef_id,
                    quantity: dec!(0.2),
                    unit_id: h.kg,
                },
                RecipeIngredient {
                    ingredient_id: onion_id,
                    quantity: dec!(0.3),
                    unit_id: h.kg,
                },
            ],
        )
        .unwrap();

    let err = h
        .ledger
        .apply_order_item_consumption(
            &OrderItem {
                id: OrderItemId::new(),
                food_item_id: food,
                quantity: 1,
            },
            "kitchen",
        )
        .unwrap_err();

    assert!(matches!(err, LedgerError::InsufficientStock { .. }));
    assert_eq!(h.ledger.ingredient(beef_id).unwrap().stock_quantity, dec!(10));
    assert_eq!(h.ledger.ingredient(onion_id).unwrap().stock_quantity, dec!(0.1));
}

#[test]
fn backorder_policy_allows_negative_consumption() {
    let h = harness(BackorderPolicy::Allow);
    let id = beef(&h, dec!(0.5));

    let tx = h
        .ledger
        .append_transaction(id, TransactionType::Consumption, dec!(-2), None, "kitchen")
        .unwrap();

    assert_eq!(tx.new_quantity, dec!(-1.5));
    assert_ledger_consistent(&h, id);
}

#[test]
fn purchase_blends_average_cost() {
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(10)); // 10 kg at 8.00

    h.ledger
        .record_purchase(id, dec!(10), Some(dec!(10.00)), None, "admin")
        .unwrap();

    let ingredient = h.ledger.ingredient(id).unwrap();
    assert_eq!(ingredient.stock_quantity, dec!(20));
    assert_eq!(ingredient.cost_per_unit, dec!(9.00));
    assert_ledger_consistent(&h, id);
}

#[test]
fn recipe_cost_follows_current_ingredient_cost() {
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(10));
    let food = FoodItemId::new();
    let recipe = h
        .ledger
        .create_recipe(
            food,
            2,
            vec![RecipeIngredient {
                ingredient_id: id,
                quantity: dec!(500),
                unit_id: h.g,
            }],
        )
        .unwrap();

    let cost = h.ledger.recipe_cost(recipe.id).unwrap();
    assert_eq!(cost.total_cost, dec!(4.00));
    assert_eq!(cost.cost_per_serving, dec!(2.00));

    // Cost change is visible on the next computation.
    h.ledger.set_ingredient_cost(id, dec!(16.00)).unwrap();
    let cost = h.ledger.recipe_cost(recipe.id).unwrap();
    assert_eq!(cost.total_cost, dec!(8.00));
}

#[test]
fn history_is_newest_first_and_restartable() {
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(100));

    for i in 1..=7 {
        h.ledger
            .adjust_stock(
                id,
                AdjustmentDirection::Add,
                Decimal::from(i),
                None,
                "admin",
            )
            .unwrap();
    }

    let query = HistoryQuery {
        pagination: Pagination::new(Some(3), None),
        ..Default::default()
    };
    let first = h.ledger.history(id, &query).unwrap();
    assert_eq!(first.total, 7);
    assert_eq!(first.transactions.len(), 3);
    assert!(first.has_more);
    // Newest first: the +7 adjustment leads.
    assert_eq!(first.transactions[0].quantity, dec!(7));

    // Re-issuing the same page returns the same entries.
    let again = h.ledger.history(id, &query).unwrap();
    assert_eq!(first.transactions, again.transactions);

    let last_page = h
        .ledger
        .history(
            id,
            &HistoryQuery {
                pagination: Pagination::new(Some(3), Some(6)),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(last_page.transactions.len(), 1);
    assert!(!last_page.has_more);
    assert_eq!(last_page.transactions[0].quantity, dec!(1));
}

#[test]
fn history_time_range_bounds_are_exclusive() {
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(100));

    let mut stamps = Vec::new();
    for _ in 0..3 {
        let tx = h
            .ledger
            .adjust_stock(id, AdjustmentDirection::Add, dec!(1), None, "admin")
            .unwrap();
        stamps.push(tx.created_at);
        // Distinct timestamps so the bounds select unambiguously.
        thread::sleep(Duration::from_millis(2));
    }

    // Strictly after the middle entry: the entry at the bound is excluded.
    let page = h
        .ledger
        .history(
            id,
            &HistoryQuery {
                range: TimeRange {
                    after: Some(stamps[1]),
                    before: None,
                },
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.transactions[0].created_at, stamps[2]);

    // Strictly before the middle entry.
    let page = h
        .ledger
        .history(
            id,
            &HistoryQuery {
                range: TimeRange {
                    after: None,
                    before: Some(stamps[1]),
                },
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.transactions[0].created_at, stamps[0]);

    // Both bounds select exactly the middle entry.
    let page = h
        .ledger
        .history(
            id,
            &HistoryQuery {
                range: TimeRange {
                    after: Some(stamps[0]),
                    before: Some(stamps[2]),
                },
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.transactions[0].created_at, stamps[1]);
}

#[test]
fn concurrent_writers_commute_to_the_same_balance() {
    // adjust(-5) and a consumption of 2 against stock 10 -> 3, whatever the
    // interleaving.
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(10));
    let food = FoodItemId::new();
    h.ledger
        .create_recipe(
            food,
            1,
            vec![RecipeIngredient {
                ingredient_id: id,
                quantity: dec!(2),
                unit_id: h.kg,
            }],
        )
        .unwrap();

    let ledger = Arc::new(h.ledger);

    let adjuster = {
        let ledger = Arc::clone(&ledger);
        thread::spawn(move || {
            ledger
                .adjust_stock(id, AdjustmentDirection::Remove, dec!(5), None, "admin")
                .unwrap();
        })
    };
    let consumer = {
        let ledger = Arc::clone(&ledger);
        thread::spawn(move || {
            ledger
                .apply_order_item_consumption(
                    &OrderItem {
                        id: OrderItemId::new(),
                        food_item_id: food,
                        quantity: 1,
                    },
                    "kitchen",
                )
                .unwrap();
        })
    };
    adjuster.join().unwrap();
    consumer.join().unwrap();

    let ingredient = ledger.ingredient(id).unwrap();
    assert_eq!(ingredient.stock_quantity, dec!(3));
    assert_eq!(ingredient.version, 2);
}

#[test]
fn many_concurrent_deductions_never_lose_updates() {
    let h = harness(BackorderPolicy::Reject);
    let id = beef(&h, dec!(100));
    // Contention here is far above what a set of restaurant terminals
    // produces; give the bounded retry plenty of headroom.
    let ledger = Arc::new(h.ledger.commit_attempts(1000));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..10 {
                    ledger
                        .adjust_stock(id, AdjustmentDirection::Remove, dec!(1), None, "admin")
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let ingredient = ledger.ingredient(id).unwrap();
    assert_eq!(ingredient.stock_quantity, dec!(20));
    assert_eq!(ingredient.version, 80);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: after any sequence of manual movements, every history entry
    /// satisfies `new - previous == quantity`, the materialized balance equals
    /// the newest entry's `new_quantity`, and the version equals the entry
    /// count.
    #[test]
    fn random_movement_sequences_keep_the_ledger_consistent(
        deltas in prop::collection::vec(-50i64..50i64, 1..20),
    ) {
        let h = harness(BackorderPolicy::Allow);
        let id = beef(&h, dec!(100));

        for delta in deltas {
            if delta == 0 {
                continue;
            }
            let (direction, qty) = if delta > 0 {
                (AdjustmentDirection::Add, Decimal::from(delta))
            } else {
                (AdjustmentDirection::Remove, Decimal::from(-delta))
            };
            h.ledger.adjust_stock(id, direction, qty, None, "prop").unwrap();
        }

        assert_ledger_consistent(&h, id);
    }
}

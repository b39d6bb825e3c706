//! # Recipe Scaling
//!
//! Ingredient amounts are written per `portion_size` units of output.
//! A work order for `target` units needs each amount multiplied by
//! `target / portion_size`.
//!
//! ```text
//! Nasi Ayam (portion_size = 100 portions)
//!   rice     8.0 kg ──┐
//!   chicken  6.0 kg ──┼── × (250 / 100) ──►  rice 20.0 kg, chicken 15.0 kg
//!   oil      0.5 l  ──┘                      oil 1.25 l
//! ```

use serde::Serialize;
use std::collections::HashMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Item, RecipeItem};

/// One ingredient after scaling to a target output.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScaledIngredient {
    pub item_id: String,
    pub sku: String,
    pub item_name: String,
    pub unit: String,
    pub quantity: f64,
    /// Standard price of `quantity`, rounded to whole cents.
    pub cost_cents: i64,
}

/// Result of scaling a whole recipe.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScaledRecipe {
    pub recipe_id: String,
    pub target_quantity: f64,
    pub ingredients: Vec<ScaledIngredient>,
    pub total_cost_cents: i64,
    pub cost_per_portion_cents: i64,
}

/// `ingredient_qty × target / portion_size`.
///
/// ## Errors
/// `InvalidPortionSize` if `portion_size <= 0`.
pub fn scale_quantity(ingredient_qty: f64, portion_size: f64, target: f64) -> CoreResult<f64> {
    if portion_size <= 0.0 || !portion_size.is_finite() {
        return Err(CoreError::InvalidPortionSize(portion_size));
    }
    Ok(ingredient_qty * (target / portion_size))
}

/// Scales every ingredient and prices it from the item master.
///
/// `items` maps item id to item; ingredients whose item is missing are
/// priced at zero and labelled with their id.
///
/// Each line's `cost_cents` is rounded on its own, but the recipe total and
/// the cost per portion are rounded once from the exact sum, so they can
/// differ from the sum of the displayed line costs by a cent or so.
///
/// ## Errors
/// - `InvalidPortionSize` if `portion_size <= 0`
/// - `AmountOverflow` if any cost leaves the `i64` cent range
pub fn scale_recipe(
    recipe_id: &str,
    portion_size: f64,
    ingredients: &[RecipeItem],
    items: &HashMap<String, Item>,
    target: f64,
) -> CoreResult<ScaledRecipe> {
    let overflow = || CoreError::overflow(format!("recipe {recipe_id}"));
    let mut scaled = Vec::with_capacity(ingredients.len());
    let mut exact_total = 0.0;

    for line in ingredients {
        let quantity = scale_quantity(line.quantity, portion_size, target)?;
        let (sku, name, price) = match items.get(&line.item_id) {
            Some(item) => (item.sku.clone(), item.name.clone(), item.price()),
            None => (line.item_id.clone(), line.item_id.clone(), Money::zero()),
        };
        let exact_cost = price.cents() as f64 * quantity;
        let cost = Money::from_exact_cents(exact_cost).ok_or_else(overflow)?;
        exact_total += exact_cost;
        scaled.push(ScaledIngredient {
            item_id: line.item_id.clone(),
            sku,
            item_name: name,
            unit: line.unit.clone(),
            quantity,
            cost_cents: cost.cents(),
        });
    }

    let total = Money::from_exact_cents(exact_total).ok_or_else(overflow)?;
    let per_portion = if target > 0.0 {
        Money::from_exact_cents(exact_total / target).ok_or_else(overflow)?
    } else {
        Money::zero()
    };

    Ok(ScaledRecipe {
        recipe_id: recipe_id.to_string(),
        target_quantity: target,
        ingredients: scaled,
        total_cost_cents: total.cents(),
        cost_per_portion_cents: per_portion.cents(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemType;
    use chrono::Utc;

    fn item(id: &str, price_cents: i64) -> Item {
        let now = Utc::now();
        Item {
            id: id.to_string(),
            sku: format!("SKU-{id}"),
            code: id.to_uppercase(),
            name: id.to_string(),
            description: None,
            item_type: ItemType::RawMaterial,
            unit: "kg".to_string(),
            category_id: None,
            reorder_point: 0.0,
            price_cents,
            shelf_life_days: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(item_id: &str, quantity: f64) -> RecipeItem {
        RecipeItem {
            id: format!("ri-{item_id}"),
            recipe_id: "r1".to_string(),
            item_id: item_id.to_string(),
            quantity,
            unit: "kg".to_string(),
        }
    }

    #[test]
    fn test_scale_quantity() {
        assert_eq!(scale_quantity(8.0, 100.0, 250.0).unwrap(), 20.0);
        assert_eq!(scale_quantity(0.5, 100.0, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_doubling_target_doubles_quantity() {
        for qty in [0.08, 1.5, 3.0, 12.25] {
            let single = scale_quantity(qty, 40.0, 125.0).unwrap();
            let double = scale_quantity(qty, 40.0, 250.0).unwrap();
            assert!((double - 2.0 * single).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_portion_size_is_rejected() {
        assert!(matches!(
            scale_quantity(1.0, 0.0, 10.0),
            Err(CoreError::InvalidPortionSize(_))
        ));
        assert!(scale_quantity(1.0, -5.0, 10.0).is_err());
    }

    #[test]
    fn test_scale_recipe_costs() {
        let mut items = HashMap::new();
        items.insert("rice".to_string(), item("rice", 1_200_000));
        items.insert("oil".to_string(), item("oil", 2_000_000));

        let lines = vec![line("rice", 8.0), line("oil", 0.5)];
        let scaled = scale_recipe("r1", 100.0, &lines, &items, 250.0).unwrap();

        assert_eq!(scaled.ingredients[0].quantity, 20.0);
        assert_eq!(scaled.ingredients[0].cost_cents, 24_000_000);
        assert_eq!(scaled.ingredients[1].quantity, 1.25);
        assert_eq!(scaled.ingredients[1].cost_cents, 2_500_000);
        assert_eq!(scaled.total_cost_cents, 26_500_000);
        assert_eq!(scaled.cost_per_portion_cents, 106_000);
    }

    #[test]
    fn test_total_is_rounded_once() {
        let mut items = HashMap::new();
        for id in ["salt", "sugar", "pepper"] {
            items.insert(id.to_string(), item(id, 1));
        }
        // each line costs half a cent
        let lines = vec![line("salt", 0.5), line("sugar", 0.5), line("pepper", 0.5)];
        let scaled = scale_recipe("r1", 1.0, &lines, &items, 1.0).unwrap();

        assert!(scaled.ingredients.iter().all(|i| i.cost_cents == 1));
        assert_eq!(scaled.total_cost_cents, 2);
        assert_eq!(scaled.cost_per_portion_cents, 2);
    }

    #[test]
    fn test_huge_target_overflows_instead_of_saturating() {
        let mut items = HashMap::new();
        items.insert("rice".to_string(), item("rice", 1_200));

        let result = scale_recipe("r1", 100.0, &[line("rice", 8.0)], &items, 1e300);
        assert!(matches!(result, Err(CoreError::AmountOverflow { .. })));

        // each line fits, their sum does not
        items.insert("saffron".to_string(), item("saffron", 100_000_000_000));
        let lines = vec![line("saffron", 5e7), line("saffron", 5e7)];
        let result = scale_recipe("r1", 1.0, &lines, &items, 1.0);
        assert!(matches!(result, Err(CoreError::AmountOverflow { .. })));
    }

    #[test]
    fn test_zero_target_has_zero_cost_per_portion() {
        let items = HashMap::new();
        let scaled = scale_recipe("r1", 10.0, &[line("x", 1.0)], &items, 0.0).unwrap();
        assert_eq!(scaled.total_cost_cents, 0);
        assert_eq!(scaled.cost_per_portion_cents, 0);
    }
}

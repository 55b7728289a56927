//! Shopping list generation.
//!
//! Sums the ingredient lines of every recipe in a user's cart, grouped by
//! ingredient name and measurement unit, and renders the result as a plain-text
//! document.

use crate::{
    entities::{CartEntry, RecipeIngredient, cart_entry, ingredient, recipe_ingredient},
    errors::Result,
};
use sea_orm::{
    FromQueryResult, JoinType, QueryOrder, QuerySelect,
    prelude::*,
    sea_query::{Expr, Query},
};
use serde::Serialize;
use tracing::{debug, instrument};

/// One aggregated line of the shopping list.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct ShoppingListItem {
    /// Ingredient name
    pub name: String,
    /// Measurement unit
    pub unit: String,
    /// Sum of the amounts over every cart recipe
    pub total_amount: i64,
}

/// Builds the user's shopping list, ordered by ingredient name then unit.
///
/// Ingredients that share a name but not a unit stay on separate lines.
/// An empty cart yields an empty list.
#[instrument(skip(db))]
pub async fn generate(db: &DatabaseConnection, user_id: i64) -> Result<Vec<ShoppingListItem>> {
    let cart_recipes = Query::select()
        .column(cart_entry::Column::RecipeId)
        .from(CartEntry)
        .and_where(cart_entry::Column::UserId.eq(user_id))
        .to_owned();

    let items = RecipeIngredient::find()
        .select_only()
        .column_as(ingredient::Column::Name, "name")
        .column_as(ingredient::Column::MeasurementUnit, "unit")
        .column_as(
            Expr::col((RecipeIngredient, recipe_ingredient::Column::Amount)).sum(),
            "total_amount",
        )
        .join(JoinType::InnerJoin, recipe_ingredient::Relation::Ingredient.def())
        .filter(recipe_ingredient::Column::RecipeId.in_subquery(cart_recipes))
        .group_by(ingredient::Column::Name)
        .group_by(ingredient::Column::MeasurementUnit)
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::MeasurementUnit)
        .into_model::<ShoppingListItem>()
        .all(db)
        .await?;

    debug!(user_id, lines = items.len(), "Generated shopping list");
    Ok(items)
}

/// Renders the list as the downloadable text document.
///
/// ```text
/// Shopping list for anna
///
/// 1) egg 5 pcs
/// 2) flour 250 g
/// ```
#[must_use]
pub fn render_shopping_list(owner: &str, items: &[ShoppingListItem]) -> String {
    let title = format!("Shopping list for {owner}");
    if items.is_empty() {
        return format!("{title}\n\nYour shopping cart is empty.\n");
    }

    let lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            format!("{}) {} {} {}", index + 1, item.name, item.total_amount, item.unit)
        })
        .collect();
    format!("{title}\n\n{}\n", lines.join("\n"))
}

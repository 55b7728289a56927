//! Ingredient-amount and cooking-time validation.
//!
//! Checks submitted recipe ingredient lists against the catalog and the configured
//! [`RecipeRules`] before anything is written. Range and duplicate checks are pure;
//! the catalog check issues a single query for all submitted ids.

use crate::{
    config::settings::RecipeRules,
    entities::{Ingredient, ingredient},
    errors::{Error, Result},
};
use sea_orm::{QuerySelect, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One submitted ingredient line: catalog id and amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmount {
    /// Catalog ingredient id
    pub id: i64,
    /// Quantity in the ingredient's unit
    pub amount: i32,
}

/// Checks a single ingredient amount against the configured bounds.
///
/// # Errors
/// Returns `Error::AmountOutOfRange` if `amount` is outside `[min_amount, max_amount]`.
pub fn check_amount(rules: &RecipeRules, amount: i32) -> Result<()> {
    if amount < rules.min_amount || amount > rules.max_amount {
        return Err(Error::AmountOutOfRange {
            amount,
            min: rules.min_amount,
            max: rules.max_amount,
        });
    }
    Ok(())
}

/// Checks a cooking time (minutes) against the configured bounds.
///
/// # Errors
/// Returns `Error::CookingTimeOutOfRange` if outside `[min_cooking_time, max_cooking_time]`.
pub fn check_cooking_time(rules: &RecipeRules, minutes: i32) -> Result<()> {
    if minutes < rules.min_cooking_time || minutes > rules.max_cooking_time {
        return Err(Error::CookingTimeOutOfRange {
            minutes,
            min: rules.min_cooking_time,
            max: rules.max_cooking_time,
        });
    }
    Ok(())
}

/// Runs the checks that need no database: emptiness, amount bounds, duplicates.
///
/// Items are checked in submission order, so the first offending line decides
/// the error.
///
/// # Errors
/// - `Error::MissingIngredients` if `items` is empty
/// - `Error::AmountOutOfRange` for the first amount outside the bounds
/// - `Error::DuplicateIngredient` for the first id seen twice
pub fn check_ingredient_lines(rules: &RecipeRules, items: &[IngredientAmount]) -> Result<()> {
    if items.is_empty() {
        return Err(Error::MissingIngredients);
    }

    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        check_amount(rules, item.amount)?;
        if !seen.insert(item.id) {
            return Err(Error::DuplicateIngredient { id: item.id });
        }
    }
    Ok(())
}

/// Validates a submitted ingredient list before recipe create/update.
///
/// On success the list is returned unchanged for persistence.
///
/// # Errors
/// Everything [`check_ingredient_lines`] reports, then `Error::UnknownIngredient`
/// for the first id that does not resolve in the catalog.
pub async fn validate_ingredients<C>(
    db: &C,
    rules: &RecipeRules,
    items: Vec<IngredientAmount>,
) -> Result<Vec<IngredientAmount>>
where
    C: ConnectionTrait,
{
    check_ingredient_lines(rules, &items)?;

    let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
    let known: HashSet<i64> = Ingredient::find()
        .select_only()
        .column(ingredient::Column::Id)
        .filter(ingredient::Column::Id.is_in(ids))
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    if let Some(unknown) = items.iter().find(|item| !known.contains(&item.id)) {
        return Err(Error::UnknownIngredient { id: unknown.id });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    const fn line(id: i64, amount: i32) -> IngredientAmount {
        IngredientAmount { id, amount }
    }

    #[test]
    fn test_check_amount_bounds_inclusive() {
        let rules = RecipeRules::default();
        assert!(check_amount(&rules, 1).is_ok());
        assert!(check_amount(&rules, 1000).is_ok());
        assert!(matches!(
            check_amount(&rules, 0),
            Err(Error::AmountOutOfRange { amount: 0, min: 1, max: 1000 })
        ));
        assert!(matches!(
            check_amount(&rules, 1001),
            Err(Error::AmountOutOfRange { amount: 1001, .. })
        ));
    }

    #[test]
    fn test_check_cooking_time_bounds() {
        let rules = RecipeRules {
            min_cooking_time: 5,
            max_cooking_time: 120,
            ..RecipeRules::default()
        };
        assert!(check_cooking_time(&rules, 5).is_ok());
        assert!(matches!(
            check_cooking_time(&rules, 4),
            Err(Error::CookingTimeOutOfRange { minutes: 4, min: 5, max: 120 })
        ));
        assert!(check_cooking_time(&rules, 121).is_err());
    }

    #[test]
    fn test_check_lines_reports_first_offender() {
        let rules = RecipeRules::default();
        let result = check_ingredient_lines(&rules, &[line(1, 2), line(1, 0)]);
        // Second line fails on amount before the duplicate check sees it
        assert!(matches!(result, Err(Error::AmountOutOfRange { amount: 0, .. })));

        let result = check_ingredient_lines(&rules, &[line(1, 2), line(2, 3), line(1, 4)]);
        assert!(matches!(result, Err(Error::DuplicateIngredient { id: 1 })));
    }

    #[tokio::test]
    async fn test_validate_empty_list_without_query() -> Result<()> {
        // Mock has no prepared results: any query would fail the test
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = validate_ingredients(&db, &RecipeRules::default(), Vec::new()).await;
        assert!(matches!(result, Err(Error::MissingIngredients)));
        Ok(())
    }

    #[tokio::test]
    async fn test_validate_amount_below_min_without_query() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let rules = RecipeRules {
            min_amount: 1,
            ..RecipeRules::default()
        };
        let result = validate_ingredients(&db, &rules, vec![line(1, 0)]).await;
        assert!(matches!(
            result,
            Err(Error::AmountOutOfRange { amount: 0, min: 1, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_validate_unknown_ingredient() -> Result<()> {
        let db = setup_test_db().await?;
        let egg = create_test_ingredient(&db, "egg", "pcs").await?;

        let result =
            validate_ingredients(&db, &RecipeRules::default(), vec![line(egg.id, 2), line(999, 1)])
                .await;
        assert!(matches!(result, Err(Error::UnknownIngredient { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_validate_returns_list_unchanged() -> Result<()> {
        let db = setup_test_db().await?;
        let egg = create_test_ingredient(&db, "egg", "pcs").await?;
        let flour = create_test_ingredient(&db, "flour", "g").await?;

        let submitted = vec![line(flour.id, 250), line(egg.id, 3)];
        let validated =
            validate_ingredients(&db, &RecipeRules::default(), submitted.clone()).await?;
        assert_eq!(validated, submitted);
        Ok(())
    }
}

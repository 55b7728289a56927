//! Recipe business logic - Create, edit, delete and read recipes.
//!
//! A recipe is written together with its ingredient lines and tag links in a
//! single transaction, so readers never see a recipe without its lines. Only the
//! author may edit or delete a recipe.

use crate::{
    config::settings::RecipeRules,
    core::{
        relations,
        user::get_user_by_id,
        validation::{IngredientAmount, check_cooking_time, validate_ingredients},
    },
    entities::{
        CartEntry, Favorite, Recipe, RecipeIngredient, RecipeTag, Tag, User, cart_entry,
        favorite, ingredient, recipe, recipe_ingredient, recipe_tag, tag, user,
    },
    errors::{Error, Result},
};
use sea_orm::{
    ActiveModelTrait, FromQueryResult, JoinType, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Everything needed to publish a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipe {
    /// Title
    pub name: String,
    /// Stored picture reference, opaque to the core
    pub image: String,
    /// Preparation instructions
    pub text: String,
    /// Cooking time in minutes
    pub cooking_time: i32,
    /// Ingredient lines
    pub ingredients: Vec<IngredientAmount>,
    /// Tag ids; repeated ids collapse
    pub tags: Vec<i64>,
}

/// Partial edit of a recipe. `None` leaves the field as is.
///
/// Supplied `ingredients` replace every existing line and supplied `tags`
/// replace the whole tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeUpdate {
    /// New title
    pub name: Option<String>,
    /// New picture reference
    pub image: Option<String>,
    /// New instructions
    pub text: Option<String>,
    /// New cooking time in minutes
    pub cooking_time: Option<i32>,
    /// Replacement ingredient lines
    pub ingredients: Option<Vec<IngredientAmount>>,
    /// Replacement tag ids
    pub tags: Option<Vec<i64>>,
}

/// Short form of a recipe returned by ledger operations and author previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeSummary {
    /// Recipe id
    pub id: i64,
    /// Title
    pub name: String,
    /// Picture reference
    pub image: String,
    /// Cooking time in minutes
    pub cooking_time: i32,
}

impl From<&recipe::Model> for RecipeSummary {
    fn from(recipe: &recipe::Model) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// One ingredient line joined with its catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct IngredientLine {
    /// Catalog ingredient id
    pub id: i64,
    /// Ingredient name
    pub name: String,
    /// Measurement unit
    pub measurement_unit: String,
    /// Quantity in that unit
    pub amount: i32,
}

/// A recipe with everything a reader sees on its page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeDetail {
    /// The recipe row
    pub recipe: recipe::Model,
    /// Its author
    pub author: user::Model,
    /// Attached tags, by name
    pub tags: Vec<tag::Model>,
    /// Ingredient lines in the order they were submitted
    pub ingredients: Vec<IngredientLine>,
    /// Whether the viewer favorited it (false for anonymous viewers)
    pub is_favorited: bool,
    /// Whether it is in the viewer's cart (false for anonymous viewers)
    pub is_in_shopping_cart: bool,
}

/// Orders recipes newest first; id breaks ties between equal timestamps.
pub(crate) fn newest_first(query: Select<Recipe>) -> Select<Recipe> {
    query
        .order_by_desc(recipe::Column::CreatedAt)
        .order_by_desc(recipe::Column::Id)
}

/// Retrieves a recipe by id.
pub async fn get_recipe<C>(db: &C, recipe_id: i64) -> Result<Option<recipe::Model>>
where
    C: ConnectionTrait,
{
    Recipe::find_by_id(recipe_id).one(db).await.map_err(Into::into)
}

/// Retrieves a recipe by id or reports `Error::RecipeNotFound`.
pub(crate) async fn find_recipe<C>(db: &C, recipe_id: i64) -> Result<recipe::Model>
where
    C: ConnectionTrait,
{
    get_recipe(db, recipe_id)
        .await?
        .ok_or(Error::RecipeNotFound { id: recipe_id })
}

/// Lists all recipes, newest first.
pub async fn list_recipes(db: &DatabaseConnection) -> Result<Vec<recipe::Model>> {
    newest_first(Recipe::find())
        .all(db)
        .await
        .map_err(Into::into)
}

fn check_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidField {
            field: "name",
            message: "Recipe name cannot be empty".to_string(),
        });
    }
    Ok(name.to_string())
}

/// Collapses repeated tag ids and checks that every tag exists.
async fn resolve_tags<C>(db: &C, tag_ids: &[i64]) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    let mut seen = HashSet::with_capacity(tag_ids.len());
    let unique: Vec<i64> = tag_ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    if unique.is_empty() {
        return Ok(unique);
    }

    let known: HashSet<i64> = Tag::find()
        .select_only()
        .column(tag::Column::Id)
        .filter(tag::Column::Id.is_in(unique.clone()))
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .collect();
    if let Some(missing) = unique.iter().find(|id| !known.contains(id)) {
        return Err(Error::UnknownTag { id: *missing });
    }
    Ok(unique)
}

async fn write_ingredient_lines<C>(db: &C, recipe_id: i64, items: &[IngredientAmount]) -> Result<()>
where
    C: ConnectionTrait,
{
    if items.is_empty() {
        return Ok(());
    }
    let lines = items.iter().map(|item| recipe_ingredient::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(item.id),
        amount: Set(item.amount),
        ..Default::default()
    });
    RecipeIngredient::insert_many(lines)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

async fn write_tags<C>(db: &C, recipe_id: i64, tag_ids: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    if tag_ids.is_empty() {
        return Ok(());
    }
    let links = tag_ids.iter().map(|tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(*tag_id),
    });
    RecipeTag::insert_many(links).exec_without_returning(db).await?;
    Ok(())
}

/// Publishes a recipe with its ingredient lines and tags.
///
/// # Errors
/// - `Error::InvalidField` for a blank name
/// - `Error::CookingTimeOutOfRange` if the cooking time is outside the rules
/// - `Error::UserNotFound` if the author does not exist
/// - any ingredient validation error (see [`validate_ingredients`])
/// - `Error::UnknownTag` for the first tag id that does not exist
#[instrument(skip(db, rules, new_recipe), fields(name = %new_recipe.name))]
pub async fn create_recipe(
    db: &DatabaseConnection,
    rules: &RecipeRules,
    author_id: i64,
    new_recipe: NewRecipe,
) -> Result<recipe::Model> {
    let name = check_name(&new_recipe.name)?;
    check_cooking_time(rules, new_recipe.cooking_time)?;
    get_user_by_id(db, author_id)
        .await?
        .ok_or(Error::UserNotFound { id: author_id })?;
    let ingredients = validate_ingredients(db, rules, new_recipe.ingredients).await?;
    let tags = resolve_tags(db, &new_recipe.tags).await?;

    let txn = db.begin().await?;
    let recipe = recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(name),
        image: Set(new_recipe.image),
        text: Set(new_recipe.text),
        cooking_time: Set(new_recipe.cooking_time),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    write_ingredient_lines(&txn, recipe.id, &ingredients).await?;
    write_tags(&txn, recipe.id, &tags).await?;
    txn.commit().await?;

    info!(
        recipe_id = recipe.id,
        author_id,
        ingredients = ingredients.len(),
        tags = tags.len(),
        "Created recipe"
    );
    Ok(recipe)
}

async fn find_own_recipe<C>(db: &C, editor_id: i64, recipe_id: i64) -> Result<recipe::Model>
where
    C: ConnectionTrait,
{
    let recipe = find_recipe(db, recipe_id).await?;
    if recipe.author_id != editor_id {
        return Err(Error::NotRecipeAuthor {
            recipe_id,
            user_id: editor_id,
        });
    }
    Ok(recipe)
}

/// Edits a recipe. Only its author may do so.
///
/// Every supplied field is validated before anything is written; the edit is
/// then applied in one transaction.
///
/// # Errors
/// - `Error::RecipeNotFound` if the recipe does not exist
/// - `Error::NotRecipeAuthor` if `editor_id` is not the author
/// - the same field errors as [`create_recipe`] for supplied fields
#[instrument(skip(db, rules, update))]
pub async fn update_recipe(
    db: &DatabaseConnection,
    rules: &RecipeRules,
    editor_id: i64,
    recipe_id: i64,
    update: RecipeUpdate,
) -> Result<recipe::Model> {
    let recipe = find_own_recipe(db, editor_id, recipe_id).await?;

    let name = update.name.as_deref().map(check_name).transpose()?;
    if let Some(minutes) = update.cooking_time {
        check_cooking_time(rules, minutes)?;
    }
    let ingredients = match update.ingredients {
        Some(items) => Some(validate_ingredients(db, rules, items).await?),
        None => None,
    };
    let tags = match &update.tags {
        Some(tag_ids) => Some(resolve_tags(db, tag_ids).await?),
        None => None,
    };

    let mut active: recipe::ActiveModel = recipe.clone().into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(image) = update.image {
        active.image = Set(image);
    }
    if let Some(text) = update.text {
        active.text = Set(text);
    }
    if let Some(minutes) = update.cooking_time {
        active.cooking_time = Set(minutes);
    }

    let txn = db.begin().await?;
    let updated = if active.is_changed() {
        active.update(&txn).await?
    } else {
        recipe
    };
    if let Some(items) = &ingredients {
        RecipeIngredient::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        write_ingredient_lines(&txn, recipe_id, items).await?;
    }
    if let Some(tag_ids) = &tags {
        RecipeTag::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        write_tags(&txn, recipe_id, tag_ids).await?;
    }
    txn.commit().await?;

    info!(
        recipe_id,
        replaced_ingredients = ingredients.is_some(),
        replaced_tags = tags.is_some(),
        "Updated recipe"
    );
    Ok(updated)
}

/// Deletes a recipe together with its lines, tag links, favorites and cart entries.
///
/// # Errors
/// - `Error::RecipeNotFound` if the recipe does not exist
/// - `Error::NotRecipeAuthor` if `editor_id` is not the author
#[instrument(skip(db))]
pub async fn delete_recipe(db: &DatabaseConnection, editor_id: i64, recipe_id: i64) -> Result<()> {
    let recipe = find_own_recipe(db, editor_id, recipe_id).await?;

    let txn = db.begin().await?;
    Favorite::delete_many()
        .filter(favorite::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    CartEntry::delete_many()
        .filter(cart_entry::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    RecipeIngredient::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    RecipeTag::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    recipe.delete(&txn).await?;
    txn.commit().await?;

    info!(recipe_id, "Deleted recipe");
    Ok(())
}

/// Loads a recipe's ingredient lines joined with the catalog, in submission order.
pub async fn get_ingredient_lines<C>(db: &C, recipe_id: i64) -> Result<Vec<IngredientLine>>
where
    C: ConnectionTrait,
{
    RecipeIngredient::find()
        .select_only()
        .column_as(ingredient::Column::Id, "id")
        .column_as(ingredient::Column::Name, "name")
        .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
        .column_as(recipe_ingredient::Column::Amount, "amount")
        .join(JoinType::InnerJoin, recipe_ingredient::Relation::Ingredient.def())
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .order_by_asc(recipe_ingredient::Column::Id)
        .into_model::<IngredientLine>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads a recipe with its author, tags, ingredient lines and the viewer's flags.
///
/// # Errors
/// Returns `Error::RecipeNotFound` if the recipe does not exist.
pub async fn get_recipe_detail(
    db: &DatabaseConnection,
    recipe_id: i64,
    viewer: Option<i64>,
) -> Result<RecipeDetail> {
    let recipe = find_recipe(db, recipe_id).await?;
    let author = User::find_by_id(recipe.author_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound {
            id: recipe.author_id,
        })?;
    let tags = recipe
        .find_related(Tag)
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await?;
    let ingredients = get_ingredient_lines(db, recipe_id).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(user_id) => (
            relations::is_favorited(db, user_id, recipe_id).await?,
            relations::is_in_shopping_cart(db, user_id, recipe_id).await?,
        ),
        None => (false, false),
    };
    debug!(recipe_id, ?viewer, "Loaded recipe detail");

    Ok(RecipeDetail {
        recipe,
        author,
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
    })
}

//! Relationship ledgers - Favorites, shopping cart and subscriptions.
//!
//! Each ledger records (user, target) pairs with at most one row per pair. Adding
//! a pair that is already present or removing one that is absent is reported as
//! an error rather than silently ignored, so callers can tell the user what
//! happened. The unique indexes created in [`crate::config::database`] back the
//! existence checks when two writes race.

use crate::{
    config::settings::RecipeRules,
    core::recipe::{RecipeSummary, find_recipe, newest_first},
    entities::{
        CartEntry, Favorite, Follow, Recipe, User, cart_entry, favorite, follow, recipe, user,
    },
    errors::{Error, Result, is_unique_violation},
};
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, instrument};

/// The three relationship tables a user can add to and remove from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ledger {
    /// Recipes a user marked as favorite
    Favorites,
    /// Recipes a user plans to cook; feeds the shopping list
    ShoppingCart,
    /// Authors a user follows
    Subscriptions,
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Favorites => "favorites",
            Self::ShoppingCart => "shopping cart",
            Self::Subscriptions => "subscriptions",
        };
        f.write_str(name)
    }
}

/// An author as seen by a subscriber, with a preview of their recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
    /// Author's user id
    pub id: i64,
    /// Login name
    pub username: String,
    /// Email address
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Whether the viewing user follows this author
    pub is_subscribed: bool,
    /// Newest recipes first, truncated to the requested limit
    pub recipes: Vec<RecipeSummary>,
    /// Total number of recipes by the author, regardless of the limit
    pub recipes_count: u64,
}

fn ledger_insert_error(err: DbErr, ledger: Ledger, target_id: i64) -> Error {
    if is_unique_violation(&err) {
        Error::AlreadyExists { ledger, target_id }
    } else {
        err.into()
    }
}

/// Returns true if `recipe_id` is in the user's favorites.
pub async fn is_favorited<C>(db: &C, user_id: i64, recipe_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = Favorite::find()
        .filter(favorite::Column::UserId.eq(user_id))
        .filter(favorite::Column::RecipeId.eq(recipe_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Returns true if `recipe_id` is in the user's shopping cart.
pub async fn is_in_shopping_cart<C>(db: &C, user_id: i64, recipe_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = CartEntry::find()
        .filter(cart_entry::Column::UserId.eq(user_id))
        .filter(cart_entry::Column::RecipeId.eq(recipe_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Returns true if the user follows `author_id`.
pub async fn is_subscribed<C>(db: &C, user_id: i64, author_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = Follow::find()
        .filter(follow::Column::UserId.eq(user_id))
        .filter(follow::Column::AuthorId.eq(author_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Adds a recipe to the user's favorites.
///
/// # Errors
/// - `Error::RecipeNotFound` if the recipe does not exist
/// - `Error::InvalidOperation` if the user authored the recipe and
///   `rules.allow_self_favorite` is off
/// - `Error::AlreadyExists` if the recipe is already a favorite
#[instrument(skip(db, rules))]
pub async fn add_favorite(
    db: &DatabaseConnection,
    rules: &RecipeRules,
    user_id: i64,
    recipe_id: i64,
) -> Result<RecipeSummary> {
    let recipe = find_recipe(db, recipe_id).await?;
    if !rules.allow_self_favorite && recipe.author_id == user_id {
        return Err(Error::InvalidOperation {
            message: "You cannot favorite your own recipe".to_string(),
        });
    }
    if is_favorited(db, user_id, recipe_id).await? {
        return Err(Error::AlreadyExists {
            ledger: Ledger::Favorites,
            target_id: recipe_id,
        });
    }

    favorite::ActiveModel {
        user_id: Set(user_id),
        recipe_id: Set(recipe_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|err| ledger_insert_error(err, Ledger::Favorites, recipe_id))?;

    info!(user_id, recipe_id, "Added recipe to favorites");
    Ok(RecipeSummary::from(&recipe))
}

/// Removes a recipe from the user's favorites.
///
/// # Errors
/// - `Error::RecipeNotFound` if the recipe does not exist
/// - `Error::NotFound` if the recipe is not a favorite
#[instrument(skip(db))]
pub async fn remove_favorite(db: &DatabaseConnection, user_id: i64, recipe_id: i64) -> Result<()> {
    find_recipe(db, recipe_id).await?;
    let result = Favorite::delete_many()
        .filter(favorite::Column::UserId.eq(user_id))
        .filter(favorite::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            ledger: Ledger::Favorites,
            target_id: recipe_id,
        });
    }

    info!(user_id, recipe_id, "Removed recipe from favorites");
    Ok(())
}

/// Adds a recipe to the user's shopping cart.
///
/// # Errors
/// - `Error::RecipeNotFound` if the recipe does not exist
/// - `Error::AlreadyExists` if the recipe is already in the cart
#[instrument(skip(db))]
pub async fn add_to_cart(
    db: &DatabaseConnection,
    user_id: i64,
    recipe_id: i64,
) -> Result<RecipeSummary> {
    let recipe = find_recipe(db, recipe_id).await?;
    if is_in_shopping_cart(db, user_id, recipe_id).await? {
        return Err(Error::AlreadyExists {
            ledger: Ledger::ShoppingCart,
            target_id: recipe_id,
        });
    }

    cart_entry::ActiveModel {
        user_id: Set(user_id),
        recipe_id: Set(recipe_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|err| ledger_insert_error(err, Ledger::ShoppingCart, recipe_id))?;

    info!(user_id, recipe_id, "Added recipe to shopping cart");
    Ok(RecipeSummary::from(&recipe))
}

/// Removes a recipe from the user's shopping cart.
///
/// # Errors
/// - `Error::RecipeNotFound` if the recipe does not exist
/// - `Error::NotFound` if the recipe is not in the cart
#[instrument(skip(db))]
pub async fn remove_from_cart(db: &DatabaseConnection, user_id: i64, recipe_id: i64) -> Result<()> {
    find_recipe(db, recipe_id).await?;
    let result = CartEntry::delete_many()
        .filter(cart_entry::Column::UserId.eq(user_id))
        .filter(cart_entry::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            ledger: Ledger::ShoppingCart,
            target_id: recipe_id,
        });
    }

    info!(user_id, recipe_id, "Removed recipe from shopping cart");
    Ok(())
}

fn reject_self_follow(user_id: i64, author_id: i64) -> Result<()> {
    if user_id == author_id {
        return Err(Error::InvalidOperation {
            message: "You cannot follow yourself".to_string(),
        });
    }
    Ok(())
}

async fn find_author<C>(db: &C, author_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(author_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: author_id })
}

async fn author_summary<C>(
    db: &C,
    author: user::Model,
    is_subscribed: bool,
    recipes_limit: Option<u64>,
) -> Result<AuthorSummary>
where
    C: ConnectionTrait,
{
    let by_author = Recipe::find().filter(recipe::Column::AuthorId.eq(author.id));
    let recipes_count = by_author.clone().count(db).await?;
    let recipes = newest_first(by_author)
        .limit(recipes_limit)
        .all(db)
        .await?
        .iter()
        .map(RecipeSummary::from)
        .collect();

    Ok(AuthorSummary {
        id: author.id,
        username: author.username,
        email: author.email,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed,
        recipes,
        recipes_count,
    })
}

/// Subscribes the user to an author.
///
/// Returns the author's summary with up to `recipes_limit` of their newest
/// recipes (all of them when `None`).
///
/// # Errors
/// - `Error::InvalidOperation` if `user_id == author_id`
/// - `Error::UserNotFound` if the author does not exist
/// - `Error::AlreadyExists` if the subscription is already present
#[instrument(skip(db))]
pub async fn follow(
    db: &DatabaseConnection,
    user_id: i64,
    author_id: i64,
    recipes_limit: Option<u64>,
) -> Result<AuthorSummary> {
    reject_self_follow(user_id, author_id)?;
    let author = find_author(db, author_id).await?;
    if is_subscribed(db, user_id, author_id).await? {
        return Err(Error::AlreadyExists {
            ledger: Ledger::Subscriptions,
            target_id: author_id,
        });
    }

    follow::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|err| ledger_insert_error(err, Ledger::Subscriptions, author_id))?;

    info!(user_id, author_id, "Followed author");
    author_summary(db, author, true, recipes_limit).await
}

/// Ends the user's subscription to an author.
///
/// # Errors
/// - `Error::InvalidOperation` if `user_id == author_id`
/// - `Error::UserNotFound` if the author does not exist
/// - `Error::NotFound` if the user does not follow the author
#[instrument(skip(db))]
pub async fn unfollow(db: &DatabaseConnection, user_id: i64, author_id: i64) -> Result<()> {
    reject_self_follow(user_id, author_id)?;
    find_author(db, author_id).await?;
    let result = Follow::delete_many()
        .filter(follow::Column::UserId.eq(user_id))
        .filter(follow::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            ledger: Ledger::Subscriptions,
            target_id: author_id,
        });
    }

    info!(user_id, author_id, "Unfollowed author");
    Ok(())
}

/// Lists the authors the user follows, oldest subscription first.
pub async fn list_subscriptions(
    db: &DatabaseConnection,
    user_id: i64,
    recipes_limit: Option<u64>,
) -> Result<Vec<AuthorSummary>> {
    let rows = Follow::find()
        .filter(follow::Column::UserId.eq(user_id))
        .order_by_asc(follow::Column::Id)
        .find_also_related(User)
        .all(db)
        .await?;
    debug!(user_id, count = rows.len(), "Loaded subscriptions");

    let mut summaries = Vec::with_capacity(rows.len());
    for (_, author) in rows {
        if let Some(author) = author {
            summaries.push(author_summary(db, author, true, recipes_limit).await?);
        }
    }
    Ok(summaries)
}

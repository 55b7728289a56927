//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod cart_entry;
pub mod favorite;
pub mod follow;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod tag;
pub mod user;

// Re-export specific types to avoid conflicts
pub use cart_entry::{Column as CartEntryColumn, Entity as CartEntry, Model as CartEntryModel};
pub use favorite::{Column as FavoriteColumn, Entity as Favorite, Model as FavoriteModel};
pub use follow::{Column as FollowColumn, Entity as Follow, Model as FollowModel};
pub use ingredient::{
    Column as IngredientColumn, Entity as Ingredient, Model as IngredientModel,
};
pub use recipe::{Column as RecipeColumn, Entity as Recipe, Model as RecipeModel};
pub use recipe_ingredient::{
    Column as RecipeIngredientColumn, Entity as RecipeIngredient, Model as RecipeIngredientModel,
};
pub use recipe_tag::{Column as RecipeTagColumn, Entity as RecipeTag, Model as RecipeTagModel};
pub use tag::{Column as TagColumn, Entity as Tag, Model as TagModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};

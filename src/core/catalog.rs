//! Catalog business logic - Ingredients and tags.
//!
//! Ingredients are reference data seeded once from a JSON file and never edited
//! through the core. Tags are created from configuration (or by an administrator)
//! and looked up by slug when filtering recipes.

use crate::{
    config::settings::TagConfig,
    entities::{Ingredient, Tag, ingredient, tag},
    errors::{Error, Result, is_unique_violation},
};
use sea_orm::{
    PaginatorTrait, QueryOrder, Set,
    prelude::*,
    sea_query::{Expr, LikeExpr},
};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Rows per insert statement when seeding; keeps well under `SQLite`'s variable limit.
const SEED_CHUNK_SIZE: usize = 500;

/// One entry of the ingredient seed file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IngredientSeed {
    /// Ingredient name
    pub name: String,
    /// Measurement unit
    pub measurement_unit: String,
}

/// Parses the ingredient seed JSON (`[{"name": .., "measurement_unit": ..}, ..]`).
///
/// # Errors
/// Returns `Error::Config` if the JSON is malformed.
pub fn parse_ingredient_seed(json: &str) -> Result<Vec<IngredientSeed>> {
    serde_json::from_str(json).map_err(|e| Error::Config {
        message: format!("Failed to parse ingredient seed: {e}"),
    })
}

/// Loads the ingredient catalog from JSON text unless the catalog already has rows.
///
/// Returns the number of ingredients inserted (0 when skipped).
///
/// # Errors
/// Returns an error if the JSON is malformed or an insert fails.
#[instrument(skip(db, json))]
pub async fn seed_ingredients(db: &DatabaseConnection, json: &str) -> Result<usize> {
    let existing = Ingredient::find().count(db).await?;
    if existing > 0 {
        info!(existing, "Ingredient catalog already populated, skipping seed");
        return Ok(0);
    }

    let seeds = parse_ingredient_seed(json)?;
    let total = seeds.len();
    for chunk in seeds.chunks(SEED_CHUNK_SIZE) {
        let models = chunk.iter().map(|seed| {
            let name = seed.name.trim();
            ingredient::ActiveModel {
                name: Set(name.to_string()),
                measurement_unit: Set(seed.measurement_unit.trim().to_string()),
                search_name: Set(name.to_lowercase()),
                ..Default::default()
            }
        });
        Ingredient::insert_many(models).exec(db).await?;
    }

    info!(total, "Ingredient catalog seeded");
    Ok(total)
}

/// Reads the seed file at `path` and passes it to [`seed_ingredients`].
///
/// # Errors
/// Returns `Error::Io` if the file cannot be read, otherwise as [`seed_ingredients`].
pub async fn seed_ingredients_from_file<P: AsRef<Path>>(
    db: &DatabaseConnection,
    path: P,
) -> Result<usize> {
    let path_ref = path.as_ref();
    debug!("Reading ingredient seed from {}", path_ref.display());
    let json = std::fs::read_to_string(path_ref)?;
    seed_ingredients(db, &json).await
}

/// Retrieves all ingredients ordered by name.
pub async fn list_ingredients(db: &DatabaseConnection) -> Result<Vec<ingredient::Model>> {
    Ingredient::find()
        .order_by_asc(ingredient::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Escapes the `LIKE` metacharacters in `value` using `\\` as the escape character.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Finds ingredients whose name starts with `prefix`, ignoring case.
///
/// `%` and `_` in the prefix match themselves. An empty prefix returns the
/// whole catalog.
pub async fn search_ingredients(
    db: &DatabaseConnection,
    prefix: &str,
) -> Result<Vec<ingredient::Model>> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return list_ingredients(db).await;
    }
    let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
    Ingredient::find()
        .filter(
            Expr::col((Ingredient, ingredient::Column::SearchName))
                .like(LikeExpr::new(pattern).escape('\\')),
        )
        .order_by_asc(ingredient::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a catalog ingredient by id.
pub async fn get_ingredient_by_id(
    db: &DatabaseConnection,
    ingredient_id: i64,
) -> Result<Option<ingredient::Model>> {
    Ingredient::find_by_id(ingredient_id)
        .one(db)
        .await
        .map_err(Into::into)
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn is_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Creates a tag after validating its color and slug.
///
/// # Errors
/// - `Error::InvalidField` for a blank name, a color not in `#RRGGBB` form, or a
///   slug with characters outside `[-A-Za-z0-9_]`
/// - `Error::Duplicate` if the name or slug is taken
pub async fn create_tag(
    db: &DatabaseConnection,
    name: String,
    color: String,
    slug: String,
) -> Result<tag::Model> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidField {
            field: "name",
            message: "Tag name cannot be empty".to_string(),
        });
    }
    if !is_hex_color(&color) {
        return Err(Error::InvalidField {
            field: "color",
            message: format!("'{color}' is not a #RRGGBB color"),
        });
    }
    if !is_slug(&slug) {
        return Err(Error::InvalidField {
            field: "slug",
            message: format!("'{slug}' may only contain letters, digits, '-' and '_'"),
        });
    }

    if get_tag_by_slug(db, &slug).await?.is_some() {
        return Err(Error::Duplicate { field: "slug", value: slug });
    }
    let name_taken = Tag::find()
        .filter(tag::Column::Name.eq(name.as_str()))
        .one(db)
        .await?
        .is_some();
    if name_taken {
        return Err(Error::Duplicate { field: "name", value: name });
    }

    let model = tag::ActiveModel {
        name: Set(name),
        color: Set(color),
        slug: Set(slug.clone()),
        ..Default::default()
    };
    model.insert(db).await.map_err(|err| {
        if is_unique_violation(&err) {
            Error::Duplicate { field: "slug", value: slug }
        } else {
            err.into()
        }
    })
}

/// Creates every configured tag whose slug is not present yet.
///
/// Returns the number of tags created.
///
/// # Errors
/// Returns an error if a configured tag is invalid or clashes by name with an
/// existing tag of a different slug.
#[instrument(skip(db, tags))]
pub async fn seed_tags(db: &DatabaseConnection, tags: &[TagConfig]) -> Result<usize> {
    let mut created = 0;
    for config in tags {
        if get_tag_by_slug(db, &config.slug).await?.is_some() {
            debug!(slug = %config.slug, "Tag already present");
            continue;
        }
        create_tag(
            db,
            config.name.clone(),
            config.color.clone(),
            config.slug.clone(),
        )
        .await?;
        created += 1;
    }
    info!(created, "Tags seeded");
    Ok(created)
}

/// Retrieves all tags ordered by name.
pub async fn list_tags(db: &DatabaseConnection) -> Result<Vec<tag::Model>> {
    Tag::find()
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a tag by its slug.
pub async fn get_tag_by_slug(db: &DatabaseConnection, slug: &str) -> Result<Option<tag::Model>> {
    Tag::find()
        .filter(tag::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    const SEED: &str = r#"[
        {"name": "egg", "measurement_unit": "pcs"},
        {"name": "wheat flour", "measurement_unit": "g"},
        {"name": "whole milk", "measurement_unit": "ml"},
        {"name": "sugar", "measurement_unit": "g"}
    ]"#;

    #[test]
    fn test_parse_ingredient_seed() {
        let seeds = parse_ingredient_seed(SEED).unwrap();
        assert_eq!(seeds.len(), 4);
        assert_eq!(
            seeds[0],
            IngredientSeed {
                name: "egg".to_string(),
                measurement_unit: "pcs".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_ingredient_seed_malformed() {
        let result = parse_ingredient_seed(r#"[{"name": "egg"}]"#);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_color_and_slug_checks() {
        assert!(is_hex_color("#E26C2D"));
        assert!(is_hex_color("#000000"));
        assert!(!is_hex_color("E26C2D"));
        assert!(!is_hex_color("#E26C2"));
        assert!(!is_hex_color("#GGGGGG"));

        assert!(is_slug("quick-dinner_2"));
        assert!(!is_slug(""));
        assert!(!is_slug("with space"));
    }

    #[tokio::test]
    async fn test_seed_ingredients_only_once() -> Result<()> {
        let db = setup_test_db().await?;

        let inserted = seed_ingredients(&db, SEED).await?;
        assert_eq!(inserted, 4);

        let second = seed_ingredients(&db, SEED).await?;
        assert_eq!(second, 0);
        assert_eq!(list_ingredients(&db).await?.len(), 4);

        Ok(())
    }

    #[tokio::test]
    async fn test_search_ingredients_by_prefix() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        seed_ingredients(&db, SEED).await?;

        let found = search_ingredients(&db, "wh").await?;
        let names: Vec<&str> = found.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["wheat flour", "whole milk"]);

        // Prefix, not substring
        assert!(search_ingredients(&db, "flour").await?.is_empty());

        // Case-insensitive
        assert_eq!(search_ingredients(&db, "EGG").await?.len(), 1);

        // Empty prefix lists everything
        assert_eq!(search_ingredients(&db, "").await?.len(), 4);

        Ok(())
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("egg"), "egg");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() -> Result<()> {
        let db = setup_test_db().await?;
        seed_ingredients(&db, SEED).await?;
        create_test_ingredient(&db, "100% juice", "ml").await?;

        assert!(search_ingredients(&db, "%").await?.is_empty());
        assert!(search_ingredients(&db, "_gg").await?.is_empty());

        let found = search_ingredients(&db, "100%").await?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "100% juice");

        Ok(())
    }

    #[tokio::test]
    async fn test_search_ignores_case_beyond_ascii() -> Result<()> {
        let db = setup_test_db().await?;
        seed_ingredients(
            &db,
            r#"[
                {"name": "Яйцо куриное", "measurement_unit": "шт"},
                {"name": "Ёжевика", "measurement_unit": "г"},
                {"name": "egg", "measurement_unit": "pcs"}
            ]"#,
        )
        .await?;

        let found = search_ingredients(&db, "яй").await?;
        let names: Vec<&str> = found.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Яйцо куриное"]);

        assert_eq!(search_ingredients(&db, "ЁЖ").await?.len(), 1);
        assert_eq!(search_ingredients(&db, "EG").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_ingredient_by_id() -> Result<()> {
        let db = setup_test_db().await?;
        let egg = create_test_ingredient(&db, "egg", "pcs").await?;

        let found = get_ingredient_by_id(&db, egg.id).await?.unwrap();
        assert_eq!(found.measurement_unit, "pcs");
        assert!(get_ingredient_by_id(&db, egg.id + 100).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tag_validation_and_uniqueness() -> Result<()> {
        let db = setup_test_db().await?;

        let tag = create_tag(
            &db,
            "Breakfast".to_string(),
            "#E26C2D".to_string(),
            "breakfast".to_string(),
        )
        .await?;
        assert_eq!(tag.slug, "breakfast");

        let bad_color =
            create_tag(&db, "Lunch".to_string(), "red".to_string(), "lunch".to_string()).await;
        assert!(matches!(
            bad_color,
            Err(Error::InvalidField { field: "color", .. })
        ));

        let dup_slug = create_tag(
            &db,
            "Morning".to_string(),
            "#000000".to_string(),
            "breakfast".to_string(),
        )
        .await;
        assert!(matches!(dup_slug, Err(Error::Duplicate { field: "slug", .. })));

        let dup_name = create_tag(
            &db,
            "Breakfast".to_string(),
            "#000000".to_string(),
            "morning".to_string(),
        )
        .await;
        assert!(matches!(dup_name, Err(Error::Duplicate { field: "name", .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_tags_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let tags = vec![
            TagConfig {
                name: "Dinner".to_string(),
                color: "#49B64E".to_string(),
                slug: "dinner".to_string(),
            },
            TagConfig {
                name: "Breakfast".to_string(),
                color: "#E26C2D".to_string(),
                slug: "breakfast".to_string(),
            },
        ];

        assert_eq!(seed_tags(&db, &tags).await?, 2);
        assert_eq!(seed_tags(&db, &tags).await?, 0);

        let listed = list_tags(&db).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Breakfast");
        assert!(get_tag_by_slug(&db, "dinner").await?.is_some());

        Ok(())
    }
}

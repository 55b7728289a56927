//! User business logic - Registration records for authors and subscribers.
//!
//! Authentication is handled outside the core; these functions only manage the
//! profile rows that recipes and relationship ledgers point at.

use crate::{
    entities::{Recipe, User, recipe, user},
    errors::{Error, Result, unique_violation_detail},
};
use sea_orm::{PaginatorTrait, Set, prelude::*};
use tracing::{info, instrument};

/// Profile fields required to register a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Login name: letters, digits and `.@+-_`
    pub username: String,
    /// Email address
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

/// Names the taken field when a concurrent registration wins the unique index.
fn user_insert_error(err: DbErr, username: String, email: String) -> Error {
    match unique_violation_detail(&err) {
        Some(detail) if detail.contains("users.email") => Error::Duplicate {
            field: "email",
            value: email,
        },
        Some(_) => Error::Duplicate {
            field: "username",
            value: username,
        },
        None => err.into(),
    }
}

/// Registers a new user.
///
/// # Errors
/// - `Error::InvalidField` if the username is empty or uses characters outside
///   letters, digits and `.@+-_`, or the email has no `@`
/// - `Error::Duplicate` if the username or email is taken
#[instrument(skip(db, new_user), fields(username = %new_user.username))]
pub async fn create_user(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model> {
    let username = new_user.username.trim().to_string();
    let email = new_user.email.trim().to_lowercase();

    if !is_valid_username(&username) {
        return Err(Error::InvalidField {
            field: "username",
            message: "Use letters, digits and . @ + - _ only".to_string(),
        });
    }
    if !email.contains('@') {
        return Err(Error::InvalidField {
            field: "email",
            message: format!("'{email}' is not an email address"),
        });
    }

    if get_user_by_username(db, &username).await?.is_some() {
        return Err(Error::Duplicate {
            field: "username",
            value: username,
        });
    }
    let email_taken = User::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(db)
        .await?
        .is_some();
    if email_taken {
        return Err(Error::Duplicate {
            field: "email",
            value: email,
        });
    }

    let model = user::ActiveModel {
        username: Set(username.clone()),
        email: Set(email.clone()),
        first_name: Set(new_user.first_name.trim().to_string()),
        last_name: Set(new_user.last_name.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let created = model
        .insert(db)
        .await
        .map_err(|err| user_insert_error(err, username, email))?;

    info!(user_id = created.id, "Registered user");
    Ok(created)
}

/// Retrieves a user by id.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Retrieves a user by login name.
pub async fn get_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Removes a user and, by cascade, their favorites, cart and subscriptions.
///
/// Authors keep their account while any of their recipes exist.
///
/// # Errors
/// - `Error::UserNotFound` if the id does not exist
/// - `Error::InvalidOperation` if the user still authors recipes
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, user_id: i64) -> Result<()> {
    let user = get_user_by_id(db, user_id)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let authored = Recipe::find()
        .filter(recipe::Column::AuthorId.eq(user_id))
        .count(db)
        .await?;
    if authored > 0 {
        return Err(Error::InvalidOperation {
            message: format!(
                "User '{}' still authors {authored} recipe(s) and cannot be removed",
                user.username
            ),
        });
    }

    user.delete(db).await?;
    info!(user_id, "Removed user");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        }
    }

    #[test]
    fn test_username_characters() {
        assert!(is_valid_username("chef.anna+1@home"));
        assert!(is_valid_username("snake_case-name"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username("semi;colon"));
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() -> Result<()> {
        let db = setup_test_db().await?;

        let created = create_user(&db, new_user("  anna ", "Anna@Example.com")).await?;
        assert_eq!(created.username, "anna");
        assert_eq!(created.email, "anna@example.com");

        let by_id = get_user_by_id(&db, created.id).await?.unwrap();
        assert_eq!(by_id, created);
        let by_name = get_user_by_username(&db, "anna").await?.unwrap();
        assert_eq!(by_name.id, created.id);
        assert!(get_user_by_username(&db, "nobody").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicates() -> Result<()> {
        let db = setup_test_db().await?;
        create_user(&db, new_user("anna", "anna@example.com")).await?;

        let same_name = create_user(&db, new_user("anna", "other@example.com")).await;
        assert!(matches!(
            same_name,
            Err(Error::Duplicate { field: "username", .. })
        ));

        let same_email = create_user(&db, new_user("bob", "ANNA@example.com")).await;
        assert!(matches!(
            same_email,
            Err(Error::Duplicate { field: "email", .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_unique_index_names_the_taken_field() -> Result<()> {
        let db = setup_test_db().await?;
        let anna = create_user(&db, new_user("anna", "anna@example.com")).await?;

        // Insert around the lookups so the unique index rejects the row
        let insert = |username: &str, email: &str| user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            first_name: Set("Test".to_string()),
            last_name: Set("User".to_string()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let err = insert("bob", &anna.email).insert(&db).await.unwrap_err();
        let mapped = user_insert_error(err, "bob".to_string(), anna.email.clone());
        assert!(matches!(
            mapped,
            Error::Duplicate { field: "email", ref value } if *value == anna.email
        ));

        let err = insert("anna", "other@example.com").insert(&db).await.unwrap_err();
        let mapped = user_insert_error(err, "anna".to_string(), "other@example.com".to_string());
        assert!(matches!(
            mapped,
            Error::Duplicate { field: "username", ref value } if value == "anna"
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_rejects_bad_fields() -> Result<()> {
        let db = setup_test_db().await?;

        let bad_name = create_user(&db, new_user("no spaces", "x@example.com")).await;
        assert!(matches!(
            bad_name,
            Err(Error::InvalidField { field: "username", .. })
        ));

        let bad_email = create_user(&db, new_user("bob", "not-an-email")).await;
        assert!(matches!(
            bad_email,
            Err(Error::InvalidField { field: "email", .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_user_restricted_while_authoring() -> Result<()> {
        let db = setup_test_db().await?;
        let author = create_test_user(&db, "author").await?;
        let egg = create_test_ingredient(&db, "egg", "pcs").await?;
        let recipe = create_test_recipe(&db, author.id, "Omelette", &[(egg.id, 3)]).await?;

        let result = delete_user(&db, author.id).await;
        assert!(matches!(result, Err(Error::InvalidOperation { .. })));
        assert!(get_user_by_id(&db, author.id).await?.is_some());

        crate::core::recipe::delete_recipe(&db, author.id, recipe.id).await?;
        delete_user(&db, author.id).await?;
        assert!(get_user_by_id(&db, author.id).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_user() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_user(&db, 42).await;
        assert!(matches!(result, Err(Error::UserNotFound { id: 42 })));
        Ok(())
    }
}

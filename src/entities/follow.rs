//! Follow entity - A user's subscription to an author.
//!
//! Both columns reference `users`. The pair is unique and a user may not follow
//! themselves; the latter is checked in [`crate::core::relations`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follows")]
pub struct Model {
    /// Unique identifier for the subscription
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Subscriber
    pub user_id: i64,
    /// Followed author
    pub author_id: i64,
    /// When the subscription started
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Follow and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The subscribing user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade",
        fk_name = "fk-follows-user_id"
    )]
    Follower,
    /// The followed author
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade",
        fk_name = "fk-follows-author_id"
    )]
    Author,
}

// A follow's related user is the author being followed.
impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

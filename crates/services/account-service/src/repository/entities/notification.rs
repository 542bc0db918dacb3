//! Notification database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::Notification;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub related_user_id: Option<i32>,
    pub related_job_id: Option<i32>,
    pub is_read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Notification {
    fn from(model: Model) -> Self {
        Notification {
            id: model.id,
            user_id: model.user_id,
            kind: model.kind,
            title: model.title,
            message: model.message,
            related_user_id: model.related_user_id,
            related_job_id: model.related_job_id,
            is_read: model.is_read,
            created_at: model.created_at,
        }
    }
}

//! Message database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::Message;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub job_id: i32,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Message {
    fn from(model: Model) -> Self {
        Message {
            id: model.id,
            sender_id: model.sender_id,
            receiver_id: model.receiver_id,
            job_id: model.job_id,
            content: model.content,
            is_read: model.is_read,
            created_at: model.created_at,
        }
    }
}

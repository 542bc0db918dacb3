//! A recorded walk; path and pets are stored as JSON text.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pet_walks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub duration_seconds: i32,
    pub distance_km: f64,
    #[sea_orm(column_type = "Text")]
    pub path_json: String,
    #[sea_orm(column_type = "Text")]
    pub pets_json: String,
    pub date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

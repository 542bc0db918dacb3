//! Migration: recorded pet walks, plus the columns profile stats read
//! (favorite kind, reviewed card).

use sea_orm_migration::prelude::*;

use super::m20260120_000001_create_account_tables::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PetWalks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PetWalks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PetWalks::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(PetWalks::DurationSeconds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PetWalks::DistanceKm)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(PetWalks::PathJson).text().not_null())
                    .col(ColumnDef::new(PetWalks::PetsJson).text().not_null())
                    .col(
                        ColumnDef::new(PetWalks::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pet_walks_user")
                            .from(PetWalks::Table, PetWalks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pet_walks_user_id")
                    .table(PetWalks::Table)
                    .col(PetWalks::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(UserFavorites::Table)
                    .add_column(
                        ColumnDef::new(UserFavorites::Kind)
                            .string()
                            .not_null()
                            .default("caregiver"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(UserComments::Table)
                    .add_column(ColumnDef::new(UserComments::CardId).string().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(UserComments::Table)
                    .drop_column(UserComments::CardId)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(UserFavorites::Table)
                    .drop_column(UserFavorites::Kind)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(PetWalks::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PetWalks {
    Table,
    Id,
    UserId,
    DurationSeconds,
    DistanceKm,
    PathJson,
    PetsJson,
    Date,
}

#[derive(DeriveIden)]
enum UserFavorites {
    Table,
    Kind,
}

#[derive(DeriveIden)]
enum UserComments {
    Table,
    CardId,
}

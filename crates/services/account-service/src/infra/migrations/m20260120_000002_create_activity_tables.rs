//! Migration: records that reference other users (messages, notifications,
//! service requests, favorites, comments).

use sea_orm_migration::prelude::*;

use super::m20260120_000001_create_account_tables::{PetProfiles, UserRequests, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceRequests::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceRequests::PetProfileId).integer().not_null())
                    .col(ColumnDef::new(ServiceRequests::ServiceType).string().not_null())
                    .col(
                        ColumnDef::new(ServiceRequests::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ServiceRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_requests_pet_profile")
                            .from(ServiceRequests::Table, ServiceRequests::PetProfileId)
                            .to(PetProfiles::Table, PetProfiles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Messages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Messages::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Messages::SenderId).integer().not_null())
                    .col(ColumnDef::new(Messages::ReceiverId).integer().not_null())
                    .col(ColumnDef::new(Messages::JobId).integer().not_null())
                    .col(ColumnDef::new(Messages::Content).text().not_null())
                    .col(
                        ColumnDef::new(Messages::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Messages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_sender")
                            .from(Messages::Table, Messages::SenderId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_receiver")
                            .from(Messages::Table, Messages::ReceiverId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_job")
                            .from(Messages::Table, Messages::JobId)
                            .to(UserRequests::Table, UserRequests::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).integer().not_null())
                    .col(ColumnDef::new(Notifications::Type).string().not_null())
                    .col(ColumnDef::new(Notifications::Title).string().not_null())
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(ColumnDef::new(Notifications::RelatedUserId).integer().null())
                    .col(ColumnDef::new(Notifications::RelatedJobId).integer().null())
                    .col(
                        ColumnDef::new(Notifications::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_related_user")
                            .from(Notifications::Table, Notifications::RelatedUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_related_job")
                            .from(Notifications::Table, Notifications::RelatedJobId)
                            .to(UserRequests::Table, UserRequests::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserFavorites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserFavorites::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserFavorites::UserId).integer().not_null())
                    .col(ColumnDef::new(UserFavorites::TargetUserId).integer().null())
                    .col(ColumnDef::new(UserFavorites::Title).string().not_null())
                    .col(
                        ColumnDef::new(UserFavorites::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_favorites_user")
                            .from(UserFavorites::Table, UserFavorites::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_favorites_target_user")
                            .from(UserFavorites::Table, UserFavorites::TargetUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserComments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserComments::UserId).integer().not_null())
                    .col(ColumnDef::new(UserComments::Content).text().not_null())
                    .col(ColumnDef::new(UserComments::Rating).integer().null())
                    .col(
                        ColumnDef::new(UserComments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_comments_user")
                            .from(UserComments::Table, UserComments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, table, column) in [
            ("idx_messages_sender_id", Messages::Table, Messages::SenderId),
            ("idx_messages_receiver_id", Messages::Table, Messages::ReceiverId),
            ("idx_messages_job_id", Messages::Table, Messages::JobId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_related_user_id")
                    .table(Notifications::Table)
                    .col(Notifications::RelatedUserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserComments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserFavorites::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Messages::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ServiceRequests::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServiceRequests {
    Table,
    Id,
    PetProfileId,
    ServiceType,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Messages {
    Table,
    Id,
    SenderId,
    ReceiverId,
    JobId,
    Content,
    IsRead,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Type,
    Title,
    Message,
    RelatedUserId,
    RelatedJobId,
    IsRead,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserFavorites {
    Table,
    Id,
    UserId,
    TargetUserId,
    Title,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserComments {
    Table,
    Id,
    UserId,
    Content,
    Rating,
    CreatedAt,
}

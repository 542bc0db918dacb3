//! Migration: users and the records they own directly.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::ExternalId).string().null())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().null())
                    .col(ColumnDef::new(Users::DisplayName).string().not_null())
                    .col(ColumnDef::new(Users::Slug).string().null())
                    .col(ColumnDef::new(Users::PhotoUrl).text().null())
                    .col(ColumnDef::new(Users::Bio).text().null())
                    .col(
                        ColumnDef::new(Users::Provider)
                            .string()
                            .not_null()
                            .default("local"),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Users::PasswordResetToken).string().null())
                    .col(
                        ColumnDef::new(Users::PasswordResetExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::TermsAccepted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::PrivacyAccepted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // Emails are stored lower-cased, so a plain unique index is case-insensitive
        for (name, column) in [
            ("idx_users_email", Users::Email),
            ("idx_users_slug", Users::Slug),
            ("idx_users_external_id", Users::ExternalId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Users::Table)
                        .col(column)
                        .unique()
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx_users_password_reset_token")
                    .table(Users::Table)
                    .col(Users::PasswordResetToken)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PetProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PetProfiles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PetProfiles::UserId).integer().not_null())
                    .col(ColumnDef::new(PetProfiles::Name).string().not_null())
                    .col(ColumnDef::new(PetProfiles::Species).string().null())
                    .col(
                        ColumnDef::new(PetProfiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pet_profiles_user")
                            .from(PetProfiles::Table, PetProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ServiceProviders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceProviders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceProviders::UserId).integer().not_null())
                    .col(ColumnDef::new(ServiceProviders::ServiceType).string().not_null())
                    .col(ColumnDef::new(ServiceProviders::Description).text().null())
                    .col(
                        ColumnDef::new(ServiceProviders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_providers_user")
                            .from(ServiceProviders::Table, ServiceProviders::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserRequests::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserRequests::UserId).integer().not_null())
                    .col(ColumnDef::new(UserRequests::Title).string().not_null())
                    .col(ColumnDef::new(UserRequests::Description).text().null())
                    .col(
                        ColumnDef::new(UserRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_requests_user")
                            .from(UserRequests::Table, UserRequests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserRequests::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ServiceProviders::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PetProfiles::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum Users {
    Table,
    Id,
    ExternalId,
    Email,
    PasswordHash,
    DisplayName,
    Slug,
    PhotoUrl,
    Bio,
    Provider,
    IsActive,
    CreatedAt,
    UpdatedAt,
    PasswordResetToken,
    PasswordResetExpiresAt,
    TermsAccepted,
    PrivacyAccepted,
}

#[derive(DeriveIden)]
pub(super) enum PetProfiles {
    Table,
    Id,
    UserId,
    Name,
    Species,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ServiceProviders {
    Table,
    Id,
    UserId,
    ServiceType,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(super) enum UserRequests {
    Table,
    Id,
    UserId,
    Title,
    Description,
    CreatedAt,
}

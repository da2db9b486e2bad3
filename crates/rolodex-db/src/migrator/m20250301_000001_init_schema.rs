//! Initial schema: identities, contacts and managed user records

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create users table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Name, 100).not_null())
                    .col(string_len(User::Email, 255).not_null().unique_key())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(string_len_null(User::City, 255))
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(User::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_email")
                    .table(User::Table)
                    .col(User::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Create contacts table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Contact::Table)
                    .if_not_exists()
                    .col(uuid(Contact::Id).primary_key())
                    .col(uuid(Contact::OwnerId).not_null())
                    .col(string_len(Contact::Name, 100).not_null())
                    .col(string_len(Contact::Email, 255).not_null())
                    .col(string_len(Contact::Phone, 32).not_null())
                    .col(
                        timestamp_with_time_zone(Contact::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Contact::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contacts_owner_id")
                            .from(Contact::Table, Contact::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_contacts_owner_id")
                    .table(Contact::Table)
                    .col(Contact::OwnerId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Create managed_users table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ManagedUser::Table)
                    .if_not_exists()
                    .col(uuid(ManagedUser::Id).primary_key())
                    .col(uuid(ManagedUser::OwnerId).not_null())
                    .col(string_len(ManagedUser::Name, 100).not_null())
                    .col(string_len(ManagedUser::City, 255).not_null())
                    .col(
                        timestamp_with_time_zone(ManagedUser::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(ManagedUser::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_managed_users_owner_id")
                            .from(ManagedUser::Table, ManagedUser::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_managed_users_owner_id")
                    .table(ManagedUser::Table)
                    .col(ManagedUser::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_managed_users_city")
                    .table(ManagedUser::Table)
                    .col(ManagedUser::City)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_managed_users_created_at")
                    .table(ManagedUser::Table)
                    .col(ManagedUser::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order (respecting foreign keys)
        manager
            .drop_table(Table::drop().table(ManagedUser::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Contact::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    City,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Contact {
    #[sea_orm(iden = "contacts")]
    Table,
    Id,
    OwnerId,
    Name,
    Email,
    Phone,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ManagedUser {
    #[sea_orm(iden = "managed_users")]
    Table,
    Id,
    OwnerId,
    Name,
    City,
    CreatedAt,
    UpdatedAt,
}

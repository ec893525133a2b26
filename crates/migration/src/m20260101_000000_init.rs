//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: accounts, stored roles and password hashes
//! - `wallets`: where money is kept, with the running balance
//! - `categories`: globally unique operation categories
//! - `tags`: free-form labels, unique by normalized title
//! - `operations`: signed amounts booked on a wallet
//! - `operation_tags`: operation ↔ tag links
//! - `reports`: saved operation filters

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Email,
    Roles,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    Title,
    Kind,
    Balance,
    OwnerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Title,
    TitleNorm,
    Slug,
    AuthorId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tags {
    Table,
    Id,
    Title,
    TitleNorm,
    AuthorId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Operations {
    Table,
    Id,
    Title,
    Amount,
    CurrentBalance,
    CategoryId,
    WalletId,
    AuthorId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum OperationTags {
    Table,
    OperationId,
    TagId,
}

#[derive(Iden)]
enum Reports {
    Table,
    Id,
    Title,
    CategoryId,
    TagId,
    WalletId,
    DateFrom,
    DateTo,
    AuthorId,
    CreatedAt,
    UpdatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(Users::Roles)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Wallets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wallets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Wallets::Title).string().not_null())
                    .col(
                        ColumnDef::new(Wallets::Kind)
                            .string()
                            .not_null()
                            .default("cash"),
                    )
                    .col(ColumnDef::new(Wallets::Balance).big_integer().not_null())
                    .col(ColumnDef::new(Wallets::OwnerId).string().not_null())
                    .col(ColumnDef::new(Wallets::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Wallets::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallets-owner_id")
                            .from(Wallets::Table, Wallets::OwnerId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallets-owner_id")
                    .table(Wallets::Table)
                    .col(Wallets::OwnerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Title).string().not_null())
                    .col(ColumnDef::new(Categories::TitleNorm).string().not_null())
                    .col(ColumnDef::new(Categories::Slug).string().not_null())
                    .col(ColumnDef::new(Categories::AuthorId).string().not_null())
                    .col(ColumnDef::new(Categories::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Categories::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-author_id")
                            .from(Categories::Table, Categories::AuthorId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-title_norm-unique")
                    .table(Categories::Table)
                    .col(Categories::TitleNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Tags
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tags::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Tags::Title).string().not_null())
                    .col(ColumnDef::new(Tags::TitleNorm).string().not_null())
                    .col(ColumnDef::new(Tags::AuthorId).string().not_null())
                    .col(ColumnDef::new(Tags::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Tags::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tags-author_id")
                            .from(Tags::Table, Tags::AuthorId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tags-title_norm-unique")
                    .table(Tags::Table)
                    .col(Tags::TitleNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Operations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Operations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Operations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Operations::Title).string().not_null())
                    .col(ColumnDef::new(Operations::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Operations::CurrentBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Operations::CategoryId).string().not_null())
                    .col(ColumnDef::new(Operations::WalletId).string().not_null())
                    .col(ColumnDef::new(Operations::AuthorId).string().not_null())
                    .col(ColumnDef::new(Operations::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Operations::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-operations-category_id")
                            .from(Operations::Table, Operations::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-operations-wallet_id")
                            .from(Operations::Table, Operations::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-operations-author_id")
                            .from(Operations::Table, Operations::AuthorId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx-operations-wallet_id", Operations::WalletId),
            ("idx-operations-category_id", Operations::CategoryId),
            ("idx-operations-author_id", Operations::AuthorId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Operations::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx-operations-updated_at-id")
                    .table(Operations::Table)
                    .col(Operations::UpdatedAt)
                    .col(Operations::Id)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Operation ↔ tag links
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(OperationTags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OperationTags::OperationId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OperationTags::TagId).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(OperationTags::OperationId)
                            .col(OperationTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-operation_tags-operation_id")
                            .from(OperationTags::Table, OperationTags::OperationId)
                            .to(Operations::Table, Operations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-operation_tags-tag_id")
                            .from(OperationTags::Table, OperationTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-operation_tags-tag_id")
                    .table(OperationTags::Table)
                    .col(OperationTags::TagId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Reports
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Reports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reports::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reports::Title).string().not_null())
                    .col(ColumnDef::new(Reports::CategoryId).string())
                    .col(ColumnDef::new(Reports::TagId).string())
                    .col(ColumnDef::new(Reports::WalletId).string())
                    .col(ColumnDef::new(Reports::DateFrom).timestamp())
                    .col(ColumnDef::new(Reports::DateTo).timestamp())
                    .col(ColumnDef::new(Reports::AuthorId).string().not_null())
                    .col(ColumnDef::new(Reports::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Reports::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reports-author_id")
                            .from(Reports::Table, Reports::AuthorId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reports-category_id")
                            .from(Reports::Table, Reports::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reports-tag_id")
                            .from(Reports::Table, Reports::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reports-wallet_id")
                            .from(Reports::Table, Reports::WalletId)
                            .to(Wallets::Table, Wallets::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-reports-author_id")
                    .table(Reports::Table)
                    .col(Reports::AuthorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse creation order
        manager
            .drop_table(Table::drop().table(Reports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OperationTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Operations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(CatalogStatusEnum::Enum)
                    .values([
                        CatalogStatusEnum::Pending,
                        CatalogStatusEnum::Ingesting,
                        CatalogStatusEnum::Completed,
                        CatalogStatusEnum::Failed,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CatalogVersions::Table)
                    .if_not_exists()
                    .col(pk_uuid(CatalogVersions::Id))
                    .col(string_len(CatalogVersions::Service, 255).not_null())
                    .col(string_len(CatalogVersions::VersionHash, 128).not_null())
                    .col(text(CatalogVersions::SourceUrl).not_null())
                    .col(string_len_null(CatalogVersions::Etag, 255))
                    .col(timestamp_with_time_zone(CatalogVersions::PublicationDate).not_null())
                    .col(
                        timestamp_with_time_zone(CatalogVersions::IngestedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(big_integer(CatalogVersions::RecordCount).not_null().default(0))
                    .col(
                        ColumnDef::new(CatalogVersions::Status)
                            .enumeration(
                                CatalogStatusEnum::Enum,
                                [
                                    CatalogStatusEnum::Pending,
                                    CatalogStatusEnum::Ingesting,
                                    CatalogStatusEnum::Completed,
                                    CatalogStatusEnum::Failed,
                                ],
                            )
                            .not_null()
                            .default("pending"),
                    )
                    .col(text_null(CatalogVersions::ErrorMessage))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_catalog_versions_service_hash")
                    .table(CatalogVersions::Table)
                    .col(CatalogVersions::Service)
                    .col(CatalogVersions::VersionHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_catalog_versions_service_status_ingested")
                    .table(CatalogVersions::Table)
                    .col(CatalogVersions::Service)
                    .col(CatalogVersions::Status)
                    .col(CatalogVersions::IngestedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CatalogVersions::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(CatalogStatusEnum::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum CatalogVersions {
    Table,
    Id,
    Service,
    VersionHash,
    SourceUrl,
    Etag,
    PublicationDate,
    IngestedAt,
    RecordCount,
    Status,
    ErrorMessage,
}

#[derive(DeriveIden)]
enum CatalogStatusEnum {
    #[sea_orm(iden = "catalog_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "ingesting")]
    Ingesting,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "failed")]
    Failed,
}

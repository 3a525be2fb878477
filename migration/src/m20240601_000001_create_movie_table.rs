use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(string(Movie::Title))
                    .col(string_null(Movie::OriginalTitle))
                    .col(text_null(Movie::Overview))
                    .col(string_null(Movie::ReleaseDate))
                    .col(big_integer_null(Movie::Budget))
                    .col(big_integer_null(Movie::Revenue))
                    .col(integer_null(Movie::Runtime))
                    .col(double_null(Movie::VoteAverage))
                    .col(integer_null(Movie::VoteCount))
                    .col(string_null(Movie::Status))
                    .col(string_null(Movie::Homepage))
                    .col(string_null(Movie::OriginalLanguage))
                    .col(integer_null(Movie::ProductionCompanyId))
                    .col(integer_null(Movie::GenreId))
                    .col(string_null(Movie::Languages))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_original_language")
                    .table(Movie::Table)
                    .col(Movie::OriginalLanguage)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    Title,
    OriginalTitle,
    Overview,
    ReleaseDate,
    Budget,
    Revenue,
    Runtime,
    VoteAverage,
    VoteCount,
    Status,
    Homepage,
    OriginalLanguage,
    ProductionCompanyId,
    GenreId,
    Languages,
}

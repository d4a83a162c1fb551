use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameResults::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameResults::RoomCode).string().not_null())
                    .col(
                        ColumnDef::new(GameResults::DisplayName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GameResults::FinalPoints)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(GameResults::RoundsPlayed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GameResults::CompletedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on room_code for per-room result queries
        manager
            .create_index(
                Index::create()
                    .name("idx_game_results_room_code")
                    .table(GameResults::Table)
                    .col(GameResults::RoomCode)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameResults::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GameResults {
    Table,
    Id,
    RoomCode,
    DisplayName,
    FinalPoints,
    RoundsPlayed,
    CompletedAt,
}

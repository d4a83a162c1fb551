use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::{game_results, prelude::*};

/// Final standing for one participant, ready to archive.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FinalResult {
    pub room_code: String,
    pub display_name: String,
    pub final_points: f64,
    pub rounds_played: u32,
}

/// Write-once-per-game-over sink for final standings. Gameplay correctness
/// never depends on these writes; callers treat failures as best-effort.
pub struct GameResultRepository {
    db: DatabaseConnection,
}

impl GameResultRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn record_result(&self, result: &FinalResult) -> Result<()> {
        let row = game_results::ActiveModel {
            id: sea_orm::ActiveValue::Set(Uuid::new_v4()),
            room_code: sea_orm::ActiveValue::Set(result.room_code.clone()),
            display_name: sea_orm::ActiveValue::Set(result.display_name.clone()),
            final_points: sea_orm::ActiveValue::Set(result.final_points),
            rounds_played: sea_orm::ActiveValue::Set(result.rounds_played as i32),
            completed_at: sea_orm::ActiveValue::Set(chrono::Utc::now().into()),
        };

        GameResults::insert(row).exec(&self.db).await?;
        Ok(())
    }

    pub async fn results_for_room(&self, room_code: &str) -> Result<Vec<FinalResult>> {
        let rows = GameResults::find()
            .filter(game_results::Column::RoomCode.eq(room_code))
            .order_by_desc(game_results::Column::FinalPoints)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|model| FinalResult {
                room_code: model.room_code,
                display_name: model.display_name,
                final_points: model.final_points,
                rounds_played: model.rounds_played as u32,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> GameResultRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        GameResultRepository::new(db)
    }

    #[tokio::test]
    async fn test_record_and_fetch_results() {
        let repo = setup_test_db().await;

        repo.record_result(&FinalResult {
            room_code: "ABCD".to_string(),
            display_name: "Ana".to_string(),
            final_points: 42.5,
            rounds_played: 5,
        })
        .await
        .unwrap();

        repo.record_result(&FinalResult {
            room_code: "ABCD".to_string(),
            display_name: "Ben".to_string(),
            final_points: 61.25,
            rounds_played: 5,
        })
        .await
        .unwrap();

        let results = repo.results_for_room("ABCD").await.unwrap();
        assert_eq!(results.len(), 2);
        // Ordered by final points descending
        assert_eq!(results[0].display_name, "Ben");
        assert_eq!(results[0].final_points, 61.25);
        assert_eq!(results[1].display_name, "Ana");
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let repo = setup_test_db().await;

        repo.record_result(&FinalResult {
            room_code: "AAAA".to_string(),
            display_name: "Ana".to_string(),
            final_points: 10.0,
            rounds_played: 1,
        })
        .await
        .unwrap();

        let other = repo.results_for_room("BBBB").await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_one_row_per_participant() {
        let repo = setup_test_db().await;

        for name in ["Ana", "Ben", "Cam"] {
            repo.record_result(&FinalResult {
                room_code: "GAME".to_string(),
                display_name: name.to_string(),
                final_points: 5.0,
                rounds_played: 3,
            })
            .await
            .unwrap();
        }

        let results = repo.results_for_room("GAME").await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.rounds_played == 3));
    }
}

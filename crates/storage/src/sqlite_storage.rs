//! SQLite storage backend for ShiftTrack.
//!
//! Every record is a JSON document in one `entities` table keyed by id and
//! entity type. A partial unique index over active shifts makes the
//! single-open-shift rule hold at the database level.

use std::path::Path;
use std::str::FromStr;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use shifttrack_core::{
    DevelopmentGoal, Employee, EmployeeFilter, EmployeeId, GoalFilter, GoalId, GoalTemplate,
    ProgressFilter, ShiftId, ShiftRoster, ShiftSummary, StepProgress, SummaryFilter, TemplateId,
    User, UserId,
};
use tracing::warn;

use super::trait_::{Storage, StorageError, Result};

const EMPLOYEE: &str = "employee";
const USER: &str = "user";
const GOAL: &str = "goal";
const TEMPLATE: &str = "template";
const SHIFT: &str = "shift";
const STEP_PROGRESS: &str = "step_progress";
const SUMMARY: &str = "summary";

/// SQLite storage implementation.
#[derive(Clone)]
pub struct SqliteStorage {
    /// Database connection pool
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) a database file.
    pub async fn new_from_path(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Create an in-memory SQLite storage for testing.
    ///
    /// Limited to one connection since each connection gets its own
    /// in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize the database schema.
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                entity_type TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_entities_type ON entities(entity_type)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_single_active_shift ON entities(entity_type)
            WHERE entity_type = 'shift' AND json_extract(data, '$.is_active') = 1",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert<T: serde::Serialize + Sync>(
        &self,
        entity_type: &str,
        id: String,
        value: &T,
    ) -> Result<()> {
        let data = serde_json::to_string(value)?;
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO entities (id, entity_type, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(&id)
        .bind(entity_type)
        .bind(data)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                warn!(entity_type, id = %id, "unique constraint rejected write");
                Err(StorageError::Conflict(format!("{} {} violates a uniqueness rule", entity_type, id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch_one<T: serde::de::DeserializeOwned>(
        &self,
        entity_type: &str,
        id: String,
    ) -> Result<Option<T>> {
        let row = sqlx::query("SELECT data FROM entities WHERE id = ? AND entity_type = ?")
            .bind(id)
            .bind(entity_type)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn fetch_all<T: serde::de::DeserializeOwned>(&self, entity_type: &str) -> Result<Vec<T>> {
        let rows = sqlx::query("SELECT data FROM entities WHERE entity_type = ? ORDER BY created_at")
            .bind(entity_type)
            .fetch_all(&self.pool)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.try_get("data")?;
            match serde_json::from_str(&data) {
                Ok(item) => items.push(item),
                Err(e) => warn!(entity_type, error = %e, "skipping unreadable record"),
            }
        }
        Ok(items)
    }

    /// Check whether the database connection is working.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn save_employee(&mut self, employee: &Employee) -> Result<()> {
        self.upsert(EMPLOYEE, employee.id.to_string(), employee).await
    }

    async fn load_employee(&self, id: EmployeeId) -> Result<Option<Employee>> {
        self.fetch_one(EMPLOYEE, id.to_string()).await
    }

    async fn list_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>> {
        let mut all: Vec<Employee> = self.fetch_all(EMPLOYEE).await?;
        all.retain(|e| filter.matches(e));
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn save_user(&mut self, user: &User) -> Result<()> {
        self.upsert(USER, user.id.to_string(), user).await
    }

    async fn load_user(&self, id: UserId) -> Result<Option<User>> {
        self.fetch_one(USER, id.to_string()).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut all: Vec<User> = self.fetch_all(USER).await?;
        all.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(all)
    }

    async fn save_goal(&mut self, goal: &DevelopmentGoal) -> Result<()> {
        self.upsert(GOAL, goal.id.to_string(), goal).await
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<DevelopmentGoal>> {
        self.fetch_one(GOAL, id.to_string()).await
    }

    async fn list_goals(&self, filter: &GoalFilter) -> Result<Vec<DevelopmentGoal>> {
        let mut all: Vec<DevelopmentGoal> = self.fetch_all(GOAL).await?;
        all.retain(|g| filter.matches(g));
        Ok(all)
    }

    async fn save_template(&mut self, template: &GoalTemplate) -> Result<()> {
        self.upsert(TEMPLATE, template.id.to_string(), template).await
    }

    async fn load_template(&self, id: TemplateId) -> Result<Option<GoalTemplate>> {
        self.fetch_one(TEMPLATE, id.to_string()).await
    }

    async fn list_templates(&self) -> Result<Vec<GoalTemplate>> {
        let mut all: Vec<GoalTemplate> = self.fetch_all(TEMPLATE).await?;
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn save_shift(&mut self, shift: &ShiftRoster) -> Result<()> {
        self.upsert(SHIFT, shift.id.to_string(), shift).await
    }

    async fn load_shift(&self, id: ShiftId) -> Result<Option<ShiftRoster>> {
        self.fetch_one(SHIFT, id.to_string()).await
    }

    async fn load_active_shift(&self) -> Result<Option<ShiftRoster>> {
        let row = sqlx::query(
            "SELECT data FROM entities
            WHERE entity_type = 'shift' AND json_extract(data, '$.is_active') = 1
            LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn save_step_progress(&mut self, record: &StepProgress) -> Result<()> {
        self.upsert(STEP_PROGRESS, record.id.to_string(), record).await
    }

    async fn list_step_progress(&self, filter: &ProgressFilter) -> Result<Vec<StepProgress>> {
        let mut all: Vec<StepProgress> = self.fetch_all(STEP_PROGRESS).await?;
        all.retain(|r| filter.matches(r));
        all.sort_by(|a, b| (a.date, a.recorded_at).cmp(&(b.date, b.recorded_at)));
        Ok(all)
    }

    async fn save_shift_summary(&mut self, summary: &ShiftSummary) -> Result<()> {
        self.upsert(SUMMARY, summary.id.to_string(), summary).await
    }

    async fn list_shift_summaries(&self, filter: &SummaryFilter) -> Result<Vec<ShiftSummary>> {
        let mut all: Vec<ShiftSummary> = self.fetch_all(SUMMARY).await?;
        all.retain(|s| filter.matches(s));
        all.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(all)
    }

    async fn commit(&mut self, _message: &str) -> Result<()> {
        // Each statement autocommits.
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shifttrack_core::{GoalStatus, StepBlueprint};

    fn create_test_goal() -> DevelopmentGoal {
        let start = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        DevelopmentGoal::new(
            EmployeeId::new(),
            "Cleaning and Sanitization",
            "Complete the end-of-shift cleaning checklist",
            start,
            start + chrono::Duration::days(90),
            &[
                StepBlueprint::required("Wipes down counters"),
                StepBlueprint::optional("Refills napkin dispensers"),
            ],
        )
    }

    #[tokio::test]
    async fn test_in_memory_storage() {
        let mut storage = SqliteStorage::in_memory().await.unwrap();

        let goal = create_test_goal();
        storage.save_goal(&goal).await.unwrap();
        let loaded = storage.load_goal(goal.id).await.unwrap().unwrap();

        assert_eq!(loaded.title, goal.title);
        assert_eq!(loaded.id, goal.id);
        assert!(storage.load_employee(EmployeeId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_goal_upsert_and_filter() {
        let mut storage = SqliteStorage::in_memory().await.unwrap();

        let mut goal = create_test_goal();
        storage.save_goal(&goal).await.unwrap();
        goal.status = GoalStatus::Maintenance;
        storage.save_goal(&goal).await.unwrap();

        let maintenance = storage
            .list_goals(&GoalFilter::default().with_status(GoalStatus::Maintenance))
            .await
            .unwrap();
        assert_eq!(maintenance.len(), 1);
        let active = storage
            .list_goals(&GoalFilter::default().with_status(GoalStatus::Active))
            .await
            .unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn test_unique_active_shift_index() {
        let mut storage = SqliteStorage::in_memory().await.unwrap();
        let now = chrono::Utc::now();

        let mut first = ShiftRoster::start(UserId::new(), vec![EmployeeId::new()], None, now);
        storage.save_shift(&first).await.unwrap();

        let second = ShiftRoster::start(UserId::new(), vec![EmployeeId::new()], None, now);
        let err = storage.save_shift(&second).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        first.end(now);
        storage.save_shift(&first).await.unwrap();
        storage.save_shift(&second).await.unwrap();
        let active = storage.load_active_shift().await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
    }

    #[tokio::test]
    async fn test_health_check() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        assert!(storage.health_check().await);
    }
}

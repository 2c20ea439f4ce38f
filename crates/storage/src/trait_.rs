//! Storage trait abstraction.

use async_trait::async_trait;
use shifttrack_core::{
    DevelopmentGoal, Employee, EmployeeFilter, EmployeeId, GoalFilter, GoalId, GoalTemplate,
    ProgressFilter, ShiftId, ShiftRoster, ShiftSummary, StepProgress, SummaryFilter, TemplateId,
    User, UserId,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error
    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness rule was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for ShiftTrack data.
///
/// `load_*` is get-by-id, `list_*` is query-by-filter and `save_*` creates
/// or replaces the whole record. Backends own the canonical collections;
/// callers work on owned copies.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Employee operations ===

    /// Save an employee (create or update).
    async fn save_employee(&mut self, employee: &Employee) -> Result<()>;

    /// Load an employee by ID.
    async fn load_employee(&self, id: EmployeeId) -> Result<Option<Employee>>;

    /// List employees matching the filter.
    async fn list_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>>;

    // === User operations ===

    /// Save a user (create or update).
    async fn save_user(&mut self, user: &User) -> Result<()>;

    /// Load a user by ID.
    async fn load_user(&self, id: UserId) -> Result<Option<User>>;

    /// List all users.
    async fn list_users(&self) -> Result<Vec<User>>;

    // === Goal operations ===

    /// Save a goal (create or update).
    async fn save_goal(&mut self, goal: &DevelopmentGoal) -> Result<()>;

    /// Load a goal by ID.
    async fn load_goal(&self, id: GoalId) -> Result<Option<DevelopmentGoal>>;

    /// List goals matching the filter.
    async fn list_goals(&self, filter: &GoalFilter) -> Result<Vec<DevelopmentGoal>>;

    // === Template operations ===

    /// Save a template (create or update).
    async fn save_template(&mut self, template: &GoalTemplate) -> Result<()>;

    /// Load a template by ID.
    async fn load_template(&self, id: TemplateId) -> Result<Option<GoalTemplate>>;

    /// List all templates.
    async fn list_templates(&self) -> Result<Vec<GoalTemplate>>;

    // === Shift operations ===

    /// Save a shift roster (create or update).
    ///
    /// Saving an active roster while a different one is active is a
    /// [`StorageError::Conflict`].
    async fn save_shift(&mut self, shift: &ShiftRoster) -> Result<()>;

    /// Load a shift by ID.
    async fn load_shift(&self, id: ShiftId) -> Result<Option<ShiftRoster>>;

    /// Load the single active shift, if any.
    async fn load_active_shift(&self) -> Result<Option<ShiftRoster>>;

    // === Step progress operations ===

    /// Save a step progress record (create or update by ID).
    async fn save_step_progress(&mut self, record: &StepProgress) -> Result<()>;

    /// List step progress records matching the filter, oldest first.
    async fn list_step_progress(&self, filter: &ProgressFilter) -> Result<Vec<StepProgress>>;

    // === Shift summary operations ===

    /// Save a shift summary (create or update by ID).
    async fn save_shift_summary(&mut self, summary: &ShiftSummary) -> Result<()>;

    /// List shift summaries matching the filter.
    async fn list_shift_summaries(&self, filter: &SummaryFilter) -> Result<Vec<ShiftSummary>>;

    // === Transaction support ===

    /// Commit pending changes with a message.
    async fn commit(&mut self, message: &str) -> Result<()>;

    /// Rollback pending changes.
    async fn rollback(&mut self) -> Result<()>;
}

//! JSON file storage implementation.
//!
//! Stores each record as a JSON file under the data directory and keeps small
//! per-object meta markers (version + updated_at). Snapshotting the directory
//! is left to whatever backs it up.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use shifttrack_core::{
    DevelopmentGoal, Employee, EmployeeFilter, EmployeeId, GoalFilter, GoalId, GoalTemplate,
    ProgressFilter, ShiftId, ShiftRoster, ShiftSummary, StepProgress, SummaryFilter, TemplateId,
    User, UserId,
};
use super::{Storage, StorageError, Result};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const KINDS: &[&str] = &[
    "employees",
    "users",
    "goals",
    "templates",
    "shifts",
    "step_progress",
    "summaries",
];

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    pending: Arc<Mutex<bool>>,
}

impl JsonStorage {
    /// Create storage, creating the per-kind data and meta directories.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        for kind in KINDS {
            fs::create_dir_all(root.join(kind)).await?;
            fs::create_dir_all(root.join("meta").join(kind)).await?;
        }
        debug!(root = %root.display(), "opened JSON storage");

        Ok(Self {
            root,
            pending: Arc::new(Mutex::new(false)),
        })
    }

    /// Data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, kind: &str, id: impl std::fmt::Display) -> PathBuf {
        self.root.join(kind).join(format!("{}.json", id))
    }

    fn meta_path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join("meta").join(kind).join(format!("{}.meta.json", id))
    }

    async fn set_pending(&self) {
        *self.pending.lock().await = true;
    }

    /// Whether writes happened since the last commit or rollback.
    pub async fn is_pending(&self) -> bool {
        *self.pending.lock().await
    }

    /// Read and increment per-object version, return new version.
    async fn bump_version(&self, kind: &str, id: &str) -> Result<u64> {
        let path = self.meta_path(kind, id);
        let mut version = 0u64;
        if let Ok(s) = fs::read_to_string(&path).await {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&s) {
                if let Some(v) = json.get("version").and_then(|v| v.as_u64()) {
                    version = v;
                }
            }
        }
        version += 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        fs::write(&path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }

    /// Write a record and bump its meta version.
    async fn write_record<T: serde::Serialize>(
        &self,
        kind: &str,
        id: impl std::fmt::Display,
        value: &T,
    ) -> Result<()> {
        let id_str = id.to_string();
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.record_path(kind, &id_str), json.as_bytes()).await?;
        let version = self.bump_version(kind, &id_str).await?;
        debug!(kind, id = %id_str, version, "saved record");
        self.set_pending().await;
        Ok(())
    }

    async fn list_shifts(&self) -> Result<Vec<ShiftRoster>> {
        list_dir(&self.root.join("shifts")).await
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_employee(&mut self, employee: &Employee) -> Result<()> {
        self.write_record("employees", employee.id, employee).await
    }

    async fn load_employee(&self, id: EmployeeId) -> Result<Option<Employee>> {
        read_json(&self.record_path("employees", id)).await
    }

    async fn list_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>> {
        let mut all: Vec<Employee> = list_dir(&self.root.join("employees")).await?;
        all.retain(|e| filter.matches(e));
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn save_user(&mut self, user: &User) -> Result<()> {
        self.write_record("users", user.id, user).await
    }

    async fn load_user(&self, id: UserId) -> Result<Option<User>> {
        read_json(&self.record_path("users", id)).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut all: Vec<User> = list_dir(&self.root.join("users")).await?;
        all.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(all)
    }

    async fn save_goal(&mut self, goal: &DevelopmentGoal) -> Result<()> {
        self.write_record("goals", goal.id, goal).await
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<DevelopmentGoal>> {
        read_json(&self.record_path("goals", id)).await
    }

    async fn list_goals(&self, filter: &GoalFilter) -> Result<Vec<DevelopmentGoal>> {
        let mut all: Vec<DevelopmentGoal> = list_dir(&self.root.join("goals")).await?;
        all.retain(|g| filter.matches(g));
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn save_template(&mut self, template: &GoalTemplate) -> Result<()> {
        self.write_record("templates", template.id, template).await
    }

    async fn load_template(&self, id: TemplateId) -> Result<Option<GoalTemplate>> {
        read_json(&self.record_path("templates", id)).await
    }

    async fn list_templates(&self) -> Result<Vec<GoalTemplate>> {
        let mut all: Vec<GoalTemplate> = list_dir(&self.root.join("templates")).await?;
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn save_shift(&mut self, shift: &ShiftRoster) -> Result<()> {
        if shift.is_active {
            let other = self
                .list_shifts()
                .await?
                .into_iter()
                .find(|s| s.is_active && s.id != shift.id);
            if let Some(other) = other {
                warn!(active = %other.id, rejected = %shift.id, "second active shift rejected");
                return Err(StorageError::Conflict(format!(
                    "shift {} is already active",
                    other.id
                )));
            }
        }
        self.write_record("shifts", shift.id, shift).await
    }

    async fn load_shift(&self, id: ShiftId) -> Result<Option<ShiftRoster>> {
        read_json(&self.record_path("shifts", id)).await
    }

    async fn load_active_shift(&self) -> Result<Option<ShiftRoster>> {
        Ok(self.list_shifts().await?.into_iter().find(|s| s.is_active))
    }

    async fn save_step_progress(&mut self, record: &StepProgress) -> Result<()> {
        self.write_record("step_progress", record.id, record).await
    }

    async fn list_step_progress(&self, filter: &ProgressFilter) -> Result<Vec<StepProgress>> {
        let mut all: Vec<StepProgress> = list_dir(&self.root.join("step_progress")).await?;
        all.retain(|r| filter.matches(r));
        all.sort_by(|a, b| (a.date, a.recorded_at).cmp(&(b.date, b.recorded_at)));
        Ok(all)
    }

    async fn save_shift_summary(&mut self, summary: &ShiftSummary) -> Result<()> {
        self.write_record("summaries", summary.id, summary).await
    }

    async fn list_shift_summaries(&self, filter: &SummaryFilter) -> Result<Vec<ShiftSummary>> {
        let mut all: Vec<ShiftSummary> = list_dir(&self.root.join("summaries")).await?;
        all.retain(|s| filter.matches(s));
        all.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(all)
    }

    async fn commit(&mut self, _message: &str) -> Result<()> {
        // Files are written eagerly; commit only clears the pending marker.
        *self.pending.lock().await = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        *self.pending.lock().await = false;
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&path).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable record"),
        }
    }
    Ok(items)
}

//! Employee, template and user records.

use std::sync::Arc;
use async_trait::async_trait;
use shifttrack_core::{
    Employee, EmployeeFilter, EmployeeId, GoalTemplate, Role, StepBlueprint, SupportProfile,
    TemplateId, TemplateStatus, User, UserId, MAX_TARGET_DAYS,
};
use shifttrack_storage::Storage;
use tokio::sync::Mutex;
use tracing::info;

use crate::context::WorkContext;
use crate::error::{Result, WorkError};

/// Record keeping for the people and blueprints the shift services rely on.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Add an employee.
    async fn add_employee(&self, spec: EmployeeSpec) -> Result<Employee>;

    /// Apply a partial update to an employee.
    async fn update_employee(&self, id: EmployeeId, update: EmployeeUpdate) -> Result<Employee>;

    /// Flag an employee inactive.
    async fn deactivate_employee(&self, id: EmployeeId) -> Result<Employee>;

    /// Fetch one employee.
    async fn get_employee(&self, id: EmployeeId) -> Result<Employee>;

    /// Employees matching a filter.
    async fn list_employees(&self, filter: EmployeeFilter) -> Result<Vec<Employee>>;

    /// Add a goal template.
    async fn add_template(&self, spec: TemplateSpec) -> Result<GoalTemplate>;

    /// Archive a template so it can't be assigned.
    async fn archive_template(&self, id: TemplateId) -> Result<GoalTemplate>;

    /// Templates, optionally including archived ones.
    async fn list_templates(&self, include_archived: bool) -> Result<Vec<GoalTemplate>>;

    /// Add a manager account.
    async fn add_user(&self, email: String, name: String, role: Role) -> Result<User>;

    /// Flag a user inactive.
    async fn deactivate_user(&self, id: UserId) -> Result<User>;

    /// Fetch one user.
    async fn get_user(&self, id: UserId) -> Result<User>;

    /// All users.
    async fn list_users(&self) -> Result<Vec<User>>;
}

/// Specification for a new employee.
#[derive(Debug, Clone, Default)]
pub struct EmployeeSpec {
    /// Display name
    pub name: String,
    /// Job role, e.g. "Super Scooper"
    pub role: String,
    /// Optional profile image
    pub profile_image_url: Option<String>,
    /// Support information
    pub support: SupportProfile,
}

/// Partial employee update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct EmployeeUpdate {
    /// New name
    pub name: Option<String>,
    /// New job role
    pub role: Option<String>,
    /// New profile image; `Some(None)` clears it
    pub profile_image_url: Option<Option<String>>,
    /// Replacement support profile
    pub support: Option<SupportProfile>,
}

/// Specification for a new template.
#[derive(Debug, Clone, Default)]
pub struct TemplateSpec {
    /// Template name
    pub name: String,
    /// Goal statement
    pub goal_statement: String,
    /// Days to target; defaults to the configured value
    pub default_target_days: Option<u32>,
    /// Mastery criteria text; defaults to the standard wording
    pub mastery_criteria: Option<String>,
    /// Steps in order
    pub steps: Vec<StepBlueprint>,
}

/// Basic directory implementation.
pub struct BasicDirectory<S: Storage> {
    storage: Arc<Mutex<S>>,
    ctx: WorkContext,
}

impl<S: Storage> BasicDirectory<S> {
    /// Create a new directory owning its storage.
    pub fn new(storage: S) -> Self {
        Self::from_shared(Arc::new(Mutex::new(storage)))
    }

    /// Create a directory over storage shared with other services.
    pub fn from_shared(storage: Arc<Mutex<S>>) -> Self {
        Self {
            storage,
            ctx: WorkContext::default(),
        }
    }

    /// Set context.
    pub fn with_context(mut self, ctx: WorkContext) -> Self {
        self.ctx = ctx;
        self
    }
}

fn non_empty(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(WorkError::InvalidInput(format!("{} is empty", what)))
    } else {
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl<S: Storage + 'static> Directory for BasicDirectory<S> {
    async fn add_employee(&self, spec: EmployeeSpec) -> Result<Employee> {
        let mut employee = Employee::new(non_empty(&spec.name, "employee name")?, spec.role.trim());
        employee.profile_image_url = spec.profile_image_url;
        employee.support = spec.support;
        employee.created_at = self.ctx.clock.now();
        employee.updated_at = employee.created_at;

        let mut storage = self.storage.lock().await;
        storage.save_employee(&employee).await?;
        storage.commit(&format!("Add employee: {}", employee.name)).await?;

        info!(employee = %employee.id, name = %employee.name, "employee added");
        Ok(employee)
    }

    async fn update_employee(&self, id: EmployeeId, update: EmployeeUpdate) -> Result<Employee> {
        let mut storage = self.storage.lock().await;
        let mut employee = storage
            .load_employee(id)
            .await?
            .ok_or_else(|| WorkError::not_found("employee", id))?;

        if let Some(name) = update.name {
            employee.name = non_empty(&name, "employee name")?;
        }
        if let Some(role) = update.role {
            employee.role = role.trim().to_string();
        }
        if let Some(url) = update.profile_image_url {
            employee.profile_image_url = url;
        }
        if let Some(support) = update.support {
            employee.support = support;
        }
        employee.updated_at = self.ctx.clock.now();

        storage.save_employee(&employee).await?;
        storage.commit(&format!("Update employee: {}", employee.name)).await?;
        Ok(employee)
    }

    async fn deactivate_employee(&self, id: EmployeeId) -> Result<Employee> {
        let mut storage = self.storage.lock().await;
        let mut employee = storage
            .load_employee(id)
            .await?
            .ok_or_else(|| WorkError::not_found("employee", id))?;

        employee.deactivate();
        storage.save_employee(&employee).await?;
        storage.commit(&format!("Deactivate employee: {}", employee.name)).await?;

        info!(employee = %employee.id, "employee deactivated");
        Ok(employee)
    }

    async fn get_employee(&self, id: EmployeeId) -> Result<Employee> {
        self.storage
            .lock()
            .await
            .load_employee(id)
            .await?
            .ok_or_else(|| WorkError::not_found("employee", id))
    }

    async fn list_employees(&self, filter: EmployeeFilter) -> Result<Vec<Employee>> {
        Ok(self.storage.lock().await.list_employees(&filter).await?)
    }

    async fn add_template(&self, spec: TemplateSpec) -> Result<GoalTemplate> {
        let name = non_empty(&spec.name, "template name")?;
        if !spec.steps.iter().any(|s| s.is_required) {
            return Err(WorkError::NoRequiredSteps);
        }

        let days = spec
            .default_target_days
            .unwrap_or(self.ctx.config.default_target_days);
        if days > MAX_TARGET_DAYS {
            return Err(WorkError::InvalidInput(format!(
                "{} days to target exceeds the maximum of {}",
                days, MAX_TARGET_DAYS
            )));
        }
        let mut template = GoalTemplate::new(name, spec.goal_statement, days, spec.steps);
        if let Some(criteria) = spec.mastery_criteria {
            template.default_mastery_criteria = criteria;
        }
        template.created_at = self.ctx.clock.now();

        let mut storage = self.storage.lock().await;
        storage.save_template(&template).await?;
        storage.commit(&format!("Add template: {}", template.name)).await?;

        info!(template = %template.id, name = %template.name, "template added");
        Ok(template)
    }

    async fn archive_template(&self, id: TemplateId) -> Result<GoalTemplate> {
        let mut storage = self.storage.lock().await;
        let mut template = storage
            .load_template(id)
            .await?
            .ok_or_else(|| WorkError::not_found("template", id))?;

        if template.status != TemplateStatus::Archived {
            template.status = TemplateStatus::Archived;
            storage.save_template(&template).await?;
            storage.commit(&format!("Archive template: {}", template.name)).await?;
            info!(template = %template.id, "template archived");
        }
        Ok(template)
    }

    async fn list_templates(&self, include_archived: bool) -> Result<Vec<GoalTemplate>> {
        let templates = self.storage.lock().await.list_templates().await?;
        Ok(templates
            .into_iter()
            .filter(|t| include_archived || t.status == TemplateStatus::Active)
            .collect())
    }

    async fn add_user(&self, email: String, name: String, role: Role) -> Result<User> {
        let email = non_empty(&email, "email")?.to_lowercase();
        if !email.contains('@') {
            return Err(WorkError::InvalidInput(format!("'{}' is not an email address", email)));
        }
        let name = non_empty(&name, "user name")?;

        let mut storage = self.storage.lock().await;
        if storage.list_users().await?.iter().any(|u| u.email == email) {
            return Err(WorkError::InvalidInput(format!("user {} already exists", email)));
        }

        let mut user = User::new(email, name, role);
        user.created_at = self.ctx.clock.now();
        user.updated_at = user.created_at;
        storage.save_user(&user).await?;
        storage.commit(&format!("Add user: {}", user.email)).await?;

        info!(user = %user.id, role = %user.role, "user added");
        Ok(user)
    }

    async fn deactivate_user(&self, id: UserId) -> Result<User> {
        let mut storage = self.storage.lock().await;
        let mut user = storage
            .load_user(id)
            .await?
            .ok_or_else(|| WorkError::not_found("user", id))?;

        user.is_active = false;
        user.updated_at = self.ctx.clock.now();
        storage.save_user(&user).await?;
        storage.commit(&format!("Deactivate user: {}", user.email)).await?;
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User> {
        self.storage
            .lock()
            .await
            .load_user(id)
            .await?
            .ok_or_else(|| WorkError::not_found("user", id))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.storage.lock().await.list_users().await?)
    }
}

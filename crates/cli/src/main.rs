//! ShiftTrack CLI - shift and employee development tracking.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use shifttrack_core::{
    Capability, Clock, EmergencyContact, EmployeeFilter, EmployeeId, GoalFilter, GoalId,
    GoalStatus, GoalTemplate, Outcome, Role, StepBlueprint, StepId, SupportProfile, SystemClock,
    TemplateId, UserId,
};
use shifttrack_progress::{BasicProgressTracker, ProgressTracker};
use shifttrack_storage::JsonStorage;
use shifttrack_work::{
    AccessGuard, BasicDirectory, BasicGoalManager, BasicShiftManager, Directory, EmployeeSpec,
    EmployeeUpdate, GoalManager, GoalSpec, GoalUpdate, ShiftManager, ShiftSpec, StepOutcomeInput,
    TemplateSpec, WorkContext,
};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ShiftTrackConfig;

#[derive(Parser)]
#[command(name = "shifttrack")]
#[command(about = "Shift management and employee development tracking", long_about = None)]
struct Cli {
    /// Data directory
    #[arg(long, env = "SHIFTTRACK_DATA", default_value = ".shifttrack")]
    data_dir: PathBuf,

    /// Role to act as (admin or shift-manager)
    #[arg(long, env = "SHIFTTRACK_ROLE", default_value = "shift-manager")]
    role: Role,

    /// Acting user id, required to start a shift
    #[arg(long, env = "SHIFTTRACK_USER")]
    user: Option<UserId>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage employees
    #[command(subcommand)]
    Employee(EmployeeCommand),
    /// Manage goal templates
    #[command(subcommand)]
    Template(TemplateCommand),
    /// Manage development goals
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Start, end or inspect the shift
    #[command(subcommand)]
    Shift(ShiftCommand),
    /// Record a step outcome on the active shift
    Record {
        /// Employee ID
        employee: EmployeeId,
        /// Goal ID
        goal: GoalId,
        /// Step ID
        step: StepId,
        /// correct, verbal-prompt or na
        outcome: Outcome,
        /// Notes (required for verbal-prompt)
        #[arg(long)]
        notes: Option<String>,
    },
    /// Write today's shift summary for an employee
    Summary {
        /// Employee ID
        employee: EmployeeId,
        /// Summary text
        text: String,
    },
    /// Show the dashboard
    Dashboard,
    /// Manage manager accounts
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Subcommand)]
enum EmployeeCommand {
    /// Add an employee
    Add {
        /// Name
        name: String,
        /// Job role
        #[arg(long, default_value = "Super Scooper")]
        job: String,
        #[command(flatten)]
        support: SupportArgs,
    },
    /// Update an employee; support lists given here replace the stored ones
    Update {
        /// Employee ID
        id: EmployeeId,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New job role
        #[arg(long)]
        job: Option<String>,
        /// New profile image URL
        #[arg(long, conflicts_with = "clear_image")]
        image_url: Option<String>,
        /// Remove the profile image
        #[arg(long)]
        clear_image: bool,
        #[command(flatten)]
        support: SupportArgs,
    },
    /// List employees
    List {
        /// Include inactive employees
        #[arg(long)]
        all: bool,
        /// Case-insensitive name search
        #[arg(long)]
        search: Option<String>,
    },
    /// Show employee details and goal progress
    Show {
        /// Employee ID
        id: EmployeeId,
    },
    /// Deactivate an employee
    Deactivate {
        /// Employee ID
        id: EmployeeId,
    },
}

#[derive(Args)]
struct SupportArgs {
    /// Known allergy (repeatable)
    #[arg(long = "allergy")]
    allergies: Vec<String>,
    /// Interest or motivator (repeatable)
    #[arg(long = "interest")]
    interests: Vec<String>,
    /// Known challenge (repeatable)
    #[arg(long = "challenge")]
    challenges: Vec<String>,
    /// Regulation strategy (repeatable)
    #[arg(long = "strategy")]
    strategies: Vec<String>,
    /// Emergency contact as NAME:RELATIONSHIP:PHONE (repeatable)
    #[arg(long = "emergency-contact", value_parser = parse_contact)]
    contacts: Vec<EmergencyContact>,
}

impl SupportArgs {
    fn is_empty(&self) -> bool {
        self.allergies.is_empty()
            && self.interests.is_empty()
            && self.challenges.is_empty()
            && self.strategies.is_empty()
            && self.contacts.is_empty()
    }

    /// Replace the categories given on the command line, keep the rest.
    fn apply(self, mut base: SupportProfile) -> SupportProfile {
        if !self.allergies.is_empty() {
            base.allergies = self.allergies;
        }
        if !self.interests.is_empty() {
            base.interests_motivators = self.interests;
        }
        if !self.challenges.is_empty() {
            base.challenges = self.challenges;
        }
        if !self.strategies.is_empty() {
            base.regulation_strategies = self.strategies;
        }
        if !self.contacts.is_empty() {
            base.emergency_contacts = self.contacts;
        }
        base
    }
}

fn parse_contact(s: &str) -> std::result::Result<EmergencyContact, String> {
    let parts: Vec<&str> = s.splitn(3, ':').map(str::trim).collect();
    match parts.as_slice() {
        [name, relationship, phone] if !name.is_empty() && !phone.is_empty() => {
            Ok(EmergencyContact {
                name: name.to_string(),
                relationship: relationship.to_string(),
                phone: phone.to_string(),
            })
        }
        _ => Err(format!("expected NAME:RELATIONSHIP:PHONE, got '{}'", s)),
    }
}

#[derive(Args)]
struct StepArgs {
    /// Required step (repeatable, in order)
    #[arg(long = "step")]
    required: Vec<String>,
    /// Optional step (repeatable, after required steps)
    #[arg(long = "optional-step")]
    optional: Vec<String>,
}

impl StepArgs {
    fn blueprints(self) -> Vec<StepBlueprint> {
        self.required
            .into_iter()
            .map(StepBlueprint::required)
            .chain(self.optional.into_iter().map(StepBlueprint::optional))
            .collect()
    }
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// Add a template
    Add {
        /// Template name
        name: String,
        /// Goal statement
        #[arg(long, default_value = "")]
        statement: String,
        /// Days from assignment to target date
        #[arg(long)]
        days: Option<u32>,
        #[command(flatten)]
        steps: StepArgs,
    },
    /// List templates
    List {
        /// Include archived templates
        #[arg(long)]
        all: bool,
    },
    /// Archive a template
    Archive {
        /// Template ID
        id: TemplateId,
    },
}

#[derive(Subcommand)]
enum GoalCommand {
    /// Assign a goal from a template
    Assign {
        /// Employee ID
        employee: EmployeeId,
        /// Template ID
        template: TemplateId,
    },
    /// Create a custom goal
    Create {
        /// Employee ID
        employee: EmployeeId,
        /// Goal title
        title: String,
        /// Description
        #[arg(long, default_value = "")]
        description: String,
        /// Target end date (YYYY-MM-DD)
        #[arg(long)]
        target: Option<NaiveDate>,
        #[command(flatten)]
        steps: StepArgs,
    },
    /// List goals
    List {
        /// Only this employee's goals
        #[arg(long)]
        employee: Option<EmployeeId>,
        /// Filter by status
        #[arg(long)]
        status: Option<GoalStatus>,
    },
    /// Edit a goal's title, description or target date
    Edit {
        /// Goal ID
        id: GoalId,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New target end date (YYYY-MM-DD)
        #[arg(long)]
        target: Option<NaiveDate>,
    },
    /// Archive a goal
    Archive {
        /// Goal ID
        id: GoalId,
    },
}

#[derive(Subcommand)]
enum ShiftCommand {
    /// Start a shift with the employees present
    Start {
        /// Employee on shift (repeatable)
        #[arg(long = "employee", required = true)]
        employees: Vec<EmployeeId>,
        /// Store location
        #[arg(long)]
        location: Option<String>,
    },
    /// End the active shift
    End,
    /// Show the active shift
    Status,
}

#[derive(Subcommand)]
enum UserCommand {
    /// Add a user
    Add {
        /// Email
        email: String,
        /// Name
        name: String,
        /// Role of the new user
        #[arg(long = "user-role", default_value = "shift-manager")]
        user_role: Role,
    },
    /// List users
    List,
    /// Deactivate a user
    Deactivate {
        /// User ID
        id: UserId,
    },
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so command output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Services sharing one storage handle.
struct App {
    guard: AccessGuard,
    user: Option<UserId>,
    clock: Arc<dyn Clock>,
    directory: BasicDirectory<JsonStorage>,
    goals: BasicGoalManager<JsonStorage>,
    shifts: BasicShiftManager<JsonStorage>,
    tracker: BasicProgressTracker<JsonStorage>,
}

impl App {
    async fn open(cli: &Cli, config: &ShiftTrackConfig) -> Result<Self> {
        let storage = Arc::new(Mutex::new(JsonStorage::new(&cli.data_dir).await?));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ctx = WorkContext::new()
            .with_config(config.work_config())
            .with_clock(clock.clone());

        Ok(Self {
            guard: AccessGuard::new(cli.role),
            user: cli.user,
            clock,
            directory: BasicDirectory::from_shared(storage.clone()).with_context(ctx.clone()),
            goals: BasicGoalManager::from_shared(storage.clone()).with_context(ctx.clone()),
            shifts: BasicShiftManager::from_shared(storage.clone()).with_context(ctx),
            tracker: BasicProgressTracker::from_shared(storage)
                .with_policy(config.mastery_policy())
                .with_success_window(config.success_window_days),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ShiftTrackConfig::load(&cli.data_dir).await?;
    init_logging(&config.log_level);

    let app = App::open(&cli, &config).await?;
    info!(role = %cli.role, data_dir = %cli.data_dir.display(), "shifttrack started");

    match cli.command {
        Commands::Employee(cmd) => run_employee(&app, cmd).await?,
        Commands::Template(cmd) => run_template(&app, cmd).await?,
        Commands::Goal(cmd) => run_goal(&app, cmd).await?,
        Commands::Shift(cmd) => run_shift(&app, cmd).await?,
        Commands::Record { employee, goal, step, outcome, notes } => {
            app.guard.require(Capability::RunShift)?;
            let recorded = app
                .shifts
                .record_step_outcome(StepOutcomeInput {
                    employee_id: employee,
                    goal_id: goal,
                    step_id: step,
                    outcome,
                    notes,
                })
                .await?;

            let eval = &recorded.evaluation;
            println!(
                "{} {}: {} of {} required steps correct today",
                if recorded.replaced { "Updated" } else { "Recorded" },
                recorded.record.outcome,
                eval.correct_required,
                eval.required_total,
            );
            println!(
                "  Streak: {} | Status: {}",
                eval.goal.consecutive_all_correct,
                eval.goal.status
            );
            if eval.reached_mastery {
                println!("  Mastery achieved!");
            }
        }
        Commands::Summary { employee, text } => {
            app.guard.require(Capability::RunShift)?;
            let summary = app.shifts.save_shift_summary(employee, text).await?;
            println!("Saved summary for {} on {}", summary.employee_id, summary.date);
        }
        Commands::Dashboard => {
            app.guard.require(Capability::ViewDashboard)?;
            print_dashboard(&app).await?;
        }
        Commands::User(cmd) => run_user(&app, cmd).await?,
    }

    Ok(())
}

async fn run_employee(app: &App, cmd: EmployeeCommand) -> Result<()> {
    match cmd {
        EmployeeCommand::Add { name, job, support } => {
            app.guard.require(Capability::ManageEmployees)?;
            let employee = app
                .directory
                .add_employee(EmployeeSpec {
                    name,
                    role: job,
                    profile_image_url: None,
                    support: support.apply(SupportProfile::default()),
                })
                .await?;
            println!("Added employee: {} - {}", employee.id, employee.name);
        }
        EmployeeCommand::Update { id, name, job, image_url, clear_image, support } => {
            app.guard.require(Capability::ManageEmployees)?;
            let support = if support.is_empty() {
                None
            } else {
                let current = app.directory.get_employee(id).await?;
                Some(support.apply(current.support))
            };
            let profile_image_url = if clear_image { Some(None) } else { image_url.map(Some) };

            let employee = app
                .directory
                .update_employee(
                    id,
                    EmployeeUpdate {
                        name,
                        role: job,
                        profile_image_url,
                        support,
                    },
                )
                .await?;
            println!("Updated employee: {} - {}", employee.id, employee.name);
        }
        EmployeeCommand::List { all, search } => {
            app.guard.require(Capability::ViewDashboard)?;
            let filter = EmployeeFilter {
                is_active: if all { None } else { Some(true) },
                name_contains: search,
            };
            let employees = app.directory.list_employees(filter).await?;

            println!("Employees ({})", employees.len());
            for e in employees {
                println!(
                    "  {} | {} | {}{}",
                    e.id,
                    e.name,
                    e.role,
                    if e.is_active { "" } else { " (inactive)" }
                );
            }
        }
        EmployeeCommand::Show { id } => {
            app.guard.require(Capability::ViewDashboard)?;
            let employee = app.directory.get_employee(id).await?;
            let stats = app.tracker.employee_stats(id).await?;

            println!("Employee: {}", employee.id);
            println!("  Name: {}", employee.name);
            println!("  Role: {}", employee.role);
            println!("  Active: {}", employee.is_active);
            print_list("Allergies", &employee.support.allergies);
            print_list("Interests", &employee.support.interests_motivators);
            print_list("Challenges", &employee.support.challenges);
            print_list("Regulation strategies", &employee.support.regulation_strategies);
            for c in &employee.support.emergency_contacts {
                println!("  Emergency contact: {} ({}) {}", c.name, c.relationship, c.phone);
            }
            println!(
                "  Goals: {} active, {} maintenance, {} archived, {} mastered",
                stats.active, stats.maintenance, stats.archived, stats.mastered
            );

            let today = app.clock.today();
            let goals = app.goals.list_goals(GoalFilter::for_employee(id)).await?;
            for goal in goals.iter().filter(|g| g.status != GoalStatus::Archived) {
                let tally = app.tracker.daily_tally(goal.id, today).await?;
                println!(
                    "  [{}] {} - streak {}, today {}/{}",
                    goal.status,
                    goal.title,
                    goal.consecutive_all_correct,
                    tally.correct_required,
                    tally.required_total
                );
                for step in &goal.steps {
                    println!(
                        "      {}. {}{} ({})",
                        step.order,
                        step.description,
                        if step.is_required { "" } else { " [optional]" },
                        step.id
                    );
                }
                for record in app.tracker.goal_history(goal.id, 5).await? {
                    println!(
                        "      {} {}{}",
                        record.date,
                        record.outcome,
                        record.notes.map(|n| format!(" - {}", n)).unwrap_or_default()
                    );
                }
            }
        }
        EmployeeCommand::Deactivate { id } => {
            app.guard.require(Capability::ManageEmployees)?;
            let employee = app.directory.deactivate_employee(id).await?;
            println!("Deactivated employee: {}", employee.name);
        }
    }
    Ok(())
}

async fn run_template(app: &App, cmd: TemplateCommand) -> Result<()> {
    match cmd {
        TemplateCommand::Add { name, statement, days, steps } => {
            app.guard.require(Capability::ManageTemplates)?;
            let template = app
                .directory
                .add_template(TemplateSpec {
                    name,
                    goal_statement: statement,
                    default_target_days: days,
                    mastery_criteria: None,
                    steps: steps.blueprints(),
                })
                .await?;
            println!("Added template: {} - {}", template.id, template.name);
        }
        TemplateCommand::List { all } => {
            app.guard.require(Capability::ManageGoals)?;
            let templates = app.directory.list_templates(all).await?;
            println!("Templates ({})", templates.len());
            for t in &templates {
                print_template(t);
            }
        }
        TemplateCommand::Archive { id } => {
            app.guard.require(Capability::ManageTemplates)?;
            let template = app.directory.archive_template(id).await?;
            println!("Archived template: {}", template.name);
        }
    }
    Ok(())
}

async fn run_goal(app: &App, cmd: GoalCommand) -> Result<()> {
    match cmd {
        GoalCommand::Assign { employee, template } => {
            app.guard.require(Capability::ManageGoals)?;
            let goal = app.goals.assign_from_template(employee, template).await?;
            println!("Assigned goal: {} - {} (target {})", goal.id, goal.title, goal.target_end_date);
        }
        GoalCommand::Create { employee, title, description, target, steps } => {
            app.guard.require(Capability::ManageGoals)?;
            let goal = app
                .goals
                .create_goal(GoalSpec {
                    employee_id: employee,
                    title,
                    description,
                    target_end_date: target,
                    steps: steps.blueprints(),
                })
                .await?;
            println!("Created goal: {} - {} (target {})", goal.id, goal.title, goal.target_end_date);
        }
        GoalCommand::List { employee, status } => {
            app.guard.require(Capability::ViewDashboard)?;
            let mut filter = employee.map(GoalFilter::for_employee).unwrap_or_default();
            if let Some(status) = status {
                filter = filter.with_status(status);
            }
            let goals = app.goals.list_goals(filter).await?;

            println!("Goals ({})", goals.len());
            for g in goals {
                println!(
                    "  {} | {} | streak {} | {}{}",
                    g.id,
                    g.status,
                    g.consecutive_all_correct,
                    g.title,
                    g.mastery_date.map(|d| format!(" (mastered {})", d)).unwrap_or_default()
                );
            }
        }
        GoalCommand::Edit { id, title, description, target } => {
            app.guard.require(Capability::ManageGoals)?;
            let goal = app
                .goals
                .update_goal(
                    id,
                    GoalUpdate {
                        title,
                        description,
                        target_end_date: target,
                    },
                )
                .await?;
            println!("Updated goal: {} - {} (target {})", goal.id, goal.title, goal.target_end_date);
        }
        GoalCommand::Archive { id } => {
            app.guard.require(Capability::ManageGoals)?;
            let goal = app.goals.archive_goal(id).await?;
            println!("Archived goal: {}", goal.title);
        }
    }
    Ok(())
}

async fn run_shift(app: &App, cmd: ShiftCommand) -> Result<()> {
    app.guard.require(Capability::RunShift)?;
    match cmd {
        ShiftCommand::Start { employees, location } => {
            let Some(manager_id) = app.user else {
                anyhow::bail!("--user is required to start a shift");
            };
            let shift = app
                .shifts
                .start_shift(ShiftSpec {
                    manager_id,
                    employee_ids: employees,
                    location,
                })
                .await?;
            println!("Started shift: {} with {} employees", shift.id, shift.employee_ids.len());
        }
        ShiftCommand::End => {
            let shift = app.shifts.end_shift().await?;
            println!("Ended shift: {}", shift.id);
        }
        ShiftCommand::Status => match app.shifts.active_shift().await? {
            Some(shift) => {
                println!("Active shift: {}", shift.id);
                println!("  Started: {}", shift.started_at);
                if let Some(location) = &shift.location {
                    println!("  Location: {}", location);
                }
                for id in &shift.employee_ids {
                    let name = app
                        .directory
                        .get_employee(*id)
                        .await
                        .map(|e| e.name)
                        .unwrap_or_else(|_| "unknown".to_string());
                    println!("  {} | {}", id, name);
                }
            }
            None => println!("No active shift"),
        },
    }
    Ok(())
}

async fn run_user(app: &App, cmd: UserCommand) -> Result<()> {
    app.guard.require(Capability::ManageUsers)?;
    match cmd {
        UserCommand::Add { email, name, user_role } => {
            let user = app.directory.add_user(email, name, user_role).await?;
            println!("Added user: {} - {} ({})", user.id, user.email, user.role);
        }
        UserCommand::Deactivate { id } => {
            let user = app.directory.deactivate_user(id).await?;
            println!("Deactivated user: {}", user.email);
        }
        UserCommand::List => {
            let users = app.directory.list_users().await?;
            println!("Users ({})", users.len());
            for u in users {
                println!(
                    "  {} | {} | {} | {}{}",
                    u.id,
                    u.email,
                    u.name,
                    u.role,
                    if u.is_active { "" } else { " (inactive)" }
                );
            }
        }
    }
    Ok(())
}

async fn print_dashboard(app: &App) -> Result<()> {
    let stats = app.tracker.dashboard(app.clock.today()).await?;

    println!("ShiftTrack Dashboard");
    println!("  Active employees: {}", stats.active_employees);
    println!("  Active goals: {}", stats.active_goals);
    println!("  Mastered goals: {}", stats.mastered_goals);
    println!("  Success rate: {}%", stats.success_rate_percent);
    println!("  Shift open: {}", if stats.shift_open { "yes" } else { "no" });

    let near = app.tracker.near_mastery().await?;
    if !near.is_empty() {
        println!("  Near mastery:");
        for goal in near {
            println!("    {} - streak {}", goal.title, goal.consecutive_all_correct);
        }
    }
    Ok(())
}

fn print_template(t: &GoalTemplate) {
    println!("  {} | {} | {} days | {}", t.id, t.name, t.default_target_days, t.status);
    for (i, step) in t.steps.iter().enumerate() {
        println!(
            "      {}. {}{}",
            i + 1,
            step.description,
            if step.is_required { "" } else { " [optional]" }
        );
    }
}

fn print_list(label: &str, items: &[String]) {
    if !items.is_empty() {
        println!("  {}: {}", label, items.join(", "));
    }
}

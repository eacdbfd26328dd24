mod script;


use std::io::{self, Read};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use client::notify::Level;
use client::{
    AccountDirectory, ApiClient, AuthService, ClearError, ClientConfig, ClientError, ConfigError, Confirmed,
    FeedbackDashboard, FileSessionStore, LoadState, Notifier, ReportExporter, SessionStore, TemplateStore,
};
use forms::session::guard;
use forms::{
    Access, AdminUpdate, Credentials, ExportError, FeedbackRecord, FieldCommand, FieldPatch, FieldType, FormTemplate,
    Id, NewAccount, NewField, Registration, Role, SessionState, TemplateDraft, TemplateError, UserUpdate, View,
    timestamp,
};

use crate::script::{ScriptError, Step, parse_script};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Clear(#[from] ClearError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("access to {view} denied; sign in at {to}")]
    Redirected { view: View, to: View },
    #[error("{0}")]
    Load(String),
    #[error("refusing to delete every feedback record without --yes")]
    NotConfirmed,
    #[error("no {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("failed to read script: {0}")]
    Input(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "feedback-desk", about = "Review feedback, manage forms and accounts, export reports")]
struct Cli {
    #[arg(long, env = "FEEDBACK_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "FEEDBACK_SESSION_FILE")]
    session_file: Option<String>,

    #[arg(long, env = "FEEDBACK_EXPORT_DIR")]
    export_dir: Option<String>,

    #[arg(long, help = "Always use the paged text layout for group reports")]
    no_tables: bool,

    #[arg(long, env = "FEEDBACK_LOG_LEVEL", default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the session.
    Login(LoginArgs),
    Logout,
    Register(RegisterArgs),
    /// Show the stored session and which views it opens.
    Whoami,
    Feedback(FeedbackCommand),
    Forms(FormsCommand),
    Fields(FieldsCommand),
    Admins(AdminCommand),
    Users(UserCommand),
    Export(ExportCommand),
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long, default_value_t = false)]
    admin: bool,
    #[arg(long, short)]
    username: String,
    #[arg(long, env = "FEEDBACK_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long, short)]
    username: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
}

#[derive(Args, Debug)]
struct FeedbackCommand {
    #[command(subcommand)]
    command: FeedbackSubcommand,
}

#[derive(Subcommand, Debug)]
enum FeedbackSubcommand {
    List {
        #[arg(long)]
        form_type: Option<String>,
    },
    /// Per-form counts, averages and rating histograms.
    Summary,
    /// Delete every feedback record on the server.
    Clear {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct FormsCommand {
    #[command(subcommand)]
    command: FormsSubcommand,
}

#[derive(Subcommand, Debug)]
enum FormsSubcommand {
    List,
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Build a new form from a draft script before the first save.
    Compose {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "-", help = "Script file path, or - for stdin")]
        script: String,
    },
    /// Run a draft script against an existing form.
    Edit {
        id: String,
        #[arg(long, default_value = "-", help = "Script file path, or - for stdin")]
        script: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct FieldsCommand {
    #[command(subcommand)]
    command: FieldsSubcommand,
}

#[derive(Subcommand, Debug)]
enum FieldsSubcommand {
    Add {
        form_id: String,
        #[arg(long)]
        name: String,
        #[arg(long = "type", default_value = "")]
        field_type: String,
        #[arg(long, help = "Comma-separated choices for select fields")]
        options: Option<String>,
        #[arg(long, default_value_t = false)]
        required: bool,
    },
    Update {
        form_id: String,
        field_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        field_type: Option<String>,
        #[arg(long)]
        options: Option<String>,
        #[arg(long)]
        required: Option<bool>,
    },
    Remove {
        form_id: String,
        field_id: String,
    },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

/// Admin accounts carry no email address.
#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    List,
    Add {
        #[arg(long, short)]
        username: String,
        #[arg(long)]
        password: String,
    },
    Update {
        id: String,
        #[arg(long, short)]
        username: String,
        #[arg(long, help = "Leave out to keep the current password")]
        password: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand, Debug)]
enum UserSubcommand {
    List,
    Add {
        #[arg(long, short)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
    Update {
        id: String,
        #[arg(long, short)]
        username: String,
        #[arg(long, help = "Leave out to keep the current password")]
        password: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct ExportCommand {
    #[command(subcommand)]
    command: ExportSubcommand,
}

#[derive(Subcommand, Debug)]
enum ExportSubcommand {
    /// One-page report for a single feedback record.
    One { feedback_id: String },
    /// One report covering every record of a form type.
    Group { form_type: String },
}

/// Prints alerts: info to stdout, errors to stderr.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Info => println!("{message}"),
            Level::Error => eprintln!("error: {message}"),
        }
    }
}

struct Desk {
    config: ClientConfig,
    api: ApiClient,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
}

impl Desk {
    fn new(config: ClientConfig) -> Result<Self, CliError> {
        let api = ApiClient::new(&config)?;
        let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(config.session_file.clone()));
        Ok(Self { config, api, store, notifier: Arc::new(ConsoleNotifier) })
    }

    fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone(), self.store.clone())
    }

    /// Enter `view` or explain where the guard sends us instead.
    fn require(&self, view: View) -> Result<SessionState, CliError> {
        let state = self.store.load().map_err(ClientError::from)?;
        match guard(view, &state) {
            Access::Granted => Ok(state),
            Access::Redirect(to) => Err(CliError::Redirected { view, to }),
        }
    }

    async fn dashboard(&self) -> Result<FeedbackDashboard, CliError> {
        let mut dashboard = FeedbackDashboard::new(self.api.clone());
        if let LoadState::Failed(message) = dashboard.load().await {
            return Err(CliError::Load(message.clone()));
        }
        Ok(dashboard)
    }

    async fn templates(&self) -> TemplateStore {
        let mut store = TemplateStore::new(self.api.clone(), self.notifier.clone());
        store.load().await;
        store
    }

    async fn accounts(&self) -> Result<AccountDirectory, CliError> {
        let mut directory = AccountDirectory::new(self.api.clone(), self.store.clone());
        directory.load().await;
        if let Some(message) = directory.error() {
            return Err(CliError::Load(message.to_owned()));
        }
        Ok(directory)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(cli.log_level).with_writer(io::stderr).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    tracing::debug!(api_url = %config.api_url, session = %config.session_file.display(), "config loaded");
    let desk = Desk::new(config)?;

    match cli.command {
        Command::Login(args) => run_login(&desk, args).await,
        Command::Logout => {
            let next = desk.auth().logout()?;
            desk.notifier.info(&format!("Signed out. Continue at {next}"));
            Ok(())
        }
        Command::Register(args) => run_register(&desk, args).await,
        Command::Whoami => run_whoami(&desk),
        Command::Feedback(feedback) => run_feedback(&desk, feedback).await,
        Command::Forms(forms) => run_forms(&desk, forms).await,
        Command::Fields(fields) => run_fields(&desk, fields).await,
        Command::Admins(admins) => run_admins(&desk, admins).await,
        Command::Users(users) => run_users(&desk, users).await,
        Command::Export(export) => run_export(&desk, export).await,
    }
}

/// Flags win over the environment, which wins over defaults.
fn load_config(cli: &Cli) -> Result<ClientConfig, ConfigError> {
    let tables = cli.no_tables.then(|| "false".to_owned());
    ClientConfig::from_lookup(|key| {
        let flag = match key {
            "FEEDBACK_API_URL" => cli.api_url.clone(),
            "FEEDBACK_SESSION_FILE" => cli.session_file.clone(),
            "FEEDBACK_EXPORT_DIR" => cli.export_dir.clone(),
            "FEEDBACK_EXPORT_TABLES" => tables.clone(),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    })
}

// =============================================================================
// SESSION
// =============================================================================

async fn run_login(desk: &Desk, args: LoginArgs) -> Result<(), CliError> {
    let role = if args.admin { Role::Admin } else { Role::User };
    let credentials = Credentials { username: args.username, password: args.password };
    let next = desk.auth().login(role, &credentials).await?;
    desk.notifier.info(&format!("Login successful. Continue at {next}"));
    Ok(())
}

async fn run_register(desk: &Desk, args: RegisterArgs) -> Result<(), CliError> {
    let registration = Registration {
        username: args.username,
        email: args.email,
        password: args.password,
        confirm_password: args.confirm_password,
    };
    let next = desk.auth().register(&registration).await?;
    desk.notifier.info(&format!("{} ({next})", client::auth::REGISTERED));
    Ok(())
}

fn run_whoami(desk: &Desk) -> Result<(), CliError> {
    let state = desk.auth().session()?;
    match &state {
        SessionState::Anonymous => println!("not signed in"),
        SessionState::User(user) => println!("user {} (id {})", user.username, user.id),
        SessionState::Admin(admin) => println!("admin {} (id {})", admin.username, admin.id),
    }
    for view in [View::FeedbackForm, View::Feedback, View::AdminFeedback, View::AdminManagement] {
        let access = match guard(view, &state) {
            Access::Granted => "open".to_owned(),
            Access::Redirect(to) => format!("redirects to {to}"),
        };
        println!("  {:<18} {access}", view.path());
    }
    Ok(())
}

// =============================================================================
// FEEDBACK
// =============================================================================

async fn run_feedback(desk: &Desk, feedback: FeedbackCommand) -> Result<(), CliError> {
    desk.require(View::AdminFeedback)?;
    let mut dashboard = desk.dashboard().await?;

    match feedback.command {
        FeedbackSubcommand::List { form_type } => {
            let records =
                dashboard.records().iter().filter(|r| form_type.as_ref().is_none_or(|ft| &r.form_type == ft));
            for record in records {
                print_record(record);
            }
            Ok(())
        }
        FeedbackSubcommand::Summary => {
            let groups = dashboard.analytics();
            if groups.is_empty() {
                println!("no feedback yet");
            }
            for group in groups {
                let summary = &group.summary;
                println!(
                    "{} - {} response(s), {} rated, average {:.1}",
                    group.form_type, summary.total, summary.rated, summary.average
                );
                for bucket in &summary.histogram {
                    println!("  {} star(s): {}", bucket.rating, bucket.count);
                }
            }
            Ok(())
        }
        FeedbackSubcommand::Clear { yes } => {
            if !yes {
                return Err(CliError::NotConfirmed);
            }
            match dashboard.clear_all(Confirmed::by_operator()).await {
                Ok(deleted) => {
                    desk.notifier.info(&format!("Deleted {deleted} feedback record(s)."));
                    Ok(())
                }
                Err(ClearError::Partial { deleted, failed }) => {
                    for (id, error) in &failed {
                        desk.notifier.error(&format!("feedback {id} was not deleted: {error}"));
                    }
                    Err(ClearError::Partial { deleted, failed }.into())
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

fn print_record(record: &FeedbackRecord) {
    println!("#{} [{}] {} <{}>", record.id, record.form_type, record.name, record.email);
    println!("  rating:    {}", record.rating_text());
    println!("  submitted: {}", record.submitted_display());
    println!("  comments:  {}", record.comments);
}

// =============================================================================
// FORMS
// =============================================================================

async fn run_forms(desk: &Desk, forms: FormsCommand) -> Result<(), CliError> {
    desk.require(View::AdminFeedback)?;
    let mut store = desk.templates().await;

    match forms.command {
        FormsSubcommand::List => {
            for template in store.templates() {
                println!("{}  {} ({} field(s))", template.id, template.title, template.fields.len());
            }
            Ok(())
        }
        FormsSubcommand::Show { id } => {
            let template = store.get(&Id::new(id.clone())).ok_or(CliError::NotFound { kind: "form", id })?;
            print_template(template);
            Ok(())
        }
        FormsSubcommand::Create { title, description } => {
            let created = store.create(&TemplateDraft::new(title, description)).await?;
            desk.notifier.info(&format!("Form created with id {}", created.id));
            Ok(())
        }
        FormsSubcommand::Compose { title, description, script } => {
            let mut draft = TemplateDraft::new(title, description);
            run_draft_script(desk, &mut store, &mut draft, &script).await
        }
        FormsSubcommand::Edit { id, script } => {
            let mut draft = store.edit(&Id::new(id.clone())).ok_or(CliError::NotFound { kind: "form", id })?;
            run_draft_script(desk, &mut store, &mut draft, &script).await
        }
        FormsSubcommand::Delete { id } => {
            store.delete(&Id::new(id.clone())).await?;
            desk.notifier.info(&format!("Form {id} deleted"));
            Ok(())
        }
    }
}

async fn run_draft_script(
    desk: &Desk,
    store: &mut TemplateStore,
    draft: &mut TemplateDraft,
    script: &str,
) -> Result<(), CliError> {
    let steps = parse_script(&read_script(script)?)?;
    if !apply_steps(draft, steps)? {
        desk.notifier.info("Draft discarded");
        return Ok(());
    }
    let saved = store.save(draft).await?;
    desk.notifier.info(&format!("Form {} saved with {} field(s)", saved.id, saved.fields.len()));
    Ok(())
}

/// Returns whether the draft should be saved.
fn apply_steps(draft: &mut TemplateDraft, steps: Vec<Step>) -> Result<bool, CliError> {
    for step in steps {
        match step {
            Step::Title(title) => draft.title = title,
            Step::Description(description) => draft.description = description,
            Step::Field(command) => {
                let id = draft.apply(command)?;
                tracing::debug!(%id, "draft field changed");
            }
            Step::Show => print_draft(draft),
            Step::Save => return Ok(true),
            Step::Cancel => return Ok(false),
        }
    }
    Ok(true)
}

fn read_script(source: &str) -> io::Result<String> {
    if source == "-" {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        return Ok(input);
    }
    std::fs::read_to_string(source)
}

fn print_template(template: &FormTemplate) {
    println!("{}  {}", template.id, template.title);
    if let Some(description) = template.description.as_deref().filter(|d| !d.is_empty()) {
        println!("  {description}");
    }
    for field in &template.fields {
        print_field(field);
    }
}

fn print_draft(draft: &TemplateDraft) {
    let id = draft.id.as_ref().map_or_else(|| "(new)".to_owned(), ToString::to_string);
    println!("{id}  {}", draft.title);
    for field in &draft.fields {
        print_field(field);
    }
}

fn print_field(field: &forms::FieldDefinition) {
    let required = if field.required { " *" } else { "" };
    print!("  [{}] {} ({}){required}", field.id, field.name, field.field_type);
    if field.field_type == FieldType::Select {
        print!(": {}", field.rendered_options().join(", "));
    }
    println!();
}

// =============================================================================
// FIELDS
// =============================================================================

async fn run_fields(desk: &Desk, fields: FieldsCommand) -> Result<(), CliError> {
    desk.require(View::AdminFeedback)?;
    let mut store = desk.templates().await;

    let (form_id, command) = match fields.command {
        FieldsSubcommand::Add { form_id, name, field_type, options, required } => {
            let field = NewField::new(name, FieldType::parse_or_text(&field_type)?)
                .with_options(options.as_deref().map(forms::template::parse_options).unwrap_or_default())
                .required(required);
            (form_id, FieldCommand::Add(field))
        }
        FieldsSubcommand::Update { form_id, field_id, name, field_type, options, required } => {
            let patch = FieldPatch {
                name,
                field_type: field_type.as_deref().map(FieldType::parse_or_text).transpose()?,
                options: options.as_deref().map(forms::template::parse_options),
                required,
            };
            (form_id, FieldCommand::Update { id: Id::new(field_id), patch })
        }
        FieldsSubcommand::Remove { form_id, field_id } => (form_id, FieldCommand::Remove { id: Id::new(field_id) }),
    };

    let mut draft = store.edit(&Id::new(form_id.clone())).ok_or(CliError::NotFound { kind: "form", id: form_id })?;
    let field_id = draft.apply(command)?;
    let saved = store.save(&mut draft).await?;
    desk.notifier.info(&format!("Form {} saved (field {field_id})", saved.id));
    Ok(())
}

// =============================================================================
// ACCOUNTS
// =============================================================================

async fn run_admins(desk: &Desk, admins: AdminCommand) -> Result<(), CliError> {
    desk.require(View::AdminManagement)?;
    let mut directory = desk.accounts().await?;

    match admins.command {
        AdminSubcommand::List => {
            for admin in directory.admins() {
                let created = timestamp::parse_lenient(admin.created_at.as_deref());
                println!("{}  {}  {}", admin.id, admin.username, timestamp::display(created));
            }
        }
        AdminSubcommand::Add { username, password } => {
            let created = directory.create_admin(&NewAccount { username, password, email: None }).await?;
            desk.notifier.info(&format!("Admin {} created", created.username));
        }
        AdminSubcommand::Update { id, username, password } => {
            directory.update_admin(&Id::new(id), AdminUpdate { username, password }).await?;
            desk.notifier.info("Admin updated");
        }
        AdminSubcommand::Delete { id } => {
            directory.delete_admin(&Id::new(id)).await?;
            desk.notifier.info("Admin deleted");
        }
    }
    Ok(())
}

async fn run_users(desk: &Desk, users: UserCommand) -> Result<(), CliError> {
    desk.require(View::AdminManagement)?;
    let mut directory = desk.accounts().await?;

    match users.command {
        UserSubcommand::List => {
            for user in directory.users() {
                println!("{}  {}  {}", user.id, user.username, user.email.as_deref().unwrap_or("-"));
            }
        }
        UserSubcommand::Add { username, password, email } => {
            let created = directory.create_user(&NewAccount { username, password, email }).await?;
            desk.notifier.info(&format!("User {} created", created.username));
        }
        UserSubcommand::Update { id, username, password, email } => {
            directory.update_user(&Id::new(id), UserUpdate { username, password, email }).await?;
            desk.notifier.info("User updated");
        }
        UserSubcommand::Delete { id } => {
            directory.delete_user(&Id::new(id)).await?;
            desk.notifier.info("User deleted");
        }
    }
    Ok(())
}

// =============================================================================
// EXPORT
// =============================================================================

async fn run_export(desk: &Desk, export: ExportCommand) -> Result<(), CliError> {
    desk.require(View::AdminFeedback)?;
    let dashboard = desk.dashboard().await?;
    let exporter = ReportExporter::new(&desk.config);

    let path = match export.command {
        ExportSubcommand::One { feedback_id } => {
            let id = Id::new(feedback_id.clone());
            let record = dashboard
                .records()
                .iter()
                .find(|r| r.id == id)
                .ok_or(CliError::NotFound { kind: "feedback", id: feedback_id })?;
            exporter.export_single(record).await?
        }
        ExportSubcommand::Group { form_type } => {
            let group = dashboard.group(&form_type).ok_or(ExportError::EmptyBatch(form_type.clone()))?;
            exporter.export_group(&group.form_type, &group.records).await?
        }
    };
    desk.notifier.info(&format!("Report saved to {}", path.display()));
    Ok(())
}

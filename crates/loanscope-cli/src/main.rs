use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use loanscope_client::views::{
    account_view, model_view, new_prediction_view, prediction_detail_view, predictions_view,
    user_profile_view, users_view,
};
use loanscope_client::{
    load_config, ApiError, DraftBuffer, DraftTarget, Navigator, PredictionScope, Route, Session,
    ViewOutcome,
};
use loanscope_common::{
    LoginRequest, NewPrediction, Prediction, PredictionInputs, Role, SignupRequest, User, UserId,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "loanscope", version, about = "Loanscope CLI - loan approval predictions")]
struct Cli {
    /// Server URL including the /api prefix (overrides the config file)
    #[arg(long, env = "LOANSCOPE_URL")]
    server: Option<String>,

    /// Path to the client config file
    #[arg(long, env = "LOANSCOPE_CONFIG", default_value = "loanscope.yaml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the credential
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "LOANSCOPE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in with it
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, env = "LOANSCOPE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored credential
    Logout,
    /// Your own account
    #[command(subcommand)]
    Account(AccountCommand),
    /// Loan approval predictions
    #[command(subcommand)]
    Predictions(PredictionCommand),
    /// User management (administrators)
    #[command(subcommand)]
    Users(UserCommand),
    /// Show the scoring model and its metrics
    Model,
}

#[derive(Subcommand)]
enum AccountCommand {
    Show,
    /// Change your first and/or last name
    Update(NameArgs),
    /// Delete your account and log out
    Delete,
}

#[derive(Subcommand)]
enum PredictionCommand {
    /// List your predictions, or another user's
    List {
        #[arg(long)]
        user: Option<UserId>,
    },
    Show {
        id: i64,
    },
    /// Request a new prediction
    New(NewPredictionArgs),
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    List,
    Show {
        id: UserId,
    },
    Update {
        id: UserId,
        #[command(flatten)]
        names: NameArgs,
    },
    /// Set a user's role (user or admin)
    Role {
        id: UserId,
        role: Role,
    },
    Delete {
        id: UserId,
    },
}

#[derive(Args)]
struct NameArgs {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
}

#[derive(Args)]
struct NewPredictionArgs {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "0")]
    dependents: i64,
    /// Applicant is a graduate
    #[arg(long)]
    graduate: bool,
    #[arg(long)]
    self_employed: bool,
    /// Annual income
    #[arg(long)]
    income: i64,
    #[arg(long)]
    loan_amount: i64,
    /// Loan term in years
    #[arg(long)]
    loan_term: i64,
    #[arg(long)]
    credit_score: i64,
    #[arg(long, default_value = "0")]
    residential_assets: i64,
    #[arg(long, default_value = "0")]
    commercial_assets: i64,
    #[arg(long, default_value = "0")]
    luxury_assets: i64,
    #[arg(long, default_value = "0")]
    bank_assets: i64,
}

impl From<NewPredictionArgs> for NewPrediction {
    fn from(args: NewPredictionArgs) -> Self {
        NewPrediction {
            title: args.title,
            inputs: PredictionInputs {
                id: None,
                dependents: args.dependents,
                education: args.graduate,
                self_employed: args.self_employed,
                income: args.income,
                loan_amount: args.loan_amount,
                loan_term: args.loan_term,
                credit_score: args.credit_score,
                residential_assets_value: args.residential_assets,
                commercial_assets_value: args.commercial_assets,
                luxury_assets_value: args.luxury_assets,
                bank_asset_value: args.bank_assets,
            },
        }
    }
}

/// Redirects become messages; the command then fails
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, route: Route) {
        tracing::info!("Redirecting to {}", route);
        if route == Route::Login {
            eprintln!("You are not logged in. Run `loanscope login` first.");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config).context("Failed to load configuration")?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    tracing::debug!("Using server {}", config.server_url);

    let session = Session::from_config(&config, Arc::new(TerminalNavigator));

    match cli.command {
        Commands::Login { username, password } => {
            session.login(&LoginRequest { username, password }).await?;
            println!("Logged in.");
        }
        Commands::Signup {
            username,
            first_name,
            last_name,
            password,
        } => {
            let user = session
                .signup(&SignupRequest {
                    username,
                    first_name,
                    last_name,
                    password,
                })
                .await?;
            println!("Account created for {}. Logged in.", user.username);
        }
        Commands::Logout => {
            session.logout()?;
            println!("Logged out.");
        }
        Commands::Account(cmd) => cmd_account(&session, cmd).await?,
        Commands::Predictions(cmd) => cmd_predictions(&session, cmd).await?,
        Commands::Users(cmd) => cmd_users(&session, cmd).await?,
        Commands::Model => cmd_model(&session).await?,
    }

    Ok(())
}

fn rendered<T>(outcome: ViewOutcome<T>) -> Result<T> {
    match outcome {
        ViewOutcome::Rendered(value) => Ok(value),
        ViewOutcome::Redirected(route) => anyhow::bail!("Redirected to {}", route),
    }
}

async fn cmd_account(session: &Session, cmd: AccountCommand) -> Result<()> {
    match cmd {
        AccountCommand::Show => {
            let view = rendered(account_view(session).await?)?;
            print_user(&view.user);
            println!("\nMenu:");
            for entry in &view.navigation {
                println!("  {:18} {}", entry.label, entry.route);
            }
        }
        AccountCommand::Update(names) => {
            let draft = DraftBuffer::new(DraftTarget::CurrentUser);
            let updated = rendered(
                session
                    .gate()
                    .guard(Route::Account, || save_names(session, &draft, names))
                    .await?,
            )?;
            println!("Account updated.");
            print_user(&updated);
        }
        AccountCommand::Delete => {
            let deleted = rendered(
                session
                    .gate()
                    .guard(Route::Account, || session.delete_account())
                    .await?,
            )?;
            println!("Account {} deleted.", deleted.username);
        }
    }
    Ok(())
}

async fn save_names(
    session: &Session,
    draft: &DraftBuffer,
    names: NameArgs,
) -> Result<User, ApiError> {
    draft.load(session).await?;
    if let Some(first) = names.first_name {
        draft.set_first_name(first);
    }
    if let Some(last) = names.last_name {
        draft.set_last_name(last);
    }
    draft.commit(session).await
}

async fn cmd_predictions(session: &Session, cmd: PredictionCommand) -> Result<()> {
    match cmd {
        PredictionCommand::List { user } => {
            let scope = user.map_or(PredictionScope::Own, PredictionScope::OfUser);
            let view = rendered(predictions_view(session, scope).await?)?;
            if view.items.is_empty() {
                println!("No predictions found.");
                return Ok(());
            }
            println!("{:6} {:30} {:10} {:20} OWNER", "ID", "TITLE", "OUTCOME", "CREATED");
            println!("{}", "-".repeat(80));
            for item in &view.items {
                let p = &item.prediction;
                println!(
                    "{:6} {:30} {:10} {:20} {}",
                    p.id,
                    p.title,
                    p.outcome_label(),
                    created(p),
                    p.owner.username
                );
            }
        }
        PredictionCommand::Show { id } => {
            let view = rendered(prediction_detail_view(session, id).await?)?;
            print_prediction(&view.prediction);
            if view.capabilities.can_delete() {
                println!("\nDelete with: loanscope predictions delete {}", id);
            }
        }
        PredictionCommand::New(args) => {
            let created = rendered(new_prediction_view(session, &args.into()).await?)?;
            println!("Prediction {} created.", created.id);
            print_prediction(&created);
        }
        PredictionCommand::Delete { id } => {
            let deleted = rendered(
                session
                    .gate()
                    .guard(Route::PredictionDetail(id), || session.delete_prediction(id))
                    .await?,
            )?;
            println!("Prediction {} deleted.", deleted.id);
        }
    }
    Ok(())
}

async fn cmd_users(session: &Session, cmd: UserCommand) -> Result<()> {
    match cmd {
        UserCommand::List => {
            let view = rendered(users_view(session).await?)?;
            println!("{:6} {:20} {:30} ROLE", "ID", "USERNAME", "NAME");
            println!("{}", "-".repeat(65));
            for item in &view.items {
                let u = &item.user;
                println!("{:6} {:20} {:30} {}", u.id, u.username, u.full_name(), u.role);
            }
        }
        UserCommand::Show { id } => {
            let view = rendered(user_profile_view(session, id).await?)?;
            print_user(&view.user);
            let caps = view.capabilities;
            let mut actions = Vec::new();
            if caps.can_edit() {
                actions.push("update");
            }
            if caps.can_change_role() {
                actions.push("role");
            }
            if caps.can_delete() {
                actions.push("delete");
            }
            if !actions.is_empty() {
                println!("\nActions: {}", actions.join(", "));
            }
        }
        UserCommand::Update { id, names } => {
            let draft = DraftBuffer::new(DraftTarget::User(id));
            let updated = rendered(
                session
                    .gate()
                    .guard(Route::UserDetail(id), || save_names(session, &draft, names))
                    .await?,
            )?;
            println!("User updated.");
            print_user(&updated);
        }
        UserCommand::Role { id, role } => {
            let updated = rendered(
                session
                    .gate()
                    .guard(Route::UserDetail(id), || session.change_role(id, role))
                    .await?,
            )?;
            println!("{} is now {}.", updated.username, updated.role);
        }
        UserCommand::Delete { id } => {
            let deleted = rendered(
                session
                    .gate()
                    .guard(Route::UserDetail(id), || session.delete_user(id))
                    .await?,
            )?;
            println!("User {} deleted.", deleted.username);
        }
    }
    Ok(())
}

async fn cmd_model(session: &Session) -> Result<()> {
    let view = rendered(model_view(session).await?)?;
    let m = &view.metrics;
    println!("Model:         logistic regression #{}", m.id);
    println!("Epochs:        {}", m.hyperparameters.epochs);
    println!("Learning rate: {}", m.hyperparameters.learning_rate);
    println!(
        "Split:         {:.0}% training / {:.0}% testing",
        m.split_ratios.training * 100.0,
        m.split_ratios.testing * 100.0
    );
    println!();
    println!("Accuracy:      {:.3}", m.metrics.accuracy);
    println!("Precision:     {:.3}", m.metrics.precision);
    println!("Recall:        {:.3}", m.metrics.recall);
    println!("F1 score:      {:.3}", m.metrics.f1_score);

    if !m.metrics.confusion_matrix.is_empty() {
        println!("\nConfusion matrix:");
        for row in &m.metrics.confusion_matrix {
            let cells: Vec<String> = row.iter().map(|c| format!("{:>8}", c)).collect();
            println!("  {}", cells.join(""));
        }
    }
    Ok(())
}

fn created(p: &Prediction) -> String {
    p.created_at
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_user(user: &User) {
    println!("ID:       {}", user.id);
    println!("Username: {}", user.username);
    println!("Name:     {}", user.full_name());
    println!("Role:     {}", user.role);
}

fn print_prediction(p: &Prediction) {
    let i = &p.inputs;
    println!("Prediction: {} ({})", p.id, p.title);
    println!("Outcome:    {}", p.outcome_label());
    println!("Created:    {}", created(p));
    println!("Owner:      {}", p.owner.username);
    println!("\nInputs:");
    println!("  {:26} {}", "Dependents", i.dependents);
    println!("  {:26} {}", "Graduate", i.education);
    println!("  {:26} {}", "Self employed", i.self_employed);
    println!("  {:26} {}", "Income", i.income);
    println!("  {:26} {}", "Loan amount", i.loan_amount);
    println!("  {:26} {}", "Loan term", i.loan_term);
    println!("  {:26} {}", "CIBIL score", i.credit_score);
    println!("  {:26} {}", "Residential assets", i.residential_assets_value);
    println!("  {:26} {}", "Commercial assets", i.commercial_assets_value);
    println!("  {:26} {}", "Luxury assets", i.luxury_assets_value);
    println!("  {:26} {}", "Bank assets", i.bank_asset_value);
}

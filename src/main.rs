use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use note_rbac::authz::{
    self, AuthzMode, CheckContext, Decision, DefaultPolicyEvaluator, Identifier, Outcome, PolicyEvaluator,
};
use note_rbac::AuthzError;

#[derive(Parser, Debug)]
#[command(author, version, about = "note-rbac permission checker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a permission check; exits with status 1 when denied
    Check(CheckArgs),
    /// Show which rule decided a permission check, as JSON
    Explain(CheckArgs),
    /// Apply the enforcement mode (AUTHZ_MODE or --mode) to a permission check
    Enforce {
        #[command(flatten)]
        check: CheckArgs,
        /// off, advisory or strict
        #[arg(long)]
        mode: Option<String>,
    },
    /// Print the policy table as JSON
    Policies,
}

impl Commands {
    fn check_args(&self) -> Option<&CheckArgs> {
        match self {
            Commands::Check(args) | Commands::Explain(args) | Commands::Enforce { check: args, .. } => Some(args),
            Commands::Policies => None,
        }
    }
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Role id (0, 1, 2) or name (baseline, employee, admin)
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    action: String,
    /// JSON context document; flags below override its fields
    #[arg(long)]
    context: Option<PathBuf>,
    #[arg(long)]
    user_id: Option<Identifier>,
    #[arg(long)]
    owner_id: Option<Identifier>,
    #[arg(long)]
    user_unit_id: Option<Identifier>,
    #[arg(long)]
    unit_id: Option<Identifier>,
    /// `--admin` alone means true; `--admin false` clears the document's flag
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    admin: Option<bool>,
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    private: Option<bool>,
}

impl CheckArgs {
    fn context(&self) -> anyhow::Result<CheckContext> {
        let mut ctx = match &self.context {
            Some(path) => authz::load_context(path)
                .with_context(|| format!("failed to load context from {}", path.display()))?,
            None => CheckContext::new(),
        };

        if let Some(id) = &self.user_id {
            ctx.user_id = Some(id.clone());
        }
        if let Some(id) = &self.owner_id {
            ctx.owner_id = Some(id.clone());
        }
        if let Some(id) = &self.user_unit_id {
            ctx.user_unit_id = Some(id.clone());
        }
        if let Some(id) = &self.unit_id {
            ctx.unit_id = Some(id.clone());
        }
        if let Some(flag) = self.admin {
            ctx.is_admin = Some(flag);
        }
        if let Some(flag) = self.private {
            ctx.is_private = Some(flag);
        }

        Ok(ctx)
    }

    fn decide(&self, ctx: &CheckContext) -> Decision {
        let decision = authz::evaluate_role_name(self.role.as_deref(), &self.action, ctx);
        if decision.outcome == Outcome::UnknownRole {
            tracing::warn!(role = ?self.role, "unrecognized role");
        }
        decision
    }
}

#[derive(Serialize)]
struct DecisionReport {
    #[serde(flatten)]
    decision: Decision,
    context: CheckContext,
    evaluated_at: DateTime<Utc>,
}

/// Text for stdout and the process exit status.
#[derive(Debug)]
struct CommandOutput {
    stdout: String,
    status: u8,
}

impl CommandOutput {
    fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            status: 0,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    load_env();
    init_tracing();

    let cli = Cli::parse();

    match run(cli, &DefaultPolicyEvaluator::new()).await {
        Ok(output) => {
            println!("{}", output.stdout);
            ExitCode::from(output.status)
        }
        Err(err) => match error_report(&err) {
            Some(report) => {
                eprintln!("{report}");
                ExitCode::from(2)
            }
            None => {
                eprintln!("Error: {err:?}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: Cli, evaluator: &dyn PolicyEvaluator) -> anyhow::Result<CommandOutput> {
    match cli.command {
        Commands::Check(args) => {
            let ctx = args.context()?;
            let decision = args.decide(&ctx);
            let allowed = match decision.outcome {
                Outcome::UnknownRole => false,
                _ => evaluator.can(decision.role, &args.action, &ctx).await,
            };
            Ok(if allowed {
                CommandOutput::ok("allowed")
            } else {
                CommandOutput {
                    stdout: "denied".to_string(),
                    status: 1,
                }
            })
        }
        Commands::Explain(args) => {
            let ctx = args.context()?;
            let report = DecisionReport {
                decision: args.decide(&ctx),
                context: ctx,
                evaluated_at: Utc::now(),
            };
            Ok(CommandOutput::ok(serde_json::to_string_pretty(&report)?))
        }
        Commands::Enforce { check, mode } => {
            let mode = match mode.as_deref() {
                Some(raw) => AuthzMode::try_parse(raw)?,
                None => AuthzMode::from_env(),
            };
            let ctx = check.context()?;
            authz::enforce_decision(mode, &check.decide(&ctx))?;
            Ok(CommandOutput::ok(format!("ok ({})", mode.as_str())))
        }
        Commands::Policies => Ok(CommandOutput::ok(serde_json::to_string_pretty(authz::rules())?)),
    }
}

/// JSON body printed to stderr when a command fails with an [`AuthzError`].
fn error_report(err: &anyhow::Error) -> Option<serde_json::Value> {
    let authz = err.downcast_ref::<AuthzError>()?;
    Some(json!({
        "error": authz.kind(),
        "message": format!("{err:#}"),
    }))
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

//! Cadence CLI — drive the workflow engine from the terminal.
//!
//! One subcommand per mode, plus the macro workflows, introspection, and
//! an embedded HTTP server. Mode subcommands can chain on each other's
//! saved outputs via `--from-last` so a pipeline can be walked across
//! separate invocations.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cadence CLI — policy-gated workflow engine
#[derive(Parser)]
#[command(name = "cadence", version, about = "Cadence CLI — policy-gated workflow engine")]
pub struct Cli {
    /// Path to the agent registry JSON file (built-in roster when unset)
    #[arg(long, env = "CADENCE_REGISTRY", global = true)]
    registry: Option<PathBuf>,

    /// Directory of per-mode config files (built-in defaults when unset)
    #[arg(long, env = "CADENCE_CONFIG_DIR", global = true)]
    config_dir: Option<PathBuf>,

    /// Policy document for the compliance guard
    #[arg(long, env = "CADENCE_POLICY", global = true)]
    policy: Option<PathBuf>,

    /// Directory where mode outputs are saved for chaining
    #[arg(long, env = "CADENCE_STATE_DIR", global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn a prompt into a vision document
    Ideate {
        /// The problem or product to envision
        prompt: String,
        /// Write the output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Turn a vision document into a technical specification
    Plan {
        /// Direct prompt, skipping the vision-document requirement
        #[arg(long)]
        prompt: Option<String>,
        /// Read the vision document from the last saved IDEATE output
        #[arg(long, visible_alias = "from-ideate", conflicts_with = "prompt")]
        from_last: bool,
        /// Read the vision document from a file
        #[arg(long, conflicts_with_all = ["prompt", "from_last"])]
        from_file: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Build, test, deploy and gate a working system
    Ship {
        /// Direct prompt, skipping the specification requirement
        #[arg(long)]
        prompt: Option<String>,
        /// Read the specification from the last saved PLAN output
        #[arg(long, visible_alias = "from-plan", conflicts_with = "prompt")]
        from_last: bool,
        /// Read the specification from a file
        #[arg(long, conflicts_with_all = ["prompt", "from_last"])]
        from_file: Option<PathBuf>,
        /// Speed profile: fast, balanced, or careful
        #[arg(long, default_value = "balanced")]
        speed: String,
        /// Production URL the deployment gates probe
        #[arg(long)]
        production_url: Option<String>,
        /// Build tree for the completeness gate
        #[arg(long)]
        artifact_dir: Option<String>,
        /// Shell command for the tests gate
        #[arg(long)]
        test_command: Option<String>,
        /// Skip the tests gate
        #[arg(long)]
        skip_tests: bool,
        /// Run VALIDATE on the shipped build immediately after
        #[arg(long)]
        validate: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Independently assess a shipped build
    Validate {
        /// Read the build output from the last saved SHIP output
        #[arg(long, visible_alias = "from-ship")]
        from_last: bool,
        /// Read the build output from a file
        #[arg(long, conflicts_with = "from_last")]
        from_file: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Full pipeline: IDEATE → PLAN → SHIP → VALIDATE
    Full { prompt: String },

    /// Rapid pipeline: IDEATE → SHIP → VALIDATE, skipping PLAN
    Rapid { prompt: String },

    /// Express pipeline: SHIP → VALIDATE from a prompt
    Express { prompt: String },

    /// Show engine status
    Status,

    /// Show workflow history
    History {
        /// Filter by mode
        #[arg(long)]
        mode: Option<String>,
    },

    /// Show the agent roster
    Agents,

    /// Start the Cadence HTTP backend server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3410)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence_core=warn,cadence_cli=info".into()),
        )
        .init();

    let ctx = commands::Context {
        registry: cli.registry,
        config_dir: cli.config_dir,
        policy: cli.policy,
        state_dir: cli.state_dir,
    };

    let result = match cli.command {
        Commands::Ideate { prompt, output } => commands::mode::ideate(&ctx, &prompt, output).await,

        Commands::Plan {
            prompt,
            from_last,
            from_file,
            output,
        } => commands::mode::plan(&ctx, prompt, from_last, from_file, output).await,

        Commands::Ship {
            prompt,
            from_last,
            from_file,
            speed,
            production_url,
            artifact_dir,
            test_command,
            skip_tests,
            validate,
            output,
        } => {
            commands::mode::ship(
                &ctx,
                commands::mode::ShipArgs {
                    prompt,
                    from_last,
                    from_file,
                    speed,
                    production_url,
                    artifact_dir,
                    test_command,
                    skip_tests,
                    validate,
                    output,
                },
            )
            .await
        }

        Commands::Validate {
            from_last,
            from_file,
            output,
        } => commands::mode::validate(&ctx, from_last, from_file, output).await,

        Commands::Full { prompt } => commands::workflow::run(&ctx, "full", &prompt).await,
        Commands::Rapid { prompt } => commands::workflow::run(&ctx, "rapid", &prompt).await,
        Commands::Express { prompt } => commands::workflow::run(&ctx, "express", &prompt).await,

        Commands::Status => commands::status::status(&ctx).await,
        Commands::History { mode } => commands::status::history(&ctx, mode.as_deref()).await,
        Commands::Agents => commands::status::agents(&ctx).await,

        Commands::Serve { host, port } => commands::server::run(&ctx, host, port).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "scaffolder")]
#[command(about = "Plan, generate and validate a multi-file project with a language model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, default_value = ".", help = "Directory holding scaffolder.yml, the project and checkpoints")]
    workspace: PathBuf,

    #[arg(long, global = true, help = "Enable verbose debug output")]
    verbose: bool,

    #[arg(long, global = true, help = "Show what would happen without calling the model or writing files")]
    dry_run: bool,

    #[arg(long, global = true, help = "Reuse cached model responses for identical prompts")]
    cache: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Ask the model for a project manifest")]
    Plan {
        #[arg(help = "What the project should do")]
        instruction: String,

        #[arg(long, default_value = "Flask", help = "Target framework, e.g. Gradio, Flask, Streamlit, Django, React")]
        framework: String,
    },

    #[command(about = "Generate every file in the saved manifest")]
    Build,

    #[command(about = "Check that every manifest entry exists on disk")]
    Validate,

    #[command(about = "Plan, build and validate in one go")]
    Run {
        #[arg(help = "What the project should do")]
        instruction: String,

        #[arg(long, default_value = "Flask", help = "Target framework, e.g. Gradio, Flask, Streamlit, Django, React")]
        framework: String,
    },

    #[command(about = "List generated files, or print one of them")]
    Explore {
        #[arg(help = "File to print, relative to the project root")]
        path: Option<String>,
    },

    #[command(about = "Remove the generated project and all checkpoints")]
    Clean,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "scaffolder=debug" } else { "scaffolder=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn load_env(workspace: &std::path::Path) {
    match scaffolder::config::load_dotenv(workspace) {
        Ok(Some(path)) => debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Ignoring .env file: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    load_env(&cli.workspace);

    let config = cli::Config {
        workspace: cli.workspace,
        verbose: cli.verbose,
        dry_run: cli.dry_run,
        cache: cli.cache,
    };

    match cli.command {
        Commands::Plan {
            instruction,
            framework,
        } => {
            cli::plan(instruction, framework, &config).await?;
        }
        Commands::Build => {
            cli::build(&config).await?;
        }
        Commands::Validate => {
            cli::validate(&config).await?;
        }
        Commands::Run {
            instruction,
            framework,
        } => {
            cli::run(instruction, framework, &config).await?;
        }
        Commands::Explore { path } => {
            cli::explore(path, &config).await?;
        }
        Commands::Clean => {
            cli::clean(&config).await?;
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use test_case_generator::commands::{
    batch_generate, generate_test_cases, run_setup, show_examples, GenerateRequest,
};
use test_case_generator::config::{Settings, ENV_FILE};
use test_case_generator::error::codes;
use test_case_generator::generator::GenerateOptions;
use test_case_generator::utils::display::{print_error, print_info};
use test_case_generator::GeneratorError;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Generate comprehensive test cases from user stories using AI.
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive setup to configure your API key
    Setup,
    /// Generate test cases from a user story
    Generate {
        /// The user story, e.g. "As a user, I want to login..."
        user_story: String,

        /// Number of test cases to generate
        #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,

        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,

        /// Save to file (.md, .json or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Focus areas (e.g. -f security -f performance)
        #[arg(short, long)]
        focus: Vec<String>,

        /// Fail when any returned test case is incomplete instead of dropping it
        #[arg(long)]
        strict: bool,
    },
    /// Generate test cases for every user story in a file (one per line)
    Batch {
        /// Text file with one user story per line
        file: PathBuf,

        /// Number of test cases per story
        #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,

        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,

        /// Output directory for generated tests
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Focus areas applied to every story
        #[arg(short, long)]
        focus: Vec<String>,

        /// Fail a story when any returned test case is incomplete
        #[arg(long)]
        strict: bool,
    },
    /// Show example user stories and commands
    Examples,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("test_case_generator=debug,warn")
        } else {
            EnvFilter::new("test_case_generator=info,warn")
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn load_settings(config: Option<&PathBuf>, model: Option<String>) -> Result<Settings, GeneratorError> {
    let mut settings = Settings::load(config.map(PathBuf::as_path))?;
    if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
        settings.model = model.trim().to_string();
    }
    Ok(settings)
}

fn run(cli: Cli) -> Result<i32, GeneratorError> {
    match cli.command {
        Commands::Setup => {
            run_setup(&PathBuf::from(ENV_FILE))?;
            Ok(codes::SUCCESS)
        }
        Commands::Examples => {
            show_examples();
            Ok(codes::SUCCESS)
        }
        Commands::Generate {
            user_story,
            count,
            model,
            output,
            focus,
            strict,
        } => {
            let settings = load_settings(cli.config.as_ref(), model)?;
            let request = GenerateRequest {
                user_story,
                options: GenerateOptions {
                    count,
                    focus_areas: focus,
                    strict,
                },
                output,
            };
            generate_test_cases(&settings, &request)?;
            Ok(codes::SUCCESS)
        }
        Commands::Batch {
            file,
            count,
            model,
            output_dir,
            focus,
            strict,
        } => {
            let settings = load_settings(cli.config.as_ref(), model)?;
            let options = GenerateOptions {
                count,
                focus_areas: focus,
                strict,
            };
            let report = batch_generate(&settings, &file, &output_dir, &options)?;
            if report.failed() > 0 {
                Ok(codes::PARTIAL_FAILURE)
            } else {
                Ok(codes::SUCCESS)
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            print_error(&e.to_string());
            if let Some(raw) = e.raw_preview() {
                eprintln!("\nRaw response:\n{}", raw);
            }
            if let GeneratorError::Auth(_) = e {
                print_info("Run `test_case_generator setup` or set OPENAI_API_KEY in a .env file");
            }
            e.exit_code()
        }
    };
    process::exit(code);
}

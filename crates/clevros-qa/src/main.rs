use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clevros_eval::{Ontology, DEFAULT_STEP_LIMIT};
use clevros_qa::{load_scene, run, Dataset, QaError, QaResult, RunConfig};

/// CLEVROS - answer CLEVR questions by evaluating logical forms
#[derive(Parser, Debug)]
#[command(name = "clevros", version)]
#[command(about = "Evaluate CLEVR logical forms against scenes", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate every question's program and report exact-match statistics
    Run {
        /// CLEVR scenes file, sorted by image_index
        #[arg(long)]
        scenes: PathBuf,

        /// Questions file with `program_sexpr` entries
        #[arg(long)]
        questions: PathBuf,

        /// Stop after this many questions
        #[arg(long)]
        limit: Option<usize>,

        /// Step budget for each evaluation
        #[arg(long, default_value_t = DEFAULT_STEP_LIMIT)]
        step_limit: u64,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Evaluate one logical form against one scene
    Eval {
        /// CLEVR scenes file
        #[arg(long)]
        scenes: PathBuf,

        /// Scene to evaluate against
        #[arg(long)]
        image_index: usize,

        /// Logical form, e.g. "(count (filter_shape scene cube))"
        expression: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    use tracing_subscriber::{fmt, EnvFilter};

    // CLEVROS_LOG, then RUST_LOG, then warn.
    let filter = EnvFilter::try_from_env("CLEVROS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match execute(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Command) -> QaResult<()> {
    let ontology = Ontology::clevr().shared();
    match command {
        Command::Run {
            scenes,
            questions,
            limit,
            step_limit,
            json,
        } => {
            let dataset = Dataset::load(&scenes, &questions, ontology)?;
            let summary = run(&dataset, &RunConfig { limit, step_limit });
            if json {
                let out = serde_json::to_string_pretty(&summary).map_err(|source| QaError::Json {
                    what: "run summary".into(),
                    source,
                })?;
                println!("{out}");
            } else {
                println!("{summary}");
            }
        }
        Command::Eval {
            scenes,
            image_index,
            expression,
        } => {
            let scene = load_scene(&scenes, image_index, ontology)?;
            let answer = scene.evaluate_str(&expression)?;
            println!("{answer}");
        }
    }
    Ok(())
}

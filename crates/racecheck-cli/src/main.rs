use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use racecheck_harness::{HarnessError, Verifier, DEFECT_EXIT_CODE};
use racecheck_scenarios::{RunConfig, Scenario};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "racecheck", version, about = "Race detector regression harness")]
struct Cli {
    /// Tracing filter, e.g. "info" or "racecheck_harness=debug".
    #[arg(long, global = true, default_value = "warn")]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Child entry point: run one scenario to completion in this process.
    Run {
        entry: String,
        /// Enable detector reporting. Instrumentation itself is a build
        /// property; the flag keeps the launch contract explicit.
        #[arg(long)]
        detect: bool,
        /// Allocation volume for the alloc-churn scenario, in MiB.
        #[arg(long, default_value_t = 32)]
        churn_mb: u64,
    },
    /// Launch one scenario in an isolated child process and classify the
    /// captured result against its registered expectation.
    Check {
        entry: String,
        #[arg(long)]
        json: bool,
    },
    /// List registered scenarios.
    List {
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            entry,
            detect,
            churn_mb,
        } => run_child(&entry, detect, churn_mb),
        Commands::Check { entry, json } => check(&entry, json),
        Commands::List { json } => {
            list(json);
            Ok(())
        }
    }
}

fn run_child(entry: &str, detect: bool, churn_mb: u64) -> Result<()> {
    let scenario = find(entry)?;
    if detect {
        tracing::debug!(entry, "detector reporting requested for this run");
    }
    let config = RunConfig { churn_mb };
    match (scenario.run)(&config) {
        Ok(()) => Ok(()),
        Err(err) => {
            // An operation failure is a scenario bug. Hard-fail with the
            // distinguished status so it cannot read as "no race found".
            eprintln!("scenario defect in '{}': {err:#}", scenario.name);
            std::process::exit(DEFECT_EXIT_CODE);
        }
    }
}

fn check(entry: &str, json: bool) -> Result<()> {
    let scenario = find(entry)?;
    let program = std::env::current_exe()?;
    let verifier = Verifier::new(program);

    let result = match verifier.run(scenario.name, scenario.extra_flags) {
        Ok(result) => result,
        Err(err) => {
            // Launch failure is an environment problem, not a test verdict.
            if json {
                emit_json(&json_error("infrastructure_failure", err.to_string()));
            } else {
                eprintln!("infrastructure failure: {err:#}");
            }
            std::process::exit(2);
        }
    };

    match result.classify(&scenario.expected_outcome()) {
        Ok(()) => {
            if json {
                emit_json(&json!({
                    "ok": true,
                    "scenario": scenario.name,
                    "discipline": scenario.discipline.as_str(),
                    "expect": scenario.expect.as_str(),
                    "exit_code": result.exit_code,
                }));
            } else {
                println!("PASS {} ({})", scenario.name, scenario.expect.as_str());
            }
            Ok(())
        }
        Err(err) => {
            let code = match &err {
                HarnessError::Mismatch { .. } => 1,
                _ => 2,
            };
            if json {
                emit_json(&json_error("classification_mismatch", err.to_string()));
            } else {
                eprintln!("FAIL {}: {err:#}", scenario.name);
            }
            std::process::exit(code);
        }
    }
}

fn list(json: bool) {
    if json {
        let entries: Vec<Value> = racecheck_scenarios::all()
            .iter()
            .map(|s| {
                json!({
                    "name": s.name,
                    "summary": s.summary,
                    "discipline": s.discipline.as_str(),
                    "expect": s.expect.as_str(),
                    "extra_flags": s.extra_flags,
                })
            })
            .collect();
        emit_json(&json!({ "ok": true, "scenarios": entries }));
        return;
    }
    for s in racecheck_scenarios::all() {
        println!(
            "{:<22} {:<19} {:<8} {}",
            s.name,
            s.discipline.as_str(),
            s.expect.as_str(),
            s.summary
        );
    }
}

fn find(entry: &str) -> Result<&'static Scenario> {
    racecheck_scenarios::find(entry)
        .ok_or_else(|| anyhow!("unknown scenario entry point: {entry} (try 'racecheck list')"))
}

fn emit_json(value: &Value) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{s}"),
        Err(_) => println!(
            "{{\"ok\":false,\"error\":{{\"code\":\"serialization_error\",\"message\":\"failed to serialize JSON payload\"}}}}"
        ),
    }
}

fn json_error(code: &str, message: String) -> Value {
    json!({
        "ok": false,
        "error": { "code": code, "message": message }
    })
}

use chrono::Utc;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::collections::BTreeMap;
use std::error::Error;
use std::process::ExitCode;
use subnet_trainer::api;
use subnet_trainer::output;
use subnet_trainer::processing::RequirementKind;
use subnet_trainer::{Config, Difficulty, ExerciseKind, SubnetError};

#[derive(Parser)]
#[command(name = "subnet-trainer")]
#[command(version)]
#[command(about = "IPv4 subnetting calculator and practice problems")]
struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Network, mask, broadcast and host range of a CIDR block
    Info { cidr: String },

    /// Divide a classful A/B/C network into equal subnets
    Classful {
        /// Network address under the class default mask
        ip: String,
        #[arg(long, conflicts_with = "hosts", required_unless_present = "hosts")]
        subnets: Option<u32>,
        #[arg(long)]
        hosts: Option<u32>,
        /// Count the zero and all-ones subnets as usable
        #[arg(long)]
        modern: bool,
        /// List at most this many subnets
        #[arg(long)]
        max_listed: Option<usize>,
    },

    /// Allocate named host requirements with VLSM, largest first
    Vlsm {
        cidr: String,
        #[arg(required = true, value_name = "NAME:HOSTS")]
        requirements: Vec<String>,
    },

    /// Smallest route covering addresses or CIDR blocks
    Summary {
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Generate a practice problem
    Exercise {
        /// identify-network, classful-legacy, calculate-mask, summarization, next-network, vlsm-scenario
        kind: ExerciseKind,
        #[arg(long, short, default_value = "easy")]
        difficulty: Difficulty,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        max_attempts: Option<u32>,
        /// Show the solution and the working
        #[arg(long)]
        solution: bool,
        /// Check an answer, e.g. --answer network=192.168.1.64
        #[arg(long = "answer", value_name = "FIELD=VALUE")]
        answers: Vec<String>,
    },
}

fn init_logging() {
    if log4rs::init_file("log4rs.yml", Default::default()).is_ok() {
        return;
    }
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn));
    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("Error initializing logging: {e}");
            }
        }
        Err(e) => eprintln!("Error building logging config: {e}"),
    }
}

/// Print a calculator failure in the selected format.
fn report_error(error: &SubnetError, json: bool) -> ExitCode {
    if json {
        println!("{}", output::to_pretty(&output::error_envelope(error)));
    } else {
        eprintln!("{}", output::render_error(error));
    }
    ExitCode::FAILURE
}

fn parse_answers(raw: &[String]) -> Result<BTreeMap<String, String>, SubnetError> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| SubnetError::InvalidFormat {
                    input: pair.clone(),
                    expected: "answer (field=value)".to_string(),
                })
        })
        .collect()
}

fn run(cli: Cli, mut config: Config) -> Result<ExitCode, Box<dyn Error>> {
    let json = cli.json;
    match cli.command {
        Command::Info { cidr } => match api::network_info(&cidr) {
            Ok(details) if json => {
                println!("{}", output::to_pretty(&serde_json::to_value(&details)?))
            }
            Ok(details) => print!("{}", output::render_details(&details)),
            Err(e) => return Ok(report_error(&e, json)),
        },

        Command::Classful {
            ip,
            subnets,
            hosts,
            modern,
            max_listed,
        } => {
            if modern {
                config.legacy_reserved_subnets = false;
            }
            if let Some(max) = max_listed {
                config.max_listed_subnets = max;
            }
            let (kind, value) = match (subnets, hosts) {
                (Some(n), _) => (RequirementKind::Subnets, n),
                (None, Some(n)) => (RequirementKind::Hosts, n),
                (None, None) => return Err("either --subnets or --hosts is required".into()),
            };
            let result = api::calculate_classful(&ip, kind, value, &config.policy());
            if json {
                println!("{}", output::to_pretty(&output::classful_envelope(&result)));
                if result.is_err() {
                    return Ok(ExitCode::FAILURE);
                }
            } else {
                match &result {
                    Ok(r) => print!("{}", output::render_classful(r)),
                    Err(e) => return Ok(report_error(e, json)),
                }
            }
        }

        Command::Vlsm { cidr, requirements } => {
            let parsed: Result<Vec<_>, _> = requirements
                .iter()
                .map(|r| api::parse_vlsm_requirement(r))
                .collect();
            let result = parsed.and_then(|reqs| api::calculate_vlsm(&cidr, &reqs));
            if json {
                println!("{}", output::to_pretty(&output::vlsm_envelope(&result)));
                if result.is_err() {
                    return Ok(ExitCode::FAILURE);
                }
            } else {
                match &result {
                    Ok(r) => print!("{}", output::render_vlsm(r)),
                    Err(e) => return Ok(report_error(e, json)),
                }
            }
        }

        Command::Summary { inputs } => {
            let route = api::find_summary_route(&inputs);
            let efficiency = if inputs.iter().all(|i| i.contains('/')) {
                api::summarize_networks(&inputs)
                    .ok()
                    .flatten()
                    .map(|(_, efficiency)| efficiency)
            } else {
                None
            };
            if json {
                let value = output::summary_envelope(&route, efficiency.as_ref());
                println!("{}", output::to_pretty(&value));
            } else {
                match &route {
                    Ok(Some(r)) => print!("{}", output::render_summary(r, efficiency.as_ref())),
                    Ok(None) => println!("no addresses given"),
                    Err(e) => return Ok(report_error(e, json)),
                }
            }
            if route.is_err() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::Exercise {
            kind,
            difficulty,
            seed,
            max_attempts,
            solution,
            answers,
        } => {
            if seed.is_some() {
                config.seed = seed;
            }
            if let Some(max) = max_attempts {
                config.max_attempts = max.max(1);
            }
            let answers = match parse_answers(&answers) {
                Ok(a) => a,
                Err(e) => return Ok(report_error(&e, json)),
            };
            let problem = api::generate_exercise(kind, difficulty, &config);
            if json {
                let mut value = output::exercise_envelope(&problem, Utc::now());
                if !answers.is_empty() {
                    value["report"] = serde_json::to_value(problem.check_answers(&answers))?;
                }
                println!("{}", output::to_pretty(&value));
            } else {
                print!("{}", output::render_exercise(&problem, solution));
                if !answers.is_empty() {
                    print!("{}", output::render_report(&problem.check_answers(&answers)));
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    // Do as little as possible in main.rs as it can't contain any tests
    init_logging();
    let config = Config::from_env();
    log::info!("#Start main() {config:?}");

    let cli = Cli::parse();
    match run(cli, config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

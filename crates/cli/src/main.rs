use anyhow::{bail, Context};
use charsheet_core::{format_hundredths, Calculation, RulesConfig};
use charsheet_data::{
    compile_activation, compile_effect, load_rules_config, load_scenario, SourceLocation,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CHARSHEET_LOG";

const USAGE: &str = "usage:
  charsheet effect \"<KEY time op operand>\"
  charsheet activation \"<KEY cmp operand>\"
  charsheet eval <scenario.json> [--rules <rules.json>] [--trace]
  charsheet level <scenario.json> <class level>";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Effect(String),
    Activation(String),
    Eval {
        scenario: PathBuf,
        rules: Option<PathBuf>,
        trace: bool,
    },
    Level {
        scenario: PathBuf,
        class_level: u32,
    },
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    let Some(name) = args.first() else {
        bail!("missing command");
    };
    match name.as_str() {
        "effect" | "activation" => {
            let text = args
                .get(1)
                .cloned()
                .with_context(|| format!("{name} needs an expression"))?;
            Ok(if name == "effect" {
                Command::Effect(text)
            } else {
                Command::Activation(text)
            })
        }
        "eval" => {
            let mut scenario = None;
            let mut rules = None;
            let mut trace = false;
            let mut idx = 1usize;
            while idx < args.len() {
                match args[idx].as_str() {
                    "--trace" => trace = true,
                    "--rules" => {
                        let value = args.get(idx + 1).context("--rules needs a path")?;
                        rules = Some(PathBuf::from(value));
                        idx += 1;
                    }
                    other if scenario.is_none() => scenario = Some(PathBuf::from(other)),
                    other => bail!("unexpected argument '{other}'"),
                }
                idx += 1;
            }
            Ok(Command::Eval {
                scenario: scenario.context("eval needs a scenario file")?,
                rules,
                trace,
            })
        }
        "level" => {
            let scenario = args.get(1).context("level needs a scenario file")?;
            let level = args.get(2).context("level needs a class level")?;
            let class_level = level
                .parse::<u32>()
                .with_context(|| format!("invalid class level '{level}'"))?;
            Ok(Command::Level {
                scenario: PathBuf::from(scenario),
                class_level,
            })
        }
        other => bail!("unknown command '{other}'"),
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    let location = SourceLocation::file("<command line>");
    match command {
        Command::Effect(text) => {
            let effect = compile_effect(&text, &location)?;
            println!("{effect}");
        }
        Command::Activation(text) => {
            let activation = compile_activation(&text, &location)?;
            println!("{activation}");
        }
        Command::Eval {
            scenario,
            rules,
            trace,
        } => {
            let rules = match rules {
                Some(path) => load_rules_config(&path)?,
                None => RulesConfig::default(),
            };
            let scenario = load_scenario(&scenario)?;
            let mut calculation =
                Calculation::new(&rules, scenario.initial_attributes(&rules), &scenario.constants);
            if trace {
                calculation = calculation.with_trace();
            }
            calculation.select(&scenario.sources)?;
            tracing::info!(active = calculation.active_count(), "evaluating");
            let report = calculation.run()?;
            for step in &report.trace {
                println!(
                    "[{}] {:<24} {}: {} -> {}",
                    step.phase,
                    step.label,
                    step.effect,
                    format_hundredths(step.before),
                    format_hundredths(step.after)
                );
            }
            println!("{}", serde_json::to_string_pretty(&report.attributes)?);
        }
        Command::Level {
            scenario,
            class_level,
        } => {
            let scenario = load_scenario(&scenario)?;
            for source in &scenario.sources {
                println!(
                    "{}: {}",
                    source.label,
                    availability(source.holder.is_active_at_level(class_level))
                );
                for (idx, part) in source.parts.iter().enumerate() {
                    println!(
                        "  {}[{}]: {}",
                        source.label,
                        idx,
                        availability(part.is_active_at_level(class_level))
                    );
                }
            }
        }
    }
    Ok(())
}

fn availability(active: bool) -> &'static str {
    if active {
        "available"
    } else {
        "unavailable"
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    setup_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}\n\n{USAGE}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(command) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

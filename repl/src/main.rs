mod error;
mod repl;

use crate::error::CliError;
use crate::repl::Repl;
use anyhow::Context;
use colored::Colorize;
use pairgc_core::gc::GcConfig;
use pairgc_core::interpreter::Interpreter;
use pairgc_core::vm::Vm;
use std::env;
use std::fs;
use tracing::Level;

/// What the command line asked for
#[derive(Debug, PartialEq, Eq)]
enum Mode {
    Repl,
    Demo,
    File(String),
    Help,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (mode, config) = parse_args(&args)?;

    match mode {
        Mode::Repl => Repl::new(config).run(),
        Mode::Demo => run_demo(config),
        Mode::File(filename) => run_file(&filename, config),
        Mode::Help => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("Usage: pairgc [options] [filename|demo]");
    println!("       pairgc                      # Run in REPL mode");
    println!("       pairgc demo                 # Run the built-in demonstration");
    println!("Options:");
    println!("  --stack-max <n>       root stack capacity (default 256)");
    println!("  --threshold <n>       objects before the first collection (default 16)");
    println!("  --min-threshold <n>   floor for the adaptive threshold (default 0)");
}

fn parse_args(args: &[String]) -> error::Result<(Mode, GcConfig)> {
    let mut config = GcConfig::default();
    let mut mode = Mode::Repl;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => mode = Mode::Help,
            "--stack-max" => config.stack_max = flag_value(arg, iter.next())?,
            "--threshold" => config.initial_threshold = flag_value(arg, iter.next())?,
            "--min-threshold" => config.min_threshold = flag_value(arg, iter.next())?,
            flag if flag.starts_with("--") => {
                return Err(CliError::UnknownFlag(flag.to_string()));
            }
            positional => {
                if mode != Mode::Repl {
                    return Err(CliError::UnexpectedArgument(positional.to_string()));
                }
                mode = match positional {
                    "demo" => Mode::Demo,
                    file => Mode::File(file.to_string()),
                };
            }
        }
    }

    Ok((mode, config))
}

fn flag_value(flag: &str, value: Option<&String>) -> error::Result<usize> {
    let value = value.ok_or_else(|| CliError::MissingValue(flag.to_string()))?;
    value.parse().map_err(|_| CliError::InvalidNumber {
        flag: flag.to_string(),
        value: value.clone(),
    })
}

fn run_file(filename: &str, config: GcConfig) -> anyhow::Result<()> {
    let _span = tracing::span!(Level::TRACE, "run_file", filename = filename).entered();
    tracing::info!(
        "{} {}",
        "Running file:".bright_green(),
        filename.italic().yellow()
    );

    let source = fs::read_to_string(filename)
        .with_context(|| format!("Error reading file: {}", filename))?;

    let mut interpreter = Interpreter::with_config(config);
    match interpreter.interpret(&source) {
        Ok(output) => {
            for line in output {
                println!("{}", line);
            }
        }
        Err(e) => {
            tracing::error!("{}", e);
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    let vm = interpreter.vm();
    tracing::event!(
        Level::INFO,
        "{} stack depth {}, {} live objects, threshold {}",
        "Execution complete:".bright_blue(),
        vm.stack_depth(),
        vm.live_object_count(),
        vm.current_threshold()
    );
    Ok(())
}

fn report(vm: &Vm) {
    println!(
        "There are now {} objects on the stack and {} objects allocated.",
        vm.stack_depth(),
        vm.live_object_count()
    );
}

/// Build two nested pairs, drop the only root and collect everything.
fn run_demo(config: GcConfig) -> anyhow::Result<()> {
    let mut vm = Vm::with_config(config);

    for value in 0..3 {
        println!("Pushing integer {} onto the stack.", value);
        vm.push_scalar(value)?;
    }

    println!("Pushing a pair built from the top two entries.");
    vm.push_pair()?;
    println!("Pushing a pair built from the remaining integer and the first pair.");
    let pair = vm.push_pair()?;
    if let Some(rendered) = vm.render(pair) {
        println!("Top of stack: {}", rendered.yellow());
    }
    report(&vm);

    println!("Popping the last pair, so nothing is rooted any more.");
    vm.pop()?;
    report(&vm);

    println!("Running a collection (should free everything).");
    let result = vm.collect();
    report(&vm);
    println!(
        "Collected {} objects; next collection at {} objects.",
        result.objects_collected, result.threshold_after
    );

    Ok(())
}

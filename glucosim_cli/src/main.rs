use clap::{Parser, Subcommand};
use glucosim_core::analysis::{load_simulations, summarize, write_report};
use glucosim_core::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "glucosim")]
#[command(about = "Educational blood glucose simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override export directory
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate glucose once and optionally export the result
    Simulate {
        /// Carbohydrate intake in grams
        #[arg(long, value_parser = non_negative)]
        carbs: f64,

        /// Minutes spent walking
        #[arg(long, value_parser = non_negative)]
        walk: f64,

        /// Hours of sleep
        #[arg(long, value_parser = non_negative)]
        sleep: f64,

        /// Export the result as CSV
        #[arg(long)]
        csv: bool,

        /// Export the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate and export interactively (default)
    Interactive {
        /// Skip the initial simulation with the configured defaults
        #[arg(long)]
        no_initial: bool,
    },

    /// Save the offline analysis script
    Script {
        /// Print the script instead of writing it
        #[arg(long)]
        stdout: bool,
    },

    /// Summarize a folder of exported CSVs into an HTML report
    Analyze {
        /// Folder containing simulation CSV exports
        dir: PathBuf,
    },

    /// Show the config file location, optionally writing the defaults
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn non_negative(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a number", s))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("`{}` must be a non-negative number", s))
    }
}

fn main() -> Result<()> {
    // Initialize logging; warnings only unless RUST_LOG says otherwise
    glucosim_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let out_dir = cli
        .out_dir
        .unwrap_or_else(|| config.export.out_dir.clone());
    let zone = config.display_zone();
    tracing::debug!("Export directory: {:?}, display zone: {:?}", out_dir, zone);

    match cli.command {
        Some(Commands::Simulate {
            carbs,
            walk,
            sleep,
            csv,
            json,
        }) => cmd_simulate(
            SimulationInput::new(carbs, walk, sleep),
            csv,
            json,
            &out_dir,
            zone,
        ),
        Some(Commands::Interactive { no_initial }) => {
            cmd_interactive(&config, no_initial, &out_dir, zone)
        }
        Some(Commands::Script { stdout }) => cmd_script(stdout, &out_dir),
        Some(Commands::Analyze { dir }) => cmd_analyze(&dir, &out_dir, zone),
        Some(Commands::Config { init }) => cmd_config(init, &config),
        None => {
            // Default to interactive mode
            cmd_interactive(&config, false, &out_dir, zone)
        }
    }
}

fn cmd_simulate(
    input: SimulationInput,
    csv: bool,
    json: bool,
    out_dir: &Path,
    zone: DisplayZone,
) -> Result<()> {
    let mut simulator = Simulator::new();
    display_result(simulator.simulate(input));

    if csv {
        export_and_report(&simulator, ExportFormat::Csv, out_dir, zone)?;
    }
    if json {
        export_and_report(&simulator, ExportFormat::Json, out_dir, zone)?;
    }

    Ok(())
}

fn cmd_interactive(
    config: &Config,
    no_initial: bool,
    out_dir: &Path,
    zone: DisplayZone,
) -> Result<()> {
    let mut simulator = Simulator::new();

    if !no_initial {
        display_result(simulator.simulate(config.defaults.input()));
    }

    print_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break, // EOF
        };

        match parse_command(&line) {
            ReplCommand::Simulate(input) => display_result(simulator.simulate(input)),
            ReplCommand::Export(format) => {
                export_and_report(&simulator, format, out_dir, zone)?;
            }
            ReplCommand::Help => print_help(),
            ReplCommand::Quit => break,
            ReplCommand::Empty => {}
            ReplCommand::Invalid(message) => println!("  {}", message),
        }
    }

    println!();
    Ok(())
}

fn cmd_script(stdout: bool, out_dir: &Path) -> Result<()> {
    if stdout {
        print!("{}", glucosim_core::script::ANALYSIS_SCRIPT);
        return Ok(());
    }

    let path = glucosim_core::script::write_script(out_dir)?;
    println!("✓ Analysis script saved: {}", path.display());
    println!();
    println!("  1. Export your simulations as CSV into one folder");
    println!("  2. pip install pandas matplotlib seaborn jinja2");
    println!("  3. python {} /your/csv/folder/", path.display());
    Ok(())
}

fn cmd_analyze(dir: &Path, out_dir: &Path, zone: DisplayZone) -> Result<()> {
    println!("Analyzing files in: {}", dir.display());

    let records = load_simulations(dir)?;
    let summary = summarize(&records)?;
    let path = write_report(&summary, out_dir, chrono::Utc::now(), zone)?;

    println!("✓ Report written: {}", path.display());
    println!("  Average glucose: {:.1} mg/dL", summary.mean_glucose);
    println!("  {} simulations analyzed", summary.count);
    println!("  Overall status: {}", summary.status.label());
    Ok(())
}

fn cmd_config(init: bool, config: &Config) -> Result<()> {
    let path = Config::default_config_path();
    println!("Config file: {}", path.display());

    if init {
        if path.exists() {
            println!("  Already exists, leaving it untouched.");
        } else {
            config.save_to(&path)?;
            println!("✓ Wrote default configuration");
        }
    }

    println!("Export directory: {}", config.export.out_dir.display());
    Ok(())
}

fn export_and_report(
    simulator: &Simulator,
    format: ExportFormat,
    out_dir: &Path,
    zone: DisplayZone,
) -> Result<()> {
    match simulator.export(format, out_dir, zone)? {
        Some(path) => println!("✓ Exported: {}", path.display()),
        None => println!("  Nothing to export yet - run a simulation first."),
    }
    Ok(())
}

fn display_result(result: &SimulationResult) {
    let input = &result.inputs;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  ESTIMATED GLUCOSE: {} mg/dL ({})", result.glucose, result.band().label());
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  Carbs {} g · Walk {} min · Sleep {} h",
        glucosim_core::format::format_number(input.carbs_grams),
        glucosim_core::format::format_number(input.walk_minutes),
        glucosim_core::format::format_number(input.sleep_hours)
    );
    println!("  Carbs effect: {} mg/dL", result.carbs_effect_text());
    println!("  Walk effect:  {} mg/dL", result.walk_effect_text());
    println!("  Sleep effect: {}", result.sleep_note);
    println!();

    for advice in recommendations(result) {
        println!("  {}", advice);
    }

    println!();
}

fn print_help() {
    println!("─────────────────────────────────────────");
    println!("  s <carbs> <walk> <sleep>  simulate");
    println!("  c                         export CSV");
    println!("  j                         export JSON");
    println!("  h                         help");
    println!("  q                         quit");
}

#[derive(Debug, PartialEq)]
enum ReplCommand {
    Simulate(SimulationInput),
    Export(ExportFormat),
    Help,
    Quit,
    Empty,
    Invalid(String),
}

fn parse_command(line: &str) -> ReplCommand {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return ReplCommand::Empty;
    };

    match command.to_lowercase().as_str() {
        "s" | "simulate" => {
            let values: std::result::Result<Vec<f64>, String> = parts.map(non_negative).collect();
            match values {
                Ok(values) if values.len() == 3 => {
                    ReplCommand::Simulate(SimulationInput::new(values[0], values[1], values[2]))
                }
                Ok(_) => ReplCommand::Invalid("Usage: s <carbs> <walk> <sleep>".into()),
                Err(message) => ReplCommand::Invalid(message),
            }
        }
        "c" | "csv" => ReplCommand::Export(ExportFormat::Csv),
        "j" | "json" => ReplCommand::Export(ExportFormat::Json),
        "h" | "help" | "?" => ReplCommand::Help,
        "q" | "quit" | "exit" => ReplCommand::Quit,
        other => ReplCommand::Invalid(format!("Unknown command: {} (h for help)", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simulate() {
        assert_eq!(
            parse_command("s 50 20 7.5"),
            ReplCommand::Simulate(SimulationInput::new(50.0, 20.0, 7.5))
        );
        assert!(matches!(parse_command("s 50 20"), ReplCommand::Invalid(_)));
        assert!(matches!(parse_command("s 50 -1 7"), ReplCommand::Invalid(_)));
        assert!(matches!(parse_command("s a b c"), ReplCommand::Invalid(_)));
    }

    #[test]
    fn test_parse_other_commands() {
        assert_eq!(parse_command("c"), ReplCommand::Export(ExportFormat::Csv));
        assert_eq!(parse_command(" J "), ReplCommand::Export(ExportFormat::Json));
        assert_eq!(parse_command("q"), ReplCommand::Quit);
        assert_eq!(parse_command("   "), ReplCommand::Empty);
        assert!(matches!(parse_command("x"), ReplCommand::Invalid(_)));
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative("7.5"), Ok(7.5));
        assert!(non_negative("-1").is_err());
        assert!(non_negative("inf").is_err());
        assert!(non_negative("NaN").is_err());
    }
}

mod logic;
mod storage;
mod util;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use logic::{
    GameTester, LogicTester, ScenarioResult, TesterAssets, expand_scenarios, get_scenario,
    list_scenarios, resolve_seed_inputs,
};
use util::{parse_date, split_csv};

#[derive(Debug, Parser)]
#[command(name = "flagquest-tester", version = "0.1.0")]
#[command(about = "Automated QA testing for FlagQuest - scripted players against the game engine")]
struct Args {
    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers or `today`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Calendar day the engine runs on (YYYY-MM-DD, defaults to the local date)
    #[arg(long)]
    today: Option<String>,

    /// JSON file overriding the game rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Directory holding a player record shared by every simulation
    #[arg(long)]
    profile_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let today = resolve_today(args.today.as_deref())?;
    let scenarios = expand_scenarios(&split_csv(&args.scenarios));
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds), today)?;
    let assets = Arc::new(TesterAssets::new(
        args.rules.clone(),
        args.profile_dir.clone(),
        today,
    ));
    let logic_tester = LogicTester::new(GameTester::new(assets, args.verbose), args.verbose);

    let results = run_logic_scenarios(&args, &scenarios, &seeds, &logic_tester);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎮 FlagQuest Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn resolve_today(raw: Option<&str>) -> Result<NaiveDate> {
    raw.map_or_else(|| Ok(Local::now().date_naive()), parse_date)
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    logic_tester: &LogicTester,
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running logic tests...".bright_green().bold());
    let mut all_results = Vec::new();

    for scenario_name in scenarios {
        let Some(scenario) = get_scenario(scenario_name) else {
            log::warn!("unknown scenario '{scenario_name}'");
            println!(
                "{} Unknown scenario: {}",
                "⚠️".yellow(),
                scenario_name.bright_white()
            );
            continue;
        };
        if args.verbose {
            println!("  ▶ {}", scenario.name.bright_white());
        }
        all_results.extend(logic_tester.run_scenario(&scenario, seeds, args.iterations));
    }

    all_results
}

fn write_reports(
    args: &Args,
    results: &[ScenarioResult],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(&mut output_target, results)?;
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# FlagQuest Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(
                &mut output_target,
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

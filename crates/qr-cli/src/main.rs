//! CLI frontend for the Quickroll item roller.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use qr_mechanics::CritBehavior;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "qr",
    about = "Quickroll: one-click composite rolls for inventory items",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log pipeline decisions to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll an item's quick roll and show the result
    Roll {
        /// Item name or ID
        item: String,

        /// Inventory JSON file
        #[arg(short, long)]
        inventory: PathBuf,

        /// Use the alternate quick roll
        #[arg(short, long)]
        alt: bool,

        /// Add a source of advantage (repeatable)
        #[arg(long, action = ArgAction::Count)]
        adv: u8,

        /// Add a source of disadvantage (repeatable)
        #[arg(long, action = ArgAction::Count)]
        disadv: u8,

        /// Roll three d20s instead of two under advantage
        #[arg(long)]
        triple: bool,

        /// Treat the action as critical
        #[arg(long)]
        force_crit: bool,

        /// Use the versatile formula for the first damage slot
        #[arg(long)]
        versatile: bool,

        /// Skip the item's preset and roll only --fields
        #[arg(long)]
        no_preset: bool,

        /// Extra fields as a JSON array, rolled after the preset
        #[arg(short, long)]
        fields: Option<String>,

        /// Points already paid for a superpower (at least its base cost); skips the pool debit
        #[arg(long)]
        spent_cost: Option<u32>,

        /// Crit damage behavior: off, default, maximize_base, maximize_both
        #[arg(long, value_parser = commands::roll::parse_crit_behavior)]
        crit: Option<CritBehavior>,

        /// Roll configuration JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// RNG seed for a reproducible roll
        #[arg(short, long)]
        seed: Option<u64>,

        /// Write consumed resources back to the inventory
        #[arg(long)]
        commit: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show an item's quick-roll toggles, filling in missing defaults
    Flags {
        /// Item name or ID (default: every item)
        item: Option<String>,

        /// Inventory JSON file
        #[arg(short, long)]
        inventory: PathBuf,

        /// Seed the description toggle of weapons and tools
        #[arg(long)]
        default_description: bool,

        /// Write the normalized flags back to the inventory
        #[arg(long)]
        commit: bool,
    },

    /// Roll a dice formula
    Formula {
        /// Formula, e.g. "2d6 + @str"
        formula: String,

        /// Bind a variable: NAME=VALUE (VALUE may be a formula)
        #[arg(long = "set", value_parser = commands::formula::parse_binding)]
        bindings: Vec<(String, String)>,

        /// Number of evaluations
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,

        /// Keep the highest evaluation (repeatable, compared against --disadv)
        #[arg(long, action = ArgAction::Count)]
        adv: u8,

        /// Keep the lowest evaluation (repeatable)
        #[arg(long, action = ArgAction::Count)]
        disadv: u8,

        /// Also show the highest possible total
        #[arg(long)]
        max: bool,

        /// RNG seed for a reproducible roll
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Validate formulas, toggles, and linked resources in an inventory
    Check {
        /// Inventory JSON file
        #[arg(short, long)]
        inventory: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Roll {
            item,
            inventory,
            alt,
            adv,
            disadv,
            triple,
            force_crit,
            versatile,
            no_preset,
            fields,
            spent_cost,
            crit,
            config,
            seed,
            commit,
            json,
        } => {
            let opts = commands::roll::RollOptions {
                alt,
                adv,
                disadv,
                triple,
                force_crit,
                versatile,
                no_preset,
                fields,
                spent_cost,
                crit,
                config,
                seed,
                commit,
                json,
            };
            commands::roll::run(&inventory, &item, &opts)
        }
        Commands::Flags {
            item,
            inventory,
            default_description,
            commit,
        } => commands::flags::run(&inventory, item.as_deref(), default_description, commit),
        Commands::Formula {
            formula,
            bindings,
            count,
            adv,
            disadv,
            max,
            seed,
        } => commands::formula::run(&formula, &bindings, count, adv, disadv, max, seed),
        Commands::Check { inventory } => commands::check::run(&inventory),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use qr_core::{ActorUpdate, ItemUpdate, PresetSelector, SharedStore, Store};
use qr_mechanics::fields::{DamageFragment, RollFragment};
use qr_mechanics::resolver::CritTag;
use qr_mechanics::resource::LinkedUpdate;
use qr_mechanics::{
    ActionOutcome, ActionReport, CritBehavior, NoPrompt, ResultFragment, RollConfig,
    RollParameters, parse_fields, run_action,
};

/// Command-line switches for one roll.
pub struct RollOptions {
    pub alt: bool,
    pub adv: u8,
    pub disadv: u8,
    pub triple: bool,
    pub force_crit: bool,
    pub versatile: bool,
    pub no_preset: bool,
    pub fields: Option<String>,
    pub spent_cost: Option<u32>,
    pub crit: Option<CritBehavior>,
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub commit: bool,
    pub json: bool,
}

/// Parse a crit behavior name.
pub fn parse_crit_behavior(s: &str) -> Result<CritBehavior, String> {
    match s.to_ascii_lowercase().replace('-', "_").as_str() {
        "off" | "none" => Ok(CritBehavior::Off),
        "default" | "roll" => Ok(CritBehavior::Default),
        "maximize_base" | "max_base" => Ok(CritBehavior::MaximizeBase),
        "maximize_both" | "max_both" => Ok(CritBehavior::MaximizeBoth),
        other => Err(format!(
            "unknown crit behavior \"{other}\" (expected off, default, maximize_base, maximize_both)"
        )),
    }
}

pub fn run(inventory: &Path, item: &str, opts: &RollOptions) -> Result<(), String> {
    let config = match opts.config.as_deref() {
        Some(path) => RollConfig::load(path).map_err(|e| e.to_string())?,
        None => RollConfig::default(),
    };

    let mut store = super::load_inventory(inventory)?;
    store.normalize_all(config.default_description);
    let shared = SharedStore::new(store);

    let fields = match opts.fields.as_deref() {
        Some(json) => parse_fields(json).map_err(|e| e.to_string())?,
        None => Vec::new(),
    };

    let selector = if opts.alt {
        PresetSelector::Alternate
    } else {
        PresetSelector::Primary
    };
    let params = RollParameters {
        advantage: u32::from(opts.adv),
        disadvantage: u32::from(opts.disadv),
        triple: opts.triple,
        force_crit: opts.force_crit,
        versatile: opts.versatile,
        spent_cost: opts.spent_cost,
        crit_behavior: opts.crit,
        preset: (!opts.no_preset).then_some(selector),
        ..RollParameters::default()
    };

    let mut rng = super::make_rng(opts.seed);
    let outcome = run_action(&shared, item, &params, &fields, &config, &mut NoPrompt, &mut rng)
        .map_err(|e| e.to_string())?;
    let report = match outcome {
        ActionOutcome::Completed(report) => report,
        ActionOutcome::Aborted(reason) => return Err(format!("{item}: {reason}")),
    };

    let store = shared.snapshot().map_err(|e| e.to_string())?;
    if opts.json {
        let json = serde_json::to_string_pretty(&*report).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        print_report(&report, &store);
    }

    let changed = !report.mutation.is_empty() || report.pool_debit.is_some();
    if opts.commit {
        super::save_inventory(&store, inventory)?;
        if !opts.json {
            println!("  Saved {}", inventory.display());
        }
    } else if changed && !opts.json {
        println!("  {}", "Inventory unchanged; pass --commit to keep these changes.".dimmed());
    }

    Ok(())
}

fn print_report(report: &ActionReport, store: &Store) {
    let mut header = format!("  {}", report.title.bold());
    if let Some(label) = report.crit_label.as_deref() {
        header.push_str(&format!("  {}", label.green().bold()));
    }
    println!("{header}");

    if !report.fragments.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Roll", "Result", "Details"]);
        for fragment in &report.fragments {
            table.add_row(fragment_row(fragment));
        }
        println!("{table}");
    }

    if !report.properties.is_empty() {
        println!("  {}", report.properties.join(", ").dimmed());
    }

    for line in mutation_lines(report, store) {
        println!("  {line}");
    }
    if report.place_template {
        println!("  Place template");
    }
    println!();
    println!("  {} dice rolled", report.dice_pool.len());
}

fn fragment_row(fragment: &ResultFragment) -> Vec<String> {
    match fragment {
        ResultFragment::Attack(r) | ResultFragment::Check(r) | ResultFragment::Custom(r) => {
            roll_row(r)
        }
        ResultFragment::Damage(d) | ResultFragment::Other(d) | ResultFragment::CritExtra(d) => {
            damage_row(d)
        }
        ResultFragment::SaveButton(save) => {
            let dc = if save.hide_dc {
                "DC ??".to_string()
            } else {
                format!("DC {}", save.dc)
            };
            vec![
                "Save".to_string(),
                dc,
                format!("{} save", save.save_id.to_uppercase()),
            ]
        }
        ResultFragment::Description { text } => {
            vec!["Description".to_string(), String::new(), text.clone()]
        }
        ResultFragment::Text { content } => vec![String::new(), String::new(), content.clone()],
        ResultFragment::Flavor { content } => {
            vec!["Flavor".to_string(), String::new(), content.clone()]
        }
    }
}

fn roll_row(fragment: &RollFragment) -> Vec<String> {
    let roll = &fragment.roll;
    let mut result = roll.chosen_total().to_string();
    match roll.chosen_tag() {
        CritTag::Success | CritTag::Mixed => result.push_str(" (crit)"),
        CritTag::Failure => result.push_str(" (fumble)"),
        CritTag::None => {}
    }
    let details: Vec<String> = roll
        .outcomes
        .iter()
        .map(|o| {
            if o.outcome.ignored {
                format!("({})", o.outcome)
            } else {
                o.outcome.to_string()
            }
        })
        .collect();
    vec![fragment.title.clone(), result, details.join(" | ")]
}

fn damage_row(fragment: &DamageFragment) -> Vec<String> {
    let mut label = fragment.title.clone();
    if let Some(kind) = fragment.damage_type.as_deref().filter(|k| !k.is_empty()) {
        label.push_str(&format!(" ({kind})"));
    }
    if let Some(context) = fragment.context.as_deref() {
        label.push_str(&format!(" [{context}]"));
    }
    if fragment.versatile {
        label.push_str(" (versatile)");
    }

    match fragment.crit.as_deref() {
        Some(crit) => vec![
            label,
            format!("{} + {}", fragment.base.total, crit.total),
            format!("{} / crit: {crit}", fragment.base),
        ],
        None => vec![
            label,
            fragment.base.total.to_string(),
            fragment.base.to_string(),
        ],
    }
}

fn mutation_lines(report: &ActionReport, store: &Store) -> Vec<String> {
    let mut lines = Vec::new();
    for update in &report.mutation.item_updates {
        lines.push(match update {
            ItemUpdate::UsesCurrent(n) => format!("Uses left: {n}"),
            ItemUpdate::Quantity(q) => format!("Quantity left: {q}"),
            ItemUpdate::RechargeCharged(true) => "Recharged".to_string(),
            ItemUpdate::RechargeCharged(false) => "Recharge spent".to_string(),
            ItemUpdate::Destroy => "Item used up".to_string(),
        });
    }
    if let Some(linked) = report.mutation.linked.as_ref() {
        lines.push(match linked {
            LinkedUpdate::Item { id, update } => {
                let name = store
                    .get_item(*id)
                    .map_or_else(|| id.to_string(), |i| i.name.clone());
                match update {
                    ItemUpdate::Quantity(q) => format!("{name}: {q} left"),
                    ItemUpdate::UsesCurrent(n) => format!("{name}: {n} use(s) left"),
                    other => format!("{name}: {other:?}"),
                }
            }
            LinkedUpdate::Actor(ActorUpdate::PoolRemaining { pool, remaining }) => {
                format!("{pool}: {remaining} left")
            }
        });
    }
    if let Some(debit) = report.pool_debit.as_ref() {
        lines.push(format!("Spent {} {}", debit.amount, debit.pool));
    }
    lines
}

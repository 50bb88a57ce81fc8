use colored::Colorize;
use qr_mechanics::RollState;
use qr_mechanics::dice::{Bindings, maximize};
use qr_mechanics::resolver::{CritFaces, MultiRollRequest, resolve};

/// Parse a `NAME=VALUE` binding.
pub fn parse_binding(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got \"{s}\""))?;
    let name = name.trim().trim_start_matches('@');
    if name.is_empty() {
        return Err(format!("missing variable name in \"{s}\""));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

pub fn run(
    formula: &str,
    bindings: &[(String, String)],
    count: u32,
    adv: u8,
    disadv: u8,
    max: bool,
    seed: Option<u64>,
) -> Result<(), String> {
    let mut vars = Bindings::new();
    for (name, value) in bindings {
        vars.set_formula(name.clone(), value.clone());
    }

    let state = RollState::from_counts(u32::from(adv), u32::from(disadv));
    let req = MultiRollRequest {
        roll_count: count,
        formula,
        extra_terms: &[],
        bindings: &vars,
        state,
        triple: false,
        crit_threshold: None,
        crit_faces: CritFaces::d20(),
        triggers_crit: true,
    };
    let mut rng = super::make_rng(seed);
    let roll = resolve(&req, &mut rng).map_err(|e| e.to_string())?;

    for (i, tagged) in roll.outcomes.iter().enumerate() {
        let line = tagged.outcome.to_string();
        if tagged.outcome.ignored {
            println!("    {}", line.dimmed());
        } else if i == roll.chosen && roll.outcomes.len() > 1 {
            println!("  * {}", line.bold());
        } else {
            println!("    {line}");
        }
    }

    if roll.is_crit {
        println!("  {}", "Critical!".green().bold());
    }

    if max {
        let highest = maximize(formula, &vars).map_err(|e| e.to_string())?;
        println!("  max: {highest}");
    }

    Ok(())
}

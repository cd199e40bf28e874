use tracing::trace;

use crate::models::host::{BonusMatchMode, LocationBonus};

/// Extra per-night payment for a booking location, or `0.0` when no bonus
/// entry matches.
///
/// `FirstMatch` compares the lowercased strings as they are, so an empty
/// location is contained in every name and picks the first entry. The opt-in
/// `Ranked` and `Exact` modes trim the location and never match a blank one.
pub fn resolve_bonus(location: &str, bonuses: &[LocationBonus], mode: BonusMatchMode) -> f64 {
    let matched = match mode {
        BonusMatchMode::FirstMatch => first_match(&location.to_lowercase(), bonuses),
        BonusMatchMode::Ranked | BonusMatchMode::Exact => {
            let needle = location.trim().to_lowercase();
            if needle.is_empty() {
                None
            } else if mode == BonusMatchMode::Ranked {
                ranked_match(&needle, bonuses)
            } else {
                bonuses.iter().find(|bonus| normalized(bonus) == needle)
            }
        }
    };

    match matched {
        Some(bonus) => {
            trace!(
                target: "app::earnings",
                location,
                bonus_location = %bonus.location_name,
                amount = bonus.bonus_per_night,
                mode = %mode,
                "resolved location bonus"
            );
            bonus.bonus_per_night
        }
        None => 0.0,
    }
}

fn normalized(bonus: &LocationBonus) -> String {
    bonus.location_name.trim().to_lowercase()
}

/// Length of the shared substring when one name contains the other.
fn containment(needle: &str, name: &str) -> Option<usize> {
    if name.is_empty() {
        None
    } else if needle.contains(name) {
        Some(name.len())
    } else if name.contains(needle) {
        Some(needle.len())
    } else {
        None
    }
}

// Order-dependent when several entries match: the earliest one wins.
fn first_match<'a>(needle: &str, bonuses: &'a [LocationBonus]) -> Option<&'a LocationBonus> {
    bonuses.iter().find(|bonus| {
        let name = bonus.location_name.to_lowercase();
        needle.contains(&name) || name.contains(needle)
    })
}

fn ranked_match<'a>(needle: &str, bonuses: &'a [LocationBonus]) -> Option<&'a LocationBonus> {
    let mut best: Option<(bool, usize, &LocationBonus)> = None;
    for bonus in bonuses {
        let name = normalized(bonus);
        let Some(length) = containment(needle, &name) else {
            continue;
        };
        let exact = name == needle;
        let better = match best {
            None => true,
            Some((best_exact, best_length, _)) => (exact, length) > (best_exact, best_length),
        };
        if better {
            best = Some((exact, length, bonus));
        }
    }
    best.map(|(_, _, bonus)| bonus)
}

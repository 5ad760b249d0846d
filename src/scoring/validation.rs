use super::config::Tariff;

/// Validate the scoring tariff at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_tariff(tariff: &Tariff) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let non_negative = [
        ("self_win_stake", tariff.self_win_stake),
        ("burn_penalty", tariff.burn_penalty),
        ("second_bonus", tariff.second_bonus),
        ("third_bonus", tariff.third_bonus),
    ];
    for (name, value) in non_negative {
        if value < 0 {
            errors.push(format!("scoring.{}: must be non-negative (got {})", name, value));
        }
    }

    // Ranked rounds settle between the players, so the table must balance
    let sum: i64 = tariff.ranking.iter().map(|&v| i64::from(v)).sum();
    if sum != 0 {
        errors.push(format!(
            "scoring.ranking: values must sum to 0 (got {:?}, sum {})",
            tariff.ranking, sum
        ));
    }

    let first = tariff.ranking[0];
    if let Some((i, value)) = tariff
        .ranking
        .iter()
        .enumerate()
        .skip(1)
        .find(|&(_, &v)| v > first)
    {
        errors.push(format!(
            "scoring.ranking[{}]: {} pays more than first place ({})",
            i, value, first
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

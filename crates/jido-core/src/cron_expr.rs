//! Cron expression normalization (spec §6): "standard 5-field cron syntax
//! plus `@daily`, `@hourly`, `@weekly`, etc." The `cron` crate this stack
//! builds on only parses 6- or 7-field (seconds-first) expressions and has
//! no nickname support, so every expression crosses this normalizer first.

/// Expand an `@`-nickname to its standard 5-field (`min hour dom month
/// dow`) equivalent. Returns `None` for anything that isn't a recognized
/// nickname, including unscheduled ones like `@reboot`.
fn expand_nickname(expression: &str) -> Option<&'static str> {
    match expression {
        "@yearly" | "@annually" => Some("0 0 1 1 *"),
        "@monthly" => Some("0 0 1 * *"),
        "@weekly" => Some("0 0 * * 0"),
        "@daily" | "@midnight" => Some("0 0 * * *"),
        "@hourly" => Some("0 * * * *"),
        _ => None,
    }
}

/// Normalize a spec-shaped cron expression into the 6-field seconds-first
/// form `cron::Schedule::from_str` requires. A 5-field expression gets a
/// leading `0` seconds field; a 6- or 7-field expression passes through
/// unchanged; an `@`-nickname expands to its 5-field equivalent first.
pub fn normalize(expression: &str) -> Result<String, String> {
    let expression = expression.trim();
    let expanded = expand_nickname(expression).unwrap_or(expression);
    let fields = expanded.split_whitespace().count();
    match fields {
        5 => Ok(format!("0 {expanded}")),
        6 | 7 => Ok(expanded.to_string()),
        _ => Err(format!(
            "cron expression must have 5 fields, or be a recognized @nickname; found {fields} field(s) in '{expression}'"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_field_expression_gets_a_leading_seconds_field() {
        assert_eq!(normalize("* * * * *").unwrap(), "0 * * * * *");
    }

    #[test]
    fn six_and_seven_field_expressions_pass_through_unchanged() {
        assert_eq!(normalize("0 * * * * *").unwrap(), "0 * * * * *");
        assert_eq!(normalize("* * * * * * *").unwrap(), "* * * * * * *");
    }

    #[test]
    fn nicknames_expand_and_then_get_a_seconds_field() {
        assert_eq!(normalize("@hourly").unwrap(), "0 0 * * * *");
        assert_eq!(normalize("@daily").unwrap(), "0 0 0 * * *");
        assert_eq!(normalize("@midnight").unwrap(), "0 0 0 * * *");
        assert_eq!(normalize("@weekly").unwrap(), "0 0 0 * * 0");
        assert_eq!(normalize("@monthly").unwrap(), "0 0 0 1 * *");
        assert_eq!(normalize("@yearly").unwrap(), "0 0 0 1 1 *");
        assert_eq!(normalize("@annually").unwrap(), "0 0 0 1 1 *");
    }

    #[test]
    fn malformed_field_counts_are_rejected() {
        assert!(normalize("* * *").is_err());
        assert!(normalize("").is_err());
    }

    #[test]
    fn unrecognized_nickname_is_rejected() {
        assert!(normalize("@reboot").is_err());
    }
}

use std::{env, str::FromStr};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads and parses the environment variable `name`. Returns `None` if the variable is unset, or `Some(Err)` with a
/// printable reason if it is set but cannot be parsed.
pub fn parse_env<T>(name: &str) -> Option<Result<T, String>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env::var(name).ok().map(|s| s.trim().parse::<T>().map_err(|e| format!("Invalid value '{s}' for {name}: {e}")))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boolean_flags() {
        assert!(parse_boolean_flag(Some("YES".into()), false));
        assert!(!parse_boolean_flag(Some(" off ".into()), true));
        assert!(parse_boolean_flag(Some("maybe".into()), true));
        assert!(!parse_boolean_flag(None, false));
    }

    #[test]
    fn env_values() {
        env::set_var("SETTLE_COMMON_TEST_PORT", "8080");
        env::set_var("SETTLE_COMMON_TEST_BAD", "eighty");
        assert_eq!(parse_env::<u16>("SETTLE_COMMON_TEST_PORT"), Some(Ok(8080)));
        assert!(matches!(parse_env::<u16>("SETTLE_COMMON_TEST_BAD"), Some(Err(_))));
        assert!(parse_env::<u16>("SETTLE_COMMON_TEST_UNSET").is_none());
    }
}

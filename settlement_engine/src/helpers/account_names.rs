/// Collapses whitespace and case so that a name typed by a user can be compared with the name a bank returns.
pub fn normalize_account_name(name: &str) -> String {
    name.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ")
}

pub fn account_names_match(supplied: &str, resolved: &str) -> bool {
    let supplied = normalize_account_name(supplied);
    !supplied.is_empty() && supplied == normalize_account_name(resolved)
}

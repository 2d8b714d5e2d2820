//! The settlement server is configured from the environment alone. Passing it any argument prints the help text and
//! the settings it would start with, and the server does not start.
use std::{env, env::VarError};

const HELP: &str = include_str!("./cli-help.txt");

/// The settings echoed by `--help`. The Paystack key, the webhook secret and the JWT secret are not on this list.
const PRINTABLE_SETTINGS: [&str; 14] = [
    "RUST_LOG",
    "TSS_HOST",
    "TSS_PORT",
    "TSS_DATABASE_URL",
    "TSS_DB_MAX_CONNECTIONS",
    "TSS_RUN_MIGRATIONS",
    "TSS_PAYSTACK_BASE_URL",
    "TSS_PAYSTACK_CURRENCY",
    "TSS_PAYSTACK_CALLBACK_URL",
    "TSS_PAYSTACK_MAX_ATTEMPTS",
    "TSS_PAYSTACK_RETRY_DELAY_MS",
    "TSS_QUEUE_PREFETCH",
    "TSS_QUEUE_POLL_MS",
    "TSS_SETTLEMENT_INTERVAL_SECS",
];

/// Returns true if arguments were given and the help was printed.
pub fn handle_command_line_args() -> bool {
    if env::args().len() <= 1 {
        return false;
    }
    println!("\n{HELP}\n");
    println!("Settings in this environment (secrets are never shown):");
    for (name, value) in settings_report(|name| env::var(name)) {
        println!("  {name:<35} {value}");
    }
    true
}

fn settings_report<F>(lookup: F) -> Vec<(&'static str, String)>
where F: Fn(&str) -> Result<String, VarError> {
    PRINTABLE_SETTINGS
        .iter()
        .map(|&name| {
            let value = match lookup(name) {
                Ok(s) => s,
                Err(VarError::NotPresent) => "(default)".into(),
                Err(VarError::NotUnicode(s)) => format!("not valid unicode: {}", s.to_string_lossy()),
            };
            (name, value)
        })
        .collect()
}

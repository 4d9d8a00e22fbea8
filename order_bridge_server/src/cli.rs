use std::{env, env::VarError};

/// The server takes no arguments. If any are given, print the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Partner credentials are never read from the environment, so everything here is safe to print
    const DISPLAY_ENVS: [&str; 8] = [
        "RUST_LOG",
        "OBS_HOST",
        "OBS_PORT",
        "OBS_DATABASE_URL",
        "OBS_MAX_DB_CONNECTIONS",
        "OBS_SESSION_FILE",
        "OBS_PARTNER_URL",
        "OBS_HEADLESS",
    ];

    println!("Current environment values:");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}

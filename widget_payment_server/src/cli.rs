use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
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
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "WPG_HOST",
        "WPG_PORT",
        "WPG_DATABASE_URL",
        "WPG_FRONTEND_URL",
        "WPG_TOKEN_TTL_HOURS",
        "WPG_RESET_LINK_EXPIRY_MINUTES",
        "WPG_RECEIPT_EXPIRY_MINUTES",
        "WPG_STRIPE_API_URL",
        "WPG_STRIPE_KEY",
        "WPG_GATEWAY_TIMEOUT_SECS",
        "WPG_SMTP_HOST",
        "WPG_SMTP_PORT",
        "WPG_MAIL_FROM",
        "WPG_MAIL_DISABLED",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}

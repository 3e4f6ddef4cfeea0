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
    const DISPLAY_ENVS: [&str; 18] = [
        "RUST_LOG",
        "POB_HOST",
        "POB_PORT",
        "POB_DATABASE_URL",
        "POB_APP_BASE_URL",
        "POB_CURRENCY",
        "POB_BUYER_LANGUAGE",
        "POB_SIGNATURE_HEADER",
        "POB_USE_X_FORWARDED_FOR",
        "POB_USE_FORWARDED",
        "POB_TRUST_IDENTITY_HEADERS",
        "POB_GATEWAY_OAUTH_URL",
        "POB_GATEWAY_ORDER_URL",
        "POB_GATEWAY_CLIENT_ID",
        "POB_GATEWAY_MERCHANT_POS_ID",
        "POB_GATEWAY_OAUTH_TIMEOUT",
        "POB_GATEWAY_ORDER_TIMEOUT",
        "POB_TOKEN_SAFETY_MARGIN",
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

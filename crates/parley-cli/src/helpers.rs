//! Shared CLI helpers — response printing, version banner.

use colored::Colorize;

/// Print an assistant reply to stdout.
pub fn print_response(response: &str) {
    println!();
    println!("{}", "Parley".cyan().bold());
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "Parley".cyan().bold(), version.dimmed());
    println!("{}", "Type a message, or \"exit\" to quit.".dimmed());
    println!();
}

/// Print a "thinking" placeholder while a turn runs.
pub fn print_thinking() {
    eprint!("{}", "thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

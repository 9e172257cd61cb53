use colored::Colorize;
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::export::Exported;
use crate::session::{Notice, Role, Turn};

pub const KEY_PAGE: &str = "https://aistudio.google.com/app/apikey";

pub fn show_banner(model: &str) {
    println!(
        "\n{}",
        "┏━━━━━━━━━━━━━━━━━━━━━━━━ vibe_sitegen ━━━━━━━━━━━━━━━━━━━━━━━┓".bold()
    );
    println!("  Describe a website and Gemini ({}) will build it.", model.cyan());
    println!("  Type {} for commands.", "/help".bold());
    println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());
}

pub fn show_help() {
    println!("\n{}", "Commands:".bold());
    println!("  {}  regenerate from your last instruction", "/regenerate".cyan());
    println!("  {}    write generated-website.html", "/download".cyan());
    println!("  {}     write a sandboxed preview page", "/preview".cyan());
    println!("  {}        print the current HTML", "/code".cyan());
    println!("  {}         enter or replace the API key", "/key".cyan());
    println!("  {}        leave", "/quit".cyan());
    println!();
}

pub fn show_turn(turn: &Turn) {
    let stamp = turn.at.format("%H:%M:%S").to_string().dimmed();
    match turn.role {
        Role::User => println!("{} {} {}", stamp, "you".blue().bold(), turn.content),
        Role::Assistant => println!("{} {} {}", stamp, "ai ".green().bold(), turn.content),
    }
}

pub fn show_turns_since(turns: &[Turn], from: usize) {
    for t in turns.iter().skip(from) {
        show_turn(t);
    }
}

pub fn notify(n: &Notice) {
    eprintln!("{} {}", format!("[{}]", n.title).red().bold(), n.description);
}

pub fn inform(title: &str, description: &str) {
    println!("{} {}", format!("[{}]", title).green().bold(), description);
}

pub fn show_code(artifact: Option<&str>) {
    match artifact {
        Some(html) => {
            println!("{}", format!("── HTML ({}) ──", format_size(html.len(), DECIMAL)).bold());
            println!("{}", html);
        }
        None => println!("{}", "(no code yet)".dimmed()),
    }
}

pub fn show_exported(label: &str, out: &Exported) {
    inform(
        label,
        &format!("{} ({}, {})", out.path.display(), format_size(out.bytes, DECIMAL), out.mime),
    );
}

/// Spinner shown while a request is outstanding.
pub fn sending_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Reads one line; `None` on EOF or read error.
pub fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut s = String::new();
    match io::stdin().lock().read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s.trim_end_matches(['\r', '\n']).to_string()),
    }
}

pub fn ask_for_key() -> Option<String> {
    println!("\n{}", "Enter Gemini API Key".bold());
    println!("You need a Google AI/Gemini API key to use this application.");
    println!("Get your API key from the Google AI Studio: {}", KEY_PAGE.underline());
    read_line("API key: ").filter(|k| !k.trim().is_empty())
}

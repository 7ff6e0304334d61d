use std::io::{BufRead, Write};

use colored::*;

use crate::config::{Settings, API_KEY_ENV};
use crate::editor;
use crate::error::Result;
use crate::utils::mask_secret;
use crate::workflow::{Decision, Prompter};

const RULE_WIDTH: usize = 50;

fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

/// Maps a typed answer to a decision; anything unrecognized cancels.
pub fn parse_decision(input: &str) -> Decision {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Decision::Commit,
        "e" | "edit" => Decision::Edit,
        "r" | "regenerate" => Decision::Regenerate,
        _ => Decision::Cancel,
    }
}

/// `true` only for an explicit yes; blank input means no.
pub fn parse_confirmation(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

fn read_answer(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    Ok(input)
}

/// Asks a `[y/N]` question on the terminal.
pub fn confirm(prompt: &str) -> Result<bool> {
    let answer = read_answer(&format!("\n{} ", format!("{} [y/N]", prompt).cyan()))?;
    Ok(parse_confirmation(&answer))
}

/// Prompter reading answers from stdin.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn show_message(&mut self, message: &str) {
        println!("\n{}", "Generated commit message:".green().bold());
        println!("{}", rule());
        println!("{}", message);
        println!("{}", rule());
    }

    fn warn(&mut self, warning: &str) {
        println!("{}", warning.yellow());
    }

    fn decide(&mut self) -> Result<Decision> {
        let answer = read_answer(&format!(
            "\n{} ",
            "Commit with this message? [y]es / [n]o / [e]dit / [r]egenerate".cyan()
        ))?;
        Ok(parse_decision(&answer))
    }

    fn edit(&mut self, message: &str) -> Result<String> {
        editor::edit_text(message, ".txt")
    }

    fn feedback(&mut self) -> Result<String> {
        println!("{}", "Enter your suggested changes (leave empty to simply retry):".yellow());
        read_answer("> ")
    }
}

/// Prints the settings without revealing the API key.
pub fn display_config(settings: &Settings) {
    println!("\n{}", "Current Configuration:".blue().bold());
    println!("{}", rule());
    println!("Model: {}", settings.model.green());
    println!("Temperature: {}", settings.temperature.to_string().green());
    println!("Max tokens: {}", settings.max_tokens.to_string().green());
    println!("Endpoint: {}", settings.api_base_url.green());
    println!("Request timeout: {}s", settings.request_timeout_secs.to_string().green());
    println!("API key: {}", api_key_status(settings));
    println!("\nSystem Prompt:");
    println!("{}", rule());
    println!("{}", settings.system_prompt.trim_end());
    println!("{}", rule());
}

fn api_key_status(settings: &Settings) -> ColoredString {
    let from_env = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
    match (from_env, settings.api_key.as_deref()) {
        (Some(key), _) => format!("{} (from {})", mask_secret(&key), API_KEY_ENV).green(),
        (None, Some(key)) => format!("{} (from config file)", mask_secret(key)).green(),
        (None, None) => "not set".red(),
    }
}

pub fn display_success(message: &str) {
    println!("{}", message.green());
}

pub fn display_info(message: &str) {
    println!("{}", message.blue());
}

pub fn display_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decisions_from_answers() {
        assert_eq!(parse_decision("y\n"), Decision::Commit);
        assert_eq!(parse_decision("YES"), Decision::Commit);
        assert_eq!(parse_decision(" e "), Decision::Edit);
        assert_eq!(parse_decision("r"), Decision::Regenerate);
        assert_eq!(parse_decision("n"), Decision::Cancel);
        assert_eq!(parse_decision(""), Decision::Cancel);
        assert_eq!(parse_decision("maybe"), Decision::Cancel);
    }

    #[test]
    fn confirmation_defaults_to_no() {
        assert!(parse_confirmation("y\n"));
        assert!(parse_confirmation(" Yes "));
        assert!(!parse_confirmation("\n"));
        assert!(!parse_confirmation("n"));
        assert!(!parse_confirmation("sure"));
    }
}

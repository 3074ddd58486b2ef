//! Output formatting: colored, emoji-prefixed status lines.

use owo_colors::OwoColorize;

/// Color modes accepted by `--colors`.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
  Yes,
  Always,
  #[default]
  Auto,
  No,
  Never,
}

fn emoji_or(name: &str, default: &str) -> String {
  emojis::get_by_shortcode(name).map_or_else(|| default.to_string(), |emoji| emoji.to_string())
}

pub fn print_success(message: &str) {
  println!("{} {}", emoji_or("check_mark", "✓").green().bold(), message);
}

pub fn print_error(message: &str) {
  eprintln!("{} {}", emoji_or("cross_mark", "✗").red().bold(), message);
}

pub fn print_warning(message: &str) {
  println!("{} {}", emoji_or("warning", "⚠").yellow().bold(), message);
}

pub fn print_info(message: &str) {
  println!("{} {}", emoji_or("information", "ℹ").blue().bold(), message);
}

//! Markdown-style formatting helpers for reply text.

use std::fmt::Display;
use std::time::Instant;

use crate::id::{ChannelId, RoleId, UserId};

/// `**message**`
pub fn bold(message: impl Display) -> String {
    format!("**{message}**")
}

/// `*message*`
pub fn italic(message: impl Display) -> String {
    format!("*{message}*")
}

/// Inline code: ``` ``message`` ```
pub fn emboss(message: impl Display) -> String {
    format!("``{message}``")
}

/// `[display](link)`
pub fn link(display: &str, link: &str) -> String {
    format!("[{display}]({link})")
}

/// A fenced code block tagged with `lang`.
pub fn code_block(lang: &str, message: impl Display) -> String {
    format!("```{lang}\n{message}```")
}

pub fn as_mention(user: &UserId) -> String {
    format!("<@{user}>")
}

pub fn mention_role(role: &RoleId) -> String {
    format!("<@&{role}>")
}

pub fn mention_channel(channel: &ChannelId) -> String {
    format!("<#{channel}>")
}

/// Plural suffix: `""` for exactly one, `"s"` otherwise.
pub fn number_ending(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// `"On"` / `"Off"`.
pub fn on_off(condition: bool) -> &'static str {
    if condition { "On" } else { "Off" }
}

/// Upper-cases the first character of `input`.
pub fn capitalize_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Milliseconds elapsed since `start`, with two decimals.
pub fn time_diff(start: Instant) -> String {
    format!("{:.2}", start.elapsed().as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup() {
        assert_eq!(bold(".ping"), "**.ping**");
        assert_eq!(italic("x"), "*x*");
        assert_eq!(emboss("flow"), "``flow``");
        assert_eq!(code_block("json", "[]"), "```json\n[]```");
        assert_eq!(link("a", "b"), "[a](b)");
        assert_eq!(as_mention(&UserId::new("1")), "<@1>");
    }

    #[test]
    fn test_number_ending() {
        assert_eq!(number_ending(0), "s");
        assert_eq!(number_ending(1), "");
        assert_eq!(number_ending(2), "s");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("hello"), "Hello");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_time_diff_is_numeric() {
        let diff = time_diff(Instant::now());
        assert!(diff.parse::<f64>().is_ok());
        assert!(diff.contains('.'));
    }
}

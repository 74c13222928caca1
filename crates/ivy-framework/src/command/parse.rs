//! Prefix stripping and tokenization.

/// A command name and its arguments, as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInvocation {
    /// The command name, lower-cased.
    pub name: String,
    /// Remaining tokens.
    pub args: Vec<String>,
}

/// Returns whether `content` opens with `prefix`.
pub fn has_prefix(content: &str, prefix: &str) -> bool {
    content.starts_with(prefix)
}

/// Splits a prefixed message into a command name and arguments.
///
/// Exactly `prefix` characters are stripped from the front; an empty prefix
/// strips one. The rest is split on single spaces, so consecutive spaces
/// yield empty arguments.
pub fn parse_invocation(content: &str, prefix: &str) -> ParsedInvocation {
    let offset = prefix.chars().count().max(1);
    let body = content
        .char_indices()
        .nth(offset)
        .map_or("", |(i, _)| &content[i..]);

    let mut tokens = body.split(' ');
    let name = tokens.next().unwrap_or_default().to_lowercase();
    ParsedInvocation {
        name,
        args: tokens.map(str::to_string).collect(),
    }
}

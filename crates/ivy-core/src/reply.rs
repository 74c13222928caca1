//! Displayable reply payloads.
//!
//! A [`Reply`] is either plain text or a structured [`Embed`]. Adapters
//! translate embeds into whatever rich format the platform supports; the
//! [`Display`](std::fmt::Display) rendering is used by text-only transports
//! and in logs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transport::MessageHandle;

/// Default embed accent colour.
pub const DEFAULT_COLOR: u32 = 0x2f3136;

/// A named field inside an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field heading.
    pub name: String,
    /// Field body.
    pub value: String,
    /// Whether the field may share a row with its neighbours.
    #[serde(default)]
    pub inline: bool,
}

impl EmbedField {
    /// Creates a field.
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

/// Footer line of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    /// Footer text.
    pub text: String,
    /// Optional icon URL.
    pub icon_url: Option<String>,
}

/// A structured message payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    /// Author line / title.
    pub title: String,
    /// Icon shown next to the title.
    pub icon: Option<String>,
    /// Main body.
    pub description: String,
    /// Accent colour (RGB).
    pub color: u32,
    /// Additional fields.
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    /// Footer line.
    pub footer: Option<EmbedFooter>,
    /// Timestamp shown alongside the footer.
    pub timestamp: Option<DateTime<Utc>>,
    /// Large image URL.
    pub image: Option<String>,
    /// Thumbnail URL.
    pub thumbnail: Option<String>,
}

impl Embed {
    /// Creates an embed with a title and body.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon: None,
            description: description.into(),
            color: DEFAULT_COLOR,
            fields: Vec::new(),
            footer: None,
            timestamp: None,
            image: None,
            thumbnail: None,
        }
    }

    /// Appends a field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField::new(name, value, inline));
        self
    }

    /// Returns the field with the given heading, if present.
    pub fn find_field(&self, name: &str) -> Option<&EmbedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for Embed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.title)?;
        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }
        for field in &self.fields {
            writeln!(f, "{}:", field.name)?;
            writeln!(f, "{}", field.value)?;
        }
        if let Some(footer) = &self.footer {
            write!(f, "-- {}", footer.text)?;
        }
        Ok(())
    }
}

/// Content sent back to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Reply {
    /// Plain text.
    Text(String),
    /// A structured embed.
    Embed(Embed),
}

impl Reply {
    /// Returns the embed, if this is one.
    pub fn as_embed(&self) -> Option<&Embed> {
        match self {
            Self::Embed(embed) => Some(embed),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Embed(embed) => embed.fmt(f),
        }
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Embed> for Reply {
    fn from(embed: Embed) -> Self {
        Self::Embed(embed)
    }
}

// =============================================================================
// Icons
// =============================================================================

/// Stock icons used by framework-generated embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedIcon {
    Audio,
    Birthday,
    Edu,
    Error,
    Help,
    Member,
    Message,
    Numbers,
    Poll,
    Prefs,
    Stonks,
    Test,
    Xp,
}

impl EmbedIcon {
    /// Returns the icon URL.
    pub fn url(self) -> &'static str {
        match self {
            Self::Audio => "https://storage.googleapis.com/stonks-cdn/audio.png",
            Self::Birthday => "https://storage.googleapis.com/stonks-cdn/birthday.png",
            Self::Edu => "https://storage.googleapis.com/stonks-cdn/univ.png",
            Self::Error => "https://storage.googleapis.com/stonks-cdn/error.png",
            Self::Help => "https://storage.googleapis.com/stonks-cdn/help.png",
            Self::Member => "https://storage.googleapis.com/stonks-cdn/jack.png",
            Self::Message => "https://storage.googleapis.com/stonks-cdn/message.png",
            Self::Numbers => "https://storage.googleapis.com/stonks-cdn/counther.png",
            Self::Poll => "https://storage.googleapis.com/stonks-cdn/poll.png",
            Self::Prefs => "https://storage.googleapis.com/stonks-cdn/prefs.png",
            Self::Stonks => "https://storage.googleapis.com/stonks-cdn/stonks.png",
            Self::Test => "https://storage.googleapis.com/stonks-cdn/test.png",
            Self::Xp => "https://storage.googleapis.com/stonks-cdn/xp.png",
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds stylised embeds with a consistent accent colour.
#[derive(Debug, Clone, Copy)]
pub struct EmbedBuilder {
    color: u32,
}

impl Default for EmbedBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_COLOR)
    }
}

impl EmbedBuilder {
    /// Creates a builder using `color` as the accent colour.
    pub fn new(color: u32) -> Self {
        Self { color }
    }

    /// Returns the accent colour.
    pub fn color(&self) -> u32 {
        self.color
    }

    /// Builds an embed.
    ///
    /// When `metadata` is given, the footer names the invoking member and
    /// channel and the embed is timestamped.
    pub fn build(
        &self,
        title: impl Into<String>,
        icon: EmbedIcon,
        description: impl Into<String>,
        fields: Vec<EmbedField>,
        metadata: Option<&dyn MessageHandle>,
    ) -> Embed {
        let mut embed = Embed::new(title, description);
        embed.icon = Some(icon.url().to_string());
        embed.color = self.color;
        embed.fields = fields;

        if let Some(message) = metadata {
            let channel = message.channel_label().unwrap_or("unknown");
            embed.footer = Some(EmbedFooter {
                text: format!("{} in {}", message.author_display_name(), channel),
                icon_url: message.author().avatar_url.clone(),
            });
            embed.timestamp = Some(Utc::now());
        }

        embed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_metadata() {
        let embed = EmbedBuilder::new(0xff0000).build(
            "Whoops",
            EmbedIcon::Error,
            "nope",
            vec![EmbedField::new("a", "b", true)],
            None,
        );
        assert_eq!(embed.color, 0xff0000);
        assert_eq!(embed.icon.as_deref(), Some(EmbedIcon::Error.url()));
        assert!(embed.footer.is_none());
        assert!(embed.timestamp.is_none());
        assert_eq!(embed.find_field("a").map(|f| f.value.as_str()), Some("b"));
    }

    #[test]
    fn test_display_renders_fields() {
        let rendered = Embed::new("Title", "Body")
            .field("Command", "ping", true)
            .to_string();
        assert!(rendered.contains("[Title]"));
        assert!(rendered.contains("Body"));
        assert!(rendered.contains("Command:\nping"));
    }

    #[test]
    fn test_reply_conversions() {
        assert_eq!(Reply::from("hi"), Reply::Text("hi".into()));
        let reply = Reply::from(Embed::new("t", "d"));
        assert!(reply.as_embed().is_some());
    }
}

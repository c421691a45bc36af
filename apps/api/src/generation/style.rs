//! Style parameters: the tone / length / focus knobs the user picks per generation.
//!
//! Values are embedded verbatim (lowercase) into the prompt.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Enthusiastic,
    Confident,
    Friendly,
    Formal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    Concise,
    #[default]
    Moderate,
    Detailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Focus {
    Skills,
    Experience,
    Culture,
    #[default]
    Balanced,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Enthusiastic => "enthusiastic",
            Tone::Confident => "confident",
            Tone::Friendly => "friendly",
            Tone::Formal => "formal",
        }
    }
}

impl Length {
    pub fn as_str(&self) -> &'static str {
        match self {
            Length::Concise => "concise",
            Length::Moderate => "moderate",
            Length::Detailed => "detailed",
        }
    }
}

impl Focus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Focus::Skills => "skills",
            Focus::Experience => "experience",
            Focus::Culture => "culture",
            Focus::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable per-request style choice. Missing fields fall back to the defaults
/// (professional / moderate / balanced).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleParameters {
    pub tone: Tone,
    pub length: Length,
    pub focus: Focus,
}

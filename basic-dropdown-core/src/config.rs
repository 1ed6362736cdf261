//! Content configuration
//!
//! Options are plain data so hosts can build them in code or load them from
//! JSON. The mutation relevance predicate is not part of the options; it is
//! registered on the content with `with_should_reposition`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Class marker carried by every dropdown content element
pub const CONTENT_CLASS: &str = "basic-dropdown-content";

/// Prefix of the content element id, `"<prefix>-<unique id>"`
pub const CONTENT_ID_PREFIX: &str = "basic-dropdown-content";

pub const DEFAULT_TRANSITIONING_IN_CLASS: &str = "basic-dropdown--transitioning-in";
pub const DEFAULT_TRANSITIONED_IN_CLASS: &str = "basic-dropdown--transitioned-in";
pub const DEFAULT_TRANSITIONING_OUT_CLASS: &str = "basic-dropdown--transitioning-out";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown root event type: {0}")]
    UnknownRootEventType(String),
    #[error("Class override for {0} is empty")]
    EmptyClass(&'static str),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Pointer event that counts as an interaction for outside-click detection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootEventType {
    #[default]
    Click,
    MouseDown,
}

impl RootEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::MouseDown => "mousedown",
        }
    }
}

impl fmt::Display for RootEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RootEventType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "click" => Ok(Self::Click),
            "mousedown" => Ok(Self::MouseDown),
            other => Err(ConfigError::UnknownRootEventType(other.to_string())),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Options recognised by the dropdown content
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentOptions {
    /// Id of the container the content is rendered into
    pub destination: String,
    /// Render where the dropdown is declared instead of in `destination`
    pub render_in_place: bool,
    /// Block page scrolling while open and keep wheel input inside the content
    pub prevent_scroll: bool,
    /// Overrides touch-capability detection when set
    pub is_touch_device: Option<bool>,
    pub root_event_type: RootEventType,
    /// Space-separated class list for the entering phase
    pub transitioning_in_class: Option<String>,
    /// Space-separated class list once entering finished
    pub transitioned_in_class: Option<String>,
    /// Space-separated class list applied to the exit clone
    pub transitioning_out_class: Option<String>,
    /// Disable to skip enter/exit animations entirely (test mode)
    #[serde(default = "default_true")]
    pub animation_enabled: bool,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            destination: String::new(),
            render_in_place: false,
            prevent_scroll: false,
            is_touch_device: None,
            root_event_type: RootEventType::default(),
            transitioning_in_class: None,
            transitioned_in_class: None,
            transitioning_out_class: None,
            animation_enabled: true,
        }
    }
}

impl ContentOptions {
    /// Parse and validate options from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject class overrides that would leave a phase without classes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let overrides = [
            ("transitioning_in_class", &self.transitioning_in_class),
            ("transitioned_in_class", &self.transitioned_in_class),
            ("transitioning_out_class", &self.transitioning_out_class),
        ];
        for (name, value) in overrides {
            if let Some(value) = value {
                if value.split_whitespace().next().is_none() {
                    return Err(ConfigError::EmptyClass(name));
                }
            }
        }
        Ok(())
    }

    pub fn transitioning_in_class(&self) -> &str {
        self.transitioning_in_class
            .as_deref()
            .unwrap_or(DEFAULT_TRANSITIONING_IN_CLASS)
    }

    pub fn transitioned_in_class(&self) -> &str {
        self.transitioned_in_class
            .as_deref()
            .unwrap_or(DEFAULT_TRANSITIONED_IN_CLASS)
    }

    pub fn transitioning_out_class(&self) -> &str {
        self.transitioning_out_class
            .as_deref()
            .unwrap_or(DEFAULT_TRANSITIONING_OUT_CLASS)
    }
}

/// Id of the content element for a dropdown
pub fn content_id(unique_id: &str) -> String {
    format!("{CONTENT_ID_PREFIX}-{unique_id}")
}

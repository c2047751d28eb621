use std::fmt;
use std::str::FromStr;

use crate::errors::ConsoleError;

/// The four mutually exclusive console views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tab {
    #[default]
    Generate,
    Verify,
    Manage,
    CustomerStats,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Generate, Tab::Verify, Tab::Manage, Tab::CustomerStats];

    /// Heading shown in the tab bar.
    pub fn label(&self) -> &'static str {
        match self {
            Tab::Generate => "Generate Key",
            Tab::Verify => "Verify Key",
            Tab::Manage => "Manage Keys",
            Tab::CustomerStats => "Customer Stats",
        }
    }

    /// Short name typed at the prompt.
    pub fn command(&self) -> &'static str {
        match self {
            Tab::Generate => "generate",
            Tab::Verify => "verify",
            Tab::Manage => "manage",
            Tab::CustomerStats => "stats",
        }
    }
}

impl FromStr for Tab {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generate" | "gen" => Ok(Tab::Generate),
            "verify" => Ok(Tab::Verify),
            "manage" | "list" => Ok(Tab::Manage),
            "stats" | "customer-stats" => Ok(Tab::CustomerStats),
            other => Err(ConsoleError::validation(
                "tab",
                format!("unknown tab '{other}' (generate, verify, manage, stats)"),
            )),
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

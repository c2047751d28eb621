//! Line commands understood by the interactive console.

use super::notifier::Notifier;
use super::state::Console;
use super::tab::Tab;
use crate::api::KeyService;
use crate::errors::{ConsoleError, ConsoleResult};

pub const HELP: &str = "\
Commands:
  tab <generate|verify|manage|stats>   switch view (or type the view name alone)
  set <field> <value>                  fill a field of the current form
  submit                               send the current form
  refresh                              reload the key list
  deactivate <key>                     deactivate a key (asks first)
  help                                 show this text
  quit                                 leave the console";

/// One parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    SelectTab(Tab),
    Set { field: String, value: String },
    Submit,
    Refresh,
    Deactivate(String),
    Help,
    Quit,
    /// Blank line; just redraw.
    Nothing,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> ConsoleResult<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "" => ConsoleCommand::Nothing,
            "tab" => ConsoleCommand::SelectTab(rest.parse()?),
            "set" => {
                let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if field.is_empty() {
                    return Err(ConsoleError::validation("set", "usage: set <field> <value>"));
                }
                ConsoleCommand::Set {
                    field: field.to_lowercase(),
                    value: value.trim().to_string(),
                }
            }
            "submit" => ConsoleCommand::Submit,
            "refresh" => ConsoleCommand::Refresh,
            "deactivate" => {
                if rest.is_empty() {
                    return Err(ConsoleError::validation(
                        "deactivate",
                        "usage: deactivate <key>",
                    ));
                }
                ConsoleCommand::Deactivate(rest.to_string())
            }
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            other => match other.parse::<Tab>() {
                Ok(tab) => ConsoleCommand::SelectTab(tab),
                Err(_) => {
                    return Err(ConsoleError::validation(
                        "command",
                        format!("unknown command '{other}', type 'help'"),
                    ))
                }
            },
        };
        Ok(command)
    }
}

impl<S: KeyService, N: Notifier> Console<S, N> {
    /// Apply one command. Returns `false` once the user asked to quit.
    ///
    /// Every error returned here has already been shown to the user.
    pub async fn execute(&mut self, command: ConsoleCommand) -> ConsoleResult<bool> {
        match command {
            ConsoleCommand::SelectTab(tab) => self.select_tab(tab).await?,
            ConsoleCommand::Set { field, value } => {
                if let Err(e) = self.set_field(&field, &value) {
                    self.notifier_mut().alert(&e.to_string());
                    return Err(e);
                }
            }
            ConsoleCommand::Submit => self.submit().await?,
            ConsoleCommand::Refresh => {
                self.refresh().await?;
            }
            ConsoleCommand::Deactivate(key) => {
                self.deactivate(&key).await?;
            }
            ConsoleCommand::Help => self.notifier_mut().alert(HELP),
            ConsoleCommand::Quit => return Ok(false),
            ConsoleCommand::Nothing => {}
        }
        Ok(true)
    }
}

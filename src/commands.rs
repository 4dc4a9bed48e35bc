//! Operator command line parsing.

use thiserror::Error;

use crate::entry::EntryId;
use crate::kind::{FaultKind, Field};

/// Stands for an empty value in `set`, clearing the field.
pub const EMPTY_VALUE: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Status,
    Topology,
    Refresh,
    Add,
    Remove(EntryId),
    Kind(EntryId, FaultKind),
    Set {
        entry: EntryId,
        field: Field,
        value: String,
    },
    /// Drop an unparsed draft and show the committed value again.
    Discard {
        entry: EntryId,
        field: Field,
    },
    Options {
        entry: EntryId,
        field: Field,
    },
    Check,
    Submit,
    Report,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command: {0} (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    Invalid(String),
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
///
/// Commands:
/// - `list` / `ls`, `status`, `topology` / `topo`, `refresh`
/// - `add`, `rm <id>`
/// - `kind <id> <kind>`
/// - `set <id> <field> <value...>` (`-` clears)
/// - `discard <id> <field>`, `options <id> <field>`
/// - `check`, `submit`, `report`, `help`, `quit` / `exit`
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    let args = &parts[1..];

    let command = match parts[0] {
        "help" | "?" => Command::Help,
        "list" | "ls" => Command::List,
        "status" => Command::Status,
        "topology" | "topo" => Command::Topology,
        "refresh" => Command::Refresh,
        "add" => Command::Add,
        "check" => Command::Check,
        "submit" => Command::Submit,
        "report" => Command::Report,
        "quit" | "exit" => Command::Quit,

        "rm" | "remove" => {
            let [id] = args else {
                return Err(CommandError::Usage("rm <id>"));
            };
            Command::Remove(entry_id(id)?)
        }

        "kind" => {
            let [id, kind] = args else {
                return Err(CommandError::Usage("kind <id> <kind>"));
            };
            let kind = kind.parse::<FaultKind>().map_err(CommandError::Invalid)?;
            Command::Kind(entry_id(id)?, kind)
        }

        "set" => {
            let [id, field, value @ ..] = args else {
                return Err(CommandError::Usage("set <id> <field> <value...>"));
            };
            if value.is_empty() {
                return Err(CommandError::Usage("set <id> <field> <value...>"));
            }
            let value = value.join(" ");
            Command::Set {
                entry: entry_id(id)?,
                field: field_name(field)?,
                value: if value == EMPTY_VALUE {
                    String::new()
                } else {
                    value
                },
            }
        }

        "discard" => {
            let [id, field] = args else {
                return Err(CommandError::Usage("discard <id> <field>"));
            };
            Command::Discard {
                entry: entry_id(id)?,
                field: field_name(field)?,
            }
        }

        "options" | "opts" => {
            let [id, field] = args else {
                return Err(CommandError::Usage("options <id> <field>"));
            };
            Command::Options {
                entry: entry_id(id)?,
                field: field_name(field)?,
            }
        }

        other => return Err(CommandError::Unknown(other.to_string())),
    };

    let takes_no_args = matches!(
        command,
        Command::Help
            | Command::List
            | Command::Status
            | Command::Topology
            | Command::Refresh
            | Command::Add
            | Command::Check
            | Command::Submit
            | Command::Report
            | Command::Quit
    );
    if takes_no_args && !args.is_empty() {
        return Err(CommandError::Invalid(format!(
            "'{}' takes no arguments",
            parts[0]
        )));
    }
    Ok(Some(command))
}

fn entry_id(text: &str) -> Result<EntryId, CommandError> {
    text.parse().map_err(CommandError::Invalid)
}

fn field_name(text: &str) -> Result<Field, CommandError> {
    text.parse().map_err(CommandError::Invalid)
}

pub const HELP: &str = "\
commands:
  list                         show the batch
  status                       topology freshness and submission state
  topology                     show the discovered topology
  refresh                      re-discover the topology
  add                          append a default entry
  rm <id>                      remove an entry
  kind <id> <kind>             change an entry's fault kind
  set <id> <field> <value...>  edit a field ('-' clears it)
  discard <id> <field>         drop an unparsed draft
  options <id> <field>         list selectable values
  check                        validate without submitting
  submit                       send the batch
  report                       show the last submission result
  quit                         leave the console";

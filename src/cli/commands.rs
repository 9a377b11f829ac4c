//! Line commands accepted on stdin while the console runs.

use crate::router::ModuleInput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Connect(String),
    Disconnect,
    Navigate(String),
    Input(ModuleInput),
    Status,
    Help,
    Quit,
}

pub const COMMANDS_HELP: &str = "\
commands:
  connect TOKEN            open the channel
  disconnect               close the channel (logout)
  go ROUTE                 dashboard | simulator | traps | walker | browser
  search [TEXT]            browser search (empty clears)
  module [NAME]            browser module filter
  type [NAME]              browser type filter
  expand OID | collapse OID | select OID
  record HOST PORT COMMUNITY OID   remember a walk target
  clear                    clear the active module's history
  status                   show connection state
  quit";

fn optional(rest: &str) -> Option<String> {
    let rest = rest.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

fn required(name: &str, rest: &str) -> Result<String, String> {
    optional(rest).ok_or_else(|| format!("{} needs an argument", name))
}

/// Parse one input line. Blank lines give `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    let command = match word {
        "connect" => ConsoleCommand::Connect(required(word, rest)?),
        "disconnect" | "logout" => ConsoleCommand::Disconnect,
        "go" | "nav" => ConsoleCommand::Navigate(rest.trim().to_string()),
        "search" => ConsoleCommand::Input(ModuleInput::Search(rest.trim().to_string())),
        "module" => ConsoleCommand::Input(ModuleInput::FilterModule(optional(rest))),
        "type" => ConsoleCommand::Input(ModuleInput::FilterType(optional(rest))),
        "expand" => ConsoleCommand::Input(ModuleInput::ExpandNode(required(word, rest)?)),
        "collapse" => ConsoleCommand::Input(ModuleInput::CollapseNode(required(word, rest)?)),
        "select" => ConsoleCommand::Input(ModuleInput::SelectNode(required(word, rest)?)),
        "record" => {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            let [target, port, community, oid] = parts.as_slice() else {
                return Err("usage: record HOST PORT COMMUNITY OID".to_string());
            };
            let port = port
                .parse::<u16>()
                .map_err(|_| format!("invalid port '{}'", port))?;
            ConsoleCommand::Input(ModuleInput::RecordTarget {
                target: target.to_string(),
                port,
                community: community.to_string(),
                oid: oid.to_string(),
            })
        }
        "clear" => ConsoleCommand::Input(ModuleInput::ClearHistory),
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        // A bare fragment navigates, as a location change would
        _ if word.starts_with('#') => ConsoleCommand::Navigate(word.to_string()),
        _ => return Err(format!("unknown command '{}'", word)),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_navigation() {
        assert_eq!(
            parse_command("go traps").unwrap(),
            Some(ConsoleCommand::Navigate("traps".to_string()))
        );
        assert_eq!(
            parse_command("#browser").unwrap(),
            Some(ConsoleCommand::Navigate("#browser".to_string()))
        );
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_module_inputs() {
        assert_eq!(
            parse_command("search  ifIndex ").unwrap(),
            Some(ConsoleCommand::Input(ModuleInput::Search("ifIndex".to_string())))
        );
        assert_eq!(
            parse_command("module").unwrap(),
            Some(ConsoleCommand::Input(ModuleInput::FilterModule(None)))
        );
        assert_eq!(
            parse_command("record 10.0.0.1 161 public 1.3.6.1.2.1").unwrap(),
            Some(ConsoleCommand::Input(ModuleInput::RecordTarget {
                target: "10.0.0.1".to_string(),
                port: 161,
                community: "public".to_string(),
                oid: "1.3.6.1.2.1".to_string(),
            }))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("connect").is_err());
        assert!(parse_command("expand").is_err());
        assert!(parse_command("record host notaport public 1.3").is_err());
        assert!(parse_command("frobnicate").is_err());
    }
}

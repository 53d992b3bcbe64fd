// Command parsing. One input line becomes one `Command`; the shell loop
// matches on it exhaustively.

use thiserror::Error;

use crate::transfer::ExportFormat;

/// Every command the browse loop understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Cd(String),
    Ls,
    TypeOf(String),
    Download {
        name: String,
        /// Last recognized format hint, e.g. `-excel`.
        format_hint: Option<String>,
        target: Option<String>,
    },
    Upload(String),
    Current,
    Record(Option<String>),
    Exec(String),
    Switch,
    Quit,
    Help,
}

/// Word, argument and description for each command, in help order.
pub const COMMANDS: &[(&str, &str, &str)] = &[
    ("cd", "<folder> | ..", "change directory"),
    ("ls", "", "list the current folder"),
    ("typeof", "<name>", "show the MIME type of an entry"),
    (
        "download",
        "<name> [-pdf|-docs|-excel|-powerpoint] [--to=<file>]",
        "download a file",
    ),
    ("upload", "<local path>", "upload a file into the current folder"),
    ("current", "", "print the current path"),
    ("record", "[file]", "write the current folder's names to a file"),
    ("exec", "<shell command>", "run a local shell command"),
    ("switch", "", "log out and return to the start screen"),
    ("quit", "", "exit"),
    ("help", "", "show this help"),
];

/// Why an input line is not a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command {0}")]
    Unknown(String),

    #[error("{0}: missing argument")]
    MissingArgument(&'static str),
}

impl Command {
    /// Parse one input line. Returns `Ok(None)` for a blank line.
    ///
    /// Arguments after the command word are re-joined with single spaces,
    /// so names containing spaces need no quoting.
    pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();
        let arg = rest.join(" ");

        let required = |cmd: &'static str| {
            if arg.is_empty() {
                Err(ParseError::MissingArgument(cmd))
            } else {
                Ok(arg.clone())
            }
        };

        let command = match word {
            "cd" => Command::Cd(required("cd")?),
            "ls" => Command::Ls,
            "typeof" => Command::TypeOf(required("typeof")?),
            "download" => parse_download(&rest)?,
            "upload" => Command::Upload(required("upload")?),
            "current" => Command::Current,
            "record" => Command::Record((!arg.is_empty()).then(|| arg.clone())),
            "exec" => Command::Exec(required("exec")?),
            "switch" => Command::Switch,
            "quit" => Command::Quit,
            "help" => Command::Help,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// Words starting with `-` are options; everything else is the name.
/// Unknown format hints are dropped, which leaves the PDF default.
fn parse_download(words: &[&str]) -> Result<Command, ParseError> {
    let mut name = Vec::new();
    let mut format_hint = None;
    let mut target = None;

    for word in words {
        if let Some(to) = word.strip_prefix("--to=") {
            target = (!to.is_empty()).then(|| to.to_string());
        } else if word.starts_with('-') && word.len() > 1 {
            if ExportFormat::from_hint(word).is_some() {
                format_hint = Some(word.to_string());
            }
        } else {
            name.push(*word);
        }
    }

    if name.is_empty() {
        return Err(ParseError::MissingArgument("download"));
    }
    Ok(Command::Download {
        name: name.join(" "),
        format_hint,
        target,
    })
}

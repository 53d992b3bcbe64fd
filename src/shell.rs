// Command execution for the browse loop. Each command runs to completion
// against the session's cursor and writes what the user should see to
// `out`. Browsing errors are reported here, never propagated: only a
// failure to write output ends the loop.

use std::io::Write;
use std::path::Path;
use std::process;

use anyhow::Result;
use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::command::{Command, COMMANDS};
use crate::cursor::{CdOutcome, DirectoryCursor};
use crate::entry::EntryKind;
use crate::error::BrowseError;
use crate::progress::TransferProgress;
use crate::remote::RemoteClient;
use crate::transfer::TransferManager;

/// How a browse session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    LoggedOut,
}

/// Whether the loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    End(SessionEnd),
}

/// Run one command against the cursor.
pub fn execute<C, W>(cursor: &mut DirectoryCursor<C>, command: Command, out: &mut W) -> Result<Flow>
where
    C: RemoteClient,
    W: Write,
{
    match command {
        Command::Cd(name) => match cursor.change_directory(&name) {
            Ok(CdOutcome::AlreadyAtRoot) => writeln!(out, "{}", BrowseError::AlreadyAtRoot)?,
            Ok(_) => {}
            Err(BrowseError::NotFound(_) | BrowseError::NotAFolder(_)) => {
                writeln!(out, "Folder does not exist")?
            }
            Err(e) => writeln!(out, "{e}")?,
        },
        Command::Ls => {
            for (name, kind) in cursor.list() {
                match kind {
                    EntryKind::Folder => writeln!(out, "{}", name.blue())?,
                    EntryKind::File => writeln!(out, "{name}")?,
                }
            }
        }
        Command::TypeOf(name) => match cursor.lookup(&name) {
            Ok(entry) => writeln!(out, "{}", entry.mime_type)?,
            Err(_) => writeln!(out, "File/Folder does not exist")?,
        },
        Command::Download {
            name,
            format_hint,
            target,
        } => {
            let bar = transfer_bar(&name)?;
            let result = TransferManager::new(cursor).download(
                &name,
                format_hint.as_deref(),
                target.as_deref().map(Path::new),
                &mut |p: &TransferProgress| bar.set_position(p.percent() as u64),
            );
            bar.finish_and_clear();
            match result {
                Ok(report) => {
                    let how = report
                        .exported_as
                        .map(|m| format!(" (exported as {m})"))
                        .unwrap_or_default();
                    writeln!(
                        out,
                        "Downloaded {name} to {} [{} bytes]{how}",
                        report.target.display(),
                        report.bytes
                    )?
                }
                Err(BrowseError::NotFound(_)) => writeln!(out, "File/Folder does not exist")?,
                Err(e) => writeln!(out, "{e}")?,
            }
        }
        Command::Upload(path) => {
            let bar = transfer_bar(&path)?;
            let result = TransferManager::new(cursor).upload(
                Path::new(&path),
                &mut |p: &TransferProgress| bar.set_position(p.percent() as u64),
            );
            bar.finish_and_clear();
            match result {
                Ok(entry) => writeln!(out, "Uploaded {}", entry.name)?,
                Err(BrowseError::FileNotFound(_)) => writeln!(out, "File not found")?,
                Err(e) => writeln!(out, "{e}")?,
            }
        }
        Command::Current => writeln!(out, "{}", cursor.current_path())?,
        Command::Record(target) => {
            match TransferManager::new(cursor).record_names(target.as_deref().map(Path::new)) {
                Ok(path) => writeln!(out, "Recorded names to {}", path.display())?,
                Err(e) => writeln!(out, "{e}")?,
            }
        }
        Command::Exec(line) => match process::Command::new("sh").arg("-c").arg(&line).status() {
            Ok(status) if !status.success() => writeln!(out, "{status}")?,
            Ok(_) => {}
            Err(e) => writeln!(out, "exec failed: {e}")?,
        },
        Command::Help => {
            for (word, args, about) in COMMANDS {
                let usage = format!("{word} {args}");
                writeln!(out, "  {:<60} {about}", usage.trim_end())?;
            }
        }
        Command::Switch => return Ok(Flow::End(SessionEnd::LoggedOut)),
        Command::Quit => return Ok(Flow::End(SessionEnd::Quit)),
    }
    Ok(Flow::Continue)
}

fn transfer_bar(label: &str) -> Result<ProgressBar> {
    let bar = ProgressBar::new(100);
    bar.set_style(ProgressStyle::with_template("{msg} [{bar:40}] {pos}%")?.progress_chars("=> "));
    bar.set_message(label.to_string());
    Ok(bar)
}

// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Line-oriented command shell driving the volume core.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Interactive shell over a [`Volume`].
//!
//! The shell only parses text and prints one status line per command; every
//! decision is made by the volume core. Rejected commands are reported and
//! the shell carries on. Storage failures end the shell.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::error::VolumeError;
use crate::namespace::EntryKind;
use crate::session::Session;
use crate::volume::Volume;

/// Whether the shell keeps reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Read the next command.
    Continue,
    /// Leave the current loop.
    Quit,
}

const TOP_HELP: &str = "commands: create <name> <size>, enter <name>, list, help, exit";
const PARTITION_HELP: &str = "commands: ls [-l], cd <dir>, mkdir <dir>, touch <file>, rm <file>, \
rmdir <dir>, edit <file> <content...>, cat <file>, pwd, help, exit";

/// Shell reading commands from `input` and reporting to `writer`.
pub struct Shell<R: BufRead, W: Write> {
    volume: Volume,
    input: R,
    writer: W,
    prompts: bool,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    /// Shell over `volume` with prompts enabled.
    pub fn new(volume: Volume, input: R, writer: W) -> Self {
        Self {
            volume,
            input,
            writer,
            prompts: true,
        }
    }

    /// Enable or disable prompt output (disabled for scripts).
    pub fn with_prompts(mut self, prompts: bool) -> Self {
        self.prompts = prompts;
        self
    }

    /// Run until `exit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        loop {
            if self.prompts {
                write!(self.writer, "cohvol> ")?;
                self.writer.flush()?;
            }
            let Some(line) = read_line(&mut self.input)? else {
                break;
            };
            if self.execute(&line)? == CommandStatus::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Execute one top-level command line.
    pub fn execute(&mut self, line: &str) -> Result<CommandStatus> {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(CommandStatus::Continue);
        };
        match cmd {
            "help" => writeln!(self.writer, "{TOP_HELP}")?,
            "create" => {
                let (Some(name), Some(size)) = (parts.next(), parts.next()) else {
                    writeln!(self.writer, "usage: create <name> <size>")?;
                    return Ok(CommandStatus::Continue);
                };
                let Ok(size) = size.parse::<u64>() else {
                    writeln!(self.writer, "error: invalid size '{size}'")?;
                    return Ok(CommandStatus::Continue);
                };
                match self.volume.create_partition(name, size) {
                    Ok(partition) => writeln!(
                        self.writer,
                        "partition '{name}' created at offset {} with size {size} bytes",
                        partition.start()
                    )?,
                    Err(err) => report(&mut self.writer, err)?,
                }
            }
            "list" => {
                let capacity = self.volume.capacity();
                let table = self.volume.partitions();
                for partition in table.iter() {
                    writeln!(
                        self.writer,
                        "{} start={} size={} free={}",
                        partition.name(),
                        partition.start(),
                        partition.length(),
                        partition.available()
                    )?;
                }
                writeln!(
                    self.writer,
                    "{} of {capacity} bytes unpartitioned",
                    table.free_space(capacity)
                )?;
            }
            "enter" => {
                let Some(name) = parts.next() else {
                    writeln!(self.writer, "usage: enter <name>")?;
                    return Ok(CommandStatus::Continue);
                };
                self.enter(name)?;
            }
            "exit" | "quit" => {
                writeln!(self.writer, "exiting")?;
                return Ok(CommandStatus::Quit);
            }
            unknown => writeln!(self.writer, "error: command '{unknown}' not recognized")?,
        }
        Ok(CommandStatus::Continue)
    }

    fn enter(&mut self, name: &str) -> Result<()> {
        if self.volume.partition(name).is_none() {
            writeln!(self.writer, "error: partition '{name}' does not exist")?;
            return Ok(());
        }
        loop {
            let Some((username, secret)) = self.authenticate(name)? else {
                return Ok(());
            };
            match self.volume.enter_partition(name, &username, &secret) {
                Ok(mut session) => {
                    writeln!(self.writer, "logged in as '{username}'")?;
                    writeln!(self.writer, "entering partition '{name}'")?;
                    run_partition(&mut session, &mut self.input, &mut self.writer, self.prompts)?;
                    writeln!(self.writer, "leaving partition '{name}'")?;
                    return Ok(());
                }
                Err(err) => report(&mut self.writer, err)?,
            }
        }
    }

    /// Run the login/enroll menu and collect the credential to enter with;
    /// `None` means the user backed out.
    fn authenticate(&mut self, name: &str) -> Result<Option<(String, String)>> {
        loop {
            self.prompt("login, enroll or back? ")?;
            let Some(choice) = read_line(&mut self.input)? else {
                return Ok(None);
            };
            match choice.as_str() {
                "login" | "1" => return self.ask_credentials().map(Some),
                "enroll" | "2" => {
                    if self.volume.is_enrolled(name) {
                        writeln!(self.writer, "error: partition '{name}' already has a user")?;
                        continue;
                    }
                    let (username, secret) = self.ask_credentials()?;
                    match self.volume.enroll(name, &username, &secret) {
                        Ok(()) => {
                            writeln!(self.writer, "user '{username}' created")?;
                            return Ok(Some((username, secret)));
                        }
                        Err(err) => report(&mut self.writer, err)?,
                    }
                }
                "back" | "3" => return Ok(None),
                other => writeln!(self.writer, "error: invalid choice '{other}'")?,
            }
        }
    }

    fn ask_credentials(&mut self) -> Result<(String, String)> {
        self.prompt("username: ")?;
        let username = read_line(&mut self.input)?.unwrap_or_default();
        self.prompt("secret: ")?;
        let secret = read_line(&mut self.input)?.unwrap_or_default();
        Ok((username, secret))
    }

    fn prompt(&mut self, text: &str) -> Result<()> {
        if self.prompts {
            write!(self.writer, "{text}")?;
            self.writer.flush()?;
        }
        Ok(())
    }

    /// Consume the shell and return the volume and writer.
    pub fn into_parts(self) -> (Volume, W) {
        (self.volume, self.writer)
    }
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_owned()))
}

/// Print a rejected request; storage failures end the shell.
fn report<W: Write>(writer: &mut W, err: VolumeError) -> Result<()> {
    writeln!(writer, "error: {err}")?;
    if err.is_fatal() {
        return Err(err).context("volume storage failure");
    }
    Ok(())
}

fn run_partition<R: BufRead, W: Write>(
    session: &mut Session<'_>,
    input: &mut R,
    writer: &mut W,
    prompts: bool,
) -> Result<()> {
    loop {
        if prompts {
            write!(writer, "{}:{} $ ", session.partition(), session.current_path())?;
            writer.flush()?;
        }
        let Some(line) = read_line(input)? else {
            return Ok(());
        };
        if execute_in_partition(session, writer, &line)? == CommandStatus::Quit {
            return Ok(());
        }
    }
}

/// Execute one command inside a partition session.
pub fn execute_in_partition<W: Write>(
    session: &mut Session<'_>,
    writer: &mut W,
    line: &str,
) -> Result<CommandStatus> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(CommandStatus::Continue);
    };
    let arg = parts.next();
    let outcome = match (cmd, arg) {
        ("help", _) => {
            writeln!(writer, "{PARTITION_HELP}")?;
            Ok(())
        }
        ("pwd", _) => {
            writeln!(writer, "{}", session.current_path())?;
            Ok(())
        }
        ("ls", Some("-l")) => session.listing().and_then(|entries| {
            for entry in entries {
                match entry.kind {
                    EntryKind::Directory => {
                        writeln!(writer, "d {:>8} {}/", entry.size, entry.name)?
                    }
                    EntryKind::File => writeln!(writer, "- {:>8} {}", entry.size, entry.name)?,
                }
            }
            Ok(())
        }),
        ("ls", _) => session
            .list()
            .and_then(|names| Ok(writeln!(writer, "{}", names.join(" "))?)),
        ("cd", Some(dir)) => session.change_directory(dir),
        ("mkdir", Some(dir)) => session.make_directory(dir),
        ("rmdir", Some(dir)) => session.remove_directory(dir),
        ("touch", Some(file)) => session
            .create_file(file)
            .and_then(|_| Ok(writeln!(writer, "file '{file}' created")?)),
        ("rm", Some(file)) => session.remove_file(file).map(|_| ()),
        ("edit", Some(file)) => {
            let content = parts.collect::<Vec<_>>().join(" ");
            if content.is_empty() {
                writeln!(writer, "usage: edit <file> <content...>")?;
                return Ok(CommandStatus::Continue);
            }
            session.edit_file(file, content.as_bytes()).and_then(|entry| {
                Ok(writeln!(
                    writer,
                    "file '{file}' updated ({} bytes)",
                    entry.size
                )?)
            })
        }
        ("cat", Some(file)) => session
            .read_file(file)
            .and_then(|bytes| Ok(writeln!(writer, "{}", String::from_utf8_lossy(&bytes))?)),
        ("exit", _) => return Ok(CommandStatus::Quit),
        ("cd" | "mkdir" | "rmdir" | "touch" | "rm" | "edit" | "cat", None) => {
            writeln!(writer, "error: '{cmd}' needs an argument")?;
            Ok(())
        }
        (unknown, _) => {
            writeln!(writer, "error: command '{unknown}' not recognized")?;
            Ok(())
        }
    };
    if let Err(err) = outcome {
        report(writer, err)?;
    }
    Ok(CommandStatus::Continue)
}

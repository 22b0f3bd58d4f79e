use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use dhtkv_core::ConnectedStore;
use dhtkv_store::{StoreValue, SyncStore};
use dhtkv_table::MemoryTable;
use dhtkv_types::{Cas, Key, Seq};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::cli::OutputFormat;

const HELP: &str = "\
commands:
  add <name> <value...>              publish a new value
  put <name> <value...> <seq> <cas>  publish with an explicit version
  update <name> <value...>           publish the next version
  get <key|name> [seq]               read, ledger first
  fetch <key|name> [seq]             read from the network
  remove <key>                       forget a key locally
  keys                               list ledger keys
  stats                              show replication statistics
  expire                             drop every item stored on the network
  quit";

/// One line of session input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    Add { name: String, value: String },
    Put { name: String, value: String, seq: Seq, cas: Cas },
    Update { name: String, value: String },
    Get { lookup: String, seq: Option<Seq> },
    Fetch { lookup: String, seq: Option<Seq> },
    Remove { key: Key },
    Keys,
    Stats,
    Expire,
    Help,
    Quit,
}

impl SessionCommand {
    /// Parse a line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = words.split_first() else {
            return Ok(None);
        };
        if verb.starts_with('#') {
            return Ok(None);
        }

        let command = match (verb, args) {
            ("add", [name, value @ ..]) if !value.is_empty() => Self::Add {
                name: name.to_string(),
                value: value.join(" "),
            },
            ("update", [name, value @ ..]) if !value.is_empty() => Self::Update {
                name: name.to_string(),
                value: value.join(" "),
            },
            ("put", [name, value @ .., seq, cas]) if !value.is_empty() => Self::Put {
                name: name.to_string(),
                value: value.join(" "),
                seq: seq.parse().with_context(|| format!("invalid seq {seq:?}"))?,
                cas: cas.parse().with_context(|| format!("invalid cas {cas:?}"))?,
            },
            ("get", [lookup, rest @ ..]) if rest.len() <= 1 => Self::Get {
                lookup: lookup.to_string(),
                seq: parse_seq(rest)?,
            },
            ("fetch", [lookup, rest @ ..]) if rest.len() <= 1 => Self::Fetch {
                lookup: lookup.to_string(),
                seq: parse_seq(rest)?,
            },
            ("remove", [key]) => Self::Remove {
                key: key.parse().with_context(|| format!("invalid key {key:?}"))?,
            },
            ("keys", []) => Self::Keys,
            ("stats", []) => Self::Stats,
            ("expire", []) => Self::Expire,
            ("help", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            _ => bail!("unrecognised command {line:?}; type `help`"),
        };
        Ok(Some(command))
    }
}

fn parse_seq(rest: &[&str]) -> anyhow::Result<Option<Seq>> {
    rest.first()
        .map(|s| s.parse().with_context(|| format!("invalid seq {s:?}")))
        .transpose()
}

/// Interactive front end over a store on a simulated network.
pub struct Session {
    store: ConnectedStore<SyncStore>,
    table: Arc<MemoryTable>,
    copies: Option<usize>,
    format: OutputFormat,
}

impl Session {
    pub fn new(
        store: ConnectedStore<SyncStore>,
        table: Arc<MemoryTable>,
        copies: Option<usize>,
        format: OutputFormat,
    ) -> Self {
        Self {
            store,
            table,
            copies,
            format,
        }
    }

    pub fn store(&self) -> &ConnectedStore<SyncStore> {
        &self.store
    }

    /// Execute commands from `input` until `quit` or end of input. Command
    /// failures are reported and the session continues.
    pub async fn run<R: AsyncBufRead + Unpin>(&self, input: R) -> anyhow::Result<()> {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await.context("reading input")? {
            let command = match SessionCommand::parse(&line) {
                Ok(Some(SessionCommand::Quit)) => break,
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    eprintln!("{} {err:#}", "error:".red().bold());
                    continue;
                }
            };
            match self.execute(command).await {
                Ok(output) => println!("{output}"),
                Err(err) => eprintln!("{} {err:#}", "error:".red().bold()),
            }
        }
        Ok(())
    }

    pub async fn execute(&self, command: SessionCommand) -> anyhow::Result<String> {
        let output = match command {
            SessionCommand::Add { name, value } => {
                let key = self.store.add(&name, &value, self.copies).await?;
                format!("{} {}", "added".green(), key)
            }
            SessionCommand::Put { name, value, seq, cas } => {
                let key = self.store.put(&name, &value, seq, cas, self.copies).await?;
                format!("{} {} (seq {seq}, cas {cas})", "put".green(), key)
            }
            SessionCommand::Update { name, value } => {
                let key = self.store.update(&name, &value, self.copies).await?;
                format!("{} {}", "updated".green(), key)
            }
            SessionCommand::Get { lookup, seq } => self.store.get(&lookup, seq, None).await?,
            SessionCommand::Fetch { lookup, seq } => self.store.fetch(&lookup, seq, None).await?,
            SessionCommand::Remove { key } => {
                self.store.remove(&key)?;
                format!("{} {}", "removed".yellow(), key)
            }
            SessionCommand::Keys => {
                let mut keys = self.store.keys();
                keys.sort();
                if keys.is_empty() {
                    "(empty)".to_string()
                } else {
                    keys.iter().map(Key::to_hex).collect::<Vec<_>>().join("\n")
                }
            }
            SessionCommand::Stats => render_stats(&self.store, self.format)?,
            SessionCommand::Expire => {
                self.table.expire_all();
                format!(
                    "expired stored items on {} nodes",
                    self.table.node_count()
                )
            }
            SessionCommand::Help => HELP.to_string(),
            SessionCommand::Quit => String::new(),
        };
        Ok(output)
    }
}

#[derive(Serialize)]
struct StatRow<'a> {
    key: String,
    #[serde(flatten)]
    stat: &'a StoreValue,
}

/// Ledger statistics, one entry per key, ordered by name.
pub fn render_stats(store: &ConnectedStore<SyncStore>, format: OutputFormat) -> anyhow::Result<String> {
    let mut rows: Vec<(Key, StoreValue)> = store
        .keys()
        .into_iter()
        .filter_map(|key| store.stat(&key).map(|stat| (key, stat)))
        .collect();
    rows.sort_by(|a, b| a.1.name.cmp(&b.1.name).then(a.0.cmp(&b.0)));

    match format {
        OutputFormat::Json => {
            let rows: Vec<StatRow<'_>> = rows
                .iter()
                .map(|(key, stat)| StatRow {
                    key: key.to_hex(),
                    stat,
                })
                .collect();
            Ok(serde_json::to_string_pretty(&rows)?)
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                return Ok("(empty)".to_string());
            }
            let lines: Vec<String> = rows
                .iter()
                .map(|(key, stat)| {
                    let mark = if stat.is_replicated() {
                        "✓".green()
                    } else {
                        "✗".red()
                    };
                    format!(
                        "{mark} {} {} = {}  copies {}/{}  seq {}  cas {}  errors {}",
                        key.short_hex().yellow(),
                        stat.name.bold(),
                        stat.value,
                        stat.replication_count,
                        stat.wish_replication_count,
                        stat.last_seq,
                        stat.last_cas,
                        stat.errors.len(),
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

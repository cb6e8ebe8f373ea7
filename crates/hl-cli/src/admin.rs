//! Line-based admin console.
//!
//! Runs on the main thread next to the scheduler.  It shares only the
//! virtual clock with the scheduler and talks to the database through its
//! own store handle.  Bad input prints an error and the console carries on.

use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use hl_core::{ConnectionId, CoreError, Manifest, TimeSource, TransportId, VirtualClock, WarehouseId};
use hl_routing::DijkstraPathFinder;
use hl_sim::{Outcome, SimError, TransportAdvancer};
use hl_store::{AdminStore, LogisticsStore, StoreError};
use thiserror::Error;
use tracing::info;

pub const HELP: &str = "\
commands:
  time                                  show virtual time and scale
  scale <factor>                        set virtual seconds per real second
  jump <duration>                       move virtual time forward (90, 1w2d3h4m5s)
  warehouse <name>                      add a warehouse
  product <name>                        add a product
  connect <from> <to> <duration> [two-way]
                                        add a connection (rounded up to minutes)
  disconnect <connection>               remove a connection
  stock <warehouse>                     show a warehouse's stock
  add-stock <warehouse> <product>:<count>...
                                        add stock to a warehouse
  dispatch <from> <to> <product>:<count>...
                                        send cargo from one warehouse to another
  reroute <transport> <warehouse>       change a transport's destination
  status                                count active, stranded and finished transports
  help                                  show this text
  quit                                  stop the service";

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid number '{0}'")]
    BadNumber(String),

    #[error("invalid duration '{0}' (use seconds or e.g. 1w2d3h4m5s)")]
    BadDuration(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sim(#[from] SimError),
}

pub type AdminResult<T> = Result<T, AdminError>;

// ── Commands ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum AdminCommand {
    Time,
    Scale(f64),
    Jump(Duration),
    Warehouse(String),
    Product(String),
    Connect { from: WarehouseId, to: WarehouseId, minutes: u32, two_way: bool },
    Disconnect(ConnectionId),
    Stock(WarehouseId),
    AddStock { warehouse: WarehouseId, cargo: Manifest },
    Dispatch { from: WarehouseId, to: WarehouseId, cargo: Manifest },
    Reroute { transport: TransportId, target: WarehouseId },
    Status,
    Help,
    Quit,
}

impl FromStr for AdminCommand {
    type Err = AdminError;

    fn from_str(line: &str) -> AdminResult<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(AdminError::Usage("help"));
        };
        let args: Vec<&str> = words.collect();

        let cmd = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("time", []) => AdminCommand::Time,
            ("scale", [factor]) => match parse_number::<f64>(factor)? {
                f if f.is_finite() => AdminCommand::Scale(f),
                _ => return Err(AdminError::BadNumber(factor.to_string())),
            },
            ("scale", _) => return Err(AdminError::Usage("scale <factor>")),
            ("jump", [d]) => AdminCommand::Jump(parse_duration(d)?),
            ("jump", _) => return Err(AdminError::Usage("jump <duration>")),
            ("warehouse", [_, ..]) => AdminCommand::Warehouse(args.join(" ")),
            ("warehouse", []) => return Err(AdminError::Usage("warehouse <name>")),
            ("product", [_, ..]) => AdminCommand::Product(args.join(" ")),
            ("product", []) => return Err(AdminError::Usage("product <name>")),
            ("connect", [from, to, d, rest @ ..]) if rest.len() <= 1 => {
                let two_way = match rest {
                    [] => false,
                    [flag] if flag.eq_ignore_ascii_case("two-way") => true,
                    _ => return Err(AdminError::Usage("connect <from> <to> <duration> [two-way]")),
                };
                AdminCommand::Connect {
                    from: parse_number(from)?,
                    to: parse_number(to)?,
                    minutes: whole_minutes(parse_duration(d)?),
                    two_way,
                }
            }
            ("connect", _) => return Err(AdminError::Usage("connect <from> <to> <duration> [two-way]")),
            ("disconnect", [id]) => AdminCommand::Disconnect(parse_number(id)?),
            ("disconnect", _) => return Err(AdminError::Usage("disconnect <connection>")),
            ("stock", [id]) => AdminCommand::Stock(parse_number(id)?),
            ("stock", _) => return Err(AdminError::Usage("stock <warehouse>")),
            ("add-stock", [w, items @ ..]) if !items.is_empty() => AdminCommand::AddStock {
                warehouse: parse_number(w)?,
                cargo:     parse_manifest(items)?,
            },
            ("add-stock", _) => {
                return Err(AdminError::Usage("add-stock <warehouse> <product>:<count>..."));
            }
            ("dispatch", [from, to, items @ ..]) if !items.is_empty() => AdminCommand::Dispatch {
                from:  parse_number(from)?,
                to:    parse_number(to)?,
                cargo: parse_manifest(items)?,
            },
            ("dispatch", _) => {
                return Err(AdminError::Usage("dispatch <from> <to> <product>:<count>..."));
            }
            ("reroute", [t, w]) => AdminCommand::Reroute {
                transport: parse_number(t)?,
                target:    parse_number(w)?,
            },
            ("reroute", _) => return Err(AdminError::Usage("reroute <transport> <warehouse>")),
            ("status", []) => AdminCommand::Status,
            ("help" | "?", _) => AdminCommand::Help,
            ("quit" | "exit", []) => AdminCommand::Quit,
            ("time" | "status" | "quit" | "exit", _) => {
                return Err(AdminError::Usage("time | status | quit take no arguments"));
            }
            _ => return Err(AdminError::UnknownCommand(verb.to_string())),
        };
        Ok(cmd)
    }
}

fn parse_number<N: FromStr>(token: &str) -> AdminResult<N> {
    token.parse().map_err(|_| AdminError::BadNumber(token.to_string()))
}

fn parse_manifest(tokens: &[&str]) -> AdminResult<Manifest> {
    let mut cargo = Manifest::new();
    for token in tokens {
        let (product, count) = Manifest::parse_entry(token)?;
        cargo.try_add(product, count)?;
    }
    Ok(cargo)
}

/// Round up to whole minutes.
fn whole_minutes(d: Duration) -> u32 {
    let minutes = (d.as_secs_f64() / 60.0).ceil();
    if minutes >= f64::from(u32::MAX) { u32::MAX } else { minutes as u32 }
}

/// Parse a duration as plain seconds (`90`, `1.5`) or as unit groups
/// (`1w2d3h4m5s`, `90m`, `2h30m`).  Every group adds; weeks and days count
/// in full.
pub fn parse_duration(text: &str) -> AdminResult<Duration> {
    let bad = || AdminError::BadDuration(text.to_string());

    if let Ok(secs) = text.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).map_err(|_| bad());
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    let mut groups = 0;
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let unit: u64 = match ch.to_ascii_lowercase() {
            'w' => 7 * 24 * 3600,
            'd' => 24 * 3600,
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(bad()),
        };
        let n: u64 = digits.parse().map_err(|_| bad())?;
        digits.clear();
        total = n
            .checked_mul(unit)
            .and_then(|s| total.checked_add(s))
            .ok_or_else(bad)?;
        groups += 1;
    }
    if groups == 0 || !digits.is_empty() {
        return Err(bad());
    }
    Ok(Duration::from_secs(total))
}

// ── Execution ─────────────────────────────────────────────────────────────────

/// Executes [`AdminCommand`]s against a store and the shared clock.
pub struct Admin<S: AdminStore, T: TimeSource> {
    store:    S,
    clock:    Arc<VirtualClock<T>>,
    advancer: TransportAdvancer<DijkstraPathFinder>,
}

impl<S: AdminStore, T: TimeSource> Admin<S, T> {
    pub fn new(store: S, clock: Arc<VirtualClock<T>>) -> Self {
        Self { store, clock, advancer: TransportAdvancer::new(DijkstraPathFinder) }
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Run one command and describe the result.  `Quit` is the caller's to
    /// handle and is answered with an empty reply.
    pub fn execute(&mut self, cmd: AdminCommand) -> AdminResult<String> {
        let reply = match cmd {
            AdminCommand::Time => {
                let secs = self.clock.get_time();
                format!(
                    "virtual time {secs:.1}s ({}), scale {}",
                    self.clock.current_minute(),
                    self.clock.get_scale()
                )
            }
            AdminCommand::Scale(factor) => {
                let old = self.clock.get_scale();
                self.clock.set_scale(factor);
                if factor <= 0.0 {
                    format!("scale {old} -> {factor} (clock paused)")
                } else {
                    format!("scale {old} -> {factor}")
                }
            }
            AdminCommand::Jump(by) => {
                self.clock.jump(by);
                format!("jumped {}s, now {}", by.as_secs_f64(), self.clock.current_minute())
            }
            AdminCommand::Warehouse(name) => {
                let id = self.store.add_warehouse(&name)?;
                format!("added {id} '{name}'")
            }
            AdminCommand::Product(name) => {
                let id = self.store.add_product(&name)?;
                format!("added {id} '{name}'")
            }
            AdminCommand::Connect { from, to, minutes, two_way } => {
                let ids = self.store.add_connection(from, to, minutes, two_way)?;
                let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
                format!("added {} ({minutes} min)", ids.join(", "))
            }
            AdminCommand::Disconnect(id) => {
                self.store.remove_connection(id)?;
                format!("removed {id}")
            }
            AdminCommand::Stock(warehouse) => {
                let stock = self.store.stock(warehouse)?;
                if stock.is_empty() {
                    format!("{warehouse} is empty")
                } else {
                    let mut out = format!("{warehouse}:");
                    for (product, count) in &stock {
                        let _ = write!(out, "\n  {product}: {count}");
                    }
                    out
                }
            }
            AdminCommand::AddStock { warehouse, cargo } => {
                self.store.upsert_stock(warehouse, &cargo)?;
                format!("added {} units to {warehouse}", cargo.total_units())
            }
            AdminCommand::Dispatch { from, to, cargo } => {
                let now = self.clock.current_minute();
                let d = self.advancer.dispatch(&mut self.store, from, to, &cargo, now)?;
                info!(transport = %d.transport, %from, %to, units = cargo.total_units(), "dispatched");
                match d.outcome {
                    Outcome::Continued { hop, .. } => format!(
                        "{} departed via {} toward {}, arriving there in {} min",
                        d.transport, hop.connection, hop.target, hop.leg_minutes
                    ),
                    Outcome::Delivered { at } => format!("{} delivered at {at} immediately", d.transport),
                    Outcome::Stranded { .. } | Outcome::Unchanged => {
                        format!("{} created but no path yet; it will leave once one exists", d.transport)
                    }
                }
            }
            AdminCommand::Reroute { transport, target } => {
                self.store.reroute_transport(transport, target)?;
                format!("{transport} now bound for {target}")
            }
            AdminCommand::Status => {
                let active = self.store.list_active_transports()?.len();
                let stranded = self.store.list_stranded_transports()?.len();
                let finished = self.store.list_finished_transports()?.len();
                format!("{active} in transit, {stranded} stranded, {finished} delivered")
            }
            AdminCommand::Help => HELP.to_string(),
            AdminCommand::Quit => String::new(),
        };
        Ok(reply)
    }
}

/// Read commands from `input` until `quit` or end of input, writing replies
/// and errors to `out`.
pub fn admin_loop<S, T, R, W>(admin: &mut Admin<S, T>, input: R, mut out: W) -> std::io::Result<()>
where
    S: AdminStore,
    T: TimeSource,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<AdminCommand>() {
            Ok(AdminCommand::Quit) => break,
            Ok(cmd) => match admin.execute(cmd) {
                Ok(reply) => writeln!(out, "{reply}")?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Err(e) => writeln!(out, "error: {e}")?,
        }
        out.flush()?;
    }
    Ok(())
}

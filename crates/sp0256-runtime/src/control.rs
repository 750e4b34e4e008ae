//! Console command set and dispatch

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use sp0256_core::{
    resolve, resolve_all, AllophoneId, LogCategory, Sp0256Error, Sp0256Result, StatusSnapshot,
    TARGET_INTERFACE,
};

use crate::{Diagnostics, EmulatorHandle, LogConfig, LogHandle, SimBus};

/// "Hello"
pub const HELLO: [&str; 4] = ["HH", "EH", "LL", "OW"];
/// "World"
pub const WORLD: [&str; 4] = ["WW", "OR", "LL", "DD1"];

/// Strobe hold time for a simulated bus write
pub const POKE_HOLD: Duration = Duration::from_millis(1);

/// `DEBUG` argument
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugTarget {
    Category(LogCategory),
    Verbose,
}

/// A parsed console line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `SPEAK <tokens...>`; empty = usage
    Speak(Vec<AllophoneId>),
    List,
    Status,
    Cleanup,
    Reset,
    Gpio,
    /// `DEBUG` alone lists the categories
    Debug(Option<DebugTarget>),
    Hello,
    World,
    /// Simulated bus write
    Poke(AllophoneId),
    Help,
    Quit,
    /// Blank line
    Empty,
}

impl Command {
    /// Parse a console line
    ///
    /// Every SPEAK token is resolved up front, so one bad token rejects the
    /// whole line.
    pub fn parse(line: &str) -> Sp0256Result<Command> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Ok(Command::Empty);
        };
        let args: Vec<&str> = parts.collect();

        let command = match word.to_ascii_uppercase().as_str() {
            "SPEAK" => Command::Speak(resolve_all(args.iter().copied())?),
            "LIST" => Command::List,
            "STATUS" => Command::Status,
            "CLEANUP" => Command::Cleanup,
            "RESET" => Command::Reset,
            "GPIO" => Command::Gpio,
            "DEBUG" => Command::Debug(match args.first() {
                None => None,
                Some(arg) if arg.eq_ignore_ascii_case("VERBOSE") => Some(DebugTarget::Verbose),
                Some(arg) => Some(DebugTarget::Category(arg.parse()?)),
            }),
            "HELLO" => Command::Hello,
            "WORLD" => Command::World,
            "POKE" => match args.as_slice() {
                [token] => Command::Poke(resolve(token)?),
                _ => return Err(Sp0256Error::UnknownCommand(line.trim().to_string())),
            },
            "HELP" | "?" => Command::Help,
            "QUIT" | "EXIT" | "BYE" => Command::Quit,
            _ => return Err(Sp0256Error::UnknownCommand(word.to_string())),
        };
        Ok(command)
    }
}

impl FromStr for Command {
    type Err = Sp0256Error;

    fn from_str(s: &str) -> Sp0256Result<Self> {
        Command::parse(s)
    }
}

/// What a command produced
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Spoke {
        ids: Vec<AllophoneId>,
        played: usize,
        total: usize,
    },
    SpeakUsage,
    Listing,
    Status(StatusSnapshot),
    Cleaned(usize),
    Reset(usize),
    Gpio(Diagnostics),
    DebugState(LogConfig),
    DebugToggled {
        target: DebugTarget,
        enabled: bool,
    },
    Poked(AllophoneId),
    Help,
    Quit,
    Nothing,
}

impl Response {
    pub fn is_quit(&self) -> bool {
        matches!(self, Response::Quit)
    }
}

/// Executes commands against a running emulator
pub struct ControlSurface {
    handle: EmulatorHandle,
    logging: Option<LogHandle>,
    host: Option<SimBus>,
}

impl ControlSurface {
    pub fn new(handle: EmulatorHandle) -> Self {
        ControlSurface {
            handle,
            logging: None,
            host: None,
        }
    }

    /// Enable the `DEBUG` toggles
    pub fn with_logging(mut self, logging: LogHandle) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Enable `POKE` through a simulated bus
    pub fn with_host(mut self, host: SimBus) -> Self {
        self.host = Some(host);
        self
    }

    pub fn handle(&self) -> &EmulatorHandle {
        &self.handle
    }

    /// Parse and run one console line
    pub async fn dispatch(&self, line: &str) -> Sp0256Result<Response> {
        let command = Command::parse(line)?;
        tracing::debug!(target: TARGET_INTERFACE, ?command, "command");
        self.execute(command).await
    }

    pub async fn execute(&self, command: Command) -> Sp0256Result<Response> {
        let response = match command {
            Command::Speak(ids) if ids.is_empty() => Response::SpeakUsage,
            Command::Speak(ids) => self.speak(ids).await?,
            Command::Hello => self.speak(resolve_all(HELLO)?).await?,
            Command::World => self.speak(resolve_all(WORLD)?).await?,
            Command::List => Response::Listing,
            Command::Status => Response::Status(self.handle.status()),
            Command::Cleanup => Response::Cleaned(self.handle.evict_nonessential()),
            Command::Reset => Response::Reset(self.handle.reset()),
            Command::Gpio => Response::Gpio(self.handle.diagnostics().await?),
            Command::Debug(target) => self.debug(target)?,
            Command::Poke(id) => {
                let host = self.host.as_ref().ok_or_else(|| {
                    Sp0256Error::UnknownCommand("POKE needs a simulated bus".into())
                })?;
                host.poke(id, POKE_HOLD).await;
                Response::Poked(id)
            }
            Command::Help => Response::Help,
            Command::Quit => Response::Quit,
            Command::Empty => Response::Nothing,
        };
        Ok(response)
    }

    async fn speak(&self, ids: Vec<AllophoneId>) -> Sp0256Result<Response> {
        let raw = ids.iter().map(|id| id.value() as u32).collect();
        let (played, total) = self.handle.play_sequence(raw).await?;
        Ok(Response::Spoke { ids, played, total })
    }

    fn debug(&self, target: Option<DebugTarget>) -> Sp0256Result<Response> {
        let logging = self
            .logging
            .as_ref()
            .ok_or_else(|| Sp0256Error::UnknownCommand("DEBUG needs a log handle".into()))?;
        Ok(match target {
            None => Response::DebugState(logging.config()),
            Some(DebugTarget::Verbose) => Response::DebugToggled {
                target: DebugTarget::Verbose,
                enabled: logging.toggle_verbose(),
            },
            Some(DebugTarget::Category(category)) => Response::DebugToggled {
                target: DebugTarget::Category(category),
                enabled: logging.toggle(category),
            },
        })
    }

    pub async fn shutdown(&self) -> Sp0256Result<()> {
        self.handle.shutdown().await
    }
}

impl fmt::Display for DebugTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebugTarget::Category(c) => write!(f, "{}", c),
            DebugTarget::Verbose => f.write_str("VERBOSE"),
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Spoke { ids, played, total } => {
                let names: Vec<&str> = ids.iter().map(|id| id.mnemonic()).collect();
                writeln!(f, "SPEAKING: {} ({} allophones)", names.join(" "), total)?;
                if played == total {
                    write!(f, "PLAYBACK COMPLETE")
                } else {
                    write!(f, "PLAYBACK INCOMPLETE: {}/{}", played, total)
                }
            }
            Response::SpeakUsage => write!(
                f,
                "USAGE: SPEAK <allophone1> <allophone2> ...\n  SPEAK HH EH LL OW\n  SPEAK 27 7 45 53\n  SPEAK PA1 HH EH LL OW PA1"
            ),
            Response::Listing => {
                writeln!(f, "ID   NAME  DESCRIPTION")?;
                write!(f, "{}", "-".repeat(40))?;
                for id in AllophoneId::all() {
                    write!(f, "\n{:2}   {:<5} {}", id.value(), id.mnemonic(), id.example())?;
                }
                Ok(())
            }
            Response::Status(s) => {
                writeln!(f, "Busy: {}", s.busy)?;
                match s.last_played {
                    Some(id) => writeln!(f, "Last allophone: {} ({})", id.value(), id)?,
                    None => writeln!(f, "Last allophone: none")?,
                }
                writeln!(f, "Total played: {}", s.play_count)?;
                writeln!(f, "Strobe edges: {}", s.edge_count)?;
                writeln!(f, "Timing misses: {}", s.timing_misses)?;
                writeln!(f, "Cached allophones: {}", s.cache_size)?;
                write!(f, "Data source: {}", s.data_source)
            }
            Response::Cleaned(n) => write!(f, "Cache cleanup: {} entries evicted", n),
            Response::Reset(n) => write!(f, "Cache reset: {} pauses reloaded", n),
            Response::Gpio(d) => {
                writeln!(
                    f,
                    "ALD={} LRQ={} SBY={}",
                    d.strobe_high as u8, d.busy_lines.lrq as u8, d.busy_lines.sby as u8
                )?;
                writeln!(f, "Current address: {} ({})", d.address, d.allophone())?;
                write!(
                    f,
                    "Real-time isolation: {}",
                    on_off(d.isolation.is_isolated())
                )?;
                if let Some(r) = d.last_report {
                    write!(
                        f,
                        "\nLast playback: {} samples in {}us, {} late (worst {}us)",
                        r.samples, r.elapsed_us, r.timing_misses, r.worst_lateness_us
                    )?;
                }
                Ok(())
            }
            Response::DebugState(c) => {
                writeln!(f, "DEBUG CATEGORIES:")?;
                for category in LogCategory::ALL {
                    writeln!(f, "  {}: {}", category, on_off(c.is_enabled(category)))?;
                }
                writeln!(f, "  VERBOSE: {}", on_off(c.verbose))?;
                write!(f, "USAGE: DEBUG <category> to toggle")
            }
            Response::DebugToggled { target, enabled } => {
                write!(f, "{} debug: {}", target, on_off(*enabled))
            }
            Response::Poked(id) => write!(f, "Bus write: {} ({})", id.value(), id),
            Response::Help => f.write_str(HELP_TEXT),
            Response::Quit => f.write_str("Goodbye!"),
            Response::Nothing => Ok(()),
        }
    }
}

const HELP_TEXT: &str = "\
SPEAK <allophones>  Play sequence of allophones (names or 0-63)
LIST                List all allophones
STATUS              Show emulator status
CLEANUP             Evict non-pause allophones from the cache
RESET               Clear the cache and reload pauses
GPIO                Show bus and output line states
DEBUG [category]    Toggle SYSTEM/GPIO/AUDIO/TIMING/INTERFACE/VERBOSE
HELLO               Say 'Hello' (HH EH LL OW)
WORLD               Say 'World' (WW OR LL DD1)
POKE <allophone>    Simulated host write on the address bus
HELP / ?            Show this help
QUIT / EXIT / BYE   Leave the console

PA1-PA5 are pauses (10, 30, 50, 100, 200 ms)";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{init_logging, EmulatorConfig};
    use sp0256_store::WaveformStore;

    fn id(raw: u32) -> AllophoneId {
        AllophoneId::new(raw).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("").unwrap(), Command::Empty);
        assert_eq!(Command::parse("   ").unwrap(), Command::Empty);
        assert_eq!(
            Command::parse("speak hh 7 ll ow").unwrap(),
            Command::Speak(vec![id(27), id(7), id(45), id(53)])
        );
        assert_eq!(Command::parse("SPEAK").unwrap(), Command::Speak(vec![]));
        assert_eq!(Command::parse("?").unwrap(), Command::Help);
        assert_eq!(Command::parse("bye").unwrap(), Command::Quit);
        assert_eq!(Command::parse("Exit").unwrap(), Command::Quit);
        assert_eq!(
            Command::parse("DEBUG timing").unwrap(),
            Command::Debug(Some(DebugTarget::Category(LogCategory::Timing)))
        );
        assert_eq!(
            Command::parse("debug verbose").unwrap(),
            Command::Debug(Some(DebugTarget::Verbose))
        );
        assert_eq!(Command::parse("POKE PA5").unwrap(), Command::Poke(id(4)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Command::parse("SPEAK HH XYZ"),
            Err(Sp0256Error::InvalidToken(_))
        ));
        assert!(matches!(
            Command::parse("SPEAK 64"),
            Err(Sp0256Error::InvalidToken(_))
        ));
        assert!(matches!(
            Command::parse("FLY"),
            Err(Sp0256Error::UnknownCommand(_))
        ));
        assert!(Command::parse("DEBUG COLOURS").is_err());
        assert!(Command::parse("POKE").is_err());
    }

    #[test]
    fn test_listing_has_every_id() {
        let text = Response::Listing.to_string();
        assert_eq!(text.lines().count(), 2 + 64);
        assert!(text.contains("27   HH1"));
    }

    #[tokio::test]
    async fn test_dispatch_against_simulated_emulator() {
        let sim = EmulatorHandle::start_simulated(
            EmulatorConfig::simulation(),
            WaveformStore::empty(),
            false,
        )
        .await
        .unwrap();
        let surface = ControlSurface::new(sim.handle)
            .with_logging(init_logging(LogConfig::quiet()))
            .with_host(sim.bus.clone());

        assert_eq!(surface.dispatch("").await.unwrap(), Response::Nothing);
        match surface.dispatch("HELLO").await.unwrap() {
            Response::Spoke { played, total, .. } => assert_eq!((played, total), (4, 4)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            surface.dispatch("SPEAK HH BOGUS").await,
            Err(Sp0256Error::InvalidToken(_))
        ));
        assert_eq!(surface.handle().status().play_count, 4);

        assert_eq!(surface.dispatch("CLEANUP").await.unwrap(), Response::Cleaned(4));
        assert_eq!(surface.dispatch("RESET").await.unwrap(), Response::Reset(5));
        assert!(matches!(
            surface.dispatch("DEBUG GPIO").await.unwrap(),
            Response::DebugToggled { enabled: true, .. }
        ));
        assert!(matches!(
            surface.dispatch("GPIO").await.unwrap(),
            Response::Gpio(_)
        ));
        assert!(surface.dispatch("quit").await.unwrap().is_quit());
        surface.shutdown().await.unwrap();
    }
}

//! Beesigner simulator - the device loop on a terminal
//!
//! Screens are printed to stdout, operator input is read line by line:
//!   1..n             → choose menu item
//!   back / b         → back
//!   yes / no         → confirm / decline
//!   scan <payload>   → feed the camera
//!   ? <partial>      → word completions
//!   network <id>     → switch network (main, test, regtest, signet)
//!   quit             → power off
//!   anything else    → prompt text
//!
//! While a recovery or password prompt is open every line is submitted as
//! typed, empty lines included. Commands then need a leading `/` (`/back`,
//! `/? ab`, `/quit`); a line starting with `//` submits the rest after one `/`.
//!
//! Configuration (flags over env):
//!   beesigner --data-dir <dir> --network <id> --tick-ms <ms> --words <n> --memory

use beesigner::channel::{CaptureFeed, QueuedCapture, Screen};
use beesigner::clock::{pulses, TickClock};
use beesigner::config::SignerConfig;
use beesigner::controller::{MenuItem, OperatorEvent, WorkflowController};
use beesigner::logging::init_logging;
use beesigner::signing::SpendSummary;
use beesigner::{install_signal_handlers, Network};
use std::env;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

fn main() -> anyhow::Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..])?;

    if opts.help {
        print_usage();
        return Ok(());
    }
    if opts.version {
        println!("beesigner {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = opts.config()?;
    config.validate()?;

    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(run(config))
}

#[derive(Default)]
struct ParsedArgs {
    data_dir: Option<String>,
    network: Option<String>,
    tick_ms: Option<u64>,
    words: Option<usize>,
    memory: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut opts = ParsedArgs::default();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let value = || args.get(i + 1).cloned().ok_or_else(|| anyhow::anyhow!("{} needs a value", arg));
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--memory" => opts.memory = true,
                "--data-dir" | "-d" => {
                    opts.data_dir = Some(value()?);
                    i += 1;
                }
                "--network" | "-n" => {
                    opts.network = Some(value()?);
                    i += 1;
                }
                "--tick-ms" => {
                    opts.tick_ms = Some(value()?.parse()?);
                    i += 1;
                }
                "--words" | "-w" => {
                    opts.words = Some(value()?.parse()?);
                    i += 1;
                }
                other => anyhow::bail!("Unknown argument: {}", other),
            }
            i += 1;
        }
        Ok(opts)
    }

    /// Defaults, then `BEESIGNER_*`, then flags.
    fn config(&self) -> anyhow::Result<SignerConfig> {
        let mut config = SignerConfig::native().apply_env()?;
        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir);
        }
        if self.memory {
            config = config.with_memory_storage();
        }
        if let Some(id) = &self.network {
            config = config.with_network(Network::from_id(id)?);
        }
        if let Some(ms) = self.tick_ms {
            config = config.with_tick_ms(ms);
        }
        if let Some(words) = self.words {
            config = config.with_word_count(words);
        }
        Ok(config)
    }
}

fn print_usage() {
    println!(
        r#"beesigner - air-gapped signer simulator

USAGE:
    beesigner [OPTIONS]

OPTIONS:
    -d, --data-dir <DIR>    Storage directory [env: BEESIGNER_ROOT]
    -n, --network <ID>      Network on first key load: main, test, regtest, signet
                            [env: BEESIGNER_NETWORK, default: test]
        --tick-ms <MS>      Tick period [env: BEESIGNER_TICK_MS, default: 30]
    -w, --words <N>         Words for new keys [env: BEESIGNER_WORDS, default: 12]
        --memory            Keep nothing after exit
    -h, --help              Print help
    -V, --version           Print version

INPUT:
    1..n  back  yes  no  scan <payload>  ? <partial>  network <id>  quit
    Anything else is submitted to the open prompt.
    At a prompt lines are taken verbatim; prefix commands with '/'."#
    );
}

/// One line of operator input.
#[derive(Debug, PartialEq)]
enum Line {
    Event(OperatorEvent),
    Scan(String),
    Network(String),
    Quit,
}

/// At a prompt the raw line is the answer, unless it is a `/` command.
fn parse_prompt_line(line: &str) -> Option<Line> {
    match line.strip_prefix('/') {
        Some(rest) if rest.starts_with('/') => Some(Line::Event(OperatorEvent::Text(rest.to_string()))),
        Some(command) => parse_line(command),
        None => Some(Line::Event(OperatorEvent::Text(line.to_string()))),
    }
}

fn parse_line(line: &str) -> Option<Line> {
    let trimmed = line.trim();
    let (word, rest) = trimmed.split_once(' ').map(|(w, r)| (w, r.trim())).unwrap_or((trimmed, ""));
    let line = match word {
        "" => return None,
        "quit" | "exit" | "q" => Line::Quit,
        "back" | "b" => Line::Event(OperatorEvent::Back),
        "yes" | "y" => Line::Event(OperatorEvent::Confirm),
        "no" | "n" => Line::Event(OperatorEvent::Decline),
        "scan" => Line::Scan(rest.to_string()),
        "network" => Line::Network(rest.to_string()),
        "?" => Line::Event(OperatorEvent::Complete(rest.to_string())),
        _ => match trimmed.parse::<usize>() {
            Ok(n) if n > 0 => Line::Event(OperatorEvent::Choose(n - 1)),
            // A lone "0" or a phrase goes to the prompt.
            _ => Line::Event(OperatorEvent::Text(trimmed.to_string())),
        },
    };
    Some(line)
}

async fn run(config: SignerConfig) -> anyhow::Result<()> {
    let shutdown = install_signal_handlers();
    let mut shutdown_rx = shutdown.subscribe();

    let medium = config.open_medium();
    let (capture, feed) = QueuedCapture::new();
    let mut controller = WorkflowController::new(&config, medium, ConsoleScreen, capture);
    let mut clock = TickClock::new(config.clock())?;

    let (line_tx, mut line_rx) = mpsc::channel::<String>(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    info!(storage = ?config.storage, network = config.network.id(), tick_ms = config.tick_ms, "beesigner started");
    controller.start();

    let mut interval = tokio::time::interval(clock.interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let outcome = clock.tick();
                if outcome.fired(pulses::POLL) {
                    controller.tick();
                }
                if outcome.fired(pulses::HEARTBEAT) {
                    debug!(tick = outcome.tick, view = ?controller.view(), "heartbeat");
                }
            }
            line = line_rx.recv() => {
                let Some(line) = line else {
                    info!("stdin closed");
                    break;
                };
                let parsed = if controller.view().is_prompt() {
                    parse_prompt_line(&line)
                } else {
                    parse_line(&line)
                };
                match parsed {
                    None => {}
                    Some(Line::Quit) => break,
                    Some(Line::Event(event)) => controller.handle(event),
                    Some(Line::Scan(payload)) => scan(&feed, payload),
                    Some(Line::Network(id)) => {
                        if let Err(e) = controller.select_network_by_id(&id) {
                            println!("! {}", e.operator_message());
                        }
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    info!(ticks = clock.current_tick(), "beesigner stopped");
    Ok(())
}

fn scan(feed: &CaptureFeed, payload: String) {
    if payload.is_empty() {
        feed.fail("nothing scanned");
    } else {
        feed.scan(payload);
    }
}

/// Plain-text rendering of the device screens.
struct ConsoleScreen;

impl ConsoleScreen {
    fn items(items: &[MenuItem]) {
        for (i, item) in items.iter().enumerate() {
            println!("  {}) {}", i + 1, item.label);
        }
    }

    fn flush() {
        std::io::stdout().flush().ok();
    }
}

impl Screen for ConsoleScreen {
    fn show_menu(&mut self, title: &str, items: &[MenuItem]) {
        println!("\n== {} ==", title);
        Self::items(items);
        Self::flush();
    }

    fn show_error(&mut self, message: &str) {
        println!("\n!! {}", message);
        Self::flush();
    }

    fn show_alert(&mut self, title: &str, message: &str) {
        println!("\n== {} ==\n{}\n  (back)", title, message);
        Self::flush();
    }

    fn show_prompt(&mut self, title: &str, note: &str) {
        println!("\n== {} ==\n  {}", title, note);
        Self::flush();
    }

    fn show_progress(&mut self, message: &str) {
        println!("\n.. {}", message);
        Self::flush();
    }

    fn show_qr(&mut self, title: &str, payload: &str) {
        println!("\n== {} ==\n{}\n  (back)", title, payload);
        Self::flush();
    }

    fn show_mnemonic(&mut self, phrase: &str, items: &[MenuItem]) {
        println!("\n== Your recovery phrase ==");
        for (i, word) in phrase.split_whitespace().enumerate() {
            println!("  {:>2}. {}", i + 1, word);
        }
        Self::items(items);
        Self::flush();
    }

    fn show_candidates(&mut self, candidates: &[&str]) {
        println!("  {}", candidates.join("  "));
        Self::flush();
    }

    fn show_confirmation(&mut self, summary: &SpendSummary) {
        println!("\n== Sign transaction? ==");
        for line in summary.lines() {
            println!("  {}", line);
        }
        println!("  (yes / no)");
        Self::flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Option<Line> {
        Some(Line::Event(OperatorEvent::Text(s.to_string())))
    }

    #[test]
    fn prompt_takes_lines_verbatim() {
        assert_eq!(parse_prompt_line(""), text(""));
        assert_eq!(parse_prompt_line("  pass phrase "), text("  pass phrase "));
        for word in ["n", "y", "b", "1", "yes", "no", "back", "quit"] {
            assert_eq!(parse_prompt_line(word), text(word));
        }
        let phrase = "exit scan network abandon abandon abandon abandon abandon abandon abandon abandon abandon";
        assert_eq!(parse_prompt_line(phrase), text(phrase));
    }

    #[test]
    fn prompt_commands_need_a_slash() {
        assert_eq!(parse_prompt_line("/back"), Some(Line::Event(OperatorEvent::Back)));
        assert_eq!(parse_prompt_line("/quit"), Some(Line::Quit));
        assert_eq!(parse_prompt_line("/? aba"), Some(Line::Event(OperatorEvent::Complete("aba".into()))));
        assert_eq!(parse_prompt_line("//etc"), text("/etc"));
    }

    #[test]
    fn menu_lines_are_commands() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line(" 2 "), Some(Line::Event(OperatorEvent::Choose(1))));
        assert_eq!(parse_line("y"), Some(Line::Event(OperatorEvent::Confirm)));
        assert_eq!(parse_line("scan cHNidP8"), Some(Line::Scan("cHNidP8".into())));
        assert_eq!(parse_line("network main"), Some(Line::Network("main".into())));
        assert_eq!(parse_line("exit"), Some(Line::Quit));
    }
}

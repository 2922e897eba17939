//! uartlogd - UART traffic logger.
//!
//! Reads raw traffic from a serial device and persists non-blank lines to a
//! timestamped log file. The file is closed after a configurable idle period
//! and a freshly-named one is opened when traffic resumes. Everything
//! received is echoed to stdout for live monitoring; diagnostics go to
//! stderr so the echo stream stays clean.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use uartlog_core::idle::IdleTracker;
use uartlog_core::port::{self, BaudRate, PortConfig, PortRead, READ_BUFFER_SIZE, UartPort};
use uartlog_core::sanitize::sanitize;
use uartlog_core::session::{LineOutcome, LogSession, unlogged_line};

/// UART traffic logger.
#[derive(Debug, Parser)]
#[command(name = "uartlogd", about = "Record UART traffic to a file", version)]
struct Args {
    /// Serial device to read input from.
    #[arg(short = 'u', long = "uart", default_value = "/dev/ttyUSB0")]
    uart: String,

    /// Baud rate (9600, 19200, 38400, 57600 or 115200).
    /// Unrecognized values keep the default.
    #[arg(short, long, default_value = "115200")]
    baud: u32,

    /// Close the log after this many milliseconds without any reception.
    /// Zero or negative disables idle-based closing.
    #[arg(short = 'T', long = "idle-timeout", default_value = "5000")]
    idle_timeout: i64,

    /// Directory where log files are created.
    #[arg(short = 'd', long, default_value = ".")]
    log_dir: String,

    /// List available serial devices and exit.
    #[arg(short = 'l', long)]
    list_ports: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Diagnostics are written to stderr; stdout carries the echoed traffic.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("uartlogd={}", level).parse().unwrap())
        .add_directive(format!("uartlog_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Picks the configured baud rate; unrecognized values keep the default.
fn select_baud(requested: u32) -> BaudRate {
    match BaudRate::from_raw(requested) {
        Some(baud) => baud,
        None => {
            warn!(
                "Unsupported baud rate {}, keeping {}",
                requested,
                BaudRate::default()
            );
            BaudRate::default()
        }
    }
}

fn list_ports() {
    match port::available_ports() {
        Ok(ports) if ports.is_empty() => println!("No serial devices found"),
        Ok(ports) => {
            for p in ports {
                println!("{}\t{}", p.name, p.kind);
            }
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Exit status for a failed argument parse. Help and version requests are
/// not failures; real usage problems exit 1.
fn usage_exit_code(kind: clap::error::ErrorKind) -> i32 {
    match kind {
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn main() {
    // Usage problems are fatal before any device is touched.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = usage_exit_code(e.kind());
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(args.verbose, args.quiet);

    if args.list_ports {
        list_ports();
        return;
    }

    let config = PortConfig {
        device: args.uart.clone(),
        baud: select_baud(args.baud),
    };

    info!("uartlogd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: device={}, baud={}, idle_timeout={}ms, log_dir={}",
        config.device, config.baud, args.idle_timeout, args.log_dir
    );

    let mut uart = match UartPort::open(&config) {
        Ok(p) => p,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    // Graceful shutdown: the handler only sets the flag; teardown runs in
    // the loop thread.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let mut session = LogSession::new(&args.log_dir);
    let mut idle = IdleTracker::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let stdout = std::io::stdout();

    info!("Starting capture loop");

    while running.load(Ordering::SeqCst) {
        // Idle check comes before the read so closing is timely even during
        // quiet periods.
        if session.is_open() && idle.is_expired(Utc::now(), args.idle_timeout) {
            info!(
                "No reception for {}ms or more, closing logfile",
                args.idle_timeout
            );
            session.close();
            idle.reset();
        }

        let n = match uart.read(&mut buf) {
            Ok(PortRead::Data(n)) => n,
            Ok(PortRead::Idle) => continue,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        // Live monitoring: everything received is echoed verbatim, whether
        // or not it ends up in the log.
        {
            let mut out = stdout.lock();
            let _ = out.write_all(&buf[..n]);
            let _ = out.flush();
        }

        let line = sanitize(&buf[..n]);
        if !line.non_blank {
            continue;
        }

        let accepted_at = Utc::now();
        match session.record(&line, accepted_at) {
            LineOutcome::Logged => idle.record_activity(accepted_at),
            LineOutcome::Unlogged => println!("{}", unlogged_line(&line.text)),
        }
    }

    info!("Shutting down...");
    session.close();
    drop(uart);
    info!("Shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::{Args, select_baud, usage_exit_code};
    use clap::Parser;
    use clap::error::ErrorKind;
    use uartlog_core::port::BaudRate;

    #[test]
    fn unsupported_baud_keeps_the_default() {
        assert_eq!(select_baud(300), BaudRate::B115200);
    }

    #[test]
    fn supported_baud_is_taken_as_is() {
        assert_eq!(select_baud(19200), BaudRate::B19200);
        assert_eq!(select_baud(9600), BaudRate::B9600);
    }

    #[test]
    fn help_and_version_exit_zero() {
        let help = Args::try_parse_from(["uartlogd", "--help"]).unwrap_err();
        assert_eq!(usage_exit_code(help.kind()), 0);

        let version = Args::try_parse_from(["uartlogd", "--version"]).unwrap_err();
        assert_eq!(usage_exit_code(version.kind()), 0);
    }

    #[test]
    fn non_numeric_idle_timeout_exits_one() {
        let err = Args::try_parse_from(["uartlogd", "-T", "abc"]).unwrap_err();
        assert_eq!(usage_exit_code(err.kind()), 1);
    }

    #[test]
    fn unknown_flag_exits_one() {
        let err = Args::try_parse_from(["uartlogd", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_eq!(usage_exit_code(err.kind()), 1);
    }
}

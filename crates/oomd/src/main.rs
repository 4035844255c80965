//! oomd - userspace out-of-memory monitor.
//!
//! Polls the cgroup v2 hierarchy at a fixed interval, keeps smoothed memory
//! state per cgroup and ranks cgroups by protection overage. Killing is left
//! to the policy layer; this daemon reports the ranking.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use oomd_core::collector::{CgroupSampler, RealFs};
use oomd_core::fmt::{FmtStyle, format_bytes};
use oomd_core::{CgroupPath, Oomd, OomdContext};

/// Userspace out-of-memory monitor.
#[derive(Parser, Debug)]
#[command(name = "oomd", about = "Userspace out-of-memory monitor", version)]
struct Args {
    /// Path to the cgroup2 mount.
    #[arg(long, default_value = "/sys/fs/cgroup")]
    cgroup_root: String,

    /// Cgroup pattern to monitor, relative to the root (repeatable).
    /// Segments may be globs, e.g. "system.slice/*" or "*.slice/*".
    #[arg(
        short,
        long = "cgroup",
        value_name = "PATTERN",
        default_values_t = ["system.slice/*".to_string(), "workload.slice/*".to_string()]
    )]
    cgroups: Vec<String>,

    /// Polling interval in seconds.
    #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Smoothing factor for average usage, strictly between 0 and 1.
    #[arg(long, default_value = "0.99")]
    decay: f64,

    /// Dump the whole context every N ticks (0 disables).
    #[arg(long, default_value = "0")]
    dump_every: u64,

    /// Print dumps as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Number of kill candidates to log per tick.
    #[arg(long, default_value = "3")]
    top: usize,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn requested_cgroups(&self) -> HashSet<CgroupPath> {
        self.cgroups
            .iter()
            .map(|pattern| CgroupPath::new(self.cgroup_root.as_str(), pattern))
            .collect()
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
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

    let mut filter = EnvFilter::from_default_env();
    for target in ["oomd", "oomd_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Describes the top kill candidates for logging.
fn describe_candidates(ctx: &OomdContext, top: usize) -> String {
    ctx.kill_candidates()
        .into_iter()
        .take(top)
        .map(|(path, cgroup)| {
            format!(
                "{} (overage {}, usage {})",
                path.relative_path(),
                format_bytes(cgroup.protection_overage, FmtStyle::Detail),
                format_bytes(cgroup.current_usage, FmtStyle::Detail)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn dump_context(ctx: &OomdContext, json: bool) {
    if json {
        match ctx.to_json() {
            Ok(out) => println!("{}", out),
            Err(e) => error!("Failed to serialize context: {}", e),
        }
    } else {
        print!("{}", ctx.dump());
    }
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("oomd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: interval={}s, root={}, cgroups=[{}], decay={}",
        args.interval,
        args.cgroup_root,
        args.cgroups.join(", "),
        args.decay
    );

    let oomd = match Oomd::new(CgroupSampler::new(RealFs::new())).with_average_decay(args.decay) {
        Ok(oomd) => oomd,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    let requested = args.requested_cgroups();
    let mut ctx = OomdContext::new();

    let interval = Duration::from_secs(args.interval);

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let mut tick_count: u64 = 0;

    info!("Starting monitoring loop");

    while running.load(Ordering::SeqCst) {
        tick_count += 1;

        match oomd.update_context(&requested, &mut ctx) {
            Ok(stats) => {
                if stats.skipped > 0 {
                    debug!("Tick #{}: {} cgroups unreadable", tick_count, stats.skipped);
                }
                if stats.resolved == 0 {
                    debug!("Tick #{}: no cgroups matched", tick_count);
                } else if args.top > 0 {
                    info!(
                        "Tick #{}: {} cgroups, top candidates: {}",
                        tick_count,
                        ctx.len(),
                        describe_candidates(&ctx, args.top)
                    );
                }
            }
            Err(e) => {
                // Keep the previous context; the next tick retries
                error!("Tick #{}: context update failed: {}", tick_count, e);
            }
        }

        if args.dump_every > 0 && tick_count.is_multiple_of(args.dump_every) {
            dump_context(&ctx, args.json);
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutdown complete after {} ticks", tick_count);
}

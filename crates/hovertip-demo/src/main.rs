#![forbid(unsafe_code)]

//! hovertip demo binary.
//!
//! Replays a toolbar interaction and prints the coordinator's state after
//! every step. Run with `--help` for options.

use std::process;

use hovertip::Result;
use hovertip_demo::cli::{Mode, Opts};
use hovertip_demo::walkthrough;
use tracing_subscriber::EnvFilter;

fn main() {
    let opts = Opts::parse();

    if opts.log_json {
        hovertip::core::logging::init_json_logging();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(err) = run(&opts) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run(opts: &Opts) -> Result<()> {
    let config = opts.tooltip_config(|key| std::env::var(key).ok())?;
    tracing::info!(
        mode = ?opts.mode,
        rest_ms = config.rest_delay.as_millis() as u64,
        linger_ms = config.linger_delay.as_millis() as u64,
        suppress_focus = config.suppress_focus,
        "starting walkthrough"
    );

    match opts.mode {
        Mode::Scripted => {
            for frame in walkthrough::run_scripted(config) {
                println!("{frame}");
            }
        }
        Mode::Live => walkthrough::run_live(config, |frame| println!("{frame}"))?,
    }
    Ok(())
}

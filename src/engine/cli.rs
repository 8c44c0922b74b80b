//! CLI command handler: settings file + flags → Opts → pipeline run.

use anyhow::{Context, Result};
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::engine::fetcher::HttpImageFetcher;
use crate::engine::progress::setup_progress;
use crate::pipeline::Pipeline;
use crate::utils::{apply_settings_to_opts, load_settings, setup_logging};

/// Defaults, then settings file, then flags.
pub fn build_opts(cli: &Cli) -> Result<Opts> {
    let mut opts = Opts::default();
    if let Some(file) = load_settings(cli.config.as_deref())? {
        apply_settings_to_opts(&file, &mut opts);
    }
    if let Some(ref p) = cli.input {
        opts.input_path = p.clone();
    }
    if let Some(ref p) = cli.output {
        opts.output_path = p.clone();
    }
    if let Some(q) = cli.queue_capacity {
        opts.queue_capacity = q as usize;
    }
    if let Some(w) = cli.workers {
        opts.worker_count = Some(w as usize);
    }
    if let Some(t) = cli.timeout {
        opts.fetch_timeout = Duration::from_secs(t);
    }
    if let Some(r) = cli.retries {
        opts.fetch_retries = r;
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    if opts.input_path.as_os_str().is_empty() {
        anyhow::bail!("no input: pass INPUT or set settings.input_path");
    }
    Ok(opts)
}

/// Run the whole job. Ctrl+C requests a coordinated shutdown; the run then ends with an error.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = build_opts(cli)?;
    setup_logging(opts.verbose);
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );

    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;

    let fetcher = HttpImageFetcher::new(&opts).context("build HTTP client")?;
    let (_bar, on_written) = setup_progress(opts.verbose);
    let mut pipeline = Pipeline::new(opts, Arc::new(fetcher)).with_cancel_flag(cancel_requested);
    if let Some(cb) = on_written {
        pipeline = pipeline.with_progress(cb);
    }

    pipeline.run_from_paths()?;
    Ok(())
}

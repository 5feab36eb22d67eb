//! CLI handler: copy by default; --verify audits the mounted volume instead.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use log::{debug, info, warn};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::copier::Copier;
use crate::engine::arg_parser::Cli;
use crate::engine::filesystem::size_to_bytes;
use crate::engine::tools::absolutize;
use crate::resolve::{DirectoryListResolver, JobFileResolver, Resolver, ResumePoint, read_resume_point};
use crate::utils::mvcopy_toml::{apply_file_to_opts, load_mvcopy_toml};
use crate::utils::setup_logging;
use crate::verifier::{Verifier, VerifyResult};
use crate::{AbortReason, CopyOptions, CopyOutcome, ReconcilerKind};

/// Build options: defaults, then `.mvcopy.toml`, then explicit flags.
fn setup_opts(cli: &Cli) -> Result<CopyOptions> {
    let mut opts = CopyOptions {
        show_progress: true,
        ..CopyOptions::default()
    };
    let cwd = std::env::current_dir().context("read current directory")?;
    if let Some(file) = load_mvcopy_toml(&cwd) {
        apply_file_to_opts(&file, &mut opts);
    }

    if let Some(ref output) = cli.output {
        opts.output = output.clone();
    }
    if let Some(ref padding) = cli.padding {
        opts.device_padding = size_to_bytes(padding)?;
    }
    if let Some(workers) = cli.workers {
        opts.num_workers = workers;
    }
    if let Some(tasks) = cli.max_worker_tasks {
        opts.max_worker_tasks = tasks;
    }
    if let Some(ref jobfile) = cli.jobfile {
        opts.jobfile = jobfile.clone();
    }
    if let Some(ref indexfile) = cli.indexfile {
        opts.indexfile = indexfile.clone();
    }
    if let Some(checksum) = cli.checksum {
        opts.compare.checksum = checksum;
    }
    if cli.no_mtime {
        opts.compare.mtime = false;
    }
    if cli.no_size {
        opts.compare.size = false;
    }
    if let Some(delete_all) = cli.delete_all {
        opts.reconciler = if delete_all {
            ReconcilerKind::DeleteAll
        } else {
            ReconcilerKind::KeepFiles
        };
    }
    if cli.no_progress {
        opts.show_progress = false;
    }
    if let Some(verbose) = cli.verbose {
        opts.verbose = verbose;
    }

    if opts.output.as_os_str().is_empty() {
        bail!("no output directory given (-o/--output or `output` in the config file)");
    }
    opts.output = absolutize(&opts.output)?;
    opts.jobfile = absolutize(&opts.jobfile)?;
    opts.indexfile = absolutize(&opts.indexfile)?;
    Ok(opts)
}

/// Fill device/start index from flags, falling back to the index file when resuming. A resumed
/// run also retries the failures the index file lists.
fn apply_indexes(cli: &Cli, opts: &mut CopyOptions) -> Result<Option<ResumePoint>> {
    let saved = if cli.resume || cli.verify {
        read_resume_point(&opts.indexfile)?
    } else {
        None
    };
    if cli.resume && saved.is_none() {
        warn!(
            "No index file at {}; resuming from the first record",
            opts.indexfile.display()
        );
    }
    opts.device_start_index = cli
        .device_start_index
        .or(saved.as_ref().map(|p| p.device_start_index))
        .unwrap_or(0);
    opts.start_index = cli
        .start_index
        .or(saved.as_ref().filter(|_| cli.resume).map(|p| p.next_index))
        .unwrap_or(opts.device_start_index);
    if cli.resume
        && let Some(point) = saved.as_ref().filter(|p| !p.errors.is_empty())
    {
        info!("Retrying {} files that failed last run", point.errors.len());
        opts.retry_indexes = point.errors.clone();
    }
    Ok(saved)
}

fn resolver_for(cli: &Cli, opts: &CopyOptions) -> Result<Box<dyn Resolver>> {
    if cli.uses_jobfile() {
        debug!("Reading file list from {}", opts.jobfile.display());
        return Ok(Box::new(JobFileResolver::new(&opts.jobfile)));
    }
    if cli.srcpaths.is_empty() {
        bail!("nothing to copy: give at least one SRCPATH, or --from-jobfile/--resume");
    }
    Ok(Box::new(DirectoryListResolver::new(
        cli.srcpaths.clone(),
        &opts.output,
    )))
}

/// Run copy (default) or verify. The exit code is 0 only for a complete, error-free run.
pub fn handle_run(cli: &Cli) -> Result<ExitCode> {
    let mut opts = setup_opts(cli)?;
    setup_logging(opts.verbose);
    let saved = apply_indexes(cli, &mut opts)?;
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    let resolver = resolver_for(cli, &opts)?;

    if cli.verify {
        let end = match cli.verify_end.or(saved.as_ref().map(|p| p.next_index)) {
            Some(end) => end,
            None => resolver.resolve()?.len(),
        };
        let start = opts.device_start_index;
        let result = Verifier::new(resolver, opts).verify(start, end)?;
        print_verify_report(&result, start, end);
        return Ok(if result.valid() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("install Ctrl+C handler")?;

    let outcome = Copier::new(resolver, opts)
        .with_cancel_flag(cancel)
        .start()?;
    Ok(match outcome {
        CopyOutcome::Finished { ref errors, .. } if errors.is_empty() => ExitCode::SUCCESS,
        CopyOutcome::Finished { errors, .. } => {
            warn!("Finished with {} unrecoverable errors", errors.len());
            ExitCode::FAILURE
        }
        CopyOutcome::Aborted(AbortReason::User) => ExitCode::FAILURE,
        CopyOutcome::Aborted(AbortReason::Interrupted) => {
            info!("Interrupted; run again with --resume to continue");
            ExitCode::FAILURE
        }
    })
}

fn print_verify_report(result: &VerifyResult, start: usize, end: usize) {
    println!("{}", format!("Verified records [{start}, {end})").bold());
    println!("  copied bytes: {}", result.copied_bytes);
    println!("  backup bytes: {}", result.backup_bytes);
    if !result.missing_indexes.is_empty() {
        println!(
            "  {} {:?}",
            "missing:".red(),
            result.missing_indexes
        );
    }
    if !result.different_indexes.is_empty() {
        println!(
            "  {} {:?}",
            "different:".yellow(),
            result.different_indexes
        );
    }
    if result.valid() {
        println!("{}", "Volume is valid".green());
    } else {
        println!("{}", "Volume is NOT valid".red());
    }
}

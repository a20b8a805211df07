//! Command handlers: merge CLI flags with the settings file and run the library operations.

use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::path::Path;
use std::process::ExitCode;

use crate::engine::arg_parser::{
    ArchiveArgs, CheckArgs, Cli, Commands, CreateCommands, DecryptArgs, EncryptArgs, ExtractArgs,
    FilelistArgs, ListArgs, StageArgs,
};
use crate::engine::tools::parse_size;
use crate::archive_set::ArchiveSet;
use crate::encryption::{decrypt_archive, encrypt_archive};
use crate::extract::extract_archive;
use crate::integrity::check_integrity;
use crate::listing::list_archive;
use crate::pipeline::{
    PipelineContext, PipelineSummary, archive, compress_bundles, create_bundles,
    create_filelists, prepare_archive, report_part_failures,
};
use crate::tools::Toolchain;
use crate::types::{ArchiveOpts, CheckOpts, DecryptOpts, EncryptOpts, ExtractOpts};
use crate::utils::config::ExitCodes;
use crate::utils::{ParchiverToml, load_settings, resolve_threads, setup_logging};

/// Settings file in the working directory, or defaults.
fn settings() -> ParchiverToml {
    load_settings(Path::new(".")).unwrap_or_default()
}

fn threads(cli: Option<usize>, file: &ParchiverToml) -> usize {
    resolve_threads(cli, file.threads(), Path::new("."))
}

/// Settings file first, CLI flags on top.
fn archive_opts(cli: &Cli, file: &ParchiverToml, threads_flag: Option<usize>) -> ArchiveOpts {
    let mut opts = ArchiveOpts::default();
    file.apply_to_archive_opts(&mut opts);
    opts.threads = threads(threads_flag, file);
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    if let Some(dir) = &cli.work_dir {
        opts.work_dir = Some(dir.clone());
    }
    opts
}

fn part_size(text: &Option<String>) -> Result<Option<u64>> {
    text.as_deref()
        .map(parse_size)
        .transpose()
        .context("invalid --part-size")
}

/// Turn per-part failures into an error naming the failed parts.
fn finish(summary: PipelineSummary, what: &str) -> Result<ExitCode> {
    let failures = report_part_failures(&summary);
    if failures > 0 {
        bail!(
            "{what} failed for {failures} of {} part(s): {}",
            summary.outcomes.len(),
            summary.failed().join(", ")
        );
    }
    info!("{what} finished for {} part(s)", summary.outcomes.len());
    Ok(ExitCode::SUCCESS)
}

fn handle_archive(cli: &Cli, args: &ArchiveArgs) -> Result<ExitCode> {
    let file = settings();
    let mut opts = archive_opts(cli, &file, args.common.threads);
    opts.part_size = part_size(&args.part_size)?;
    if let Some(level) = args.compression {
        opts.compression = level;
    }
    if !args.keys.is_empty() {
        opts.encryption_keys = args.keys.clone();
    }
    if let Some(v) = args.remove_unencrypted {
        opts.remove_unencrypted = v;
    }
    opts.force = args.common.force.unwrap_or(false);

    let summary = archive(&args.source, &args.dest, opts, Toolchain::default())
        .with_context(|| format!("cannot archive {}", args.source.display()))?;
    finish(summary, "Archiving")
}

fn handle_filelist(cli: &Cli, args: &FilelistArgs) -> Result<ExitCode> {
    let file = settings();
    let mut opts = archive_opts(cli, &file, args.common.threads);
    opts.part_size = part_size(&args.part_size)?;
    opts.force = args.common.force.unwrap_or(false);
    let ctx = prepare_archive(&args.source, &args.dest, opts, Toolchain::default())?;
    finish(create_filelists(&ctx)?, "Listing")
}

/// Context for a stage that runs on an existing archive directory.
fn stage_context(cli: &Cli, args: &StageArgs) -> Result<PipelineContext> {
    let file = settings();
    let mut opts = archive_opts(cli, &file, args.threads);
    if let Some(level) = args.compression {
        opts.compression = level;
    }
    // Stages never encrypt; keys from the settings file must not change artifact naming.
    opts.encryption_keys.clear();
    if !args.dest.is_dir() {
        bail!("{} is not an archive directory", args.dest.display());
    }
    Ok(PipelineContext::new(
        &args.source,
        &args.dest,
        opts,
        Toolchain::default(),
    )?)
}

fn handle_create(cli: &Cli, command: &CreateCommands) -> Result<ExitCode> {
    match command {
        CreateCommands::Filelist(args) => handle_filelist(cli, args),
        CreateCommands::Tar(args) => {
            let ctx = stage_context(cli, args)?;
            finish(create_bundles(&ctx, args.part.as_deref())?, "Bundling")
        }
        CreateCommands::CompressedTar(args) => {
            let ctx = stage_context(cli, args)?;
            let bundled = create_bundles(&ctx, args.part.as_deref())?;
            if !bundled.is_success() {
                return finish(bundled, "Bundling");
            }
            finish(compress_bundles(&ctx, args.part.as_deref())?, "Compressing")
        }
    }
}

fn handle_encrypt(args: &EncryptArgs) -> Result<ExitCode> {
    let file = settings();
    let opts = EncryptOpts {
        threads: threads(args.common.threads, &file),
        keys: args.keys.clone(),
        remove_unencrypted: args.remove_unencrypted.unwrap_or(false),
        reencrypt: args.reencrypt,
        force: args.common.force.unwrap_or(false),
    };
    let summary = encrypt_archive(
        &args.archive,
        args.dest.as_deref(),
        &opts,
        &Toolchain::default(),
    )
    .with_context(|| format!("cannot encrypt {}", args.archive.display()))?;
    finish(summary, "Encryption")
}

fn handle_decrypt(args: &DecryptArgs) -> Result<ExitCode> {
    let file = settings();
    let opts = DecryptOpts {
        threads: threads(args.common.threads, &file),
        remove_encrypted: args.remove_encrypted.unwrap_or(false),
        force: args.common.force.unwrap_or(false),
    };
    let summary = decrypt_archive(
        &args.archive,
        args.dest.as_deref(),
        &opts,
        &Toolchain::default(),
    )
    .with_context(|| format!("cannot decrypt {}", args.archive.display()))?;
    finish(summary, "Decryption")
}

fn handle_extract(cli: &Cli, args: &ExtractArgs) -> Result<ExitCode> {
    let file = settings();
    let opts = ExtractOpts {
        threads: threads(args.common.threads, &file),
        subpath: args.subpath.clone(),
        force: args.common.force.unwrap_or(false),
        work_dir: cli.work_dir.clone().or_else(|| file.work_dir()),
    };
    let summary = extract_archive(&args.archive, &args.dest, &opts, &Toolchain::default())
        .with_context(|| format!("cannot extract {}", args.archive.display()))?;
    finish(summary, "Extraction")
}

fn handle_list(args: &ListArgs) -> Result<ExitCode> {
    let set = ArchiveSet::discover(&args.archive)
        .with_context(|| format!("cannot read {}", args.archive.display()))?;
    list_archive(&set, args.subpath.as_deref(), std::io::stdout().lock())?;
    Ok(ExitCode::SUCCESS)
}

fn handle_check(cli: &Cli, args: &CheckArgs) -> Result<ExitCode> {
    let file = settings();
    let opts = CheckOpts {
        threads: threads(args.threads, &file),
        deep: args.deep.unwrap_or(false),
        work_dir: cli.work_dir.clone().or_else(|| file.work_dir()),
    };
    let report = check_integrity(&args.archive, &opts, &Toolchain::default())
        .with_context(|| format!("cannot check {}", args.archive.display()))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    report.log_summary();
    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(ExitCodes::INTEGRITY_FAILED)
    })
}

/// Dispatch the parsed command line. Errors mean the operation could not run.
pub fn handle_run(cli: &Cli) -> Result<ExitCode> {
    let verbose = cli.verbose.unwrap_or_else(|| settings().verbose());
    setup_logging(verbose);
    debug!("{cli:?}");
    match &cli.command {
        Commands::Archive(args) => handle_archive(cli, args),
        Commands::Create(command) => handle_create(cli, command),
        Commands::Encrypt(args) => handle_encrypt(args),
        Commands::Decrypt(args) => handle_decrypt(args),
        Commands::Extract(args) => handle_extract(cli, args),
        Commands::List(args) => handle_list(args),
        Commands::Check(args) => handle_check(cli, args),
    }
}

/// Exit code for an error returned by [`handle_run`].
pub fn failure_code() -> ExitCode {
    ExitCode::from(ExitCodes::FAILURE)
}


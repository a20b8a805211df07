//! Pipeline orchestration: split the tree, then run the part stages on a bounded worker pool.

use log::{debug, info};
use std::path::Path;

use crate::engine::parallel::run_bounded;
use crate::engine::progress::PartsProgress;
use crate::engine::tools::{
    canonicalize_existing, ensure_files_exist, part_name, prepare_destination,
};
use crate::error::{ArchiveError, ArchiveResult};
use crate::sidecar::{read_part_count, write_part_count};
use crate::splitter::{single_part, split_directory};
use crate::tools::Toolchain;
use crate::types::{ArchiveOpts, Part, PartArtifactChain};
use crate::utils::config::MAX_COMPRESSION_LEVEL;

use super::context::PipelineContext;
use super::error_handler::{PartOutcome, PipelineSummary};
use super::stages::{bundle_part, compress_part, run_part, write_filelists};

/// Validate the arguments, create the destination directory and build the run context.
pub fn prepare_archive(
    source: &Path,
    dest: &Path,
    opts: ArchiveOpts,
    toolchain: Toolchain,
) -> ArchiveResult<PipelineContext> {
    if opts.compression > MAX_COMPRESSION_LEVEL {
        return Err(ArchiveError::validation(format!(
            "compression level must be between 0 and {MAX_COMPRESSION_LEVEL}, got {}",
            opts.compression
        )));
    }
    ensure_files_exist(&opts.encryption_keys)?;
    let source = canonicalize_existing(source)?;
    if !source.is_dir() {
        return Err(ArchiveError::validation(format!(
            "not a directory: {}",
            source.display()
        )));
    }
    let abs_dest = std::path::absolute(dest)?;
    if abs_dest.starts_with(&source) {
        return Err(ArchiveError::validation(format!(
            "destination {} lies inside the source {}",
            dest.display(),
            source.display()
        )));
    }
    prepare_destination(dest, opts.force)?;
    PipelineContext::new(&source, dest, opts, toolchain)
}

/// Split the source into named parts. An oversized entry aborts the whole run.
pub fn plan_parts(ctx: &PipelineContext) -> ArchiveResult<Vec<(String, Part)>> {
    let parts = match ctx.opts.part_size {
        Some(max_size) => {
            split_directory(&ctx.source, max_size)?.collect::<ArchiveResult<Vec<_>>>()?
        }
        None => vec![single_part(&ctx.source)?],
    };
    info!("Split {} into {} part(s)", ctx.source.display(), parts.len());
    Ok(parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| (ctx.part_name(i + 1), part))
        .collect())
}

/// Names of the parts recorded in the destination, or just `only` after checking it exists.
///
/// Names come from what is on disk, not from `opts.part_size`: a later stage does not know how
/// the tree was split. A single part is unnumbered when its unsplit listing exists.
pub fn recorded_part_names(ctx: &PipelineContext, only: Option<&str>) -> ArchiveResult<Vec<String>> {
    let count = read_part_count(&ctx.part_count_path())?;
    let names: Vec<String> = if count == 1 && ctx.chain(&ctx.basename).path_listing.is_file() {
        vec![ctx.basename.clone()]
    } else {
        (1..=count).map(|i| part_name(&ctx.basename, Some(i))).collect()
    };
    match only {
        None => Ok(names),
        Some(name) if names.iter().any(|n| n == name) => Ok(vec![name.to_string()]),
        Some(name) => Err(ArchiveError::validation(format!(
            "no part named {name} in {}",
            ctx.dest.display()
        ))),
    }
}

/// Run `stage` for every item on `opts.threads` workers and collect the outcomes.
fn run_stage<T, F>(
    ctx: &PipelineContext,
    items: Vec<(String, T)>,
    desc: &'static str,
    stage: F,
) -> PipelineSummary
where
    T: Send,
    F: Fn(&PipelineContext, &PartArtifactChain, T) -> ArchiveResult<()> + Sync,
{
    let progress = PartsProgress::start(ctx.opts.verbose, items.len(), desc);
    let outcomes = run_bounded(items, ctx.opts.threads, |(name, item)| {
        debug!("{desc}: {name}");
        let chain = ctx.chain(&name);
        let result = stage(ctx, &chain, item);
        if let Some(progress) = &progress {
            progress.advance();
        }
        PartOutcome { name, result }
    });
    if let Some(progress) = progress {
        progress.finish();
    }
    PipelineSummary::new(outcomes)
}

/// Split, then write each part's content hash listing and path listing, plus the part count.
pub fn create_filelists(ctx: &PipelineContext) -> ArchiveResult<PipelineSummary> {
    let parts = plan_parts(ctx)?;
    write_part_count(&ctx.part_count_path(), parts.len())?;
    Ok(run_stage(ctx, parts, "Listing", |ctx, chain, part| {
        write_filelists(ctx, chain, &part).map(|_| ())
    }))
}

/// Bundle all recorded parts, or only `only`, from their path listings.
pub fn create_bundles(ctx: &PipelineContext, only: Option<&str>) -> ArchiveResult<PipelineSummary> {
    let names = recorded_part_names(ctx, only)?;
    let items = names.into_iter().map(|n| (n, ())).collect();
    Ok(run_stage(ctx, items, "Bundling", |ctx, chain, ()| {
        bundle_part(ctx, chain)
    }))
}

/// Compress all bundled parts, or only `only`.
pub fn compress_bundles(
    ctx: &PipelineContext,
    only: Option<&str>,
) -> ArchiveResult<PipelineSummary> {
    let names = recorded_part_names(ctx, only)?;
    let items = names.into_iter().map(|n| (n, ())).collect();
    Ok(run_stage(ctx, items, "Compressing", |ctx, chain, ()| {
        compress_part(ctx, chain)
    }))
}

/// Archive `source` into `dest`: every stage for every part.
///
/// Errors that make the run meaningless (bad arguments, oversized entries) are returned directly;
/// failures of single parts end up in the summary and never stop the other parts.
pub fn archive(
    source: &Path,
    dest: &Path,
    opts: ArchiveOpts,
    toolchain: Toolchain,
) -> ArchiveResult<PipelineSummary> {
    let ctx = prepare_archive(source, dest, opts, toolchain)?;
    let parts = plan_parts(&ctx)?;
    write_part_count(&ctx.part_count_path(), parts.len())?;
    let summary = run_stage(&ctx, parts, "Archiving", |ctx, chain, part| {
        run_part(ctx, chain, &part)
    });
    info!(
        "Archived {} of {} part(s) into {}",
        summary.succeeded(),
        summary.outcomes.len(),
        ctx.dest.display()
    );
    Ok(summary)
}

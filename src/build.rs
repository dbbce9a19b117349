//! Site building orchestration.
//!
//! ```text
//! build_site()
//!     │
//!     ├── collect template set ──► single max mtime (gates every page)
//!     │
//!     ├── pages pass:  load ──► is_stale()? ──► render ──► write
//!     │
//!     └── assets pass: sync static/ into public/ (disjoint file set)
//! ```
//!
//! The two passes run in parallel, and each pass fans out across the rayon
//! pool; artifacts are mutually independent once their source sets are
//! known. Every artifact is evaluated exactly once and ends up rendered,
//! skipped, or failed. A failure is logged with the artifact's identity and
//! never aborts the rest of the run; nothing already written is rolled
//! back.

use crate::{
    compiler::{
        BuildError, DESCRIPTOR_EXT, LOCK_FILE_SUFFIX, OUTPUT_EXT, Page, RenderSession, Renderer,
        collect_files, is_stale, newest_timestamp, sync_asset,
    },
    config::SiteConfig,
    log,
    logger::ProgressBars,
    timestamp::TimestampIndex,
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{
    fs,
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
    time::SystemTime,
};

/// Outcome counters for one build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub pages_built: usize,
    pub pages_skipped: usize,
    pub pages_failed: usize,
    pub assets_copied: usize,
    pub assets_skipped: usize,
    pub assets_failed: usize,
}

#[derive(Default)]
struct Counters {
    pages_built: AtomicUsize,
    pages_skipped: AtomicUsize,
    pages_failed: AtomicUsize,
    assets_copied: AtomicUsize,
    assets_skipped: AtomicUsize,
    assets_failed: AtomicUsize,
}

impl Counters {
    fn into_summary(self) -> BuildSummary {
        BuildSummary {
            pages_built: self.pages_built.into_inner(),
            pages_skipped: self.pages_skipped.into_inner(),
            pages_failed: self.pages_failed.into_inner(),
            assets_copied: self.assets_copied.into_inner(),
            assets_skipped: self.assets_skipped.into_inner(),
            assets_failed: self.assets_failed.into_inner(),
        }
    }
}

/// Build the entire site incrementally.
///
/// Only fails fast on unrecoverable setup errors (output directory cannot
/// be created, templates cannot be loaded); per-artifact failures are
/// reported and counted instead.
pub fn build_site(config: &SiteConfig) -> Result<BuildSummary> {
    let public = config.public_path();
    fs::create_dir_all(&public)
        .with_context(|| format!("failed to create output directory `{}`", public.display()))?;

    // One mtime cache per run; mtimes on disk are the ground truth.
    let index = TimestampIndex::new();

    // The template set is one monolithic dependency: reduce it to a single
    // max mtime once, and let it gate every page.
    let templates = collect_files(&config.templates_path(), |path| {
        path.extension().is_some_and(|ext| ext == OUTPUT_EXT)
    });
    let templates_mtime = if templates.is_empty() {
        log!("warn"; "no templates under `{}`", config.templates_path().display());
        SystemTime::UNIX_EPOCH
    } else {
        newest_timestamp(&templates, &index)
    };

    let renderer = Renderer::new(config)?;

    let descriptors = collect_files(&config.pages_path(), |path| {
        path.extension().is_some_and(|ext| ext == DESCRIPTOR_EXT)
    });
    let assets = collect_files(&config.static_path(), |path| {
        !path.to_string_lossy().ends_with(LOCK_FILE_SUFFIX)
    });

    log!("build"; "{} pages, {} assets", descriptors.len(), assets.len());

    let progress = ProgressBars::new(&[("pages", descriptors.len()), ("assets", assets.len())]);
    let counters = Counters::default();

    rayon::join(
        || {
            // Cloning the loaded engine is per worker, not per page.
            descriptors.par_iter().for_each_init(
                || renderer.session(),
                |session, descriptor| {
                    match build_page(descriptor, config, session, templates_mtime, &index) {
                        Ok(true) => counters.pages_built.fetch_add(1, Ordering::Relaxed),
                        Ok(false) => counters.pages_skipped.fetch_add(1, Ordering::Relaxed),
                        Err(err) => {
                            log!("error"; "{:#}", anyhow::Error::new(err));
                            counters.pages_failed.fetch_add(1, Ordering::Relaxed)
                        }
                    };
                    progress.inc_by_name("pages");
                },
            );
        },
        || {
            assets.par_iter().for_each(|asset| {
                match sync_asset(asset, config, &index) {
                    Ok(true) => {
                        let relative = asset.strip_prefix(config.static_path());
                        log!("assets"; "{}", relative.unwrap_or(asset).display());
                        counters.assets_copied.fetch_add(1, Ordering::Relaxed)
                    }
                    Ok(false) => counters.assets_skipped.fetch_add(1, Ordering::Relaxed),
                    Err(err) => {
                        log!("error"; "{:#}", anyhow::Error::new(err));
                        counters.assets_failed.fetch_add(1, Ordering::Relaxed)
                    }
                };
                progress.inc_by_name("assets");
            });
        },
    );

    progress.finish();

    let summary = counters.into_summary();
    log!(
        "build";
        "{} pages built, {} up to date, {} assets copied",
        summary.pages_built,
        summary.pages_skipped,
        summary.assets_copied
    );
    if summary.pages_failed + summary.assets_failed > 0 {
        log!(
            "error";
            "{} artifacts failed",
            summary.pages_failed + summary.assets_failed
        );
    }

    Ok(summary)
}

/// Load, evaluate and (iff stale) render one page.
///
/// Returns whether the output was written.
fn build_page(
    descriptor: &Path,
    config: &SiteConfig,
    session: &mut RenderSession,
    templates_mtime: SystemTime,
    index: &TimestampIndex,
) -> Result<bool, BuildError> {
    let page = Page::load(descriptor, config, index)?;
    let target = config.public_path().join(&page.link);

    if !is_stale(&target, &page.sources, templates_mtime, index) {
        return Ok(false);
    }

    log!("pages"; "{}", page.link);
    let output = session.render(&page, config)?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|err| BuildError::Io(parent.to_path_buf(), err))?;
    }
    fs::write(&target, output).map_err(|err| BuildError::Io(target.clone(), err))?;

    Ok(true)
}

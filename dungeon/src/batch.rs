//! Compositing many rooms at once.

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::compositor::Compositor;
use crate::layers::LayerManager;
use crate::room::Room;

/// Upper bound on compositing threads.
pub const MAX_WORKERS: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rooms_composited: usize,
    /// Rooms that weren't loaded.
    pub rooms_skipped: usize,
    pub opaque_pixels: usize,
}

/// Worker count used when none is requested.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(MAX_WORKERS)
}

/// Counts survive a worker that panicked while holding the lock.
fn tally(summary: &Mutex<BatchSummary>, update: impl FnOnce(&mut BatchSummary)) {
    update(&mut summary.lock().unwrap_or_else(PoisonError::into_inner));
}

/// Composites every loaded room with the same layer state.
///
/// Each room is owned by exactly one worker; only the summary is shared.
pub fn composite_rooms(
    rooms: &mut [Room],
    manager: &LayerManager,
    compositor: &Compositor,
    workers: Option<usize>,
) -> BatchSummary {
    let workers = workers.unwrap_or_else(default_workers).clamp(1, MAX_WORKERS);
    let summary = Mutex::new(BatchSummary::default());

    let mut run = || {
        rooms.par_iter_mut().for_each(|room| {
            if !room.is_loaded() {
                tally(&summary, |summary| summary.rooms_skipped += 1);
                return;
            }

            let stats = room.recomposite(manager, compositor);
            tally(&summary, |summary| {
                summary.rooms_composited += 1;
                summary.opaque_pixels += stats.opaque_pixels;
            });
        });
    };

    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(run),
        Err(err) => {
            warn!("couldn't start {workers} compositing threads ({err}), using the global pool");
            run();
        }
    }

    let summary = summary.into_inner().unwrap_or_else(PoisonError::into_inner);
    info!(
        "composited {} rooms ({} skipped) on {workers} threads",
        summary.rooms_composited, summary.rooms_skipped
    );
    summary
}

//! Fixed-rate tick driver

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use puppet_transport::SnapshotReader;

use crate::{Engine, Frame};

/// Receives every frame the driver produces (typically a renderer)
pub trait FrameSink {
    fn present(&mut self, frame: &Frame);
}

impl<F: FnMut(&Frame)> FrameSink for F {
    fn present(&mut self, frame: &Frame) {
        self(frame)
    }
}

/// Tick `engine` at its configured interval until `shutdown` flips
///
/// Each tick reads whatever snapshot is current; a late tick is skipped
/// rather than bunched. Returns the number of ticks run.
pub async fn run_ticks<S: FrameSink>(
    engine: &mut Engine,
    reader: SnapshotReader,
    sink: &mut S,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    let mut ticker = interval(engine.config().tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = 0u64;

    loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => break,

            _ = ticker.tick() => {
                let snapshot = reader.latest();
                let frame = engine.tick(&snapshot);
                sink.present(&frame);
                ticks += 1;
            }
        }
    }

    tracing::info!(ticks, "tick driver stopped");
    ticks
}

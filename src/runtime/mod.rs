//! Producer/consumer threading harness.
//!
//! One background worker repeatedly advances the simulation and hands the
//! freshly written vertex buffer to the consumer through a two-party
//! rendezvous: a zero-capacity channel carries the new frame toward the
//! consumer, and a reply channel carries the stale buffer back for reuse.
//! Exactly two buffers circulate, so neither party ever observes the other's
//! writes mid-frame, and frames arrive strictly ordered.
//!
//! Shutdown is cooperative: a flag checked once per worker iteration (an
//! in-progress frame always completes), one forced rendezvous to unstick a
//! worker blocked at the handoff, then an explicit [`Rendezvous::Release`]
//! and a join.

use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{channel, sync_channel, Receiver, Sender, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::surface::mesh::{FrameView, GridLayout, Vertex};
use crate::surface::OceanSurface;

/// The worker disappeared (panicked or already stopped) before the
/// rendezvous completed.
#[derive(Debug, Error)]
#[error("simulation worker disconnected before the rendezvous")]
pub struct WorkerDisconnected;

/// Consumer-side half of each rendezvous.
enum Rendezvous {
    /// Normal handoff: the stale buffer goes back to the worker for reuse.
    Exchange(Vec<Vertex>),
    /// Knock-down: release the worker immediately, shutdown only.
    Release,
}

struct FrameMsg {
    vertices: Vec<Vertex>,
    frame_index: u64,
}

/// Handle to a running background simulation.
///
/// Dropping the handle without calling [`terminate`](Self::terminate) also
/// stops the worker (both channels disconnect), but discards the surface.
pub struct SimulationThread {
    layout: GridLayout,
    current: Vec<Vertex>,
    frame_index: u64,
    frames: Receiver<FrameMsg>,
    replies: Sender<Rendezvous>,
    running: Arc<AtomicBool>,
    frames_completed: Arc<AtomicU64>,
    worker: JoinHandle<(OceanSurface, Option<Vec<Vertex>>)>,
}

impl SimulationThread {
    /// Move the surface onto a background worker and start simulating.
    ///
    /// `fetch_time` is called once per frame and supplies the elapsed
    /// simulation time in seconds.
    pub fn spawn<F>(mut surface: OceanSurface, fetch_time: F) -> Self
    where
        F: FnMut() -> f32 + Send + 'static,
    {
        let layout = surface.layout();
        // The surface's own buffer pair becomes the circulating pair: the
        // consumer starts with the read buffer, the worker with the other.
        let (current, pending) = surface.detach_buffers();

        let (frame_tx, frame_rx) = sync_channel::<FrameMsg>(0);
        let (reply_tx, reply_rx) = channel::<Rendezvous>();
        let running = Arc::new(AtomicBool::new(true));
        let frames_completed = Arc::new(AtomicU64::new(0));

        let worker_running = Arc::clone(&running);
        let worker_completed = Arc::clone(&frames_completed);
        let worker = std::thread::spawn(move || {
            run_worker(
                surface,
                pending,
                fetch_time,
                frame_tx,
                reply_rx,
                worker_running,
                worker_completed,
            )
        });
        log::debug!("simulation worker started");

        Self {
            layout,
            current,
            frame_index: 0,
            frames: frame_rx,
            replies: reply_tx,
            running,
            frames_completed,
            worker,
        }
    }

    /// Consumer half of the rendezvous. Blocks until the worker's frame is
    /// ready, installs it as the readable frame, and hands the stale buffer
    /// back. Returns the new frame's index (first frame is 1).
    pub fn wait(&mut self) -> Result<u64, WorkerDisconnected> {
        let msg = self.frames.recv().map_err(|_| WorkerDisconnected)?;
        let stale = mem::replace(&mut self.current, msg.vertices);
        self.frame_index = msg.frame_index;
        // A send failure here only means the worker already stopped; the
        // received frame stays valid either way.
        let _ = self.replies.send(Rendezvous::Exchange(stale));
        Ok(msg.frame_index)
    }

    /// View of the frame most recently handed over. Safe to read while the
    /// worker computes the next one; the worker never touches this buffer.
    pub fn frame(&self) -> FrameView<'_> {
        FrameView::new(self.layout, &self.current)
    }

    /// Interpolated height at a world location, from the current frame.
    pub fn height_at(&self, location: Vec2) -> f32 {
        self.frame().height_at(location)
    }

    /// Interpolated height and unit normal at a world location.
    pub fn height_normal_at(&self, location: Vec2) -> (f32, Vec3) {
        self.frame().height_normal_at(location)
    }

    /// Index of the frame currently readable; 0 until the first `wait`.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Number of frames the worker has finished computing.
    pub fn frames_completed(&self) -> u64 {
        self.frames_completed.load(Ordering::Relaxed)
    }

    /// Stop the worker and reassemble the surface. The returned surface's
    /// read buffer is the last frame this handle observed.
    ///
    /// Always completes: the stop flag ends the loop, and one forced
    /// rendezvous frees a worker already blocked at the handoff. Errors only
    /// if the worker panicked.
    pub fn terminate(self) -> Result<OceanSurface, WorkerDisconnected> {
        self.running.store(false, Ordering::Release);
        // Complete a handoff the worker may be blocked on. If the worker
        // already exited at the top of its loop this recv fails, which is
        // fine; the in-flight frame (if any) is discarded, not installed.
        let leftover = self.frames.recv().ok();
        let _ = self.replies.send(Rendezvous::Release);

        let (mut surface, pending) = self.worker.join().map_err(|_| WorkerDisconnected)?;
        log::debug!("simulation worker joined");
        let back = leftover
            .map(|msg| msg.vertices)
            .or(pending)
            .unwrap_or_default();
        surface.attach_buffers(self.current, back);
        Ok(surface)
    }
}

fn run_worker<F>(
    mut surface: OceanSurface,
    mut pending: Vec<Vertex>,
    mut fetch_time: F,
    frames: SyncSender<FrameMsg>,
    replies: Receiver<Rendezvous>,
    running: Arc<AtomicBool>,
    frames_completed: Arc<AtomicU64>,
) -> (OceanSurface, Option<Vec<Vertex>>)
where
    F: FnMut() -> f32,
{
    let mut frame_index = 0u64;
    while running.load(Ordering::Acquire) {
        let time = fetch_time();
        frame_index += 1;
        surface.synthesize_into(&mut pending, time);
        frames_completed.fetch_add(1, Ordering::Relaxed);

        let msg = FrameMsg {
            vertices: mem::take(&mut pending),
            frame_index,
        };
        if frames.send(msg).is_err() {
            // Consumer went away; its buffer is gone with it.
            return (surface, None);
        }
        match replies.recv() {
            Ok(Rendezvous::Exchange(stale)) => pending = stale,
            Ok(Rendezvous::Release) | Err(_) => return (surface, None),
        }
    }
    (surface, Some(pending))
}

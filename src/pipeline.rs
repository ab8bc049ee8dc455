//! Hands finished frames to a persistence worker so the render loop never
//! waits on disk I/O.

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, error, trace};

use crate::{
    error::{Error, Result},
    frame::FrameBuffer,
};

/// How long the worker sleeps on an empty queue before checking again.
const IDLE: Duration = Duration::from_millis(10);

/// Extension of every persisted frame.
pub const FRAME_EXTENSION: &str = "bmp";

/// `<directory>/<index>.bmp`.
pub fn frame_path(directory: &Path, index: u64) -> PathBuf {
    directory.join(format!("{index}.{FRAME_EXTENSION}"))
}

/// Persists one frame. Implementations run on the persistence worker thread.
pub trait FrameSink: Send {
    fn save(&mut self, index: u64, frame: &FrameBuffer) -> Result<()>;
}

/// Writes each frame as an uncompressed 24-bit BMP named after its index.
pub struct BmpSink {
    directory: PathBuf,
}

impl BmpSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl FrameSink for BmpSink {
    fn save(&mut self, index: u64, frame: &FrameBuffer) -> Result<()> {
        let path = frame_path(&self.directory, index);
        image::save_buffer_with_format(
            &path,
            frame.as_bytes(),
            frame.width(),
            frame.height(),
            image::ColorType::Rgb8,
            image::ImageFormat::Bmp,
        )
        .map_err(|source| Error::Save { index, source })?;
        trace!("wrote {}", path.display());
        Ok(())
    }
}

pub struct QueueEntry {
    pub sequence_index: u64,
    pub frame: FrameBuffer,
}

struct State {
    entries: VecDeque<QueueEntry>,
    next_index: u64,
    stopping: bool,
    worker_done: bool,
}

struct Shared {
    state: Mutex<State>,
    /// Signalled when an entry is pushed or stop is requested.
    available: Condvar,
    /// Signalled when an entry is popped or the worker exits.
    space: Condvar,
    capacity: usize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Bounded FIFO of finished frames drained by a dedicated writer thread.
///
/// `push` blocks while `capacity` frames are waiting. After [`finish`] is
/// called the worker keeps writing until the queue is empty, so every pushed
/// frame reaches the sink unless the sink itself fails.
///
/// [`finish`]: OutputPipeline::finish
pub struct OutputPipeline {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<Result<usize>>>,
}

impl OutputPipeline {
    pub fn new(sink: impl FrameSink + 'static, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::config("output queue capacity must be at least 1"));
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                entries: VecDeque::with_capacity(capacity),
                next_index: 0,
                stopping: false,
                worker_done: false,
            }),
            available: Condvar::new(),
            space: Condvar::new(),
            capacity,
        });

        let worker = thread::Builder::new()
            .name("frame-writer".into())
            .spawn({
                let shared = Arc::clone(&shared);
                move || persist(&shared, sink)
            })?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Frames waiting to be written.
    pub fn depth(&self) -> usize {
        self.shared.lock().entries.len()
    }

    /// Queues `entry` for writing. Indices must start at 0 and increase by one.
    pub fn push(&self, entry: QueueEntry) -> Result<()> {
        let mut state = self.shared.lock();
        if entry.sequence_index != state.next_index {
            return Err(Error::OutOfOrder {
                expected: state.next_index,
                actual: entry.sequence_index,
            });
        }

        while state.entries.len() >= self.shared.capacity && !state.worker_done {
            state = self
                .shared
                .space
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.worker_done || state.stopping {
            return Err(Error::PipelineClosed);
        }

        state.entries.push_back(entry);
        state.next_index += 1;
        drop(state);
        self.shared.available.notify_one();
        Ok(())
    }

    /// Stops accepting frames, waits for the queue to drain and returns the
    /// number of frames written.
    pub fn finish(mut self) -> Result<usize> {
        self.stop()
    }

    fn stop(&mut self) -> Result<usize> {
        self.shared.lock().stopping = true;
        self.shared.available.notify_all();

        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| Error::WorkerPanicked)?,
            None => Ok(0),
        }
    }
}

impl Drop for OutputPipeline {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(err) = self.stop() {
                error!("output pipeline failed while shutting down: {err}");
            }
        }
    }
}

fn persist(shared: &Shared, mut sink: impl FrameSink) -> Result<usize> {
    let result = drain(shared, &mut sink);

    let mut state = shared.lock();
    state.worker_done = true;
    if result.is_err() {
        state.entries.clear();
    }
    drop(state);
    shared.space.notify_all();

    result
}

fn drain(shared: &Shared, sink: &mut impl FrameSink) -> Result<usize> {
    let mut written = 0;
    loop {
        let entry = {
            let mut state = shared.lock();
            loop {
                if let Some(entry) = state.entries.pop_front() {
                    break Some(entry);
                }
                if state.stopping {
                    break None;
                }
                state = shared
                    .available
                    .wait_timeout(state, IDLE)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }
        };

        let Some(QueueEntry {
            sequence_index,
            frame,
        }) = entry
        else {
            debug!("persistence worker drained after {written} frames");
            return Ok(written);
        };
        shared.space.notify_one();

        sink.save(sequence_index, &frame)?;
        drop(frame);
        written += 1;
    }
}

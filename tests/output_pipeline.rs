use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Arc, Mutex,
    },
    thread,
    time::Duration,
};

use fnv::FnvHashSet;
use mandelbrot_zoom::{
    screen, Error, FrameBuffer, FrameSink, OutputPipeline, QueueEntry, Result, Rgb,
};

#[derive(Clone, Default)]
struct CountingSink {
    saved: Arc<Mutex<Vec<u64>>>,
}

impl FrameSink for CountingSink {
    fn save(&mut self, index: u64, frame: &FrameBuffer) -> Result<()> {
        // Each test frame carries its index in the first pixel.
        assert_eq!(frame.get(0, 0).r as u64, index % 256);
        thread::sleep(Duration::from_micros(200));
        self.saved.lock().unwrap().push(index);
        Ok(())
    }
}

fn entry(sequence_index: u64) -> QueueEntry {
    let mut frame = FrameBuffer::new(screen::Size::new(4, 3));
    frame.set(0, 0, Rgb::new((sequence_index % 256) as u8, 0, 0));
    QueueEntry {
        sequence_index,
        frame,
    }
}

#[test]
fn every_pushed_frame_is_written_exactly_once() {
    let sink = CountingSink::default();
    let saved = Arc::clone(&sink.saved);
    let pipeline = OutputPipeline::new(sink, 8).unwrap();

    const N: u64 = 300;
    for index in 0..N {
        pipeline.push(entry(index)).unwrap();
        assert!(pipeline.depth() <= pipeline.capacity());
    }
    assert_eq!(pipeline.finish().unwrap(), N as usize);

    let saved = saved.lock().unwrap();
    assert_eq!(saved.len(), N as usize);
    let unique: FnvHashSet<u64> = saved.iter().copied().collect();
    assert_eq!(unique.len(), N as usize, "duplicate indices written");
    assert_eq!(*saved, (0..N).collect::<Vec<_>>(), "frames written out of order");
}

#[test]
fn finish_drains_a_full_queue() {
    let sink = CountingSink::default();
    let saved = Arc::clone(&sink.saved);
    let pipeline = OutputPipeline::new(sink, 1000).unwrap();
    for index in 0..50 {
        pipeline.push(entry(index)).unwrap();
    }
    // The stop flag is raised while frames are still queued.
    assert_eq!(pipeline.finish().unwrap(), 50);
    assert_eq!(saved.lock().unwrap().len(), 50);
}

#[test]
fn dropping_the_pipeline_still_drains() {
    let sink = CountingSink::default();
    let saved = Arc::clone(&sink.saved);
    {
        let pipeline = OutputPipeline::new(sink, 16).unwrap();
        for index in 0..10 {
            pipeline.push(entry(index)).unwrap();
        }
    }
    assert_eq!(saved.lock().unwrap().len(), 10);
}

struct GatedSink {
    gate: mpsc::Receiver<()>,
}

impl FrameSink for GatedSink {
    fn save(&mut self, _index: u64, _frame: &FrameBuffer) -> Result<()> {
        self.gate.recv().unwrap();
        Ok(())
    }
}

#[test]
fn push_blocks_when_the_queue_is_full() {
    let (open, gate) = mpsc::channel();
    let pipeline = Arc::new(OutputPipeline::new(GatedSink { gate }, 1).unwrap());
    let pushed = Arc::new(AtomicUsize::new(0));

    let producer = thread::spawn({
        let pipeline = Arc::clone(&pipeline);
        let pushed = Arc::clone(&pushed);
        move || {
            for index in 0..3 {
                pipeline.push(entry(index)).unwrap();
                pushed.fetch_add(1, Ordering::SeqCst);
            }
        }
    });

    thread::sleep(Duration::from_millis(100));
    // One frame held by the blocked writer, at most one queued.
    assert!(pushed.load(Ordering::SeqCst) <= 2);
    assert!(pipeline.depth() <= 1);

    for _ in 0..3 {
        open.send(()).unwrap();
    }
    producer.join().unwrap();
    assert_eq!(pushed.load(Ordering::SeqCst), 3);

    let pipeline = Arc::try_unwrap(pipeline).ok().unwrap();
    assert_eq!(pipeline.finish().unwrap(), 3);
}

struct FailingSink {
    fail_at: u64,
}

impl FrameSink for FailingSink {
    fn save(&mut self, index: u64, _frame: &FrameBuffer) -> Result<()> {
        if index == self.fail_at {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    }
}

#[test]
fn write_failure_is_fatal_to_the_pipeline() {
    let pipeline = OutputPipeline::new(FailingSink { fail_at: 1 }, 4).unwrap();
    let mut closed = false;
    for index in 0..200 {
        match pipeline.push(entry(index)) {
            Ok(()) => {}
            Err(Error::PipelineClosed) => {
                closed = true;
                break;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
        thread::sleep(Duration::from_millis(1));
    }
    assert!(closed, "producer was never told the writer stopped");

    let err = pipeline.finish().unwrap_err();
    assert_eq!(err.to_string(), "disk full");
}

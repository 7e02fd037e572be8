//! Frame buffers for the real-time path
//!
//! [`FrameQueue`] carries fixed-size PCM frames from one producer to one
//! consumer, with a free list so the capture callback can hand frames to
//! playback or the network without allocating. All buffers are allocated
//! when the queue is created.
//!
//! Both ends pop from the filled queue: the consumer to read, the producer
//! to drop the oldest frame on overflow. The backing `ArrayQueue`s must
//! therefore stay multi-consumer.

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::codec::pcm::{normalize_into, quantize_into};

/// One frame of normalized samples
#[derive(Clone, Debug)]
pub struct AudioFrame {
    samples: Vec<f32>,
}

impl AudioFrame {
    pub fn silent(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Overwrite with normalized copies of `pcm`
    pub fn load_pcm(&mut self, pcm: &[i16]) {
        normalize_into(pcm, &mut self.samples);
    }

    /// Quantize into `pcm`, clipping to the 16-bit range
    pub fn store_pcm(&self, pcm: &mut [i16]) {
        quantize_into(&self.samples, pcm);
    }
}

/// A PCM frame owned by a [`FrameQueue`]
pub type PcmFrame = Vec<i16>;

/// Lock-free queue of fixed-size PCM frames
pub struct FrameQueue {
    /// Written frames, oldest first
    filled: ArrayQueue<PcmFrame>,
    /// Empty frames ready for the producer
    free: ArrayQueue<PcmFrame>,
    /// Samples per frame
    frame_size: usize,
    /// Set once the producer is done
    closed: AtomicBool,
    /// Frames dropped because the consumer fell behind
    overflow_count: AtomicUsize,
    /// Empty pops by the consumer
    underrun_count: AtomicUsize,
}

impl FrameQueue {
    /// Create a queue holding up to `capacity` frames of `frame_size` samples
    pub fn new(capacity: usize, frame_size: usize) -> Self {
        let capacity = capacity.max(2);
        let free = ArrayQueue::new(capacity);
        for _ in 0..capacity {
            let _ = free.push(vec![0i16; frame_size]);
        }

        Self {
            filled: ArrayQueue::new(capacity),
            free,
            frame_size,
            closed: AtomicBool::new(false),
            overflow_count: AtomicUsize::new(0),
            underrun_count: AtomicUsize::new(0),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Take an empty frame for writing.
    ///
    /// When every frame is queued and unread, the oldest one is popped from
    /// the filled queue, dropped and reused, counting as an overflow. That
    /// pop can race the consumer's. Returns `None` only if the consumer
    /// currently holds every frame.
    pub fn acquire(&self) -> Option<PcmFrame> {
        if let Some(frame) = self.free.pop() {
            return Some(frame);
        }
        self.overflow_count.fetch_add(1, Ordering::Relaxed);
        self.filled.pop()
    }

    /// Queue a written frame for the consumer
    pub fn push(&self, frame: PcmFrame) {
        if let Err(frame) = self.filled.push(frame) {
            self.overflow_count.fetch_add(1, Ordering::Relaxed);
            self.recycle(frame);
        }
    }

    /// Take the oldest written frame, counting an underrun when empty
    pub fn pop(&self) -> Option<PcmFrame> {
        match self.filled.pop() {
            Some(frame) => Some(frame),
            None => {
                self.underrun_count.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Pop without counting an underrun
    pub fn try_pop(&self) -> Option<PcmFrame> {
        self.filled.pop()
    }

    /// Count an underrun noticed by a consumer that uses `try_pop`
    pub fn record_underrun(&self) {
        self.underrun_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a consumed frame to the free list
    pub fn recycle(&self, frame: PcmFrame) {
        let _ = self.free.push(frame);
    }

    /// Producer is gone; consumers drain what is left and stop
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.filled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filled.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.filled.capacity()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            level: self.len(),
            capacity: self.capacity(),
            overflows: self.overflow_count.load(Ordering::Relaxed),
            underruns: self.underrun_count.load(Ordering::Relaxed),
        }
    }
}

/// Thread-safe handle to a frame queue
pub type SharedFrameQueue = Arc<FrameQueue>;

pub fn create_frame_queue(capacity: usize, frame_size: usize) -> SharedFrameQueue {
    Arc::new(FrameQueue::new(capacity, frame_size))
}

/// Frame queue statistics
#[derive(Debug, Clone, Copy)]
pub struct QueueStats {
    pub level: usize,
    pub capacity: usize,
    pub overflows: usize,
    pub underruns: usize,
}

/// Collects device-sized callbacks into fixed-size frames
pub struct FrameAssembler {
    frame: PcmFrame,
    filled: usize,
}

impl FrameAssembler {
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame: vec![0; frame_size],
            filled: 0,
        }
    }

    /// Append samples, calling `on_frame` for every frame completed.
    pub fn push<I, F>(&mut self, samples: I, mut on_frame: F)
    where
        I: IntoIterator<Item = i16>,
        F: FnMut(&[i16]),
    {
        for sample in samples {
            self.frame[self.filled] = sample;
            self.filled += 1;
            if self.filled == self.frame.len() {
                on_frame(&self.frame);
                self.filled = 0;
            }
        }
    }

    /// Samples waiting for the next frame
    pub fn pending(&self) -> usize {
        self.filled
    }
}

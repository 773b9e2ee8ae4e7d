//! Dedicated detection thread for callers that share one detector.
//!
//! Layout: `handles → bounded job queue → worker [detector] → reply channel`
//!
//! The worker owns the detector, so every `detect` call on it is serialized
//! no matter how many handles submit frames.

use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::face_detector::{DetectError, FaceDetector};
use crate::shared::constants::DEFAULT_WORKER_CAPACITY;
use crate::shared::frame::Frame;

pub type DetectResult = Result<Vec<Detection>, DetectError>;

/// Receives the result of one submitted frame.
pub type PendingResult = Receiver<DetectResult>;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("detection worker has shut down")]
    Closed,
    #[error(transparent)]
    Detect(#[from] DetectError),
}

enum Message {
    Detect { frame: Frame, reply: Sender<DetectResult> },
    Stop,
}

pub struct DetectionWorker {
    jobs: Sender<Message>,
    thread: Option<JoinHandle<Box<dyn FaceDetector>>>,
}

/// Cloneable submission side of a [`DetectionWorker`].
#[derive(Clone)]
pub struct DetectionHandle {
    jobs: Sender<Message>,
}

impl DetectionWorker {
    /// Move `detector` onto a new thread with room for `capacity` queued frames.
    pub fn spawn(detector: Box<dyn FaceDetector>, capacity: usize) -> Self {
        let (jobs, queue) = crossbeam_channel::bounded(capacity.max(1));
        let thread = spawn_detector(detector, queue);
        Self {
            jobs,
            thread: Some(thread),
        }
    }

    pub fn with_default_capacity(detector: Box<dyn FaceDetector>) -> Self {
        Self::spawn(detector, DEFAULT_WORKER_CAPACITY)
    }

    pub fn handle(&self) -> DetectionHandle {
        DetectionHandle {
            jobs: self.jobs.clone(),
        }
    }

    /// Drain queued frames, stop the thread and hand the detector back.
    ///
    /// Returns `None` if the worker thread panicked.
    pub fn shutdown(mut self) -> Option<Box<dyn FaceDetector>> {
        self.stop()
    }

    fn stop(&mut self) -> Option<Box<dyn FaceDetector>> {
        let thread = self.thread.take()?;
        let _ = self.jobs.send(Message::Stop);
        match thread.join() {
            Ok(detector) => Some(detector),
            Err(_) => {
                log::warn!("detection worker panicked");
                None
            }
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl DetectionHandle {
    /// Queue `frame`, blocking while the queue is full.
    ///
    /// The returned receiver yields exactly one result.
    pub fn submit(&self, frame: Frame) -> Result<PendingResult, WorkerError> {
        let (reply, result) = crossbeam_channel::bounded(1);
        self.jobs
            .send(Message::Detect { frame, reply })
            .map_err(|_| WorkerError::Closed)?;
        Ok(result)
    }

    /// Queue `frame` and wait for its detections.
    pub fn detect(&self, frame: Frame) -> Result<Vec<Detection>, WorkerError> {
        let result = self.submit(frame)?;
        Ok(result.recv().map_err(|_| WorkerError::Closed)??)
    }
}

fn spawn_detector(
    mut detector: Box<dyn FaceDetector>,
    queue: Receiver<Message>,
) -> JoinHandle<Box<dyn FaceDetector>> {
    std::thread::spawn(move || {
        for message in queue.iter() {
            match message {
                Message::Detect { frame, reply } => {
                    let result = detector.detect(&frame);
                    if reply.send(result).is_err() {
                        log::debug!("result for frame {} was abandoned", frame.index());
                    }
                }
                Message::Stop => break,
            }
        }
        detector
    })
}

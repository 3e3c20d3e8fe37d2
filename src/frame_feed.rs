// THEORY:
// The frame feed is the hand-off between whatever produces frames (a camera thread,
// a file reader) and the single task that paints them. Detection and painting are
// synchronous and own mutable history, so exactly one task owns the `PaintSession`
// and everything else talks to it over channels.
//
// Key principles:
// 1.  **Producer-side backpressure**: frames go through a small bounded channel with
//     `try_send`. When the painter is behind, the new frame is dropped on the floor
//     and counted. The painter never queues more than `capacity` frames.
// 2.  **Controls are never dropped**: keys and clicks travel on a separate unbounded
//     channel and are applied before any waiting frame.
// 3.  **Latest output wins**: results are published on a `watch` channel, so a slow
//     viewer only ever sees the newest painting.
// 4.  **Events are best effort**: replies to controls and frame rejections go into a
//     bounded channel. When nobody reads them they are dropped and counted.

use crate::core_modules::pixel::pixel::Color;
use crate::error::{PaintError, Result};
use crate::session::{KeyOutcome, PaintSession};
use futures::{Stream, StreamExt};
use image::RgbaImage;
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// User input for the painter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Key(char),
    /// Pick the target color at this pixel of the last prepared frame.
    Click { x: u32, y: u32 },
    SetTarget(Color),
}

/// Things the painter reports back besides frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Key(KeyOutcome),
    TargetSelected(Color),
    /// A control or frame was rejected; the message says why.
    Rejected(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub processed: u64,
    pub dropped: u64,
    pub failed: u64,
    /// Events nobody read in time.
    pub events_dropped: u64,
}

pub type SharedFrame = Arc<RgbaImage>;

/// How many unread `WorkerEvent`s the painter keeps before dropping new ones.
pub const EVENT_QUEUE_CAPACITY: usize = 16;

pub struct PaintWorker {
    frames: mpsc::Sender<RgbaImage>,
    controls: mpsc::UnboundedSender<Control>,
    outputs: watch::Receiver<Option<SharedFrame>>,
    events: mpsc::Receiver<WorkerEvent>,
    dropped: AtomicU64,
    handle: JoinHandle<(PaintSession, FeedStats)>,
}

impl PaintWorker {
    /// Moves `session` onto a new tokio task. At most `capacity` frames wait for it.
    pub fn spawn(session: PaintSession, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PaintError::invalid("frame queue capacity must be at least 1"));
        }

        let (frame_tx, frame_rx) = mpsc::channel::<RgbaImage>(capacity);
        let (control_tx, control_rx) = mpsc::unbounded_channel::<Control>();
        let (output_tx, output_rx) = watch::channel::<Option<SharedFrame>>(None);
        let (event_tx, event_rx) = mpsc::channel::<WorkerEvent>(EVENT_QUEUE_CAPACITY);

        let handle = tokio::spawn(run_painter(session, frame_rx, control_rx, output_tx, event_tx));
        info!("paint worker started (queue capacity {capacity})");

        Ok(Self {
            frames: frame_tx,
            controls: control_tx,
            outputs: output_rx,
            events: event_rx,
            dropped: AtomicU64::new(0),
            handle,
        })
    }

    /// Hands a frame to the painter without waiting. Returns `Ok(false)` when the
    /// queue is full and the frame was dropped.
    pub fn offer_frame(&self, frame: RgbaImage) -> Result<bool> {
        match self.frames.try_send(frame) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                debug!("painter busy, dropped frame ({dropped} so far)");
                Ok(false)
            }
            Err(TrySendError::Closed(_)) => Err(PaintError::WorkerClosed),
        }
    }

    pub fn send_control(&self, control: Control) -> Result<()> {
        self.controls
            .send(control)
            .map_err(|_| PaintError::WorkerClosed)
    }

    /// The newest output frame, if any frame has been painted yet.
    pub fn latest(&self) -> Option<SharedFrame> {
        self.outputs.borrow().clone()
    }

    /// A receiver that wakes whenever a new output frame is published.
    pub fn subscribe(&self) -> watch::Receiver<Option<SharedFrame>> {
        self.outputs.clone()
    }

    /// Next event from the painter, without waiting.
    pub fn try_next_event(&mut self) -> Option<WorkerEvent> {
        self.events.try_recv().ok()
    }

    pub async fn next_event(&mut self) -> Option<WorkerEvent> {
        self.events.recv().await
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stops taking input, lets the painter finish queued frames, and returns the
    /// session together with the final counters.
    pub async fn shutdown(self) -> Result<(PaintSession, FeedStats)> {
        let PaintWorker {
            frames,
            controls,
            dropped,
            handle,
            ..
        } = self;
        drop(frames);
        drop(controls);

        let (session, mut stats) = handle.await.map_err(|e| {
            warn!("paint worker ended abnormally: {e}");
            PaintError::WorkerClosed
        })?;
        stats.dropped = dropped.into_inner();
        info!(
            "paint worker stopped: {} processed, {} dropped, {} failed, {} event(s) unread",
            stats.processed, stats.dropped, stats.failed, stats.events_dropped
        );
        Ok((session, stats))
    }
}

async fn run_painter(
    mut session: PaintSession,
    mut frames: mpsc::Receiver<RgbaImage>,
    mut controls: mpsc::UnboundedReceiver<Control>,
    outputs: watch::Sender<Option<SharedFrame>>,
    events: mpsc::Sender<WorkerEvent>,
) -> (PaintSession, FeedStats) {
    let mut stats = FeedStats::default();
    let mut controls_open = true;

    loop {
        tokio::select! {
            biased;

            control = controls.recv(), if controls_open => match control {
                Some(control) => {
                    let event = apply_control(&mut session, control);
                    publish(&events, event, &mut stats);
                }
                None => controls_open = false,
            },

            frame = frames.recv() => {
                let Some(frame) = frame else { break };
                match session.process_frame(&frame) {
                    Ok(view) => {
                        stats.processed += 1;
                        outputs.send_replace(Some(Arc::new(view.clone())));
                    }
                    Err(e) => {
                        stats.failed += 1;
                        warn!("skipping frame: {e}");
                        publish(&events, WorkerEvent::Rejected(e.to_string()), &mut stats);
                    }
                }
                tokio::task::yield_now().await;
            }
        }
    }

    while let Ok(control) = controls.try_recv() {
        let event = apply_control(&mut session, control);
        publish(&events, event, &mut stats);
    }
    (session, stats)
}

fn apply_control(session: &mut PaintSession, control: Control) -> WorkerEvent {
    match control {
        Control::Key(key) => WorkerEvent::Key(session.handle_key(key)),
        Control::Click { x, y } => match session.select_target(x, y) {
            Ok(color) => WorkerEvent::TargetSelected(color),
            Err(e) => {
                warn!("ignoring click: {e}");
                WorkerEvent::Rejected(e.to_string())
            }
        },
        Control::SetTarget(color) => {
            session.set_target(color);
            WorkerEvent::TargetSelected(color)
        }
    }
}

fn publish(events: &mpsc::Sender<WorkerEvent>, event: WorkerEvent, stats: &mut FeedStats) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            stats.events_dropped += 1;
            debug!("event queue full, dropped {event:?}");
        }
        // nobody listening is fine
        Err(TrySendError::Closed(_)) => {}
    }
}

/// Feeds `frames` into `worker`, one every `interval`. Frames the worker is too busy
/// for are dropped. Returns how many frames were accepted.
pub async fn pump<S>(mut frames: S, worker: &PaintWorker, interval: Duration) -> Result<u64>
where
    S: Stream<Item = RgbaImage> + Unpin,
{
    let mut ticker = (!interval.is_zero()).then(|| {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });
    let mut accepted = 0u64;

    while let Some(frame) = frames.next().await {
        match ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => tokio::task::yield_now().await,
        }
        if worker.offer_frame(frame)? {
            accepted += 1;
        }
    }
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaintConfig;
    use crate::core_modules::paint_accumulator::DisplayMode;
    use image::Rgba;

    const MARKER: Rgba<u8> = Rgba([200, 40, 40, 255]);

    fn session() -> PaintSession {
        PaintSession::new(PaintConfig {
            scale: 1.0,
            mirror: false,
            display: DisplayMode::Painting,
            ..PaintConfig::default()
        })
        .unwrap()
    }

    fn frame_with_marker(x: u32) -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(32, 16, Rgba([0, 0, 0, 255]));
        for dy in 0..8 {
            for dx in 0..8 {
                frame.put_pixel(x + dx, 4 + dy, MARKER);
            }
        }
        frame
    }

    #[tokio::test]
    async fn frames_beyond_capacity_are_dropped() {
        let worker = PaintWorker::spawn(session(), 1).unwrap();

        // Nothing has yielded to the painter yet, so only the first frame fits.
        assert!(worker.offer_frame(frame_with_marker(0)).unwrap());
        assert!(!worker.offer_frame(frame_with_marker(8)).unwrap());
        assert!(!worker.offer_frame(frame_with_marker(16)).unwrap());

        let (session, stats) = worker.shutdown().await.unwrap();
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.dropped, 2);
        assert_eq!(session.frames_processed(), 1);
    }

    #[tokio::test]
    async fn dropped_frames_are_visible_before_shutdown() {
        let worker = PaintWorker::spawn(session(), 1).unwrap();

        worker.offer_frame(frame_with_marker(0)).unwrap();
        worker.offer_frame(frame_with_marker(8)).unwrap();

        assert_eq!(worker.dropped_frames(), 1);
        worker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn controls_apply_before_queued_frames() {
        let worker = PaintWorker::spawn(session(), 4).unwrap();

        worker.offer_frame(frame_with_marker(0)).unwrap();
        worker.send_control(Control::SetTarget(Color::from(MARKER))).unwrap();

        let (session, stats) = worker.shutdown().await.unwrap();
        assert_eq!(stats.processed, 1);
        assert_eq!(session.accumulator().history().len(), 1);
    }

    #[tokio::test]
    async fn click_selects_target_and_reports_it() {
        let mut worker = PaintWorker::spawn(session(), 2).unwrap();
        let mut views = worker.subscribe();

        worker.offer_frame(frame_with_marker(0)).unwrap();
        views.changed().await.unwrap();
        worker.send_control(Control::Click { x: 2, y: 6 }).unwrap();

        assert_eq!(
            worker.next_event().await,
            Some(WorkerEvent::TargetSelected(Color::from(MARKER)))
        );

        worker.send_control(Control::Click { x: 99, y: 0 }).unwrap();
        assert!(matches!(worker.next_event().await, Some(WorkerEvent::Rejected(_))));

        let (session, _) = worker.shutdown().await.unwrap();
        assert_eq!(session.target(), Some(Color::from(MARKER)));
    }

    #[tokio::test]
    async fn pump_paints_a_trail_across_frames() {
        let worker = PaintWorker::spawn(session(), 4).unwrap();
        worker.send_control(Control::SetTarget(Color::from(MARKER))).unwrap();

        let mut frames = futures::stream::iter((0..3).map(|i| frame_with_marker(i * 8)));
        let mut views = worker.subscribe();
        let mut accepted = 0;
        while let Some(frame) = frames.next().await {
            assert!(worker.offer_frame(frame).unwrap());
            views.changed().await.unwrap();
            accepted += 1;
        }

        let latest = worker.latest().unwrap();
        let painted = latest
            .pixels()
            .filter(|p| **p == Color::BLUE.to_rgba())
            .count();
        assert_eq!(accepted, 3);
        assert_eq!(painted, 3 * 64);

        let (_, stats) = worker.shutdown().await.unwrap();
        assert_eq!(stats, FeedStats { processed: 3, ..FeedStats::default() });
    }

    #[tokio::test]
    async fn pump_counts_accepted_frames() {
        let worker = PaintWorker::spawn(session(), 8).unwrap();
        let frames = futures::stream::iter((0..3).map(|i| frame_with_marker(i * 8)));

        let accepted = pump(frames, &worker, Duration::ZERO).await.unwrap();

        assert_eq!(accepted, 3);
        let (_, stats) = worker.shutdown().await.unwrap();
        assert_eq!(stats.processed, 3);
    }

    #[tokio::test]
    async fn zero_capacity_is_rejected() {
        assert!(matches!(
            PaintWorker::spawn(session(), 0),
            Err(PaintError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn unread_events_stay_bounded() {
        let mut worker = PaintWorker::spawn(session(), 1).unwrap();
        let total = EVENT_QUEUE_CAPACITY as u64 + 10;
        for _ in 0..total {
            worker.send_control(Control::Key('w')).unwrap();
        }
        // Let the painter work through every control before anything is read.
        worker.offer_frame(frame_with_marker(0)).unwrap();
        worker.subscribe().changed().await.unwrap();

        let mut unread = 0;
        while let Some(event) = worker.try_next_event() {
            assert_eq!(event, WorkerEvent::Key(KeyOutcome::Display(DisplayMode::Webcam)));
            unread += 1;
        }
        assert_eq!(unread, EVENT_QUEUE_CAPACITY);

        let (_, stats) = worker.shutdown().await.unwrap();
        assert_eq!(stats.events_dropped, total - EVENT_QUEUE_CAPACITY as u64);
    }
}

//! Continuous location fixes.
//!
//! A [`LocationSource`] is polled by one background task which publishes
//! every valid fix twice: on a `watch` channel for readers that only need
//! the latest position, and on every open [`FixStream`] for consumers that
//! must see each fix. The channel is seeded with a fallback coordinate, and
//! the fallback is published again whenever the source fails, so consumers
//! always have somewhere to stand.

use crate::error::LocationError;
use pulsepoint_geo::{destination_point, distance_km, initial_bearing, Coordinate};
use pulsepoint_telemetry::metrics;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default delay before polling a failing source again.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of fixes a [`FixStream`] buffers before the feed waits.
pub const DEFAULT_STREAM_BUFFER: usize = 64;

/// Produces location fixes, one per call.
///
/// Implementations may wait as long as they like between fixes.
pub trait LocationSource: Send + 'static {
    fn next_fix(&mut self) -> impl Future<Output = Result<Coordinate, LocationError>> + Send;
}

/// Feed settings
#[derive(Debug, Clone, Copy)]
pub struct FeedConfig {
    /// Published at start and whenever the source fails
    pub fallback: Coordinate,
    /// Wait after a transient failure
    pub retry_interval: Duration,
    /// Capacity of each [`FixStream`]
    pub stream_buffer: usize,
}

impl FeedConfig {
    pub fn new(fallback: Coordinate) -> Self {
        Self {
            fallback,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    #[must_use]
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    #[must_use]
    pub fn with_stream_buffer(mut self, stream_buffer: usize) -> Self {
        self.stream_buffer = stream_buffer.max(1);
        self
    }
}

/// Entry point for starting feeds.
pub struct LocationFeed;

impl LocationFeed {
    /// Start polling `source`, seeding consumers with `fallback`.
    pub fn spawn<S: LocationSource>(source: S, fallback: Coordinate) -> FeedHandle {
        Self::spawn_with_config(source, FeedConfig::new(fallback))
    }

    /// Start polling `source` with explicit settings.
    ///
    /// The source is moved into the task; a feed cannot be restarted.
    pub fn spawn_with_config<S: LocationSource>(source: S, config: FeedConfig) -> FeedHandle {
        let (tx, rx) = watch::channel(config.fallback);
        let streams = Streams::default();
        let publisher = Publisher {
            latest: tx,
            streams: Arc::clone(&streams),
        };
        let task = tokio::spawn(run(source, config, publisher));
        FeedHandle {
            rx,
            streams,
            stream_buffer: config.stream_buffer.max(1),
            task,
        }
    }
}

type Streams = Arc<Mutex<Vec<mpsc::Sender<Coordinate>>>>;

struct Publisher {
    latest: watch::Sender<Coordinate>,
    streams: Streams,
}

impl Publisher {
    /// Hand `fix` to every consumer.
    ///
    /// The watch value and the stream list change under one lock, so a
    /// stream opened concurrently either starts at `fix` or receives it.
    async fn publish(&self, fix: Coordinate) {
        let streams = {
            let mut streams = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
            self.latest.send_replace(fix);
            streams.retain(|stream| !stream.is_closed());
            streams.clone()
        };

        for stream in streams {
            // A full stream holds the feed back rather than losing the fix
            if stream.send(fix).await.is_err() {
                debug!("Fix stream closed");
            }
        }
    }
}

async fn run<S: LocationSource>(mut source: S, config: FeedConfig, publisher: Publisher) {
    loop {
        match source.next_fix().await {
            Ok(fix) if fix.is_valid() => {
                metrics().increment("location.fixes");
                publisher.publish(fix).await;
            }
            Ok(fix) => {
                warn!(latitude = fix.latitude, longitude = fix.longitude, "Dropping invalid fix");
            }
            Err(e) if e.is_transient() => {
                metrics().increment("location.fallbacks");
                warn!(
                    code = %e.code(),
                    error = %e,
                    retry_ms = config.retry_interval.as_millis() as u64,
                    "Location unavailable, using fallback"
                );
                publisher.publish(config.fallback).await;
                tokio::time::sleep(config.retry_interval).await;
            }
            Err(e) => {
                metrics().increment("location.fallbacks");
                warn!(code = %e.code(), error = %e, "Location denied, holding fallback");
                publisher.publish(config.fallback).await;
                publisher.latest.closed().await;
                return;
            }
        }

        if publisher.latest.is_closed() {
            debug!("All feed consumers gone");
            return;
        }
    }
}

/// Every fix a feed publishes, in order, starting after [`FixStream::start`].
///
/// Unlike the receivers from [`FeedHandle::subscribe`], a stream never
/// skips a fix. A stream that is not drained holds the feed back once its
/// buffer is full.
#[derive(Debug)]
pub struct FixStream {
    start: Coordinate,
    rx: mpsc::Receiver<Coordinate>,
}

impl FixStream {
    /// Latest position when the stream was opened.
    pub fn start(&self) -> Coordinate {
        self.start
    }

    /// The next fix, or `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<Coordinate> {
        self.rx.recv().await
    }
}

/// Consumer side of a running feed.
///
/// Dropping the handle cancels the feed.
#[derive(Debug)]
pub struct FeedHandle {
    rx: watch::Receiver<Coordinate>,
    streams: Streams,
    stream_buffer: usize,
    task: JoinHandle<()>,
}

impl FeedHandle {
    /// A new receiver, positioned at the latest fix.
    ///
    /// Fixes published faster than the receiver reads are coalesced; use
    /// [`FeedHandle::fixes`] when each one matters.
    pub fn subscribe(&self) -> watch::Receiver<Coordinate> {
        self.rx.clone()
    }

    /// Open a stream of every fix published from now on.
    pub fn fixes(&self) -> FixStream {
        let (tx, rx) = mpsc::channel(self.stream_buffer);
        let mut streams = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
        let start = *self.rx.borrow();
        streams.push(tx);
        FixStream { start, rx }
    }

    /// The latest published fix.
    pub fn latest(&self) -> Coordinate {
        *self.rx.borrow()
    }

    /// Stop polling the source and end every open stream.
    pub fn cancel(&self) {
        self.task.abort();
        self.streams.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Replays a fixed list of fixes, then goes quiet.
#[derive(Debug)]
pub struct ScriptedSource {
    events: VecDeque<Result<Coordinate, LocationError>>,
    interval: Duration,
    started: bool,
}

impl ScriptedSource {
    pub fn new(fixes: impl IntoIterator<Item = Coordinate>, interval: Duration) -> Self {
        Self::with_events(fixes.into_iter().map(Ok), interval)
    }

    /// Script that may include failures.
    pub fn with_events(
        events: impl IntoIterator<Item = Result<Coordinate, LocationError>>,
        interval: Duration,
    ) -> Self {
        Self {
            events: events.into_iter().collect(),
            interval,
            started: false,
        }
    }
}

impl LocationSource for ScriptedSource {
    async fn next_fix(&mut self) -> Result<Coordinate, LocationError> {
        if self.started {
            tokio::time::sleep(self.interval).await;
        }
        self.started = true;

        match self.events.pop_front() {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }
}

/// Fixes pushed by another task, e.g. a device bridge.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<Coordinate>,
}

impl ChannelSource {
    /// Create the source and the sender that feeds it.
    pub fn new(buffer: usize) -> (mpsc::Sender<Coordinate>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx })
    }
}

impl LocationSource for ChannelSource {
    async fn next_fix(&mut self) -> Result<Coordinate, LocationError> {
        match self.rx.recv().await {
            Some(fix) => Ok(fix),
            // Sender gone: keep the last fix
            None => std::future::pending().await,
        }
    }
}

/// Walks in a straight line toward a destination at constant speed.
///
/// Emits its start position first, then one fix per interval. Once at the
/// destination it keeps reporting it.
#[derive(Debug, Clone)]
pub struct SimulatedWalk {
    position: Coordinate,
    destination: Coordinate,
    step_km: f64,
    interval: Duration,
    started: bool,
}

impl SimulatedWalk {
    pub fn new(start: Coordinate, destination: Coordinate, speed_kmh: f64, interval: Duration) -> Self {
        Self {
            position: start,
            destination,
            step_km: speed_kmh.max(0.0) * interval.as_secs_f64() / 3600.0,
            interval,
            started: false,
        }
    }

    fn advance(&mut self) {
        let remaining = distance_km(&self.position, &self.destination);
        if remaining <= self.step_km {
            if remaining > 0.0 {
                info!(destination = %self.destination, "Simulated walk reached destination");
            }
            self.position = self.destination;
        } else {
            let bearing = initial_bearing(&self.position, &self.destination);
            self.position = destination_point(&self.position, bearing, self.step_km);
        }
    }
}

impl LocationSource for SimulatedWalk {
    async fn next_fix(&mut self) -> Result<Coordinate, LocationError> {
        if self.started {
            tokio::time::sleep(self.interval).await;
            self.advance();
        }
        self.started = true;
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: Coordinate = Coordinate::new(9.9252, 78.1198);
    const TICK: Duration = Duration::from_millis(100);

    #[tokio::test(start_paused = true)]
    async fn test_channel_starts_at_fallback() {
        let feed = LocationFeed::spawn(ScriptedSource::new([], TICK), FALLBACK);
        assert_eq!(feed.latest(), FALLBACK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_fixes_are_published_in_order() {
        let fixes = [
            Coordinate::new(9.926, 78.120),
            Coordinate::new(9.926, 78.120),
            Coordinate::new(9.927, 78.121),
        ];
        let feed = LocationFeed::spawn(ScriptedSource::new(fixes, TICK), FALLBACK);
        let mut rx = feed.subscribe();

        let mut seen = Vec::new();
        for _ in 0..fixes.len() {
            rx.changed().await.unwrap();
            seen.push(*rx.borrow_and_update());
        }
        assert_eq!(seen, fixes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_fixes_are_dropped() {
        let good = Coordinate::new(9.93, 78.125);
        let source = ScriptedSource::new([Coordinate::new(95.0, 78.0), good], TICK);
        let feed = LocationFeed::spawn(source, FALLBACK);
        let mut rx = feed.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), good);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_publishes_fallback_then_recovers() {
        let first = Coordinate::new(9.93, 78.125);
        let later = Coordinate::new(9.94, 78.13);
        let source = ScriptedSource::with_events(
            [
                Ok(first),
                Err(LocationError::Unavailable("no satellites".into())),
                Ok(later),
            ],
            TICK,
        );
        let feed = LocationFeed::spawn_with_config(
            source,
            FeedConfig::new(FALLBACK).with_retry_interval(Duration::from_secs(1)),
        );
        let mut rx = feed.subscribe();

        let mut seen = Vec::new();
        for _ in 0..3 {
            rx.changed().await.unwrap();
            seen.push(*rx.borrow_and_update());
        }
        assert_eq!(seen, [first, FALLBACK, later]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_holds_fallback() {
        let source = ScriptedSource::with_events(
            [
                Ok(Coordinate::new(9.93, 78.125)),
                Err(LocationError::Denied("permission".into())),
                Ok(Coordinate::new(9.94, 78.13)),
            ],
            TICK,
        );
        let feed = LocationFeed::spawn(source, FALLBACK);
        let mut rx = feed.subscribe();

        rx.changed().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), FALLBACK);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(feed.latest(), FALLBACK);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_source_forwards_pushed_fixes() {
        let (tx, source) = ChannelSource::new(4);
        let feed = LocationFeed::spawn(source, FALLBACK);
        let mut rx = feed.subscribe();

        let fix = Coordinate::new(9.95, 78.16);
        tx.send(fix).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), fix);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fix_stream_keeps_every_fix() {
        let (tx, source) = ChannelSource::new(8);
        let feed = LocationFeed::spawn(source, FALLBACK);
        let mut latest = feed.subscribe();
        let mut stream = feed.fixes();
        assert_eq!(stream.start(), FALLBACK);

        let fixes = [
            Coordinate::new(9.9300, 78.1250),
            Coordinate::new(9.9350, 78.1300),
            Coordinate::new(9.9400, 78.1350),
        ];
        for fix in fixes {
            tx.send(fix).await.unwrap();
        }

        let mut seen = Vec::new();
        for _ in 0..fixes.len() {
            seen.push(stream.next().await.unwrap());
        }
        assert_eq!(seen, fixes);

        // The watch receiver only keeps the newest
        latest.changed().await.unwrap();
        assert_eq!(*latest.borrow_and_update(), fixes[2]);
        assert!(!latest.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fix_stream_waits_for_slow_reader() {
        let (tx, source) = ChannelSource::new(8);
        let feed = LocationFeed::spawn_with_config(
            source,
            FeedConfig::new(FALLBACK).with_stream_buffer(1),
        );
        let mut stream = feed.fixes();

        let fixes = [
            Coordinate::new(9.931, 78.121),
            Coordinate::new(9.932, 78.122),
            Coordinate::new(9.933, 78.123),
        ];
        for fix in fixes {
            tx.send(fix).await.unwrap();
        }
        tokio::time::sleep(TICK).await;

        for fix in fixes {
            assert_eq!(stream.next().await, Some(fix));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_ends_fix_streams() {
        let (_tx, source) = ChannelSource::new(1);
        let feed = LocationFeed::spawn(source, FALLBACK);
        let mut stream = feed.fixes();

        feed.cancel();
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_the_feed() {
        let (_tx, source) = ChannelSource::new(1);
        let feed = LocationFeed::spawn(source, FALLBACK);
        feed.cancel();

        tokio::time::sleep(TICK).await;
        assert!(feed.is_finished());
        // The last value stays readable
        assert_eq!(feed.latest(), FALLBACK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_walk_reaches_destination() {
        let destination = Coordinate::new(9.9300, 78.1250);
        // 0.78 km at 36 km/h is about 78 s
        let mut walk = SimulatedWalk::new(FALLBACK, destination, 36.0, Duration::from_secs(10));

        assert_eq!(walk.next_fix().await.unwrap(), FALLBACK);

        let mut last = distance_km(&FALLBACK, &destination);
        for _ in 0..7 {
            let fix = walk.next_fix().await.unwrap();
            let remaining = distance_km(&fix, &destination);
            assert!(remaining < last);
            last = remaining;
        }

        let mut fix = walk.next_fix().await.unwrap();
        for _ in 0..2 {
            fix = walk.next_fix().await.unwrap();
        }
        assert_eq!(fix, destination);
    }
}

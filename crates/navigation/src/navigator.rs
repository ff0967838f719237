//! Navigator runtime.
//!
//! One task owns the [`NavigationSession`] and the [`FacilityIndex`]. It
//! reacts to three inputs:
//!
//! ```text
//!   location fixes (mpsc) ──┐
//!   commands (mpsc) ────────┼──► navigator task ──► snapshots (watch)
//!   route results (mpsc) ───┘         │
//!                                     └──► route fetch task (one at a time)
//! ```
//!
//! Fixes arrive on a [`FixStream`], so every one of them reaches the
//! session even when several land between two wakeups.
//! Route fetches run in their own task so a slow routing service never holds
//! up location processing. Selecting a new target aborts the previous fetch,
//! and the session's request id discards anything that still slips through.
//! After every change a fresh [`NavigatorSnapshot`] is published, so readers
//! never see a half-applied update.

use crate::error::{NavigationError, Result};
use crate::feed::FixStream;
use crate::route::{RouteProvider, RoutePath, RouteSource};
use crate::session::{
    NavigationSession, RequestId, SessionState, Transition, DEFAULT_ARRIVAL_THRESHOLD_KM,
};
use chrono::{DateTime, Utc};
use pulsepoint_geo::{AnnotatedFacility, Coordinate, Facility, FacilityIndex};
use pulsepoint_telemetry::{metrics, Event};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Navigator settings
#[derive(Debug, Clone, Copy)]
pub struct NavigatorConfig {
    /// Distance below which the target counts as reached
    pub arrival_threshold_km: f64,
    /// Capacity of the command queue
    pub command_buffer: usize,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            arrival_threshold_km: DEFAULT_ARRIVAL_THRESHOLD_KM,
            command_buffer: 32,
        }
    }
}

/// Consistent view of the navigator after one update.
#[derive(Debug, Clone)]
pub struct NavigatorSnapshot {
    /// Position the facilities were annotated against
    pub observer: Coordinate,
    /// Facilities sorted by distance from `observer`
    pub facilities: Arc<[AnnotatedFacility]>,
    /// Navigation state after this update
    pub session: SessionState,
    /// Arrivals since the navigator started
    pub arrivals: u64,
    /// When the snapshot was published
    pub updated_at: DateTime<Utc>,
}

enum Command {
    SelectTarget(Facility),
    SelectByName {
        query: String,
        reply: oneshot::Sender<Option<AnnotatedFacility>>,
    },
    Stop,
    Reset,
    PushFix(Coordinate),
    ReplaceFacilities(Vec<Facility>),
}

/// Entry point for starting a navigator.
pub struct Navigator;

impl Navigator {
    /// Start the navigator task.
    ///
    /// The task runs until every [`NavigatorHandle`] has been dropped. If
    /// the feed ends, the navigator keeps running on the last fix and on
    /// fixes pushed through the handle.
    pub fn spawn<S: RouteSource>(
        config: NavigatorConfig,
        facilities: Vec<Facility>,
        provider: RouteProvider<S>,
        fixes: FixStream,
    ) -> NavigatorHandle {
        let observer = fixes.start();
        let mut index = FacilityIndex::new(facilities);
        index.refresh(observer);
        let session = NavigationSession::new(config.arrival_threshold_km);

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(NavigatorSnapshot {
            observer,
            facilities: index.view(),
            session: session.state().clone(),
            arrivals: 0,
            updated_at: Utc::now(),
        }));
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let (route_tx, route_rx) = mpsc::unbounded_channel();

        let actor = Actor {
            session,
            index,
            provider,
            observer,
            arrivals: 0,
            snapshot_tx,
            route_tx,
            pending: None,
        };
        tokio::spawn(actor.run(command_rx, route_rx, fixes));

        NavigatorHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        }
    }
}

struct Actor<S> {
    session: NavigationSession,
    index: FacilityIndex,
    provider: RouteProvider<S>,
    observer: Coordinate,
    arrivals: u64,
    snapshot_tx: watch::Sender<Arc<NavigatorSnapshot>>,
    route_tx: mpsc::UnboundedSender<(RequestId, RoutePath)>,
    pending: Option<JoinHandle<()>>,
}

impl<S: RouteSource> Actor<S> {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut routes: mpsc::UnboundedReceiver<(RequestId, RoutePath)>,
        fixes: FixStream,
    ) {
        let mut feed = Some(fixes);
        debug!(facilities = self.index.len(), "Navigator started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                fix = next_fix(&mut feed) => match fix {
                    Some(fix) => self.on_fix(fix),
                    None => {
                        warn!("Location feed closed, keeping last fix");
                        feed = None;
                        continue;
                    }
                },
                Some((id, path)) = routes.recv() => self.on_route(id, path),
            }
            self.publish();
        }

        if let Some(task) = self.pending.take() {
            task.abort();
        }
        debug!("Navigator stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SelectTarget(facility) => self.select(facility),
            Command::SelectByName { query, reply } => {
                let hit = self.index.find(&query);
                match &hit {
                    Some(annotated) => self.select(annotated.facility.clone()),
                    None => info!(query = %query, "No facility matches"),
                }
                let _ = reply.send(hit);
            }
            Command::Stop => {
                self.cancel_pending();
                self.session.stop();
            }
            Command::Reset => {
                self.cancel_pending();
                self.session.reset();
            }
            Command::PushFix(fix) => self.on_fix(fix),
            Command::ReplaceFacilities(facilities) => {
                debug!(count = facilities.len(), "Replacing facilities");
                self.index.replace_facilities(facilities);
            }
        }
    }

    fn select(&mut self, facility: Facility) {
        self.cancel_pending();
        let request = self.session.select_target(facility, self.observer);

        let provider = self.provider.clone();
        let results = self.route_tx.clone();
        self.pending = Some(tokio::spawn(async move {
            let path = provider.fetch_route(request.origin, request.destination).await;
            // Receiver gone means the navigator stopped
            let _ = results.send((request.id, path));
        }));
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    fn on_fix(&mut self, fix: Coordinate) {
        self.observer = fix;
        self.index.refresh(fix);

        if let Transition::Arrived {
            distance_to_target_km,
        } = self.session.location_update(fix)
        {
            self.arrivals += 1;
            metrics().increment("navigation.arrivals");
            Event::new(
                "navigation.arrived",
                serde_json::json!({
                    "facility": self.session.target().map(|f| f.id.as_str()),
                    "distance_km": distance_to_target_km,
                    "arrivals": self.arrivals,
                }),
            )
            .log();
        }
    }

    fn on_route(&mut self, id: RequestId, path: RoutePath) {
        if self.session.route_ready(id, path) != Transition::Discarded {
            self.pending = None;
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(Arc::new(NavigatorSnapshot {
            observer: self.observer,
            facilities: self.index.view(),
            session: self.session.state().clone(),
            arrivals: self.arrivals,
            updated_at: Utc::now(),
        }));
    }
}

async fn next_fix(feed: &mut Option<FixStream>) -> Option<Coordinate> {
    match feed {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

/// Control and observation handle for a running navigator.
#[derive(Debug, Clone)]
pub struct NavigatorHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Arc<NavigatorSnapshot>>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectTarget(facility) => write!(f, "SelectTarget({})", facility.id),
            Self::SelectByName { query, .. } => write!(f, "SelectByName({query})"),
            Self::Stop => f.write_str("Stop"),
            Self::Reset => f.write_str("Reset"),
            Self::PushFix(fix) => write!(f, "PushFix({fix})"),
            Self::ReplaceFacilities(facilities) => {
                write!(f, "ReplaceFacilities({})", facilities.len())
            }
        }
    }
}

impl NavigatorHandle {
    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| NavigationError::SessionClosed)
    }

    /// Start navigating to `facility`.
    pub async fn select_target(&self, facility: Facility) -> Result<()> {
        self.send(Command::SelectTarget(facility)).await
    }

    /// Navigate to the nearest facility whose name contains `query`.
    ///
    /// Returns the chosen facility, or `None` (and changes nothing) when
    /// nothing matches.
    pub async fn select_by_name(&self, query: impl Into<String>) -> Result<Option<AnnotatedFacility>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::SelectByName {
            query: query.into(),
            reply,
        })
        .await?;
        response.await.map_err(|_| NavigationError::SessionClosed)
    }

    /// End the trip, keeping the target selected.
    pub async fn stop(&self) -> Result<()> {
        self.send(Command::Stop).await
    }

    /// Clear the session entirely.
    pub async fn reset(&self) -> Result<()> {
        self.send(Command::Reset).await
    }

    /// Feed a fix directly, bypassing the location feed.
    pub async fn push_fix(&self, fix: Coordinate) -> Result<()> {
        let fix = Coordinate::validated(fix.latitude, fix.longitude)?;
        self.send(Command::PushFix(fix)).await
    }

    /// Swap the known facility set.
    pub async fn replace_facilities(&self, facilities: Vec<Facility>) -> Result<()> {
        self.send(Command::ReplaceFacilities(facilities)).await
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> Arc<NavigatorSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<NavigatorSnapshot>> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&NavigatorSnapshot) -> bool,
    ) -> Result<Arc<NavigatorSnapshot>> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| NavigationError::SessionClosed)?;
        Ok(Arc::clone(&snapshot))
    }
}

//! Navigation session state machine.
//!
//! ```text
//!            select_target              route_ready(id)          fix < threshold
//!   Idle ─────────────────► Routing ─────────────────► Active ─────────────────► Arrived
//!    ▲                        │  ▲                       │                          │
//!    └──── stop / reset ──────┘  └──── select_target ────┴──────────────────────────┘
//! ```
//!
//! The machine is synchronous and owns no I/O. Route fetches are requested by
//! returning a [`RouteRequest`]; the caller performs the fetch and feeds the
//! result back through [`NavigationSession::route_ready`] with the same
//! [`RequestId`]. Results for any other id are discarded, which is how a
//! newer selection or a stop wins over an in-flight fetch.

use crate::route::RoutePath;
use pulsepoint_geo::{distance_km, Coordinate, Facility};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Default arrival threshold, about 50 m.
pub const DEFAULT_ARRIVAL_THRESHOLD_KM: f64 = 0.05;

/// Identity of one route fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route-{}", self.0)
    }
}

/// A route fetch the caller must perform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteRequest {
    /// Identifies the answer that may complete this request
    pub id: RequestId,
    /// Observer position when the target was selected
    pub origin: Coordinate,
    /// The target facility's coordinate
    pub destination: Coordinate,
}

/// Where the session is, with the data each state owns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// No trip. `selected` survives a stop so the trip can be resumed.
    Idle { selected: Option<Facility> },
    /// Waiting for a route
    Routing {
        target: Facility,
        request: RouteRequest,
    },
    /// Travelling toward the target
    Active {
        target: Facility,
        path: RoutePath,
        distance_to_target_km: f64,
    },
    /// Within the arrival threshold at least once
    Arrived {
        target: Facility,
        path: RoutePath,
        distance_to_target_km: f64,
    },
}

impl SessionState {
    /// Short state name for logs and display.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle { .. } => "idle",
            Self::Routing { .. } => "routing",
            Self::Active { .. } => "active",
            Self::Arrived { .. } => "arrived",
        }
    }
}

/// Outcome of feeding an event to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Routing → Active
    RouteAccepted { distance_to_target_km: f64 },
    /// A route result for a request that is no longer current
    Discarded,
    /// Distance to target updated, state unchanged
    Progress { distance_to_target_km: f64 },
    /// Active → Arrived; fires once per trip
    Arrived { distance_to_target_km: f64 },
    /// Only the observer position was recorded
    ObserverMoved,
    /// Trip ended, target kept as the selection
    Stopped,
    /// Everything cleared
    Reset,
    /// Event does not apply in the current state
    Ignored,
}

/// One navigation session.
#[derive(Debug, Clone)]
pub struct NavigationSession {
    state: SessionState,
    arrival_threshold_km: f64,
    observer: Option<Coordinate>,
    next_request: u64,
}

impl Default for NavigationSession {
    fn default() -> Self {
        Self::new(DEFAULT_ARRIVAL_THRESHOLD_KM)
    }
}

impl NavigationSession {
    pub fn new(arrival_threshold_km: f64) -> Self {
        Self {
            state: SessionState::Idle { selected: None },
            arrival_threshold_km,
            observer: None,
            next_request: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn arrival_threshold_km(&self) -> f64 {
        self.arrival_threshold_km
    }

    /// Last position seen by [`location_update`](Self::location_update).
    pub fn observer(&self) -> Option<Coordinate> {
        self.observer
    }

    /// Current target, or the kept selection when idle.
    pub fn target(&self) -> Option<&Facility> {
        match &self.state {
            SessionState::Idle { selected } => selected.as_ref(),
            SessionState::Routing { target, .. }
            | SessionState::Active { target, .. }
            | SessionState::Arrived { target, .. } => Some(target),
        }
    }

    pub fn path(&self) -> Option<&RoutePath> {
        match &self.state {
            SessionState::Active { path, .. } | SessionState::Arrived { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn distance_to_target_km(&self) -> Option<f64> {
        match &self.state {
            SessionState::Active {
                distance_to_target_km,
                ..
            }
            | SessionState::Arrived {
                distance_to_target_km,
                ..
            } => Some(*distance_to_target_km),
            _ => None,
        }
    }

    /// The request whose result is still wanted, if any.
    pub fn pending_request(&self) -> Option<RequestId> {
        match &self.state {
            SessionState::Routing { request, .. } => Some(request.id),
            _ => None,
        }
    }

    /// Start a trip to `facility` from `origin`, superseding any current one.
    pub fn select_target(&mut self, facility: Facility, origin: Coordinate) -> RouteRequest {
        self.next_request += 1;
        let request = RouteRequest {
            id: RequestId(self.next_request),
            origin,
            destination: facility.coordinate,
        };

        info!(
            facility_id = %facility.id,
            request = %request.id,
            from = self.state.name(),
            "Target selected"
        );
        self.state = SessionState::Routing {
            target: facility,
            request,
        };
        request
    }

    /// Accept the route for `id` if it is still the pending request.
    pub fn route_ready(&mut self, id: RequestId, path: RoutePath) -> Transition {
        let (target, request) = match &self.state {
            SessionState::Routing { target, request } if request.id == id => {
                (target.clone(), *request)
            }
            _ => {
                debug!(request = %id, state = self.state.name(), "Discarding stale route");
                return Transition::Discarded;
            }
        };

        let from = self.observer.unwrap_or(request.origin);
        let distance = distance_km(&from, &target.coordinate);
        info!(
            facility_id = %target.id,
            request = %id,
            fallback = path.is_fallback(),
            distance_km = distance,
            "Navigation active"
        );

        self.state = SessionState::Active {
            target,
            path,
            distance_to_target_km: distance,
        };
        Transition::RouteAccepted {
            distance_to_target_km: distance,
        }
    }

    /// Record a new observer fix.
    pub fn location_update(&mut self, location: Coordinate) -> Transition {
        self.observer = Some(location);
        let threshold = self.arrival_threshold_km;

        match &mut self.state {
            SessionState::Active {
                target,
                path,
                distance_to_target_km,
            } => {
                let distance = distance_km(&location, &target.coordinate);
                if distance < threshold {
                    info!(facility_id = %target.id, distance_km = distance, "Arrived");
                    self.state = SessionState::Arrived {
                        target: target.clone(),
                        path: path.clone(),
                        distance_to_target_km: distance,
                    };
                    Transition::Arrived {
                        distance_to_target_km: distance,
                    }
                } else {
                    *distance_to_target_km = distance;
                    Transition::Progress {
                        distance_to_target_km: distance,
                    }
                }
            }
            SessionState::Arrived {
                target,
                distance_to_target_km,
                ..
            } => {
                let distance = distance_km(&location, &target.coordinate);
                *distance_to_target_km = distance;
                Transition::Progress {
                    distance_to_target_km: distance,
                }
            }
            SessionState::Idle { .. } | SessionState::Routing { .. } => Transition::ObserverMoved,
        }
    }

    /// End the trip but keep the target selected.
    pub fn stop(&mut self) -> Transition {
        let target = match &self.state {
            SessionState::Idle { .. } => return Transition::Ignored,
            SessionState::Routing { target, .. }
            | SessionState::Active { target, .. }
            | SessionState::Arrived { target, .. } => target.clone(),
        };

        info!(facility_id = %target.id, from = self.state.name(), "Navigation stopped");
        self.state = SessionState::Idle {
            selected: Some(target),
        };
        Transition::Stopped
    }

    /// Clear everything, including the selection.
    pub fn reset(&mut self) -> Transition {
        debug!(from = self.state.name(), "Session reset");
        self.state = SessionState::Idle { selected: None };
        Transition::Reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const START: Coordinate = Coordinate::new(9.9252, 78.1198);

    fn hospital() -> Facility {
        Facility::new("h1", "Apollo Speciality Hospital", Coordinate::new(9.9300, 78.1250))
    }

    fn clinic() -> Facility {
        Facility::new("h2", "Meenakshi Mission Hospital", Coordinate::new(9.9490, 78.1600))
    }

    fn active_session() -> NavigationSession {
        let mut session = NavigationSession::default();
        let request = session.select_target(hospital(), START);
        session.route_ready(request.id, RoutePath::straight_line(START, hospital().coordinate));
        session
    }

    #[test]
    fn test_select_then_route_ready() {
        let mut session = NavigationSession::default();
        let request = session.select_target(hospital(), START);

        assert_eq!(session.state().name(), "routing");
        assert_eq!(request.destination, hospital().coordinate);
        assert_eq!(session.pending_request(), Some(request.id));

        let transition =
            session.route_ready(request.id, RoutePath::straight_line(START, request.destination));
        match transition {
            Transition::RouteAccepted {
                distance_to_target_km,
            } => assert!((distance_to_target_km - 0.78).abs() < 0.05),
            other => panic!("unexpected transition {other:?}"),
        }
        assert_eq!(session.state().name(), "active");
        assert!(session.path().is_some());
    }

    #[test]
    fn test_latest_selection_wins() {
        let mut session = NavigationSession::default();
        let first = session.select_target(hospital(), START);
        let second = session.select_target(clinic(), START);
        assert_ne!(first.id, second.id);

        let late = session.route_ready(first.id, RoutePath::straight_line(START, first.destination));
        assert_eq!(late, Transition::Discarded);
        assert_eq!(session.state().name(), "routing");

        session.route_ready(second.id, RoutePath::straight_line(START, second.destination));
        assert_eq!(session.target().map(|f| f.id.as_str()), Some("h2"));
        assert_eq!(session.state().name(), "active");
    }

    #[test]
    fn test_stop_during_routing_discards_late_route() {
        let mut session = NavigationSession::default();
        let request = session.select_target(hospital(), START);

        assert_eq!(session.stop(), Transition::Stopped);
        assert_eq!(
            session.state(),
            &SessionState::Idle {
                selected: Some(hospital())
            }
        );

        let late = session.route_ready(request.id, RoutePath::straight_line(START, request.destination));
        assert_eq!(late, Transition::Discarded);
        assert_eq!(session.state().name(), "idle");
    }

    #[test]
    fn test_reset_during_routing_clears_everything() {
        let mut session = NavigationSession::default();
        let request = session.select_target(hospital(), START);

        assert_eq!(session.reset(), Transition::Reset);
        assert!(session.target().is_none());
        assert_eq!(
            session.route_ready(request.id, RoutePath::straight_line(START, request.destination)),
            Transition::Discarded
        );
    }

    #[test]
    fn test_stop_when_idle_is_ignored() {
        let mut session = NavigationSession::default();
        assert_eq!(session.stop(), Transition::Ignored);
    }

    #[test]
    fn test_location_while_routing_only_moves_observer() {
        let mut session = NavigationSession::default();
        session.select_target(hospital(), START);

        let moved = Coordinate::new(9.9260, 78.1205);
        assert_eq!(session.location_update(moved), Transition::ObserverMoved);
        assert_eq!(session.observer(), Some(moved));
        assert!(session.distance_to_target_km().is_none());
    }

    #[test]
    fn test_route_ready_uses_latest_observer() {
        let mut session = NavigationSession::default();
        let request = session.select_target(hospital(), START);
        // Walk right up to the entrance while the route is loading
        session.location_update(Coordinate::new(9.93, 78.1251));

        session.route_ready(request.id, RoutePath::straight_line(START, request.destination));
        assert!(session.distance_to_target_km().unwrap() < 0.05);
    }

    #[test]
    fn test_arrival_fires_once() {
        let mut session = active_session();
        let target = hospital().coordinate;

        let approach = [
            Coordinate::new(9.9280, 78.1230),
            target,
            Coordinate::new(9.9300, 78.1251),
            Coordinate::new(9.9350, 78.1300),
            target,
        ];

        let arrivals = approach
            .iter()
            .map(|fix| session.location_update(*fix))
            .filter(|t| matches!(t, Transition::Arrived { .. }))
            .count();

        assert_eq!(arrivals, 1);
        assert_eq!(session.state().name(), "arrived");
    }

    #[test]
    fn test_arrived_keeps_tracking_distance() {
        let mut session = active_session();
        session.location_update(hospital().coordinate);

        let away = Coordinate::new(9.9350, 78.1300);
        session.location_update(away);
        let distance = session.distance_to_target_km().unwrap();
        assert!((distance - distance_km(&away, &hospital().coordinate)).abs() < 1e-12);
    }

    #[test]
    fn test_reset_rearms_arrival() {
        let mut session = active_session();
        assert!(matches!(
            session.location_update(hospital().coordinate),
            Transition::Arrived { .. }
        ));

        session.reset();
        let request = session.select_target(hospital(), START);
        session.route_ready(request.id, RoutePath::straight_line(START, request.destination));

        assert!(matches!(
            session.location_update(hospital().coordinate),
            Transition::Arrived { .. }
        ));
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut session = NavigationSession::new(0.0);
        let request = session.select_target(hospital(), START);
        session.route_ready(request.id, RoutePath::straight_line(START, request.destination));

        // Zero threshold can never be undercut
        assert!(matches!(
            session.location_update(hospital().coordinate),
            Transition::Progress { .. }
        ));
    }

    proptest! {
        #[test]
        fn prop_arrival_fires_at_most_once(
            fixes in prop::collection::vec((9.925f64..9.935, 78.119f64..78.131), 1..60)
        ) {
            let mut session = active_session();
            let arrivals = fixes
                .into_iter()
                .map(|(lat, lng)| session.location_update(Coordinate::new(lat, lng)))
                .filter(|t| matches!(t, Transition::Arrived { .. }))
                .count();
            prop_assert!(arrivals <= 1);
        }
    }
}

//! Selection state
//! Tracks the selected service and origin, the active map and the latest
//! destination summary. Older in-flight summaries are superseded.

use crate::api::{query_destinations, ApiError, DestinationSource, OriginSummary};
use crate::catalog::normalize_code;
use crate::colors::{AssignmentSession, ZoneColorResolver};
use crate::legend::{build_legend, LegendEntry};
use crate::router::{is_international_service, map_type_for_service, MapType, RouteMatch, ServiceDescriptor};
use tokio_util::sync::CancellationToken;

/// One summary request handed out by [`SelectionState::begin_summary`]
#[derive(Debug, Clone)]
pub struct SummaryTicket {
    pub origin: String,
    pub service: String,
    pub token: CancellationToken,
}

#[derive(Debug)]
pub struct SelectionState {
    services: Vec<ServiceDescriptor>,
    service_code: Option<String>,
    origin: Option<String>,
    origin_name: Option<String>,
    map_mode: MapType,
    /// An international service is selected but no origin yet; the world
    /// or europe map opens once one is picked on the iberia map
    pending_world_view: bool,
    session: AssignmentSession,
    summary_error: Option<String>,
    loading: bool,
    in_flight: Option<CancellationToken>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SelectionState {
    pub fn new(services: Vec<ServiceDescriptor>) -> Self {
        Self {
            services,
            service_code: None,
            origin: None,
            origin_name: None,
            map_mode: MapType::Iberia,
            pending_world_view: false,
            session: AssignmentSession::default(),
            summary_error: None,
            loading: false,
            in_flight: None,
        }
    }

    pub fn service_code(&self) -> Option<&str> {
        self.service_code.as_deref()
    }

    /// Catalog entry for the selected code, if the catalog lists it
    pub fn selected_service(&self) -> Option<&ServiceDescriptor> {
        let code = self.service_code.as_deref()?;
        self.services.iter().find(|s| s.has_code(code))
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn origin_name(&self) -> Option<&str> {
        self.origin_name.as_deref()
    }

    pub fn map_mode(&self) -> MapType {
        self.map_mode
    }

    pub fn pending_world_view(&self) -> bool {
        self.pending_world_view
    }

    pub fn is_international(&self) -> bool {
        is_international_service(self.service_code.as_deref())
    }

    pub fn session(&self) -> &AssignmentSession {
        &self.session
    }

    pub fn summary_error(&self) -> Option<&str> {
        self.summary_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Routing decision for the selected service. Codes missing from the
    /// catalog are routed on the code alone.
    pub fn route(&self) -> RouteMatch {
        let descriptor = self.service_code.as_deref().map(|code| {
            self.selected_service()
                .cloned()
                .unwrap_or_else(|| ServiceDescriptor::new(code, ""))
        });
        map_type_for_service(descriptor.as_ref())
    }

    fn routed_map(&self) -> MapType {
        self.route().map_type
    }

    /// Selects a service (or clears it with `None`) and recomputes the map mode
    pub fn select_service(&mut self, code: Option<&str>) {
        self.cancel_in_flight();
        self.service_code = normalize_code(code);
        self.session = AssignmentSession::default();
        self.summary_error = None;

        match self.routed_map() {
            MapType::Iberia => {
                self.map_mode = MapType::Iberia;
                self.pending_world_view = false;
            }
            international if self.origin.is_some() => {
                self.map_mode = international;
                self.pending_world_view = false;
            }
            _ => {
                self.map_mode = MapType::Iberia;
                self.pending_world_view = true;
            }
        }
        tracing::debug!(
            "Service {:?} -> map {} (pending world view: {})",
            self.service_code,
            self.map_mode,
            self.pending_world_view
        );
    }

    /// Selects an origin zone (or clears it with `None`). A `name` of
    /// `None` keeps the current origin name.
    pub fn select_origin(&mut self, zone_id: Option<&str>, name: Option<&str>) {
        self.cancel_in_flight();
        self.origin = normalize_code(zone_id);
        if let Some(name) = name {
            self.origin_name = Some(name.to_string());
        }

        if self.origin.is_none() {
            self.origin_name = None;
            self.session = AssignmentSession::default();
            self.summary_error = None;
            self.loading = false;
            self.map_mode = MapType::Iberia;
            self.pending_world_view = self.service_code.is_some() && self.routed_map() != MapType::Iberia;
            return;
        }

        self.route_for_origin();
    }

    /// Map mode once an origin is known: the international maps open
    /// directly, the iberia one keeps any pending world view
    fn route_for_origin(&mut self) {
        match self.routed_map() {
            MapType::Iberia => self.map_mode = MapType::Iberia,
            international => {
                self.map_mode = international;
                self.pending_world_view = false;
            }
        }
    }

    /// Clears every selection
    pub fn reset(&mut self) {
        self.cancel_in_flight();
        self.service_code = None;
        self.origin = None;
        self.origin_name = None;
        self.map_mode = MapType::Iberia;
        self.pending_world_view = false;
        self.session = AssignmentSession::default();
        self.summary_error = None;
        self.loading = false;
    }

    /// Back to the iberia map without touching the selection
    pub fn go_to_iberia(&mut self) {
        self.map_mode = MapType::Iberia;
        self.pending_world_view = false;
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    /// Starts a summary query for the current selection, cancelling any
    /// query still in flight. Returns `None` (and clears the destination
    /// set) when origin or service is missing.
    pub fn begin_summary(&mut self) -> Option<SummaryTicket> {
        self.cancel_in_flight();

        let (Some(origin), Some(service)) = (self.origin.clone(), self.service_code.clone()) else {
            self.session = AssignmentSession::default();
            self.summary_error = None;
            self.loading = false;
            return None;
        };

        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());
        self.loading = true;
        self.summary_error = None;
        Some(SummaryTicket { origin, service, token })
    }

    /// Applies the outcome of a summary query. Results of superseded
    /// tickets are dropped; returns whether the state changed.
    ///
    /// An origin code echoed back by the API replaces the selected one and
    /// the map mode is recomputed as if that origin had been selected. No
    /// new query is started for it.
    pub fn apply_summary(&mut self, ticket: &SummaryTicket, result: Result<OriginSummary, ApiError>) -> bool {
        if ticket.token.is_cancelled() {
            tracing::debug!("Dropping superseded summary for {} / {}", ticket.origin, ticket.service);
            return false;
        }

        match result {
            Err(ApiError::Cancelled) => return false,
            Ok(summary) => {
                if let Some(info) = summary.origin {
                    let echoed = normalize_code(info.origin_zone_code.as_deref());
                    if let Some(code) = echoed.filter(|code| self.origin.as_deref() != Some(code.as_str())) {
                        tracing::debug!("API resolved origin {} as {}", ticket.origin, code);
                        self.origin = Some(code);
                        self.route_for_origin();
                    }
                    if info.origin_zone_name.is_some() {
                        self.origin_name = info.origin_zone_name;
                    }
                }
                tracing::info!(
                    "Loaded {} destinations for {} / {}",
                    summary.destinations.len(),
                    ticket.origin,
                    ticket.service
                );
                self.session = AssignmentSession::new(summary.destinations);
                self.summary_error = None;
            }
            Err(e) => {
                tracing::warn!("Failed to load origin summary: {}", e);
                self.session = AssignmentSession::default();
                self.summary_error = Some(e.to_string());
            }
        }

        self.loading = false;
        self.in_flight = None;
        true
    }

    /// Begins, runs and applies a summary query in one go
    pub async fn refresh_summary<S: DestinationSource>(&mut self, source: &S) -> bool {
        let Some(ticket) = self.begin_summary() else {
            return false;
        };
        let result = query_destinations(source, &ticket.origin, &ticket.service, &ticket.token).await;
        self.apply_summary(&ticket, result)
    }

    /// Color resolver over the current selection and destination set
    pub fn resolver(&self) -> ZoneColorResolver<'_> {
        ZoneColorResolver::new(self.origin.as_deref(), self.service_code.is_some(), &self.session)
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        build_legend(&self.session)
    }
}

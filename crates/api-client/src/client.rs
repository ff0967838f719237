//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::{FacilitiesApi, RoutingApi};
use crate::error::{ApiError, ApiResult};
use pulsepoint_core::retry::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// The remote services the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Facility REST backend
    Backend,
    /// OSRM compatible routing service
    Routing,
}

/// PulsePoint API client with built-in resilience patterns
///
/// This client wraps `reqwest` and adds:
/// - Automatic retry with exponential backoff
/// - One circuit breaker per remote service
/// - Request correlation IDs for tracing
#[derive(Clone)]
pub struct PulsePointClient {
    inner: Client,
    config: Arc<ClientConfig>,
    backend_breaker: Arc<CircuitBreaker>,
    routing_breaker: Arc<CircuitBreaker>,
}

impl PulsePointClient {
    /// Create a new client with default configuration from environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("pulsepoint-api-client/", env!("CARGO_PKG_VERSION"))),
        );

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
            backend_breaker: Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default())),
            routing_breaker: Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
                failure_threshold: 3,
                ..CircuitBreakerConfig::default()
            })),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get circuit breaker state for a service
    #[must_use]
    pub fn circuit_state(&self, service: Service) -> CircuitState {
        self.breaker(service).state()
    }

    /// Reset the circuit breaker for a service
    pub fn reset_circuit(&self, service: Service) {
        self.breaker(service).reset();
    }

    fn breaker(&self, service: Service) -> &CircuitBreaker {
        match service {
            Service::Backend => &self.backend_breaker,
            Service::Routing => &self.routing_breaker,
        }
    }

    fn retry_config(&self, service: Service) -> &RetryConfig {
        match service {
            Service::Backend => &self.config.retry,
            Service::Routing => &self.config.routing_retry,
        }
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access facility endpoints
    #[must_use]
    pub fn facilities(&self) -> FacilitiesApi {
        FacilitiesApi::new(self.clone())
    }

    /// Access routing endpoints
    #[must_use]
    pub fn routing(&self) -> RoutingApi {
        RoutingApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Low-level HTTP methods with resilience
    // -------------------------------------------------------------------------

    /// Perform a GET request to an absolute URL with resilience patterns
    #[instrument(skip(self, query))]
    pub async fn get_url<T: DeserializeOwned>(
        &self,
        service: Service,
        url: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let request_id = Uuid::new_v4().to_string();

        if !self.breaker(service).can_execute() {
            warn!(
                request_id = %request_id,
                url = %url,
                "Circuit breaker is open, rejecting request"
            );
            return Err(ApiError::CircuitOpen);
        }

        self.execute_with_retry(&request_id, service, url, query)
            .await
    }

    /// Execute request with retry logic
    async fn execute_with_retry<T: DeserializeOwned>(
        &self,
        request_id: &str,
        service: Service,
        url: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let retry_config = self.retry_config(service);
        let breaker = self.breaker(service);
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..retry_config.max_attempts {
            // Wait before retry (except first attempt)
            if attempt > 0 {
                let delay = retry_config.delay_for_attempt(attempt);
                debug!(
                    request_id = %request_id,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            let result = self
                .execute_single_request(request_id, service, url, query)
                .await;
            let elapsed = start.elapsed();

            match result {
                Ok(value) => {
                    breaker.record_success();
                    debug!(
                        request_id = %request_id,
                        attempt = attempt + 1,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Request succeeded"
                    );
                    return Ok(value);
                }
                Err(e) => {
                    breaker.record_failure();

                    if e.is_retryable() && attempt + 1 < retry_config.max_attempts {
                        debug!(
                            request_id = %request_id,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, will retry"
                        );
                        last_error = Some(e);
                    } else {
                        debug!(
                            request_id = %request_id,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, not retrying"
                        );
                        return Err(e);
                    }
                }
            }
        }

        Err(ApiError::RetriesExhausted {
            attempts: retry_config.max_attempts,
            last_error: last_error.map_or_else(|| "Unknown error".to_string(), |e| e.to_string()),
        })
    }

    /// Execute a single request without retry
    async fn execute_single_request<T: DeserializeOwned>(
        &self,
        request_id: &str,
        service: Service,
        url: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let mut request = self
            .inner
            .get(url)
            .header(X_REQUEST_ID, request_id)
            .query(query);

        if service == Service::Routing {
            request = request.timeout(self.config.routing_timeout);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Handle HTTP response and deserialize
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(ApiError::Request)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(ApiError::api_response(status.as_u16(), message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = ClientConfig::development();
        let client = PulsePointClient::with_config(config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let config = ClientConfig::default().with_routing_url("not a url");
        assert!(PulsePointClient::with_config(config).is_err());
    }

    #[test]
    fn test_breakers_are_independent() {
        let client = PulsePointClient::with_config(ClientConfig::default()).unwrap();

        for _ in 0..3 {
            client.breaker(Service::Routing).record_failure();
        }

        assert_eq!(client.circuit_state(Service::Routing), CircuitState::Open);
        assert_eq!(client.circuit_state(Service::Backend), CircuitState::Closed);

        client.reset_circuit(Service::Routing);
        assert_eq!(client.circuit_state(Service::Routing), CircuitState::Closed);
    }

    #[test]
    fn test_open_circuit_rejects_without_network() {
        let client = PulsePointClient::with_config(ClientConfig::default()).unwrap();
        for _ in 0..3 {
            client.breaker(Service::Routing).record_failure();
        }

        let result: ApiResult<serde_json::Value> = tokio_test::block_on(client.get_url(
            Service::Routing,
            "https://router.invalid/route",
            &[],
        ));
        assert!(matches!(result, Err(ApiError::CircuitOpen)));
    }
}

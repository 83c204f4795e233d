//! Core library for the `weather-poller` runner.
//!
//! This crate defines:
//! - Configuration handling
//! - The bearer token store and the authentication client
//! - An HTTP client that refreshes the token on `401` and retries transport failures
//! - The weather API provider and the startup city-list validation
//! - The fixed-interval polling scheduler and its persistence sinks
//!
//! It is used by `weather-poller`, but can also be embedded by other binaries.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod provider;
pub mod scheduler;
pub mod sink;
pub mod token;
pub mod validate;

pub use auth::{Authenticator, Credentials, HttpAuthenticator};
pub use config::{Config, OutputConfig, WeatherApiConfig};
pub use error::{AuthFailure, Error, Result, ValidationError};
pub use http::{RetryPolicy, RetryingHttpClient};
pub use model::{CityName, PollCycle, WeatherObservation, WeatherReport};
pub use provider::{ApiWeatherProvider, WeatherProvider, connect, provider_from_config};
pub use scheduler::{CycleReport, MIN_PERIOD, PollingScheduler, SchedulerHandle, SchedulerState};
pub use sink::{JsonLinesSink, MemorySink, ObservationSink};
pub use token::{BearerToken, TokenStore};
pub use validate::{CityValidation, validate_city_list};

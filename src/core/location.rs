//! Best-effort location resolution for check-ins/outs.
//!
//! Resolution never blocks a record from being written: callers turn any
//! failure into "no location".

use crate::config::{LocationConfig, LocationMode};
use crate::errors::AppError;
use crate::models::location::{Location, format_coordinates};
use serde::Deserialize;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Accuracy radius reported for IP-based fixes, in meters.
pub const IP_ACCURACY_M: f64 = 10_000.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("location is disabled")]
    Disabled,

    #[error("location request timed out")]
    Timeout,

    #[error("location lookup failed: {0}")]
    Lookup(String),

    #[error("location is not configured: {0}")]
    NotConfigured(String),
}

impl From<LocationError> for AppError {
    fn from(e: LocationError) -> Self {
        AppError::Location(e.to_string())
    }
}

pub trait LocationResolver: Send + Sync {
    fn resolve(&self) -> impl Future<Output = Result<Location, LocationError>> + Send;
}

/// Always fails with [`LocationError::Disabled`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Disabled;

impl LocationResolver for Disabled {
    async fn resolve(&self) -> Result<Location, LocationError> {
        Err(LocationError::Disabled)
    }
}

/// Coordinates taken from the configuration file.
#[derive(Debug, Clone)]
pub struct FixedResolver {
    location: Location,
}

impl FixedResolver {
    pub fn new(latitude: f64, longitude: f64, label: Option<&str>) -> Self {
        let mut location = Location::from_coordinates(latitude, longitude, 0.0, "config");
        if let Some(label) = label.filter(|l| !l.trim().is_empty()) {
            location.label = label.to_string();
            location.full_label = format!("{} ({})", label, location.full_label);
        }
        Self { location }
    }
}

impl LocationResolver for FixedResolver {
    async fn resolve(&self) -> Result<Location, LocationError> {
        Ok(self.location.clone())
    }
}

/// Response of a JSON IP-geolocation service. Field names differ between
/// providers, hence the aliases.
#[derive(Debug, Deserialize)]
struct IpLookup {
    #[serde(alias = "lat")]
    latitude: Option<f64>,
    #[serde(alias = "lon", alias = "lng")]
    longitude: Option<f64>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default, alias = "regionName")]
    region: Option<String>,
    #[serde(default, alias = "country_name")]
    country: Option<String>,
}

/// Coarse location from the public IP address.
#[derive(Clone)]
pub struct IpResolver {
    client: reqwest::Client,
    url: String,
}

impl IpResolver {
    pub fn new(url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            url: url.to_string(),
        }
    }
}

impl LocationResolver for IpResolver {
    async fn resolve(&self) -> Result<Location, LocationError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LocationError::Lookup(e.to_string()))?
            .error_for_status()
            .map_err(|e| LocationError::Lookup(e.to_string()))?;

        let lookup: IpLookup = resp
            .json()
            .await
            .map_err(|e| LocationError::Lookup(e.to_string()))?;

        let (Some(lat), Some(lng)) = (lookup.latitude, lookup.longitude) else {
            return Err(LocationError::Lookup("response has no coordinates".into()));
        };

        let mut location = Location::from_coordinates(lat, lng, IP_ACCURACY_M, "ip");
        let parts: Vec<String> = [lookup.city, lookup.region, lookup.country]
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect();

        if let Some(city) = parts.first() {
            location.label = city.clone();
            location.full_label = parts.join(", ");
        }

        Ok(location)
    }
}

/// Resolver selected by configuration.
pub enum AnyResolver {
    Disabled(Disabled),
    Fixed(FixedResolver),
    Ip(IpResolver),
}

impl AnyResolver {
    pub fn from_config(cfg: &LocationConfig) -> Result<Self, LocationError> {
        match cfg.mode {
            LocationMode::None => Ok(AnyResolver::Disabled(Disabled)),
            LocationMode::Fixed => match (cfg.latitude, cfg.longitude) {
                (Some(lat), Some(lng)) => Ok(AnyResolver::Fixed(FixedResolver::new(
                    lat,
                    lng,
                    cfg.label.as_deref(),
                ))),
                _ => Err(LocationError::NotConfigured(
                    "fixed mode requires latitude and longitude".into(),
                )),
            },
            LocationMode::Ip => Ok(AnyResolver::Ip(IpResolver::new(
                &cfg.ip_lookup_url,
                Duration::from_millis(cfg.timeout_ms),
            ))),
        }
    }
}

impl LocationResolver for AnyResolver {
    async fn resolve(&self) -> Result<Location, LocationError> {
        match self {
            AnyResolver::Disabled(r) => r.resolve().await,
            AnyResolver::Fixed(r) => r.resolve().await,
            AnyResolver::Ip(r) => r.resolve().await,
        }
    }
}

/// Races the inner resolver against a timeout and falls back to the last
/// location it produced (or was seeded with).
pub struct BoundedResolver<R> {
    inner: R,
    timeout: Duration,
    last_known: Mutex<Option<Location>>,
}

impl<R: LocationResolver> BoundedResolver<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            last_known: Mutex::new(None),
        }
    }

    pub fn seed(&self, location: Location) {
        if let Ok(mut slot) = self.last_known.lock() {
            *slot = Some(location);
        }
    }

    pub fn last_known(&self) -> Option<Location> {
        self.last_known.lock().ok().and_then(|slot| slot.clone())
    }
}

impl<R: LocationResolver> LocationResolver for BoundedResolver<R> {
    async fn resolve(&self) -> Result<Location, LocationError> {
        let err = match tokio::time::timeout(self.timeout, self.inner.resolve()).await {
            Ok(Ok(mut location)) => {
                if location.label.trim().is_empty() {
                    location.label = format_coordinates(location.latitude, location.longitude);
                }
                self.seed(location.clone());
                return Ok(location);
            }
            Ok(Err(e)) => e,
            Err(_) => LocationError::Timeout,
        };

        if err == LocationError::Disabled {
            return Err(err);
        }

        match self.last_known() {
            Some(cached) => {
                warn!(error = %err, "using last known location");
                Ok(cached)
            }
            None => {
                debug!(error = %err, "no location available");
                Err(err)
            }
        }
    }
}

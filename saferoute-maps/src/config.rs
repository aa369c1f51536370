//! Configuration-driven provider assembly.
//!
//! A provider entry without credentials is simply absent from the fallback
//! list; nothing is ever half-initialized.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use saferoute_core::RoutingProvider;
use serde::Deserialize;
use thiserror::Error;

use crate::orchestrator::MapsOrchestrator;
use crate::providers::{
    MapboxConfig, MapboxProvider, OrsConfig, OrsProvider, OsrmConfig, OsrmProvider,
    ProviderBuildError,
};

fn default_order() -> Vec<String> {
    vec![
        "mapbox".to_owned(),
        "osrm".to_owned(),
        "openrouteservice".to_owned(),
    ]
}

fn default_timeout_secs() -> u64 {
    10
}

/// Mapbox credentials and endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MapboxSettings {
    /// API access token.
    pub access_token: String,
    /// Optional base URL override.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Self-hosted OSRM endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OsrmSettings {
    /// Base URL of the OSRM instance.
    pub base_url: String,
}

/// OpenRouteService credentials and endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OrsSettings {
    /// API key.
    pub api_key: String,
    /// Optional base URL override.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Deployment configuration for the maps orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// Fallback order; unconfigured names are skipped.
    #[serde(default = "default_order")]
    pub order: Vec<String>,
    /// Fire all providers concurrently per leg instead of falling back.
    /// Increases cost to paid providers; never the default.
    #[serde(default)]
    pub race: bool,
    /// Per-provider-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Mapbox settings; absent means the provider is disabled.
    #[serde(default)]
    pub mapbox: Option<MapboxSettings>,
    /// OSRM settings; absent means the provider is disabled.
    #[serde(default)]
    pub osrm: Option<OsrmSettings>,
    /// OpenRouteService settings; absent means the provider is disabled.
    #[serde(default)]
    pub openrouteservice: Option<OrsSettings>,
}

/// Errors raised while assembling the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorBuildError {
    /// The fallback order names a provider this build does not know.
    #[error("unknown provider {name} in fallback order")]
    UnknownProvider {
        /// The unrecognized name.
        name: String,
    },
    /// Every entry in the fallback order was unconfigured.
    #[error("no routing providers are configured")]
    NoProviders,
    /// A configured provider failed to initialize.
    #[error("failed to initialize provider {name}")]
    Provider {
        /// Provider being built.
        name: String,
        /// Construction failure.
        #[source]
        source: ProviderBuildError,
    },
}

impl ProvidersConfig {
    /// Assemble the orchestrator from this configuration.
    ///
    /// # Errors
    /// Returns [`OrchestratorBuildError`] for unknown provider names, an
    /// entirely unconfigured list, or a provider that fails to build.
    pub fn build(&self) -> Result<MapsOrchestrator, OrchestratorBuildError> {
        let timeout = Duration::from_secs(self.timeout_secs);
        let mut providers: Vec<Arc<dyn RoutingProvider>> = Vec::new();

        for name in &self.order {
            match name.as_str() {
                "mapbox" => {
                    let Some(settings) = &self.mapbox else {
                        info!("provider mapbox not configured; skipping");
                        continue;
                    };
                    let mut config =
                        MapboxConfig::new(settings.access_token.clone()).with_timeout(timeout);
                    if let Some(base_url) = &settings.base_url {
                        config = config.with_base_url(base_url.clone());
                    }
                    let provider =
                        MapboxProvider::new(config).map_err(|source| {
                            OrchestratorBuildError::Provider {
                                name: name.clone(),
                                source,
                            }
                        })?;
                    providers.push(Arc::new(provider));
                }
                "osrm" => {
                    let Some(settings) = &self.osrm else {
                        info!("provider osrm not configured; skipping");
                        continue;
                    };
                    let config =
                        OsrmConfig::new(settings.base_url.clone()).with_timeout(timeout);
                    let provider =
                        OsrmProvider::new(config).map_err(|source| {
                            OrchestratorBuildError::Provider {
                                name: name.clone(),
                                source,
                            }
                        })?;
                    providers.push(Arc::new(provider));
                }
                "openrouteservice" => {
                    let Some(settings) = &self.openrouteservice else {
                        info!("provider openrouteservice not configured; skipping");
                        continue;
                    };
                    let mut config =
                        OrsConfig::new(settings.api_key.clone()).with_timeout(timeout);
                    if let Some(base_url) = &settings.base_url {
                        config = config.with_base_url(base_url.clone());
                    }
                    let provider =
                        OrsProvider::new(config).map_err(|source| {
                            OrchestratorBuildError::Provider {
                                name: name.clone(),
                                source,
                            }
                        })?;
                    providers.push(Arc::new(provider));
                }
                unknown => {
                    return Err(OrchestratorBuildError::UnknownProvider {
                        name: unknown.to_owned(),
                    });
                }
            }
        }

        if providers.is_empty() {
            return Err(OrchestratorBuildError::NoProviders);
        }
        info!(
            "maps orchestrator assembled with providers {:?} (race: {})",
            providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            self.race
        );
        Ok(MapsOrchestrator::new(providers).with_race(self.race))
    }
}

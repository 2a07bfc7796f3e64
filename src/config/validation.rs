//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, addresses parse)
//! - Reject malformed route tables in every policy layer
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ManagerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::BTreeMap;
use std::net::SocketAddr;

use crate::config::schema::ManagerConfig;
use crate::routing::address::normalize_address;
use crate::routing::policy::DEFAULT_ROUTE;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field} '{value}'")]
    InvalidSocketAddress { field: &'static str, value: String },

    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("no routes defined in [policy]")]
    NoRoutes,

    #[error("{layer}: invalid route key '{key}'")]
    InvalidRouteKey { layer: String, key: String },

    #[error("{layer}: route '{key}' has no destinations")]
    EmptyDestinations { layer: String, key: String },

    #[error("{layer}: route '{key}' has invalid destination '{dest}'")]
    InvalidDestination {
        layer: String,
        key: String,
        dest: String,
    },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ManagerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidSocketAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidSocketAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration("health_check.interval_secs"));
    }
    if config.health_check.probe_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("health_check.probe_timeout_secs"));
    }
    if config.timeouts.read_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.read_secs"));
    }

    if config.policy.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }
    check_routes("policy", &config.policy.routes, &mut errors);
    for (name, layer) in &config.groups {
        check_routes(&format!("groups.{}", name), &layer.routes, &mut errors);
    }
    for (name, layer) in &config.users {
        check_routes(&format!("users.{}", name), &layer.routes, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_routes(layer: &str, routes: &BTreeMap<String, Vec<String>>, errors: &mut Vec<ValidationError>) {
    for (key, dests) in routes {
        if key != DEFAULT_ROUTE && normalize_address(key).is_err() {
            errors.push(ValidationError::InvalidRouteKey {
                layer: layer.to_string(),
                key: key.clone(),
            });
        }
        if dests.is_empty() {
            errors.push(ValidationError::EmptyDestinations {
                layer: layer.to_string(),
                key: key.clone(),
            });
        }
        for dest in dests {
            if normalize_address(dest).is_err() {
                errors.push(ValidationError::InvalidDestination {
                    layer: layer.to_string(),
                    key: key.clone(),
                    dest: dest.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LayerConfig;

    fn valid_config() -> ManagerConfig {
        let mut config = ManagerConfig::default();
        config
            .policy
            .routes
            .insert("default".into(), vec!["h1:22".into()]);
        config
    }

    #[test]
    fn default_with_route_is_valid() {
        assert_eq!(validate_config(&valid_config()), Ok(()));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = valid_config();
        config.listener.bind_address = "not-an-address".into();
        config.health_check.interval_secs = 0;
        config.policy.routes.insert("bad host:22".into(), vec![]);

        let mut group = LayerConfig::default();
        group.routes.insert("default".into(), vec!["h2:99999".into()]);
        config.groups.insert("ops".into(), group);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::ZeroDuration("health_check.interval_secs")));
        assert!(errors.contains(&ValidationError::InvalidDestination {
            layer: "groups.ops".into(),
            key: "default".into(),
            dest: "h2:99999".into(),
        }));
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = valid_config();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}

//! Layered routing policy resolution.
//!
//! # Responsibilities
//! - Hold the global, per-group and per-user policy layers
//! - Fold them into one effective algorithm + candidate list per request
//!
//! # Design Decisions
//! - Layer order: global, then matching groups sorted by name, then the user
//! - Later layers replace earlier values wholesale (no list merging)
//! - Within a layer, an exact target match beats the `default` entry
//! - Tables are normalized once at construction, never per request

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::{LayerConfig, ManagerConfig};
use crate::routing::address::{normalize_address, AddressError};
use crate::routing::select::Algorithm;

/// Route key matching any target without an exact entry.
pub const DEFAULT_ROUTE: &str = "default";

/// Result of folding every applicable layer for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePolicy {
    pub algorithm: Algorithm,
    pub candidates: Vec<String>,
}

/// One normalized policy layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyLayer {
    algorithm: Option<Algorithm>,
    routes: HashMap<String, Vec<String>>,
}

impl PolicyLayer {
    /// Build a layer, normalizing every route key and destination.
    pub fn new(
        algorithm: Option<Algorithm>,
        routes: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self, AddressError> {
        let mut normalized = HashMap::with_capacity(routes.len());
        for (key, dests) in routes {
            let key = if key == DEFAULT_ROUTE {
                key.clone()
            } else {
                normalize_address(key)?
            };
            let dests = dests
                .iter()
                .map(|d| normalize_address(d))
                .collect::<Result<Vec<_>, _>>()?;
            normalized.insert(key, dests);
        }
        Ok(Self {
            algorithm,
            routes: normalized,
        })
    }

    fn lookup(&self, target: &str) -> Option<&Vec<String>> {
        self.routes
            .get(target)
            .or_else(|| self.routes.get(DEFAULT_ROUTE))
    }
}

/// Global, group and user layers.
#[derive(Debug, Clone, Default)]
pub struct PolicyResolver {
    global: PolicyLayer,
    groups: BTreeMap<String, PolicyLayer>,
    users: HashMap<String, PolicyLayer>,
}

impl PolicyResolver {
    pub fn new(
        global: PolicyLayer,
        groups: BTreeMap<String, PolicyLayer>,
        users: HashMap<String, PolicyLayer>,
    ) -> Self {
        Self {
            global,
            groups,
            users,
        }
    }

    pub fn from_config(config: &ManagerConfig) -> Result<Self, AddressError> {
        let global = PolicyLayer::new(Some(config.policy.route_select), &config.policy.routes)?;
        let build = |layer: &LayerConfig| PolicyLayer::new(layer.route_select, &layer.routes);

        let groups = config
            .groups
            .iter()
            .map(|(name, layer)| Ok((name.clone(), build(layer)?)))
            .collect::<Result<BTreeMap<_, _>, AddressError>>()?;
        let users = config
            .users
            .iter()
            .map(|(name, layer)| Ok((name.clone(), build(layer)?)))
            .collect::<Result<HashMap<_, _>, AddressError>>()?;

        Ok(Self::new(global, groups, users))
    }

    /// Fold the layers that apply to `user` for `target`.
    ///
    /// `target` must already be normalized. Groups are applied in name order,
    /// so a user in several configured groups always gets the same result.
    pub fn resolve(&self, user: &str, target: &str, member_of: &BTreeSet<String>) -> EffectivePolicy {
        let mut policy = EffectivePolicy {
            algorithm: self.global.algorithm.unwrap_or_default(),
            candidates: Vec::new(),
        };

        let group_layers = member_of.iter().filter_map(|g| self.groups.get(g));
        let layers = std::iter::once(&self.global)
            .chain(group_layers)
            .chain(self.users.get(user));

        for layer in layers {
            if let Some(algorithm) = layer.algorithm {
                policy.algorithm = algorithm;
            }
            if let Some(candidates) = layer.lookup(target) {
                policy.candidates = candidates.clone();
            }
        }
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(algorithm: Option<Algorithm>, routes: &[(&str, &[&str])]) -> PolicyLayer {
        let routes = routes
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect();
        PolicyLayer::new(algorithm, &routes).unwrap()
    }

    fn member_of(groups: &[&str]) -> BTreeSet<String> {
        groups.iter().map(|g| g.to_string()).collect()
    }

    #[test]
    fn group_replaces_global_candidates() {
        let resolver = PolicyResolver::new(
            layer(Some(Algorithm::Ordered), &[("default", &["h1", "h2"])]),
            BTreeMap::from([("g".to_string(), layer(None, &[("default", &["h3"])]))]),
            HashMap::new(),
        );

        let policy = resolver.resolve("alice", "svc:22", &member_of(&["g"]));
        assert_eq!(policy.candidates, vec!["h3:22"]);
        assert_eq!(policy.algorithm, Algorithm::Ordered);

        let policy = resolver.resolve("bob", "svc:22", &member_of(&["other"]));
        assert_eq!(policy.candidates, vec!["h1:22", "h2:22"]);
    }

    #[test]
    fn exact_target_beats_default() {
        let resolver = PolicyResolver::new(
            layer(None, &[("default", &["h1"]), ("db1:5432", &["db-primary:5432"])]),
            BTreeMap::new(),
            HashMap::new(),
        );
        let policy = resolver.resolve("alice", "db1:5432", &BTreeSet::new());
        assert_eq!(policy.candidates, vec!["db-primary:5432"]);
        assert_eq!(policy.algorithm, Algorithm::Ordered);

        let policy = resolver.resolve("alice", "web:22", &BTreeSet::new());
        assert_eq!(policy.candidates, vec!["h1:22"]);
    }

    #[test]
    fn user_layer_wins_and_algorithm_overrides_independently() {
        let resolver = PolicyResolver::new(
            layer(Some(Algorithm::Ordered), &[("default", &["h1"])]),
            BTreeMap::from([(
                "g".to_string(),
                layer(Some(Algorithm::Random), &[("default", &["h2"])]),
            )]),
            HashMap::from([("alice".to_string(), layer(None, &[("default", &["h9"])]))]),
        );
        let policy = resolver.resolve("alice", "svc:22", &member_of(&["g"]));
        assert_eq!(policy.candidates, vec!["h9:22"]);
        assert_eq!(policy.algorithm, Algorithm::Random);
    }

    #[test]
    fn layer_without_matching_route_keeps_previous() {
        let resolver = PolicyResolver::new(
            layer(None, &[("default", &["h1"])]),
            BTreeMap::from([("g".to_string(), layer(None, &[("other:22", &["h5"])]))]),
            HashMap::new(),
        );
        let policy = resolver.resolve("alice", "svc:22", &member_of(&["g"]));
        assert_eq!(policy.candidates, vec!["h1:22"]);
    }

    #[test]
    fn multiple_groups_fold_in_name_order() {
        let resolver = PolicyResolver::new(
            layer(None, &[("default", &["h1"])]),
            BTreeMap::from([
                ("zeta".to_string(), layer(None, &[("default", &["z1"])])),
                ("alpha".to_string(), layer(None, &[("default", &["a1"])])),
            ]),
            HashMap::new(),
        );
        for _ in 0..10 {
            let policy = resolver.resolve("alice", "svc:22", &member_of(&["zeta", "alpha"]));
            assert_eq!(policy.candidates, vec!["z1:22"]);
        }
    }

    #[test]
    fn from_config_normalizes_tables() {
        let config = crate::config::parse_config(
            "[policy.routes]\ndefault = [\"H1\"]\n\"DB1:5432\" = [\"db-primary:5432\"]\n",
        )
        .unwrap();
        let resolver = PolicyResolver::from_config(&config).unwrap();
        let policy = resolver.resolve("u", "db1:5432", &BTreeSet::new());
        assert_eq!(policy.candidates, vec!["db-primary:5432"]);
        let policy = resolver.resolve("u", "x:22", &BTreeSet::new());
        assert_eq!(policy.candidates, vec!["h1:22"]);
    }
}

// Endpoint registries
//
// A `Registry` is a named, ordered table of endpoints for one device
// subsystem. Variants for optional hardware are derived from a base table
// with `extend`, which replaces members by name and appends new ones.
// A `RegistrySet` combines the registries that match one installation and
// guarantees that every sensor ID resolves to exactly one endpoint.

pub mod builtin;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::endpoint::Endpoint;
use crate::error::Error;

pub use builtin::Circuit;

// ── Registry ─────────────────────────────────────────────────────────

/// A named, immutable collection of endpoints keyed by member name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    name: &'static str,
    members: IndexMap<&'static str, Endpoint>,
}

impl Registry {
    /// Build a registry from `(member, endpoint)` pairs in declaration order.
    pub fn new<I>(name: &'static str, members: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Endpoint)>,
    {
        Self {
            name,
            members: members.into_iter().collect(),
        }
    }

    /// Derive a specialised registry from this one.
    ///
    /// Each override replaces the base member of the same name at its
    /// original position; additions are appended. Overriding a member the
    /// base does not have, or adding one it already has, is rejected so a
    /// typo cannot silently produce a second endpoint.
    pub fn extend<O, A>(&self, name: &'static str, overrides: O, additions: A) -> Result<Self, Error>
    where
        O: IntoIterator<Item = (&'static str, Endpoint)>,
        A: IntoIterator<Item = (&'static str, Endpoint)>,
    {
        let mut members = self.members.clone();
        for (member, endpoint) in overrides {
            let Some(slot) = members.get_mut(member) else {
                return Err(Error::configuration(format!(
                    "{name} overrides unknown member {member} of {}",
                    self.name
                )));
            };
            *slot = endpoint;
        }
        for (member, endpoint) in additions {
            if members.insert(member, endpoint).is_some() {
                return Err(Error::configuration(format!(
                    "{name} adds member {member} already defined by {}",
                    self.name
                )));
            }
        }
        Ok(Self { name, members })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Each logical endpoint once, most specific definition, declaration order.
    pub fn iterate_endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.members.values()
    }

    /// `(member, endpoint)` pairs in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (&'static str, &Endpoint)> {
        self.members.iter().map(|(member, endpoint)| (*member, endpoint))
    }

    /// Look up an endpoint by member name.
    pub fn get(&self, member: &str) -> Option<&Endpoint> {
        self.members.get(member)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn sensor_endpoint_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.members.values().map(|endpoint| endpoint.sensor_endpoint_id)
    }

    pub fn get_endpoint_by_sensor_id(&self, sensor_endpoint_id: &str) -> Option<&Endpoint> {
        self.members
            .values()
            .find(|endpoint| endpoint.sensor_endpoint_id == sensor_endpoint_id)
    }
}

// ── RegistrySet ──────────────────────────────────────────────────────

/// A validated, immutable composition of registries.
#[derive(Debug)]
pub struct RegistrySet {
    registries: Vec<Registry>,
    by_sensor_id: OnceLock<HashMap<&'static str, Endpoint>>,
}

impl RegistrySet {
    /// Compose registries, rejecting duplicates and sensor-ID collisions.
    pub fn new<I>(registries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Registry>,
    {
        let registries: Vec<Registry> = registries.into_iter().collect();

        // Names identify members for lookup, so they must be unique as well.
        for (i, registry) in registries.iter().enumerate() {
            let Some(earlier) = registries[..i].iter().find(|r| r.name == registry.name) else {
                continue;
            };
            let message = if earlier == registry {
                format!("Multiple of the same registry: {}", registry.name)
            } else {
                format!("Different registries share the name {}", registry.name)
            };
            return Err(Error::configuration(message));
        }

        let mut owners: HashMap<&'static str, &'static str> = HashMap::new();
        for registry in &registries {
            for id in registry.sensor_endpoint_ids() {
                match owners.entry(id) {
                    Entry::Occupied(owner) => {
                        return Err(Error::configuration(format!(
                            "Conflicting endpoint IDs between {} and {}: {id}",
                            owner.get(),
                            registry.name
                        )));
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(registry.name);
                    }
                }
            }
        }

        Ok(Self {
            registries,
            by_sensor_id: OnceLock::new(),
        })
    }

    /// Member registries in composition order.
    pub fn registries(&self) -> &[Registry] {
        &self.registries
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registries.iter().any(|r| r.name == name)
    }

    /// Every endpoint of every member registry.
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.registries.iter().flat_map(Registry::iterate_endpoints)
    }

    /// Every sensor wire ID, in registry then declaration order.
    pub fn sensor_endpoint_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.registries.iter().flat_map(Registry::sensor_endpoint_ids)
    }

    /// O(1) reverse lookup over a map built on first use.
    pub fn get_endpoint_by_sensor_id(&self, sensor_endpoint_id: &str) -> Option<&Endpoint> {
        self.by_sensor_id
            .get_or_init(|| {
                self.endpoints()
                    .map(|endpoint| (endpoint.sensor_endpoint_id, *endpoint))
                    .collect()
            })
            .get(sensor_endpoint_id)
    }

    /// Find an endpoint by its semantic name.
    pub fn find_by_name(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints().find(|endpoint| endpoint.name == name)
    }

    pub fn len(&self) -> usize {
        self.registries.iter().map(Registry::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for RegistrySet {
    fn eq(&self, other: &Self) -> bool {
        self.registries == other.registries
    }
}

impl Eq for RegistrySet {}

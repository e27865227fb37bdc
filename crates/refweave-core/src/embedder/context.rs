//! Per-call embedding state
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

use crate::canonical::sort_keys;
use crate::error::Result;
use crate::naming::NameAllocator;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::trace;

/// Unique name to embedded schema
///
/// Iteration and serialization are in key order; the order in which
/// definitions were first inserted is kept separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionsMap {
    entries: BTreeMap<String, Value>,
    insertion_order: Vec<String>,
}

impl DefinitionsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a definition
    pub fn insert(&mut self, name: impl Into<String>, schema: Value) {
        let name = name.into();
        if !self.entries.contains_key(&name) {
            self.insertion_order.push(name.clone());
        }
        self.entries.insert(name, schema);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definitions in key order
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    /// Names in the order they were first inserted
    pub fn insertion_order(&self) -> &[String] {
        &self.insertion_order
    }

    /// Convert into a JSON object with sorted keys
    pub fn into_map(self) -> Map<String, Value> {
        sort_keys(self.entries.into_iter().collect())
    }
}

impl Serialize for DefinitionsMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl IntoIterator for DefinitionsMap {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a DefinitionsMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Where an external document ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedResource {
    /// Definition name holding the document root
    pub name: String,
    /// The document's own definitions, by local key, to their shared names
    pub local_names: BTreeMap<String, String>,
}

/// Where a `$ref` inside a document's own definition points
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RefTarget {
    /// Another definition of the same document, by local key
    Definition(String),
    /// A target independent of the owning document, e.g. a resolved identity
    Fixed(String),
    /// Some other part of the owning document
    Document,
}

/// A hoisted definition other documents may share
#[derive(Debug, Clone)]
struct HoistedDefinition {
    name: String,
    owner: String,
    content: Value,
}

/// An existing definition a local key could share, and the names its
/// internal refs need the document's other keys to share as well
#[derive(Debug, Clone)]
struct ShareCandidate {
    name: String,
    requires: Vec<(String, String)>,
}

/// A definition whose content still has to be traversed
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingDefinition {
    pub name: String,
    pub identity: String,
}

/// State for one embedding call: identity to name, definitions, worklist
#[derive(Debug)]
pub struct EmbeddingContext {
    resources: HashMap<String, EmbeddedResource>,
    definitions: DefinitionsMap,
    // local key -> every definition hoisted under that key
    hoisted: HashMap<String, Vec<HoistedDefinition>>,
    allocator: NameAllocator,
    worklist: VecDeque<PendingDefinition>,
}

impl EmbeddingContext {
    pub fn new(max_name_suffix: usize) -> Self {
        Self {
            resources: HashMap::new(),
            definitions: DefinitionsMap::new(),
            hoisted: HashMap::new(),
            allocator: NameAllocator::new(max_name_suffix),
            worklist: VecDeque::new(),
        }
    }

    /// Keep a name out of allocation, e.g. an existing definition
    pub fn reserve_name(&mut self, name: impl Into<String>) {
        self.allocator.reserve(name);
    }

    pub fn resource(&self, identity: &str) -> Option<&EmbeddedResource> {
        self.resources.get(identity)
    }

    /// Identity to assigned name, sorted by identity
    pub fn assigned_names(&self) -> BTreeMap<String, String> {
        self.resources
            .iter()
            .map(|(identity, resource)| (identity.clone(), resource.name.clone()))
            .collect()
    }

    pub fn definitions(&self) -> &DefinitionsMap {
        &self.definitions
    }

    pub fn into_definitions(self) -> DefinitionsMap {
        self.definitions
    }

    /// Allocate and reserve the name for a newly seen identity
    ///
    /// From here on every ref to `identity` resolves to the returned name,
    /// even while its document is still being loaded or traversed.
    pub(crate) fn reserve_resource(&mut self, identity: &str, base_name: &str) -> Result<String> {
        let name = self.allocator.allocate(base_name, identity)?;
        self.resources.insert(
            identity.to_string(),
            EmbeddedResource {
                name: name.clone(),
                local_names: BTreeMap::new(),
            },
        );
        trace!(identity, name = %name, "Reserved definition name");
        Ok(name)
    }

    /// Store a loaded document root and queue it for traversal
    pub(crate) fn store_document(&mut self, identity: &str, name: &str, content: Value) {
        self.definitions.insert(name, content);
        self.worklist.push_back(PendingDefinition {
            name: name.to_string(),
            identity: identity.to_string(),
        });
    }

    /// Flatten a loaded document's own definitions into the shared map
    ///
    /// A key shares an existing hoisted definition when the raw content is
    /// identical and every `$ref` in it lands on the same target, as told by
    /// `target(owner, raw_ref)`. Refs into the document itself never match,
    /// refs to sibling definitions match only when those siblings share too.
    /// Remaining keys keep their own name when free and are disambiguated
    /// otherwise, in key order.
    pub(crate) fn hoist<F>(
        &mut self,
        identity: &str,
        local: Map<String, Value>,
        target: F,
    ) -> Result<()>
    where
        F: Fn(&str, &str) -> RefTarget,
    {
        let local = sort_keys(local);
        let keys: BTreeSet<String> = local.keys().cloned().collect();

        let viable: BTreeMap<String, Vec<ShareCandidate>> = local
            .iter()
            .map(|(key, content)| {
                let candidates = self.share_candidates(identity, key, content, &keys, &target);
                (key.clone(), candidates)
            })
            .filter(|(_, candidates)| !candidates.is_empty())
            .collect();
        let shared = resolve_sharing(viable);

        let mut local_names = BTreeMap::new();
        for (key, content) in local {
            let name = match shared.get(&key) {
                Some(name) => {
                    trace!(identity, key = %key, name = %name, "Sharing hoisted definition");
                    name.clone()
                }
                None => {
                    let name = self.allocator.allocate(&key, identity)?;
                    self.hoisted
                        .entry(key.clone())
                        .or_default()
                        .push(HoistedDefinition {
                            name: name.clone(),
                            owner: identity.to_string(),
                            content: content.clone(),
                        });
                    self.store_document(identity, &name, content);
                    name
                }
            };
            local_names.insert(key, name);
        }

        if let Some(resource) = self.resources.get_mut(identity) {
            resource.local_names = local_names;
        }
        Ok(())
    }

    fn share_candidates<F>(
        &self,
        identity: &str,
        key: &str,
        content: &Value,
        keys: &BTreeSet<String>,
        target: &F,
    ) -> Vec<ShareCandidate>
    where
        F: Fn(&str, &str) -> RefTarget,
    {
        let Some(hoisted) = self.hoisted.get(key) else {
            return Vec::new();
        };

        let mut refs = Vec::new();
        collect_refs(content, &mut refs);

        hoisted
            .iter()
            .filter(|definition| definition.content == *content)
            .filter_map(|definition| {
                let owner = self.resources.get(&definition.owner)?;
                let mut requires = Vec::new();
                for raw in &refs {
                    match (target(identity, raw), target(&definition.owner, raw)) {
                        (RefTarget::Fixed(here), RefTarget::Fixed(there)) if here == there => {}
                        (RefTarget::Definition(sibling), RefTarget::Definition(_))
                            if keys.contains(&sibling) =>
                        {
                            let name = owner.local_names.get(&sibling)?;
                            requires.push((sibling, name.clone()));
                        }
                        _ => return None,
                    }
                }
                Some(ShareCandidate {
                    name: definition.name.clone(),
                    requires,
                })
            })
            .collect()
    }

    pub(crate) fn next_pending(&mut self) -> Option<PendingDefinition> {
        self.worklist.pop_front()
    }

    /// Replace a queued definition with its traversed content
    pub(crate) fn complete(&mut self, name: &str, content: Value) {
        self.definitions.insert(name, content);
    }
}

/// Pick one shared name per key so that every pick's requirements hold
///
/// Candidates whose required sibling names are no longer on offer are
/// dropped until nothing changes; a first pick that still disagrees with
/// another key's first pick is dropped and the search repeats.
fn resolve_sharing(mut viable: BTreeMap<String, Vec<ShareCandidate>>) -> BTreeMap<String, String> {
    loop {
        loop {
            let offered: BTreeSet<(String, String)> = viable
                .iter()
                .flat_map(|(key, candidates)| {
                    candidates
                        .iter()
                        .map(move |candidate| (key.clone(), candidate.name.clone()))
                })
                .collect();

            let mut changed = false;
            for candidates in viable.values_mut() {
                let before = candidates.len();
                candidates.retain(|candidate| {
                    candidate
                        .requires
                        .iter()
                        .all(|requirement| offered.contains(requirement))
                });
                changed |= candidates.len() != before;
            }
            if !changed {
                break;
            }
        }

        let chosen: BTreeMap<String, String> = viable
            .iter()
            .filter_map(|(key, candidates)| {
                candidates
                    .first()
                    .map(|candidate| (key.clone(), candidate.name.clone()))
            })
            .collect();

        let conflict = viable.iter().find_map(|(key, candidates)| {
            let candidate = candidates.first()?;
            candidate
                .requires
                .iter()
                .any(|(sibling, name)| chosen.get(sibling) != Some(name))
                .then(|| key.clone())
        });

        match conflict {
            Some(key) => {
                if let Some(candidates) = viable.get_mut(&key) {
                    candidates.remove(0);
                }
            }
            None => return chosen,
        }
    }
}

fn collect_refs<'v>(value: &'v Value, refs: &mut Vec<&'v str>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match (key.as_str(), val) {
                    ("$ref", Value::String(raw)) => refs.push(raw),
                    _ => collect_refs(val, refs),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, refs)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definitions_map_orders() {
        let mut definitions = DefinitionsMap::new();
        definitions.insert("zebra", json!({}));
        definitions.insert("apple", json!({}));
        definitions.insert("zebra", json!({"type": "object"}));

        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions.insertion_order(), ["zebra", "apple"]);
        let keys: Vec<_> = definitions.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["apple", "zebra"]);
        assert_eq!(
            serde_json::to_string(&definitions).unwrap(),
            r#"{"apple":{},"zebra":{"type":"object"}}"#
        );
    }

    fn local_targets(_owner: &str, raw: &str) -> RefTarget {
        match raw.strip_prefix("#/definitions/") {
            Some(key) => RefTarget::Definition(key.to_string()),
            None => RefTarget::Document,
        }
    }

    fn definitions(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_reserved_resource_is_visible_before_storage() {
        let mut context = EmbeddingContext::new(100);
        let name = context.reserve_resource("car.json", "car").unwrap();
        assert_eq!(name, "car");
        assert_eq!(context.resource("car.json").unwrap().name, "car");
        assert!(context.definitions().is_empty());
    }

    #[test]
    fn test_hoist_shares_identical_definitions() {
        let mut context = EmbeddingContext::new(100);
        context.reserve_resource("a.json", "a").unwrap();
        context.reserve_resource("b.json", "b").unwrap();

        let engine = json!({"type": "object", "title": "Engine"});
        let other_engine = json!({"type": "string"});

        context
            .hoist("a.json", definitions(json!({"Engine": engine})), local_targets)
            .unwrap();
        context
            .hoist(
                "b.json",
                definitions(json!({"Engine": engine, "Wheel": {}})),
                local_targets,
            )
            .unwrap();
        context.reserve_resource("c.json", "c").unwrap();
        context
            .hoist("c.json", definitions(json!({"Engine": other_engine})), local_targets)
            .unwrap();

        assert_eq!(context.resource("b.json").unwrap().local_names["Engine"], "Engine");
        assert_eq!(context.resource("c.json").unwrap().local_names["Engine"], "Engine2");
        assert_eq!(context.definitions().len(), 3);
        assert_eq!(context.definitions().get("Engine2"), Some(&other_engine));
    }

    #[test]
    fn test_hoist_keeps_definitions_whose_siblings_differ() {
        let mut context = EmbeddingContext::new(100);
        context.reserve_resource("a.json", "a").unwrap();
        context.reserve_resource("b.json", "b").unwrap();

        let car = json!({"$ref": "#/definitions/Wheel"});
        context
            .hoist(
                "a.json",
                definitions(json!({"Car": car, "Wheel": {"description": "A wheel"}})),
                local_targets,
            )
            .unwrap();
        context
            .hoist(
                "b.json",
                definitions(json!({"Car": car, "Wheel": {"description": "B wheel"}})),
                local_targets,
            )
            .unwrap();

        let local_names = &context.resource("b.json").unwrap().local_names;
        assert_eq!(local_names["Car"], "Car2");
        assert_eq!(local_names["Wheel"], "Wheel2");
        assert_eq!(context.definitions().len(), 4);
    }

    #[test]
    fn test_hoist_shares_mutually_referencing_definitions() {
        let mut context = EmbeddingContext::new(100);
        context.reserve_resource("a.json", "a").unwrap();
        context.reserve_resource("b.json", "b").unwrap();

        let local = json!({
            "Car": {"properties": {"wheel": {"$ref": "#/definitions/Wheel"}}},
            "Wheel": {"properties": {"car": {"$ref": "#/definitions/Car"}}}
        });
        context.hoist("a.json", definitions(local.clone()), local_targets).unwrap();
        context.hoist("b.json", definitions(local), local_targets).unwrap();

        let local_names = &context.resource("b.json").unwrap().local_names;
        assert_eq!(local_names["Car"], "Car");
        assert_eq!(local_names["Wheel"], "Wheel");
        assert_eq!(context.definitions().len(), 2);
    }

    #[test]
    fn test_hoist_never_shares_refs_into_the_document() {
        let mut context = EmbeddingContext::new(100);
        context.reserve_resource("a.json", "a").unwrap();
        context.reserve_resource("b.json", "b").unwrap();

        let local = json!({"Engine": {"properties": {"car": {"$ref": "#"}}}});
        context.hoist("a.json", definitions(local.clone()), local_targets).unwrap();
        context.hoist("b.json", definitions(local), local_targets).unwrap();

        assert_eq!(context.resource("b.json").unwrap().local_names["Engine"], "Engine2");
        assert_eq!(context.definitions().len(), 2);
    }

    #[test]
    fn test_conflicting_requirements_fall_back_to_new_names() {
        let candidate = |name: &str, requires: &[(&str, &str)]| ShareCandidate {
            name: name.to_string(),
            requires: requires
                .iter()
                .map(|(key, name)| (key.to_string(), name.to_string()))
                .collect(),
        };
        let viable = BTreeMap::from([
            ("Car".to_string(), vec![candidate("Car", &[("Wheel", "Wheel")])]),
            ("Truck".to_string(), vec![candidate("Truck", &[("Wheel", "Wheel2")])]),
            (
                "Wheel".to_string(),
                vec![candidate("Wheel", &[]), candidate("Wheel2", &[])],
            ),
        ]);

        let shared = resolve_sharing(viable);

        assert_eq!(shared["Wheel"], "Wheel");
        assert_eq!(shared.get("Car").map(String::as_str), Some("Car"));
        assert_eq!(shared.get("Truck"), None);
    }
}

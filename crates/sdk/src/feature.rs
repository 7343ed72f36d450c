//! Permission features and their prerequisite graph.
//!
//! A feature may require other features. Requirements are grouped: a group
//! is satisfied when the user holds *any* of its members, and a feature's
//! requirements hold when *all* of its groups are satisfied.
//!
//! The graph is resolved once at plugin registration using Kahn's algorithm,
//! so unknown references and cycles are caught before any request is served.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One requirement group.
///
/// Serialized as a bare string for a single dependency, or as an array for
/// an any-of group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    /// Exactly this feature.
    Feature(String),
    /// At least one of these features.
    AnyOf(Vec<String>),
}

impl Requirement {
    pub fn feature(name: impl Into<String>) -> Self {
        Self::Feature(name.into())
    }

    pub fn any_of<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::AnyOf(names.into_iter().map(Into::into).collect())
    }

    /// Iterate over the features named by this group.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::Feature(name) => std::slice::from_ref(name),
            Self::AnyOf(names) => names,
        };
        slice.iter().map(String::as_str)
    }

    /// Check the group with a predicate telling whether a feature is held.
    ///
    /// An empty any-of group is never satisfied.
    pub fn is_satisfied_by(&self, holds: impl Fn(&str) -> bool) -> bool {
        self.members().any(holds)
    }

    /// Prefix every member with `scope/`.
    pub fn qualified(&self, scope: &str) -> Self {
        match self {
            Self::Feature(name) => Self::Feature(qualify(scope, name)),
            Self::AnyOf(names) => Self::AnyOf(names.iter().map(|n| qualify(scope, n)).collect()),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feature(name) => write!(f, "{name}"),
            Self::AnyOf(names) => write!(f, "any of [{}]", names.join(", ")),
        }
    }
}

/// Join a scope and a short name with `/`.
pub fn qualify(scope: &str, name: &str) -> String {
    format!("{scope}/{name}")
}

/// A named capability a user can be granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDefinition {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Requirement>,
}

impl FeatureDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            requires: Vec::new(),
        }
    }

    /// Append a requirement group.
    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requires.push(requirement);
        self
    }

    /// Qualify the feature name and all requirement members with `scope`.
    pub fn qualified(&self, scope: &str) -> Self {
        Self {
            name: qualify(scope, &self.name),
            description: self.description.clone(),
            requires: self.requires.iter().map(|r| r.qualified(scope)).collect(),
        }
    }
}

/// Errors found while building a [`FeatureGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureGraphError {
    #[error("feature '{0}' is declared more than once")]
    Duplicate(String),

    #[error("feature '{feature}' requires unknown feature '{requirement}'")]
    UnknownRequirement { feature: String, requirement: String },

    #[error("circular requirement detected involving features: {}", .0.join(", "))]
    Cycle(Vec<String>),
}

/// A granted set that violates the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrantError {
    #[error("feature '{0}' is not registered")]
    Unknown(String),

    #[error("feature '{feature}' requires {requirement}")]
    Unsatisfied {
        feature: String,
        requirement: Requirement,
    },
}

/// Resolved feature graph.
#[derive(Debug, Clone, Default)]
pub struct FeatureGraph {
    features: BTreeMap<String, FeatureDefinition>,
    order: Vec<String>,
}

impl FeatureGraph {
    /// Build and check a graph from fully qualified feature definitions.
    pub fn new<I>(definitions: I) -> Result<Self, FeatureGraphError>
    where
        I: IntoIterator<Item = FeatureDefinition>,
    {
        let mut features = BTreeMap::new();
        for def in definitions {
            if features.contains_key(&def.name) {
                return Err(FeatureGraphError::Duplicate(def.name));
            }
            features.insert(def.name.clone(), def);
        }

        // in_degree[f] = number of distinct features f depends on
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for name in features.keys() {
            in_degree.insert(name, 0);
        }

        for (name, def) in &features {
            let mut seen = HashSet::new();
            for requirement in &def.requires {
                for member in requirement.members() {
                    let Some((dep, _)) = features.get_key_value(member) else {
                        return Err(FeatureGraphError::UnknownRequirement {
                            feature: name.clone(),
                            requirement: member.to_string(),
                        });
                    };
                    if seen.insert(dep.as_str()) {
                        *in_degree.entry(name.as_str()).or_default() += 1;
                        dependents.entry(dep.as_str()).or_default().push(name);
                    }
                }
            }
        }

        // Kahn's algorithm; BTreeMap iteration keeps the order deterministic
        let mut queue: VecDeque<&str> = features
            .keys()
            .map(String::as_str)
            .filter(|name| in_degree.get(name) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(features.len());

        while let Some(feature) = queue.pop_front() {
            order.push(feature.to_string());
            for dependent in dependents.get(feature).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*dependent);
                    }
                }
            }
        }

        if order.len() != features.len() {
            let resolved: HashSet<&str> = order.iter().map(String::as_str).collect();
            let in_cycle = features
                .keys()
                .filter(|k| !resolved.contains(k.as_str()))
                .cloned()
                .collect();
            return Err(FeatureGraphError::Cycle(in_cycle));
        }

        Ok(Self { features, order })
    }

    /// Features ordered so that prerequisites come first.
    pub fn load_order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Check that every granted feature has its requirements granted too.
    ///
    /// Features are checked in load order so the first reported error is the
    /// most fundamental one.
    pub fn check_grant(&self, granted: &HashSet<String>) -> Result<(), GrantError> {
        let mut unknown: Vec<&String> = granted
            .iter()
            .filter(|f| !self.features.contains_key(*f))
            .collect();
        unknown.sort();
        if let Some(name) = unknown.first() {
            return Err(GrantError::Unknown((*name).clone()));
        }

        for name in &self.order {
            if !granted.contains(name) {
                continue;
            }
            let Some(def) = self.features.get(name) else {
                continue;
            };
            for requirement in &def.requires {
                if !requirement.is_satisfied_by(|f| granted.contains(f)) {
                    return Err(GrantError::Unsatisfied {
                        feature: name.clone(),
                        requirement: requirement.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> FeatureGraph {
        FeatureGraph::new([
            FeatureDefinition::new("see_mine", "See mine"),
            FeatureDefinition::new("see_all", "See all"),
            FeatureDefinition::new("edit", "Edit")
                .requires(Requirement::any_of(["see_mine", "see_all"])),
            FeatureDefinition::new("create", "Create").requires(Requirement::feature("edit")),
        ])
        .unwrap()
    }

    #[test]
    fn requirement_serde_shapes() {
        let single: Requirement = serde_json::from_str(r#""edit""#).unwrap();
        assert_eq!(single, Requirement::feature("edit"));

        let group: Requirement = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(group, Requirement::any_of(["a", "b"]));
    }

    #[test]
    fn qualified_prefixes_all_members() {
        let req = Requirement::any_of(["a", "b"]).qualified("vendor/plugin");
        let members: Vec<_> = req.members().collect();
        assert_eq!(members, vec!["vendor/plugin/a", "vendor/plugin/b"]);
    }

    #[test]
    fn empty_any_of_never_satisfied() {
        assert!(!Requirement::AnyOf(vec![]).is_satisfied_by(|_| true));
    }

    #[test]
    fn load_order_puts_prerequisites_first() {
        let graph = sample();
        let order = graph.load_order();
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();

        assert!(pos("see_mine") < pos("edit"));
        assert!(pos("see_all") < pos("edit"));
        assert!(pos("edit") < pos("create"));
    }

    #[test]
    fn unknown_requirement_rejected() {
        let err = FeatureGraph::new([
            FeatureDefinition::new("edit", "Edit").requires(Requirement::feature("missing"))
        ])
        .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn duplicate_rejected() {
        let err = FeatureGraph::new([
            FeatureDefinition::new("a", "A"),
            FeatureDefinition::new("a", "A again"),
        ])
        .unwrap_err();
        assert_eq!(err, FeatureGraphError::Duplicate("a".into()));
    }

    #[test]
    fn cycle_rejected() {
        let err = FeatureGraph::new([
            FeatureDefinition::new("a", "A").requires(Requirement::feature("b")),
            FeatureDefinition::new("b", "B").requires(Requirement::any_of(["a", "c"])),
            FeatureDefinition::new("c", "C"),
        ])
        .unwrap_err();
        assert_eq!(err, FeatureGraphError::Cycle(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn grant_with_full_chain_is_valid() {
        let graph = sample();
        assert!(graph.check_grant(&grant(&["see_all", "edit", "create"])).is_ok());
        assert!(graph.check_grant(&grant(&["see_mine"])).is_ok());
        assert!(graph.check_grant(&grant(&[])).is_ok());
    }

    #[test]
    fn grant_missing_single_dependency() {
        let err = sample()
            .check_grant(&grant(&["see_mine", "create"]))
            .unwrap_err();
        assert_eq!(
            err,
            GrantError::Unsatisfied {
                feature: "create".into(),
                requirement: Requirement::feature("edit"),
            }
        );
    }

    #[test]
    fn grant_missing_any_of_group() {
        let err = sample().check_grant(&grant(&["edit"])).unwrap_err();
        assert!(err.to_string().contains("any of [see_mine, see_all]"));
    }

    #[test]
    fn grant_of_unknown_feature() {
        let err = sample().check_grant(&grant(&["fly"])).unwrap_err();
        assert_eq!(err, GrantError::Unknown("fly".into()));
    }
}

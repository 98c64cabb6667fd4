//! The typed result tree.
//!
//! Interpretation happens in two phases. The interpreter first assembles a
//! provisional tree of [`NodeBuilder`]s, one per document, without knowing
//! yet what each group will turn into. [`TreeBuilder`] then finalizes those
//! into an arena of [`Node`]s: classes are settled once the children are
//! known, identities are computed from name paths, and parent/child links
//! become indices into the arena.
//!
//! ```text
//! NodeBuilder (per document, owned, unclassified)
//!     │  TreeBuilder::insert
//! ResultTree  (arena + hash index, classified, immutable)
//! ```

use crate::identity::{NamePath, StableHash};
use crate::literal::{Literal, ValueKind};
use crate::threshold::ThresholdRule;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Ordinal of a build in the chain.
pub type BuildNumber = u32;

/// Sentinel build used while a document is being interpreted.
pub const CURRENT_BUILD: BuildNumber = 0;

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

/// Final classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupClass {
    Group,
    Array,
    Result,
    Parameter,
    ParameterGroup,
    ThresholdGroup,
    FileGroup,
}

impl GroupClass {
    pub fn is_value(self) -> bool {
        matches!(self, Self::Result | Self::Parameter)
    }
}

/// Whether a value is measured or describes the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRole {
    Result,
    Parameter,
}

/// Per-build facts recorded next to a raw value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Property {
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub messages: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<StableHash>,
}

/// Leaf payload of result and parameter nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueData {
    pub kind: ValueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub group_label: String,
    pub samples: BTreeMap<BuildNumber, Literal>,
    pub properties: BTreeMap<BuildNumber, Property>,
}

impl ValueData {
    /// Failed state recorded for `build`; absent means passing.
    pub fn failed_at(&self, build: BuildNumber) -> bool {
        self.properties.get(&build).is_some_and(|p| p.failed)
    }
}

/// A finalized node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub class: GroupClass,
    pub hash: StableHash,
    pub path: String,
    #[serde(skip)]
    pub parent: Option<NodeId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub thresholds: Vec<ThresholdRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueData>,
}

/// Errors raised while finalizing or re-keying a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("two values resolve to the same identity `{path}`")]
    DuplicateIdentity { path: String },

    #[error("build {0} cannot be assigned; it is reserved for the current document")]
    InvalidBuild(BuildNumber),

    #[error("value `{path}` already holds a sample for build {build}")]
    BuildCollision { path: String, build: BuildNumber },
}

/// Interpreted results of one build, as an arena.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultTree {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    #[serde(skip)]
    index: HashMap<StableHash, NodeId>,
    #[serde(skip)]
    results: Vec<NodeId>,
    #[serde(skip)]
    parameters: Vec<NodeId>,
}

impl ResultTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn lookup(&self, hash: &StableHash) -> Option<NodeId> {
        self.index.get(hash).copied()
    }

    /// Lookup by dotted name path.
    pub fn find(&self, dotted: &str) -> Option<&Node> {
        self.lookup(&StableHash::from_dotted(dotted))
            .map(|id| self.node(id))
    }

    pub fn results(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.results.iter().map(|id| (*id, self.node(*id)))
    }

    pub fn parameters(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.parameters.iter().map(|id| (*id, self.node(*id)))
    }

    /// Results and parameters, in arena order.
    pub fn values(&self) -> impl Iterator<Item = (NodeId, &Node, &ValueData)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.value.as_ref().map(|v| (NodeId(i), n, v)))
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, |p| self.node(*p).parent)
    }

    /// Nearest enclosing file group, including the node itself.
    pub fn file_group_of(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| self.node(*n).class == GroupClass::FileGroup)
    }

    /// Rules that apply to the value at `id`: its own, then each
    /// ancestor's, plus those held by threshold groups along the way.
    pub fn effective_thresholds(&self, id: NodeId) -> Vec<&ThresholdRule> {
        let mut rules = Vec::new();
        for scope in std::iter::once(id).chain(self.ancestors(id)) {
            let node = self.node(scope);
            rules.extend(node.thresholds.iter());
            for child in &node.children {
                let child = self.node(*child);
                if child.class == GroupClass::ThresholdGroup {
                    rules.extend(child.thresholds.iter());
                }
            }
        }
        rules
    }

    /// Builds that have at least one sample in this tree.
    pub fn builds(&self) -> Vec<BuildNumber> {
        let mut builds: Vec<BuildNumber> = self
            .values()
            .flat_map(|(_, _, v)| v.samples.keys().copied())
            .collect();
        builds.sort_unstable();
        builds.dedup();
        builds
    }

    /// Re-key every current-build sample to `build`.
    pub fn assign_build(&mut self, build: BuildNumber) -> Result<(), TreeError> {
        if build == CURRENT_BUILD {
            return Err(TreeError::InvalidBuild(build));
        }
        for node in &mut self.nodes {
            let Some(value) = node.value.as_mut() else {
                continue;
            };
            if !value.samples.contains_key(&CURRENT_BUILD) {
                continue;
            }
            if value.samples.contains_key(&build) {
                return Err(TreeError::BuildCollision {
                    path: node.path.clone(),
                    build,
                });
            }
            if let Some(sample) = value.samples.remove(&CURRENT_BUILD) {
                value.samples.insert(build, sample);
            }
            if let Some(property) = value.properties.remove(&CURRENT_BUILD) {
                value.properties.insert(build, property);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Provisional {
    Group,
    Array,
    FileGroup,
    Value {
        role: ValueRole,
        kind: ValueKind,
        unit: Option<String>,
        group_label: Option<String>,
        literal: Literal,
        property: Property,
    },
}

/// An unclassified node, as produced while walking one document.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBuilder {
    name: String,
    description: Option<String>,
    provisional: Provisional,
    children: Vec<NodeBuilder>,
    thresholds: Vec<ThresholdRule>,
}

impl NodeBuilder {
    fn new(name: impl Into<String>, provisional: Provisional) -> Self {
        Self {
            name: name.into(),
            description: None,
            provisional,
            children: Vec::new(),
            thresholds: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, Provisional::Group)
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self::new(name, Provisional::Array)
    }

    /// Root of one document. Contributes `description` to name paths.
    pub fn file_group(name: impl Into<String>, description: impl Into<String>) -> Self {
        let mut node = Self::new(name, Provisional::FileGroup);
        node.description = Some(description.into());
        node
    }

    /// A value observed in the current build.
    pub fn value(name: impl Into<String>, role: ValueRole, literal: Literal) -> Self {
        Self::new(
            name,
            Provisional::Value {
                role,
                kind: literal.kind(),
                unit: None,
                group_label: None,
                literal,
                property: Property::default(),
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_value(&self) -> bool {
        matches!(self.provisional, Provisional::Value { .. })
    }

    pub fn is_parameter(&self) -> bool {
        matches!(
            self.provisional,
            Provisional::Value {
                role: ValueRole::Parameter,
                ..
            }
        )
    }

    pub fn children(&self) -> &[NodeBuilder] {
        &self.children
    }

    pub fn thresholds(&self) -> &[ThresholdRule] {
        &self.thresholds
    }

    pub fn set_description(&mut self, description: Option<String>) {
        if description.is_some() {
            self.description = description;
        }
    }

    pub fn set_unit(&mut self, value_unit: Option<String>) {
        if let Provisional::Value { unit, .. } = &mut self.provisional
            && value_unit.is_some()
        {
            *unit = value_unit;
        }
    }

    pub fn set_group_label(&mut self, label: Option<String>) {
        if let Provisional::Value { group_label, .. } = &mut self.provisional
            && label.is_some()
        {
            *group_label = label;
        }
    }

    /// Property of the current build; `None` for groups.
    pub fn property_mut(&mut self) -> Option<&mut Property> {
        match &mut self.provisional {
            Provisional::Value { property, .. } => Some(property),
            _ => None,
        }
    }

    pub fn literal(&self) -> Option<&Literal> {
        match &self.provisional {
            Provisional::Value { literal, .. } => Some(literal),
            _ => None,
        }
    }

    pub fn push_child(&mut self, child: NodeBuilder) {
        self.children.push(child);
    }

    pub fn push_threshold(&mut self, rule: ThresholdRule) {
        self.thresholds.push(rule);
    }

    fn settle_class(&self) -> GroupClass {
        match &self.provisional {
            Provisional::Value {
                role: ValueRole::Result,
                ..
            } => GroupClass::Result,
            Provisional::Value {
                role: ValueRole::Parameter,
                ..
            } => GroupClass::Parameter,
            Provisional::FileGroup => GroupClass::FileGroup,
            Provisional::Group | Provisional::Array => {
                if !self.children.is_empty() && self.children.iter().all(NodeBuilder::is_parameter)
                {
                    GroupClass::ParameterGroup
                } else if self.children.is_empty() && !self.thresholds.is_empty() {
                    GroupClass::ThresholdGroup
                } else if self.provisional == Provisional::Array {
                    GroupClass::Array
                } else {
                    GroupClass::Group
                }
            }
        }
    }

    fn path_segment(&self) -> &str {
        match (&self.provisional, &self.description) {
            (Provisional::FileGroup, Some(description)) => description,
            _ => &self.name,
        }
    }
}

/// Where a node sits while it is being finalized.
#[derive(Debug, Clone, Default)]
struct Placement {
    path: NamePath,
    label: Vec<String>,
    file_description: Option<String>,
}

/// Finalizes provisional trees into one [`ResultTree`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tree: ResultTree,
    arrays: HashSet<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalize one provisional root (normally a file group).
    ///
    /// Identities are checked before anything is committed; on error the
    /// tree is left as it was.
    pub fn insert(&mut self, root: NodeBuilder) -> Result<NodeId, TreeError> {
        self.check_identities(&root, &NamePath::root(), &mut HashMap::new())?;
        self.insert_node(root, None, &Placement::default())
    }

    /// A value may not share its identity with any other node; groups with
    /// the same identity unify.
    fn check_identities(
        &self,
        builder: &NodeBuilder,
        parent: &NamePath,
        seen: &mut HashMap<StableHash, bool>,
    ) -> Result<(), TreeError> {
        let path = parent.child(builder.path_segment());
        let hash = path.stable_hash();
        let is_value = builder.is_value();
        let earlier = seen.get(&hash).copied().or_else(|| {
            self.tree
                .index
                .get(&hash)
                .map(|id| self.tree.nodes[id.0].value.is_some())
        });
        if let Some(earlier_value) = earlier
            && (is_value || earlier_value)
        {
            return Err(TreeError::DuplicateIdentity { path: path.dotted() });
        }
        seen.insert(hash, is_value);
        for child in &builder.children {
            self.check_identities(child, &path, seen)?;
        }
        Ok(())
    }

    fn insert_node(
        &mut self,
        builder: NodeBuilder,
        parent: Option<NodeId>,
        placement: &Placement,
    ) -> Result<NodeId, TreeError> {
        let class = builder.settle_class();
        let is_array = builder.provisional == Provisional::Array;
        let path = placement.path.child(builder.path_segment());
        let hash = path.stable_hash();
        let dotted = path.dotted();

        let NodeBuilder {
            name,
            description,
            provisional,
            children,
            thresholds,
        } = builder;

        let value = match provisional {
            Provisional::Value {
                kind,
                unit,
                group_label,
                literal,
                property,
                ..
            } => {
                let group_label = group_label.unwrap_or_else(|| {
                    if placement.label.is_empty() {
                        placement.file_description.clone().unwrap_or_default()
                    } else {
                        placement.label.join(".")
                    }
                });
                Some(ValueData {
                    kind,
                    unit,
                    group_label,
                    samples: BTreeMap::from([(CURRENT_BUILD, literal)]),
                    properties: BTreeMap::from([(CURRENT_BUILD, property)]),
                })
            }
            _ => None,
        };

        let unified = self.tree.index.contains_key(&hash);
        let id = match self.tree.index.get(&hash).copied() {
            Some(existing) => {
                let node = &mut self.tree.nodes[existing.0];
                if value.is_some() || node.value.is_some() {
                    return Err(TreeError::DuplicateIdentity { path: dotted });
                }
                tracing::trace!(path = %node.path, "unifying group with an earlier declaration");
                node.thresholds.extend(thresholds);
                if node.description.is_none() {
                    node.description = description;
                }
                existing
            }
            None => {
                let id = NodeId(self.tree.nodes.len());
                self.tree.nodes.push(Node {
                    name: name.clone(),
                    description,
                    class,
                    hash: hash.clone(),
                    path: dotted,
                    parent,
                    children: Vec::new(),
                    thresholds,
                    value,
                });
                self.tree.index.insert(hash, id);
                match class {
                    GroupClass::Result => self.tree.results.push(id),
                    GroupClass::Parameter => self.tree.parameters.push(id),
                    _ => {}
                }
                match parent {
                    Some(p) => self.tree.nodes[p.0].children.push(id),
                    None => self.tree.roots.push(id),
                }
                id
            }
        };
        if is_array {
            self.arrays.insert(id);
        }

        let child_placement = if class == GroupClass::FileGroup {
            Placement {
                path,
                label: Vec::new(),
                file_description: self.tree.nodes[id.0].description.clone(),
            }
        } else {
            let mut label = placement.label.clone();
            label.push(name);
            Placement {
                path,
                label,
                file_description: placement.file_description.clone(),
            }
        };
        for child in children {
            self.insert_node(child, Some(id), &child_placement)?;
        }
        if unified {
            self.reclassify(id);
        }
        Ok(id)
    }

    /// Settle a unified group's class again from its merged children and
    /// rules.
    fn reclassify(&mut self, id: NodeId) {
        let node = &self.tree.nodes[id.0];
        if node.value.is_some() || node.class == GroupClass::FileGroup {
            return;
        }
        let class = if !node.children.is_empty()
            && node
                .children
                .iter()
                .all(|c| self.tree.nodes[c.0].class == GroupClass::Parameter)
        {
            GroupClass::ParameterGroup
        } else if node.children.is_empty() && !node.thresholds.is_empty() {
            GroupClass::ThresholdGroup
        } else if self.arrays.contains(&id) {
            GroupClass::Array
        } else {
            GroupClass::Group
        };
        if class != node.class {
            tracing::trace!(path = %node.path, from = ?node.class, to = ?class, "reclassified unified group");
            self.tree.nodes[id.0].class = class;
        }
    }

    /// Link parameters to results and hand out the immutable tree.
    pub fn finish(mut self) -> ResultTree {
        let links: Vec<(NodeId, Vec<StableHash>)> = self
            .tree
            .results
            .iter()
            .map(|id| (*id, self.linked_parameters(*id)))
            .collect();
        for (id, parameters) in links {
            if parameters.is_empty() {
                continue;
            }
            if let Some(value) = self.tree.nodes[id.0].value.as_mut() {
                for property in value.properties.values_mut() {
                    if property.parameters.is_empty() {
                        property.parameters = parameters.clone();
                    }
                }
            }
        }
        self.tree
    }

    /// Parameters visible from a result: its own parameter children, and
    /// those declared beside it or beside any enclosing group.
    fn linked_parameters(&self, id: NodeId) -> Vec<StableHash> {
        let tree = &self.tree;
        let mut found = Vec::new();
        for scope in std::iter::once(id).chain(tree.ancestors(id)) {
            for child in &tree.node(scope).children {
                collect_parameters(tree, *child, &mut found);
            }
        }
        found
    }
}

fn collect_parameters(tree: &ResultTree, id: NodeId, found: &mut Vec<StableHash>) {
    let node = tree.node(id);
    match node.class {
        GroupClass::Parameter => {
            if !found.contains(&node.hash) {
                found.push(node.hash.clone());
            }
        }
        GroupClass::ParameterGroup => {
            for child in &node.children {
                collect_parameters(tree, *child, found);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, literal: Literal) -> NodeBuilder {
        NodeBuilder::value(name, ValueRole::Result, literal)
    }

    fn parameter(name: &str, literal: Literal) -> NodeBuilder {
        NodeBuilder::value(name, ValueRole::Parameter, literal)
    }

    fn sample_document() -> NodeBuilder {
        let mut file = NodeBuilder::file_group("results.json", "out/results.json");
        let mut suite = NodeBuilder::group("sort");
        suite.push_child(result("latency", Literal::Double(12.5)));
        let mut params = NodeBuilder::group("config");
        params.push_child(parameter("threads", Literal::Integer(4)));
        suite.push_child(params);
        let mut limits = NodeBuilder::array("limits");
        limits.push_threshold(ThresholdRule::Percentage { percentage: 5.0 });
        suite.push_child(limits);
        file.push_child(suite);
        file
    }

    #[test]
    fn file_group_contributes_description_to_paths() {
        let mut builder = TreeBuilder::new();
        builder.insert(sample_document()).unwrap();
        let tree = builder.finish();

        let latency = tree.find("out/results.json.sort.latency").expect("latency");
        assert_eq!(latency.class, GroupClass::Result);
        assert_eq!(
            latency.hash,
            StableHash::from_segments(&["out/results.json", "sort", "latency"])
        );
        assert_eq!(latency.value.as_ref().unwrap().group_label, "sort");
    }

    #[test]
    fn groups_are_reclassified_from_their_children() {
        let mut builder = TreeBuilder::new();
        builder.insert(sample_document()).unwrap();
        let tree = builder.finish();

        assert_eq!(
            tree.find("out/results.json.sort.config").unwrap().class,
            GroupClass::ParameterGroup
        );
        assert_eq!(
            tree.find("out/results.json.sort.limits").unwrap().class,
            GroupClass::ThresholdGroup
        );
        assert_eq!(
            tree.find("out/results.json.sort").unwrap().class,
            GroupClass::Group
        );
    }

    #[test]
    fn threshold_groups_apply_to_sibling_values() {
        let mut builder = TreeBuilder::new();
        builder.insert(sample_document()).unwrap();
        let tree = builder.finish();

        let id = tree
            .lookup(&StableHash::from_dotted("out/results.json.sort.latency"))
            .unwrap();
        let rules = tree.effective_thresholds(id);
        assert_eq!(rules, vec![&ThresholdRule::Percentage { percentage: 5.0 }]);
    }

    #[test]
    fn results_link_visible_parameters() {
        let mut builder = TreeBuilder::new();
        builder.insert(sample_document()).unwrap();
        let tree = builder.finish();

        let latency = tree.find("out/results.json.sort.latency").unwrap();
        let property = &latency.value.as_ref().unwrap().properties[&CURRENT_BUILD];
        assert_eq!(
            property.parameters,
            vec![StableHash::from_dotted(
                "out/results.json.sort.config.threads"
            )]
        );
        assert_eq!(tree.parameters().count(), 1);
        assert_eq!(tree.results().count(), 1);
    }

    #[test]
    fn duplicate_value_identities_are_rejected() {
        let mut file = NodeBuilder::file_group("a.json", "a.json");
        file.push_child(result("x", Literal::Integer(1)));
        file.push_child(result("x", Literal::Integer(2)));

        let err = TreeBuilder::new().insert(file).unwrap_err();
        assert_eq!(
            err,
            TreeError::DuplicateIdentity {
                path: "a.json.x".into()
            }
        );
    }

    #[test]
    fn groups_with_the_same_path_are_unified() {
        let mut file = NodeBuilder::file_group("a.json", "a.json");
        let mut first = NodeBuilder::group("g");
        first.push_child(result("x", Literal::Integer(1)));
        let mut second = NodeBuilder::group("g");
        second.push_child(result("y", Literal::Integer(2)));
        file.push_child(first);
        file.push_child(second);

        let mut builder = TreeBuilder::new();
        builder.insert(file).unwrap();
        let tree = builder.finish();
        assert_eq!(tree.find("a.json.g").unwrap().children.len(), 2);
    }

    #[test]
    fn rejected_documents_leave_the_tree_untouched() {
        let mut builder = TreeBuilder::new();
        builder.insert(sample_document()).unwrap();

        let mut file = NodeBuilder::file_group("b.json", "b.json");
        file.push_child(result("first", Literal::Integer(1)));
        file.push_child(result("x", Literal::Integer(1)));
        file.push_child(result("x", Literal::Integer(2)));
        assert!(builder.insert(file).is_err());

        let mut clash = NodeBuilder::file_group("results.json", "out/results.json");
        let mut suite = NodeBuilder::group("sort");
        suite.push_child(result("extra", Literal::Integer(1)));
        suite.push_child(result("latency", Literal::Integer(2)));
        clash.push_child(suite);
        assert!(builder.insert(clash).is_err());

        let tree = builder.finish();
        assert!(tree.find("b.json").is_none());
        assert!(tree.find("b.json.first").is_none());
        assert!(tree.find("out/results.json.sort.extra").is_none());
        assert_eq!(tree.results().count(), 1);
    }

    #[test]
    fn unified_groups_are_classified_from_every_declaration() {
        let mut file = NodeBuilder::file_group("a.json", "a.json");
        let mut limits = NodeBuilder::group("g");
        limits.push_threshold(ThresholdRule::Percentage { percentage: 5.0 });
        let mut params = NodeBuilder::group("g");
        params.push_child(parameter("threads", Literal::Integer(4)));
        let mut results = NodeBuilder::array("g");
        results.push_child(result("x", Literal::Integer(1)));
        file.push_child(limits);
        file.push_child(params);

        let mut builder = TreeBuilder::new();
        builder.insert(file.clone()).unwrap();
        let tree = builder.finish();
        assert_eq!(tree.find("a.json.g").unwrap().class, GroupClass::ParameterGroup);

        file.push_child(results);
        let mut builder = TreeBuilder::new();
        builder.insert(file).unwrap();
        let tree = builder.finish();
        let g = tree.find("a.json.g").unwrap();
        assert_eq!(g.class, GroupClass::Array);
        assert_eq!(g.children.len(), 2);
        assert_eq!(g.thresholds.len(), 1);
    }

    #[test]
    fn assign_build_moves_current_samples() {
        let mut builder = TreeBuilder::new();
        builder.insert(sample_document()).unwrap();
        let mut tree = builder.finish();

        assert_eq!(tree.builds(), vec![CURRENT_BUILD]);
        tree.assign_build(7).unwrap();
        assert_eq!(tree.builds(), vec![7]);
        let latency = tree.find("out/results.json.sort.latency").unwrap();
        let value = latency.value.as_ref().unwrap();
        assert_eq!(value.samples[&7], Literal::Double(12.5));
        assert!(!value.failed_at(7));

        assert_eq!(tree.assign_build(0), Err(TreeError::InvalidBuild(0)));
    }

    #[test]
    fn value_directly_in_file_group_is_labelled_with_file_description() {
        let mut file = NodeBuilder::file_group("b.xml", "reports/b.xml");
        file.push_child(result("total", Literal::Integer(3)));
        let mut builder = TreeBuilder::new();
        builder.insert(file).unwrap();
        let tree = builder.finish();
        assert_eq!(
            tree.find("reports/b.xml.total")
                .unwrap()
                .value
                .as_ref()
                .unwrap()
                .group_label,
            "reports/b.xml"
        );
    }
}

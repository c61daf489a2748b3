//! Target registry and execution-order resolution built on petgraph
//!
//! ## Graph Structure
//!
//! - **Nodes**: registered targets, indexed by declaration order
//! - **Hard edges**: `A → B` means "A must complete before B" (B depends on A)
//! - **Soft edges**: `before`/`after` hints, consulted only as a tie-break
//!
//! Resolution takes the transitive closure over hard edges from the requested
//! targets, rejects cycles (Tarjan's SCC), then runs a stable Kahn sort: among
//! ready targets the earliest-declared one wins unless a soft hint asks for an
//! unscheduled target to go first. Soft hints never pull in targets and never
//! take part in cycle detection.

use crate::core::error::{GraphError, RailResult};
use petgraph::Direction;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

/// Body of a target: runs against the build context, fails with an error
pub type TargetBody<C> = Box<dyn Fn(&C) -> RailResult<()>>;

/// Predicate deciding whether a target's body runs
pub type TargetCondition<C> = Box<dyn Fn(&C) -> bool>;

/// A named build step with its ordering constraints.
///
/// Built with chained calls and registered once:
///
/// ```rust,ignore
/// graph.register(
///   Target::new("Compile")
///     .depends_on(["Restore"])
///     .executes(|ctx: &BuildContext| ctx.tools.dotnet.build(&settings)),
/// )?;
/// ```
pub struct Target<C> {
  name: String,
  description: Option<String>,
  depends_on: Vec<String>,
  before: Vec<String>,
  after: Vec<String>,
  condition: Option<TargetCondition<C>>,
  body: Option<TargetBody<C>>,
}

impl<C> Target<C> {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      description: None,
      depends_on: Vec::new(),
      before: Vec::new(),
      after: Vec::new(),
      condition: None,
      body: None,
    }
  }

  pub fn description(mut self, text: impl Into<String>) -> Self {
    self.description = Some(text.into());
    self
  }

  /// Hard predecessors: must complete first, failure aborts this target
  pub fn depends_on<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.depends_on.extend(names.into_iter().map(Into::into));
    self
  }

  /// Soft hint: run before these targets when they are scheduled too
  pub fn before<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.before.extend(names.into_iter().map(Into::into));
    self
  }

  /// Soft hint: run after these targets when they are scheduled too
  pub fn after<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.after.extend(names.into_iter().map(Into::into));
    self
  }

  /// Skip the body (but still satisfy dependents) when the predicate is false
  pub fn only_when(mut self, condition: impl Fn(&C) -> bool + 'static) -> Self {
    self.condition = Some(Box::new(condition));
    self
  }

  pub fn executes(mut self, body: impl Fn(&C) -> RailResult<()> + 'static) -> Self {
    self.body = Some(Box::new(body));
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description_text(&self) -> Option<&str> {
    self.description.as_deref()
  }

  pub fn dependencies(&self) -> &[String] {
    &self.depends_on
  }

  pub fn runs_before(&self) -> &[String] {
    &self.before
  }

  pub fn runs_after(&self) -> &[String] {
    &self.after
  }

  pub fn is_conditional(&self) -> bool {
    self.condition.is_some()
  }

  /// Evaluate the condition (targets without one always run)
  pub fn should_run(&self, ctx: &C) -> bool {
    self.condition.as_ref().is_none_or(|condition| condition(ctx))
  }

  /// Run the body (targets without one succeed immediately)
  pub fn execute(&self, ctx: &C) -> RailResult<()> {
    match &self.body {
      Some(body) => body(ctx),
      None => Ok(()),
    }
  }
}

impl<C> fmt::Debug for Target<C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Target")
      .field("name", &self.name)
      .field("depends_on", &self.depends_on)
      .field("before", &self.before)
      .field("after", &self.after)
      .field("conditional", &self.condition.is_some())
      .finish()
  }
}

/// Registry of targets; immutable once execution starts.
pub struct TargetGraph<C> {
  /// Targets in declaration order
  targets: Vec<Target<C>>,

  /// Index: target name → declaration index
  name_to_index: HashMap<String, usize>,
}

impl<C> Default for TargetGraph<C> {
  fn default() -> Self {
    Self::new()
  }
}

impl<C> TargetGraph<C> {
  pub fn new() -> Self {
    Self {
      targets: Vec::new(),
      name_to_index: HashMap::new(),
    }
  }

  /// Register a target; names are unique
  pub fn register(&mut self, target: Target<C>) -> Result<(), GraphError> {
    if self.name_to_index.contains_key(&target.name) {
      return Err(GraphError::DuplicateTarget { name: target.name });
    }

    self.name_to_index.insert(target.name.clone(), self.targets.len());
    self.targets.push(target);
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&Target<C>> {
    self.name_to_index.get(name).map(|&index| &self.targets[index])
  }

  /// Targets in declaration order
  pub fn targets(&self) -> impl Iterator<Item = &Target<C>> {
    self.targets.iter()
  }

  pub fn names(&self) -> Vec<String> {
    self.targets.iter().map(|t| t.name.clone()).collect()
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  /// Check the whole registry: every hard dependency exists, no hard cycles.
  ///
  /// Run once after registration so graph errors surface before any target runs.
  pub fn validate(&self) -> Result<(), GraphError> {
    for target in &self.targets {
      for dependency in &target.depends_on {
        self.lookup(dependency, Some(&target.name))?;
      }
    }

    let all: Vec<usize> = (0..self.targets.len()).collect();
    let (graph, _) = self.hard_graph(&all)?;
    self.check_acyclic(&graph)
  }

  /// Execution order for one requested target
  #[allow(dead_code)] // Commands always go through resolve_order_many; used in tests
  pub fn resolve_order(&self, name: &str) -> Result<Vec<String>, GraphError> {
    self.resolve_order_many(&[name])
  }

  /// Execution order for several requested targets (union of their closures)
  pub fn resolve_order_many<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>, GraphError> {
    let mut roots = Vec::with_capacity(names.len());
    for name in names {
      roots.push(self.lookup(name.as_ref(), None)?);
    }

    let closure = self.closure(&roots)?;
    let (graph, nodes) = self.hard_graph(&closure)?;
    self.check_acyclic(&graph)?;

    let order = self.stable_toposort(&graph, &nodes);
    Ok(order.into_iter().map(|index| self.targets[index].name.clone()).collect())
  }

  /// Find a target by name, or explain which names exist
  fn lookup(&self, name: &str, required_by: Option<&str>) -> Result<usize, GraphError> {
    self
      .name_to_index
      .get(name)
      .copied()
      .ok_or_else(|| GraphError::UnknownTarget {
        name: name.to_string(),
        required_by: required_by.map(str::to_string),
        available: self.names(),
      })
  }

  /// Transitive closure over hard dependencies, in declaration order
  fn closure(&self, roots: &[usize]) -> Result<Vec<usize>, GraphError> {
    let mut visited = HashSet::new();
    let mut stack: Vec<usize> = roots.to_vec();

    while let Some(index) = stack.pop() {
      if !visited.insert(index) {
        continue;
      }

      let target = &self.targets[index];
      for dependency in &target.depends_on {
        stack.push(self.lookup(dependency, Some(&target.name))?);
      }
    }

    let mut closure: Vec<usize> = visited.into_iter().collect();
    closure.sort_unstable();
    Ok(closure)
  }

  /// Hard-edge graph over a subset of targets.
  ///
  /// Node weights are declaration indices; the returned map goes the other way.
  fn hard_graph(&self, subset: &[usize]) -> Result<(DiGraph<usize, ()>, HashMap<usize, NodeIndex>), GraphError> {
    let mut graph = DiGraph::with_capacity(subset.len(), subset.len());
    let mut nodes = HashMap::with_capacity(subset.len());

    for &index in subset {
      nodes.insert(index, graph.add_node(index));
    }

    for &index in subset {
      let target = &self.targets[index];
      for dependency in &target.depends_on {
        let dep_index = self.lookup(dependency, Some(&target.name))?;
        if let Some(&from) = nodes.get(&dep_index) {
          graph.update_edge(from, nodes[&index], ());
        }
      }
    }

    Ok((graph, nodes))
  }

  /// Reject hard cycles using Tarjan's SCC algorithm
  fn check_acyclic(&self, graph: &DiGraph<usize, ()>) -> Result<(), GraphError> {
    let cycles: Vec<Vec<NodeIndex>> = algo::tarjan_scc(graph)
      .into_iter()
      .filter(|component| component.len() > 1 || graph.contains_edge(component[0], component[0]))
      .collect();

    // Report the cycle containing the earliest-declared target, for stable messages
    let Some(component) = cycles
      .into_iter()
      .min_by_key(|component| component.iter().map(|n| graph[*n]).min().unwrap_or(usize::MAX))
    else {
      return Ok(());
    };

    Err(GraphError::CyclicDependency {
      cycle: self.cycle_path(graph, &component),
    })
  }

  /// Concrete cycle through a strongly connected component, in "depends on" order
  ///
  /// Returns e.g. `["A", "B", "A"]` for A depends on B depends on A.
  fn cycle_path(&self, graph: &DiGraph<usize, ()>, component: &[NodeIndex]) -> Vec<String> {
    let members: HashSet<NodeIndex> = component.iter().copied().collect();
    let Some(&start) = component.iter().min_by_key(|n| graph[**n]) else {
      return Vec::new();
    };

    // BFS along "depends on" (incoming hard edges) until we return to start
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    let mut closing = None;

    'search: while let Some(current) = queue.pop_front() {
      let mut predecessors: Vec<NodeIndex> = graph
        .neighbors_directed(current, Direction::Incoming)
        .filter(|n| members.contains(n))
        .collect();
      predecessors.sort_by_key(|n| graph[*n]);

      for next in predecessors {
        if next == start {
          closing = Some(current);
          break 'search;
        }
        if let std::collections::hash_map::Entry::Vacant(e) = parent.entry(next) {
          e.insert(current);
          queue.push_back(next);
        }
      }
    }

    let mut path = vec![start];
    if let Some(mut node) = closing {
      let mut tail = Vec::new();
      while node != start {
        tail.push(node);
        node = parent[&node];
      }
      tail.reverse();
      path.extend(tail);
    }
    path.push(start);

    path.into_iter().map(|n| self.targets[graph[n]].name.clone()).collect()
  }

  /// Kahn's algorithm with declaration order as the base priority and soft
  /// hints as a preference among ready targets.
  fn stable_toposort(&self, graph: &DiGraph<usize, ()>, nodes: &HashMap<usize, NodeIndex>) -> Vec<usize> {
    let soft = self.soft_edges(graph, nodes);

    let mut in_degree: HashMap<usize, usize> = nodes
      .iter()
      .map(|(&index, &node)| (index, graph.neighbors_directed(node, Direction::Incoming).count()))
      .collect();

    let mut ready: BTreeSet<usize> = in_degree
      .iter()
      .filter(|(_, degree)| **degree == 0)
      .map(|(&index, _)| index)
      .collect();

    let mut scheduled: HashSet<usize> = HashSet::with_capacity(nodes.len());
    let mut order = Vec::with_capacity(nodes.len());

    while !ready.is_empty() {
      let held_back = |candidate: &usize| {
        soft
          .iter()
          .any(|&(first, then)| then == *candidate && !scheduled.contains(&first))
      };

      // Conflicting hints can hold back every ready target; fall back to declaration order
      let Some(next) = ready
        .iter()
        .copied()
        .find(|candidate| !held_back(candidate))
        .or_else(|| ready.first().copied())
      else {
        break;
      };

      ready.remove(&next);
      scheduled.insert(next);
      order.push(next);

      for successor in graph.neighbors_directed(nodes[&next], Direction::Outgoing) {
        let index = graph[successor];
        if let Some(degree) = in_degree.get_mut(&index) {
          *degree -= 1;
          if *degree == 0 {
            ready.insert(index);
          }
        }
      }
    }

    order
  }

  /// Soft ordering pairs `(first, then)` among targets present in `nodes`.
  ///
  /// A pair is dropped when `first` hard-depends (transitively) on `then`;
  /// such a hint can never be honoured.
  fn soft_edges(&self, graph: &DiGraph<usize, ()>, nodes: &HashMap<usize, NodeIndex>) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();

    for &index in nodes.keys() {
      let target = &self.targets[index];

      for name in &target.before {
        if let Some(&other) = self.name_to_index.get(name)
          && other != index
          && nodes.contains_key(&other)
        {
          edges.push((index, other));
        }
      }

      for name in &target.after {
        if let Some(&other) = self.name_to_index.get(name)
          && other != index
          && nodes.contains_key(&other)
        {
          edges.push((other, index));
        }
      }
    }

    edges.retain(|&(first, then)| !algo::has_path_connecting(graph, nodes[&then], nodes[&first], None));
    edges
  }
}

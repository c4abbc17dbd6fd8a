//! Dependency graph of derived dashboard values
//!
//! Each derived value declares the selection inputs and other derived values
//! it reads. The graph orders them topologically once, and on every change
//! reports the dirty closure in that order so upstream values are always
//! recomputed before anything reading them.

use crate::error::{ForecastError, Result};
use crate::selection::SelectionInput;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A derived value of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Node {
    /// Weekly series of the selected store
    Series,
    /// Descriptive statistics of the series
    Summary,
    /// Histogram of weekly sales
    Distribution,
    /// Window plan of the main forecast
    Plan,
    /// Main forecast
    Forecast,
    /// Full-history forecast with a fixed horizon
    IntervalForecast,
    /// Past-vs-forecast comparison
    Comparison,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Something a derived value reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    Input(SelectionInput),
    Node(Node),
}

/// Validated, topologically ordered dependency declarations
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    declarations: BTreeMap<Node, Vec<Dependency>>,
    order: Vec<Node>,
}

impl DependencyGraph {
    /// Build a graph, rejecting undeclared dependencies and cycles
    pub fn new<I>(declarations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Node, Vec<Dependency>)>,
    {
        let declarations: BTreeMap<Node, Vec<Dependency>> = declarations.into_iter().collect();

        let mut indegree: BTreeMap<Node, usize> = declarations.keys().map(|n| (*n, 0)).collect();
        for (node, deps) in &declarations {
            for dep in deps {
                if let Dependency::Node(upstream) = dep {
                    if !declarations.contains_key(upstream) {
                        return Err(ForecastError::ValidationError(format!(
                            "{} depends on undeclared value {}",
                            node, upstream
                        )));
                    }
                    *indegree.entry(*node).or_default() += 1;
                }
            }
        }

        let mut ready: BTreeSet<Node> = indegree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| *node)
            .collect();
        let mut order = Vec::with_capacity(declarations.len());

        while let Some(node) = ready.pop_first() {
            order.push(node);
            for (downstream, deps) in &declarations {
                let edges = deps.iter().filter(|d| **d == Dependency::Node(node)).count();
                if edges == 0 {
                    continue;
                }
                let degree = indegree.entry(*downstream).or_default();
                *degree -= edges;
                if *degree == 0 {
                    ready.insert(*downstream);
                }
            }
        }

        if order.len() != declarations.len() {
            let stuck: Vec<String> = declarations
                .keys()
                .filter(|n| !order.contains(n))
                .map(Node::to_string)
                .collect();
            return Err(ForecastError::ValidationError(format!(
                "Dependency cycle between {}",
                stuck.join(", ")
            )));
        }

        Ok(Self {
            declarations,
            order,
        })
    }

    /// The dashboard's derived values and what each one reads
    pub fn dashboard() -> Result<Self> {
        use Dependency::{Input, Node as Derived};

        Self::new([
            (Node::Series, vec![Input(SelectionInput::Store)]),
            (Node::Summary, vec![Derived(Node::Series)]),
            (Node::Distribution, vec![Derived(Node::Series)]),
            (
                Node::Plan,
                vec![
                    Derived(Node::Series),
                    Input(SelectionInput::Mode),
                    Input(SelectionInput::Horizon),
                ],
            ),
            (
                Node::Forecast,
                vec![Derived(Node::Plan), Input(SelectionInput::Confidence)],
            ),
            (
                Node::IntervalForecast,
                vec![Derived(Node::Series), Input(SelectionInput::Confidence)],
            ),
            (
                Node::Comparison,
                vec![
                    Derived(Node::Series),
                    Input(SelectionInput::Confidence),
                    Input(SelectionInput::Comparison),
                ],
            ),
        ])
    }

    /// All values, upstream first
    pub fn topological_order(&self) -> &[Node] {
        &self.order
    }

    /// Declared dependencies of a value
    pub fn dependencies(&self, node: Node) -> &[Dependency] {
        self.declarations
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Values to recompute after `changed` inputs, upstream first
    pub fn affected_by(&self, changed: &BTreeSet<SelectionInput>) -> Vec<Node> {
        let mut dirty = BTreeSet::new();
        for node in &self.order {
            let stale = self.dependencies(*node).iter().any(|dep| match dep {
                Dependency::Input(input) => changed.contains(input),
                Dependency::Node(upstream) => dirty.contains(upstream),
            });
            if stale {
                dirty.insert(*node);
            }
        }

        self.order
            .iter()
            .filter(|node| dirty.contains(*node))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(inputs: &[SelectionInput]) -> BTreeSet<SelectionInput> {
        inputs.iter().copied().collect()
    }

    #[test]
    fn test_dashboard_order() {
        let graph = DependencyGraph::dashboard().unwrap();
        assert_eq!(
            graph.topological_order(),
            &[
                Node::Series,
                Node::Summary,
                Node::Distribution,
                Node::Plan,
                Node::Forecast,
                Node::IntervalForecast,
                Node::Comparison,
            ]
        );
    }

    #[test]
    fn test_store_change_invalidates_everything() {
        let graph = DependencyGraph::dashboard().unwrap();
        let affected = graph.affected_by(&changed(&[SelectionInput::Store]));
        assert_eq!(affected, graph.topological_order());
    }

    #[test]
    fn test_narrow_changes() {
        let graph = DependencyGraph::dashboard().unwrap();

        assert_eq!(
            graph.affected_by(&changed(&[SelectionInput::Horizon])),
            vec![Node::Plan, Node::Forecast]
        );
        assert_eq!(
            graph.affected_by(&changed(&[SelectionInput::Confidence])),
            vec![Node::Forecast, Node::IntervalForecast, Node::Comparison]
        );
        assert_eq!(
            graph.affected_by(&changed(&[SelectionInput::Comparison])),
            vec![Node::Comparison]
        );
        assert!(graph.affected_by(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_cycles_are_rejected() {
        let result = DependencyGraph::new([
            (Node::Plan, vec![Dependency::Node(Node::Forecast)]),
            (Node::Forecast, vec![Dependency::Node(Node::Plan)]),
        ]);
        assert!(matches!(result, Err(ForecastError::ValidationError(_))));
    }

    #[test]
    fn test_undeclared_dependency_is_rejected() {
        let result = DependencyGraph::new([(Node::Forecast, vec![Dependency::Node(Node::Plan)])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_edges_are_counted() {
        let graph = DependencyGraph::new([
            (Node::Series, vec![Dependency::Input(SelectionInput::Store)]),
            (
                Node::Summary,
                vec![Dependency::Node(Node::Series), Dependency::Node(Node::Series)],
            ),
        ])
        .unwrap();
        assert_eq!(graph.topological_order(), &[Node::Series, Node::Summary]);
    }
}

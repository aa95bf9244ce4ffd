//! Table dependency graph.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use super::cycles::{elementary_cycles, shortest_cycle};
use crate::catalog::{Catalog, ForeignKeyDef, QualifiedName, TableDef, TableId};
use crate::config::Deadline;
use crate::error::{CyclicDependency, Result};

/// Directed graph over tables: an edge `A -> B` means A has a foreign key into B
/// (A depends on B).
///
/// Node `i` is the table with [`TableId`] `i`; parallel foreign keys between the
/// same pair of tables become parallel edges. Unresolved foreign keys add no edge.
pub struct DependencyGraph<'a> {
    catalog: &'a Catalog,
    graph: DiGraph<TableId, usize>,
    /// Sorted, deduplicated successors per node.
    dependencies: Vec<Vec<usize>>,
    /// Sorted, deduplicated predecessors per node.
    dependents: Vec<Vec<usize>>,
}

impl<'a> DependencyGraph<'a> {
    /// Build the graph for a catalog.
    pub fn new(catalog: &'a Catalog) -> Self {
        let mut graph = DiGraph::with_capacity(catalog.tables.len(), catalog.foreign_keys.len());
        for table in &catalog.tables {
            graph.add_node(table.id);
        }

        let mut dependencies = vec![Vec::new(); catalog.tables.len()];
        let mut dependents = vec![Vec::new(); catalog.tables.len()];
        for (position, fk) in catalog.foreign_keys.iter().enumerate() {
            if let Some(target) = fk.target {
                graph.add_edge(NodeIndex::new(fk.source.0), NodeIndex::new(target.0), position);
                dependencies[fk.source.0].push(target.0);
                dependents[target.0].push(fk.source.0);
            }
        }
        for list in dependencies.iter_mut().chain(dependents.iter_mut()) {
            list.sort_unstable();
            list.dedup();
        }

        Self {
            catalog,
            graph,
            dependencies,
            dependents,
        }
    }

    /// Number of foreign-key edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Tables that `table` references directly, in declaration order.
    pub fn dependencies_of(&self, table: TableId) -> Vec<&'a TableDef> {
        self.tables(&self.dependencies[table.0])
    }

    /// Tables that reference `table` directly, in declaration order.
    pub fn dependents_of(&self, table: TableId) -> Vec<&'a TableDef> {
        self.tables(&self.dependents[table.0])
    }

    /// Foreign keys running from `from` to `to`.
    pub fn edges_between(&self, from: TableId, to: TableId) -> Vec<&'a ForeignKeyDef> {
        let catalog = self.catalog;
        self.graph
            .edges_connecting(NodeIndex::new(from.0), NodeIndex::new(to.0))
            .map(|edge| &catalog.foreign_keys[*edge.weight()])
            .collect()
    }

    /// Check if a table references itself.
    pub fn is_self_referencing(&self, table: TableId) -> bool {
        let node = NodeIndex::new(table.0);
        self.graph.contains_edge(node, node)
    }

    /// All elementary cycles.
    ///
    /// Strongly connected components come from Tarjan's algorithm; cycles inside
    /// each nontrivial component are enumerated with Johnson's circuit search.
    /// A self-reference is a one-table cycle. Each cycle starts at its earliest
    /// declared table, and cycles are sorted.
    ///
    /// The number of cycles can grow exponentially with the size of a
    /// component; use [`cycles_within`](Self::cycles_within) to bound the work.
    pub fn cycles(&self) -> Vec<Vec<TableId>> {
        // Without a deadline enumeration cannot fail.
        self.enumerate_cycles(None).unwrap_or_default()
    }

    /// [`cycles`](Self::cycles), abandoned with
    /// [`Error::DeadlineExceeded`](crate::Error::DeadlineExceeded) once `deadline` passes.
    pub fn cycles_within(&self, deadline: &Deadline) -> Result<Vec<Vec<TableId>>> {
        self.enumerate_cycles(Some(deadline))
    }

    fn enumerate_cycles(&self, deadline: Option<&Deadline>) -> Result<Vec<Vec<TableId>>> {
        let mut cycles = Vec::new();
        for component in self.cyclic_components() {
            cycles.extend(elementary_cycles(&self.dependencies, &component, deadline)?);
        }
        cycles.sort();
        Ok(cycles
            .into_iter()
            .map(|cycle| cycle.into_iter().map(TableId).collect())
            .collect())
    }

    /// Check if the graph has any cycle, self-references included.
    pub fn has_cycles(&self) -> bool {
        !self.cyclic_components().is_empty()
    }

    /// Tables in dependency order: each table after every table it references.
    ///
    /// The returned iterator is lazy and independent of any earlier call. Ties
    /// are broken by declaration order. Fails with the cycle through the
    /// earliest declared cyclic table when the graph is not acyclic.
    pub fn topological_order(&self) -> Result<TopologicalOrder<'a>, CyclicDependency> {
        let components = self.cyclic_components();
        let first = components
            .iter()
            .min_by_key(|component| component.iter().min().copied());
        if let Some(cycle) = first.and_then(|c| shortest_cycle(&self.dependencies, c)) {
            return Err(CyclicDependency {
                cycle: cycle
                    .into_iter()
                    .map(|i| self.catalog.tables[i].name.clone())
                    .collect(),
            });
        }
        Ok(TopologicalOrder::new(
            self.catalog,
            &self.dependencies,
            self.dependents.clone(),
        ))
    }

    /// Strongly connected components, dependencies first.
    ///
    /// Works on cyclic graphs too: tables on a common cycle share a component.
    /// Tables within a component are in declaration order.
    pub fn component_order(&self) -> Vec<Vec<TableId>> {
        // tarjan_scc yields components in reverse topological order of the
        // edge direction, which puts referenced tables first.
        tarjan_scc(&self.graph)
            .into_iter()
            .map(|component| {
                let mut ids: Vec<TableId> = component.into_iter().map(|n| TableId(n.index())).collect();
                ids.sort_unstable();
                ids
            })
            .collect()
    }

    /// A safe deletion order: referencing tables before the tables they reference.
    pub fn deletion_order(&self) -> Vec<TableId> {
        self.component_order().into_iter().rev().flatten().collect()
    }

    fn cyclic_components(&self) -> Vec<Vec<usize>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .map(|component| component.into_iter().map(NodeIndex::index).collect::<Vec<_>>())
            .filter(|component| {
                component.len() > 1 || self.dependencies[component[0]].contains(&component[0])
            })
            .collect()
    }

    fn tables(&self, positions: &[usize]) -> Vec<&'a TableDef> {
        positions.iter().map(|&i| &self.catalog.tables[i]).collect()
    }
}

/// Lazy topological walk produced by [`DependencyGraph::topological_order`].
pub struct TopologicalOrder<'a> {
    catalog: &'a Catalog,
    dependents: Vec<Vec<usize>>,
    unmet: Vec<usize>,
    ready: BinaryHeap<Reverse<usize>>,
    remaining: usize,
}

impl<'a> TopologicalOrder<'a> {
    fn new(catalog: &'a Catalog, dependencies: &[Vec<usize>], dependents: Vec<Vec<usize>>) -> Self {
        let unmet: Vec<usize> = dependencies.iter().map(Vec::len).collect();
        let ready = unmet
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(i, _)| Reverse(i))
            .collect();
        Self {
            catalog,
            dependents,
            remaining: unmet.len(),
            unmet,
            ready,
        }
    }

    /// Collect the remaining order as qualified names.
    pub fn names(self) -> Vec<QualifiedName> {
        self.map(|t| t.name.clone()).collect()
    }
}

impl<'a> Iterator for TopologicalOrder<'a> {
    type Item = &'a TableDef;

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse(node) = self.ready.pop()?;
        for &dependent in &self.dependents[node] {
            self.unmet[dependent] -= 1;
            if self.unmet[dependent] == 0 {
                self.ready.push(Reverse(dependent));
            }
        }
        self.remaining -= 1;
        Some(&self.catalog.tables[node])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for TopologicalOrder<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::error::Error;
    use crate::loader::MetadataDocument;
    use serde_json::{json, Value};
    use std::time::Duration;

    /// Builds a catalog from `(table, [(column, referenced table)])` pairs in schema `app`.
    fn catalog(tables: &[(&str, &[(&str, &str)])]) -> Catalog {
        let mut names = Vec::new();
        let mut columns = serde_json::Map::new();
        let mut foreign_keys = serde_json::Map::new();
        for (table, fks) in tables {
            names.push(Value::from(*table));
            let mut cols = serde_json::Map::new();
            cols.insert(
                "id".into(),
                json!({ "type": "int", "nullable": false, "is_primary_key": true }),
            );
            let mut records = Vec::new();
            for (column, target) in fks.iter() {
                cols.insert(
                    (*column).into(),
                    json!({ "type": "int", "nullable": false, "is_foreign_key": true }),
                );
                records.push(json!({ "column": column, "referenced_table": target, "referenced_column": "id" }));
            }
            columns.insert((*table).into(), Value::Object(cols));
            foreign_keys.insert((*table).into(), Value::Array(records));
        }
        let value = json!({
            "version": "test",
            "tables": { "app": names },
            "columns": { "app": columns },
            "indexes": {},
            "foreign_keys": { "app": foreign_keys }
        });
        build(&MetadataDocument::from_value(&value).unwrap()).unwrap()
    }

    fn names(tables: &[&TableDef]) -> Vec<String> {
        tables.iter().map(|t| t.name.table.clone()).collect()
    }

    #[test]
    fn test_topological_order_respects_edges() {
        let catalog = catalog(&[
            ("order_items", &[("order_id", "app.orders"), ("product_id", "app.products")]),
            ("orders", &[("customer_id", "app.customers")]),
            ("products", &[]),
            ("customers", &[]),
        ]);
        let graph = catalog.dependency_graph();

        let order: Vec<&TableDef> = graph.topological_order().unwrap().collect();
        assert_eq!(names(&order), vec!["products", "customers", "orders", "order_items"]);

        let position = |id: TableId| order.iter().position(|t| t.id == id).unwrap();
        for fk in catalog.foreign_keys() {
            assert!(position(fk.target.unwrap()) < position(fk.source));
        }
    }

    #[test]
    fn test_topological_order_is_restartable() {
        let catalog = catalog(&[("b", &[("a_id", "app.a")]), ("a", &[])]);
        let graph = catalog.dependency_graph();

        let mut first = graph.topological_order().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.next().unwrap().name.table, "a");

        let second = graph.topological_order().unwrap().names();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].table, "a");
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let catalog = catalog(&[("staffs", &[("manager_id", "app.staffs")]), ("stores", &[])]);
        let graph = catalog.dependency_graph();
        let staffs = catalog.table_id("app.staffs").unwrap();

        assert!(graph.is_self_referencing(staffs));
        assert_eq!(graph.cycles(), vec![vec![staffs]]);

        let err = graph.topological_order().err().unwrap();
        assert!(err.is_self_reference());
        assert_eq!(err.cycle, vec![QualifiedName::new("app", "staffs")]);

        assert_eq!(names(&graph.dependents_of(staffs)), vec!["staffs"]);
        assert_eq!(names(&graph.dependencies_of(staffs)), vec!["staffs"]);
    }

    #[test]
    fn test_multi_table_cycle() {
        let catalog = catalog(&[
            ("a", &[("b_id", "app.b")]),
            ("b", &[("c_id", "app.c")]),
            ("c", &[("a_id", "app.a")]),
            ("d", &[("a_id", "app.a")]),
        ]);
        let graph = catalog.dependency_graph();

        let cycles = graph.cycles();
        assert_eq!(cycles, vec![vec![TableId(0), TableId(1), TableId(2)]]);

        let err = graph.topological_order().err().unwrap();
        let tables: Vec<&str> = err.cycle.iter().map(|n| n.table.as_str()).collect();
        assert_eq!(tables, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cycles_within_deadline() {
        let catalog = catalog(&[
            ("a", &[("b_id", "app.b")]),
            ("b", &[("a_id", "app.a")]),
            ("c", &[]),
        ]);
        let graph = catalog.dependency_graph();

        let generous = Deadline::new(Duration::from_secs(60));
        assert_eq!(graph.cycles_within(&generous).unwrap(), graph.cycles());

        let expired = Deadline::new(Duration::ZERO);
        assert!(matches!(
            graph.cycles_within(&expired),
            Err(Error::DeadlineExceeded { .. })
        ));
    }

    #[test]
    fn test_component_and_deletion_order() {
        let catalog = catalog(&[
            ("a", &[("b_id", "app.b")]),
            ("b", &[("a_id", "app.a")]),
            ("c", &[("a_id", "app.a")]),
            ("root", &[]),
        ]);
        let graph = catalog.dependency_graph();

        let components = graph.component_order();
        let position = |id: TableId| components.iter().position(|c| c.contains(&id)).unwrap();
        assert!(components.contains(&vec![TableId(0), TableId(1)]));
        assert!(position(TableId(0)) < position(TableId(2)));

        let deletion = graph.deletion_order();
        let c = deletion.iter().position(|id| *id == TableId(2)).unwrap();
        let a = deletion.iter().position(|id| *id == TableId(0)).unwrap();
        assert!(c < a);
        assert_eq!(deletion.len(), 4);
    }

    #[test]
    fn test_parallel_edges_and_neighbors() {
        let catalog = catalog(&[
            ("orders", &[("billing_id", "app.addresses"), ("shipping_id", "app.addresses")]),
            ("addresses", &[]),
            ("returns", &[("order_id", "app.orders")]),
        ]);
        let graph = catalog.dependency_graph();
        let orders = catalog.table_id("app.orders").unwrap();
        let addresses = catalog.table_id("app.addresses").unwrap();

        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.edges_between(orders, addresses).len(), 2);
        assert_eq!(names(&graph.dependencies_of(orders)), vec!["addresses"]);
        assert_eq!(names(&graph.dependents_of(addresses)), vec!["orders"]);
        assert_eq!(names(&graph.dependents_of(orders)), vec!["returns"]);
        assert!(!graph.has_cycles());
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_unresolved_edges_ignored() {
        let catalog = catalog(&[("orders", &[("staff_id", "hr.staffs")])]);
        let graph = catalog.dependency_graph();

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.topological_order().unwrap().count(), 1);
    }
}

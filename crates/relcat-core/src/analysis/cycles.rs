//! Elementary cycle enumeration.
//!
//! Johnson's circuit search, run once per start node inside a strongly
//! connected component. Each cycle is reported once, rotated so that its
//! smallest node comes first.
//!
//! A dense component can hold exponentially many cycles, so the search polls
//! an optional [`Deadline`] on every step and stops once it has passed.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::config::Deadline;
use crate::error::Result;

/// Enumerate the elementary cycles of one strongly connected component.
///
/// `adjacency[v]` lists the successors of `v` over the whole graph; edges
/// leaving the component are ignored.
pub(crate) fn elementary_cycles(
    adjacency: &[Vec<usize>],
    component: &[usize],
    deadline: Option<&Deadline>,
) -> Result<Vec<Vec<usize>>> {
    let members: BTreeSet<usize> = component.iter().copied().collect();
    let mut cycles = Vec::new();

    for &start in &members {
        let mut search = CircuitSearch {
            start,
            adjacency,
            members: &members,
            deadline,
            expired: false,
            blocked: HashSet::new(),
            blocked_by: HashMap::new(),
            stack: Vec::new(),
            cycles: &mut cycles,
        };
        search.circuit(start);
        if search.expired {
            break;
        }
    }

    if let Some(deadline) = deadline {
        deadline.check()?;
    }
    Ok(cycles)
}

/// Find one cycle through the smallest node of a component, preferring the shortest.
pub(crate) fn shortest_cycle(adjacency: &[Vec<usize>], component: &[usize]) -> Option<Vec<usize>> {
    let members: BTreeSet<usize> = component.iter().copied().collect();
    let start = *members.first()?;

    let mut parent: HashMap<usize, usize> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        for &next in &adjacency[node] {
            if !members.contains(&next) {
                continue;
            }
            if next == start {
                let mut cycle = vec![node];
                let mut current = node;
                while current != start {
                    current = parent[&current];
                    cycle.push(current);
                }
                cycle.reverse();
                return Some(cycle);
            }
            if !parent.contains_key(&next) {
                parent.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    None
}

struct CircuitSearch<'a> {
    start: usize,
    adjacency: &'a [Vec<usize>],
    members: &'a BTreeSet<usize>,
    deadline: Option<&'a Deadline>,
    /// Set once the deadline has passed; unwinds the search.
    expired: bool,
    blocked: HashSet<usize>,
    blocked_by: HashMap<usize, HashSet<usize>>,
    stack: Vec<usize>,
    cycles: &'a mut Vec<Vec<usize>>,
}

impl CircuitSearch<'_> {
    /// Nodes below `start` were already used as starts and are excluded.
    fn successors(&self, node: usize) -> Vec<usize> {
        self.adjacency[node]
            .iter()
            .copied()
            .filter(|n| *n >= self.start && self.members.contains(n))
            .collect()
    }

    fn circuit(&mut self, node: usize) -> bool {
        if self.deadline.is_some_and(Deadline::is_expired) {
            self.expired = true;
        }
        if self.expired {
            return false;
        }

        let mut found = false;
        self.stack.push(node);
        self.blocked.insert(node);

        for next in self.successors(node) {
            if self.expired {
                break;
            }
            if next == self.start {
                self.cycles.push(self.stack.clone());
                found = true;
            } else if !self.blocked.contains(&next) && self.circuit(next) {
                found = true;
            }
        }

        if found {
            self.unblock(node);
        } else {
            for next in self.successors(node) {
                self.blocked_by.entry(next).or_default().insert(node);
            }
        }

        self.stack.pop();
        found
    }

    fn unblock(&mut self, node: usize) {
        self.blocked.remove(&node);
        if let Some(waiting) = self.blocked_by.remove(&node) {
            for other in waiting {
                if self.blocked.contains(&other) {
                    self.unblock(other);
                }
            }
        }
    }
}

//! # Recipe Dependency Graph
//!
//! Base recipes can be components of other recipes, which makes the
//! catalog a directed graph. Historically nothing guarded that graph
//! against cycles, and a cyclic catalog turns cascade propagation into an
//! infinite loop. Two guards close that:
//!
//! 1. The save path rejects item lists that would introduce a cycle
//!    ([`would_cycle`], checked before anything is written).
//! 2. The propagator additionally bounds depth and tracks visited recipes,
//!    so even pre-existing cyclic data cannot loop it.

use std::collections::{HashMap, HashSet};

/// True when `target` is reachable from `start` by following edges.
///
/// Iterative DFS; tolerates nodes missing from the edge map (leaves) and
/// cyclic input (the visited set terminates it).
pub fn reaches(edges: &HashMap<String, Vec<String>>, start: &str, target: &str) -> bool {
    if start == target {
        return true;
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![start];

    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        if node == target {
            return true;
        }
        if let Some(next) = edges.get(node) {
            stack.extend(next.iter().map(String::as_str));
        }
    }

    false
}

/// Checks whether pointing `recipe_id` at `component_ids` would make the
/// recipe graph cyclic.
///
/// ## Arguments
/// * `edges` - current recipe → base-recipe references, `recipe_id`'s own
///   outgoing edges excluded (they are being replaced by this save)
/// * `component_ids` - the recipe-kind components about to be saved
pub fn would_cycle(
    edges: &HashMap<String, Vec<String>>,
    recipe_id: &str,
    component_ids: &[String],
) -> bool {
    component_ids
        .iter()
        .any(|component| component == recipe_id || reaches(edges, component, recipe_id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(pairs: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        let mut edges: HashMap<String, Vec<String>> = HashMap::new();
        for (from, to) in pairs {
            edges
                .entry((*from).to_string())
                .or_default()
                .push((*to).to_string());
        }
        edges
    }

    #[test]
    fn test_reaches_direct_and_transitive() {
        let edges = graph(&[("cake", "cream"), ("cream", "custard")]);

        assert!(reaches(&edges, "cake", "custard"));
        assert!(reaches(&edges, "cream", "custard"));
        assert!(!reaches(&edges, "custard", "cake"));
    }

    #[test]
    fn test_reaches_tolerates_cycles() {
        let edges = graph(&[("a", "b"), ("b", "a")]);
        assert!(reaches(&edges, "a", "b"));
        assert!(!reaches(&edges, "a", "c"));
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let edges = HashMap::new();
        assert!(would_cycle(&edges, "cake", &["cake".to_string()]));
    }

    #[test]
    fn test_two_step_cycle_detected() {
        // cream already uses custard; making custard use cream closes a loop
        let edges = graph(&[("cream", "custard")]);
        assert!(would_cycle(&edges, "custard", &["cream".to_string()]));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        // two recipes sharing a base is fine
        let edges = graph(&[("cake", "cream"), ("pie", "cream")]);
        assert!(!would_cycle(&edges, "tart", &["cream".to_string()]));
        assert!(!would_cycle(
            &edges,
            "cake",
            &["cream".to_string(), "dough".to_string()]
        ));
    }
}

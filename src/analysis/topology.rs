use crate::store::Registry;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Edges point from a node to each name its strategies need.
///
/// Needs that are not registered nodes appear as leaves (they can only be
/// supplied as characteristics).
pub fn dependency_graph(registry: &Registry) -> DiGraphMap<&str, ()> {
    let mut graph = DiGraphMap::new();
    for node in registry.nodes() {
        graph.add_node(node.name());
        for strategy in node.strategies() {
            for need in strategy.need_names() {
                graph.add_edge(node.name(), need.as_str(), ());
            }
        }
    }
    graph
}

/// Every cycle among registered nodes, each reported as a closed path (`a -> b -> a`).
///
/// A cycle here is only hit at request time if characteristics do not break it,
/// but no request should be able to reach one.
pub fn find_cycles(registry: &Registry) -> Vec<Vec<String>> {
    let graph = dependency_graph(registry);
    let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| cycle_path(&graph, &scc))
        .collect();
    cycles.sort();
    cycles
}

/// One concrete loop through a strongly connected component, starting at its smallest name.
///
/// Depth-first search from the start, remembering each member's parent, until a
/// member with an edge back to the start is reached.
fn cycle_path(graph: &DiGraphMap<&str, ()>, scc: &[&str]) -> Vec<String> {
    let members: HashSet<&str> = scc.iter().copied().collect();
    let Some(&start) = scc.iter().min() else { return Vec::new() };

    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut visited = HashSet::from([start]);
    let mut stack = vec![start];

    while let Some(current) = stack.pop() {
        let mut next: Vec<&str> = graph.neighbors(current).filter(|n| members.contains(n)).collect();
        next.sort_unstable();

        if next.contains(&start) {
            let mut path = vec![current];
            let mut at = current;
            while let Some(&p) = parent.get(at) {
                path.push(p);
                at = p;
            }
            path.reverse();
            path.push(start);
            return path.into_iter().map(String::from).collect();
        }
        for n in next.into_iter().rev() {
            if visited.insert(n) {
                parent.insert(n, current);
                stack.push(n);
            }
        }
    }
    Vec::new()
}

/// All names `name` can transitively depend on (excluding itself unless it is on a cycle).
pub fn upstream_of(registry: &Registry, name: &str) -> BTreeSet<String> {
    let graph = dependency_graph(registry);
    let mut found = BTreeSet::new();
    if !graph.contains_node(name) {
        return found;
    }

    let mut dfs = Dfs::new(&graph, name);
    while let Some(n) = dfs.next(&graph) {
        if n != name || graph.contains_edge(name, name) {
            found.insert(n.to_string());
        }
    }
    found
}

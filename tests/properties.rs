use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use petgraph::stable_graph::NodeIndex;
use proptest::prelude::*;

use stacklimit::analysis::calculate_stack;
use stacklimit::graph::CallGraph;
use stacklimit::Config;


/// Sizes of the functions and the calls between them. Calls only go to
/// functions with a higher index, so the graph has no cycles.
fn call_dag() -> impl Strategy<Value = (Vec<u64>, Vec<(usize, usize)>)>
{
    prop::collection::vec(0u64..512, 1..16).prop_flat_map(|sizes| {
        let n = sizes.len();
        let calls = prop::collection::vec((0..n, 0..n), 0..3 * n).prop_map(|pairs| {
            pairs
                .into_iter()
                .filter(|(a, b)| a < b)
                .collect::<Vec<_>>()
        });
        (Just(sizes), calls)
    })
}

fn build(sizes: &[u64], calls: &[(usize, usize)]) -> (CallGraph, Vec<NodeIndex>)
{
    let mut graph = CallGraph::new();
    let nodes: Vec<_> = sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| {
            let ix = graph.add_function(0x1000 + 0x10 * i as u64, &format!("f{}", i));
            graph[ix].size = size;
            graph[ix].section = Some(".text".to_string());
            ix
        })
        .collect();

    for &(caller, callee) in calls
    {
        graph.add_call(nodes[caller], nodes[callee]);
    }
    (graph, nodes)
}

/// Deepest chain below every function, evaluated in reverse topological
/// order on a graph of its own.
fn expected_totals(sizes: &[u64], calls: &[(usize, usize)]) -> Vec<u64>
{
    let mut dag: DiGraph<u64, ()> = DiGraph::new();
    let nodes: Vec<_> = sizes.iter().map(|&size| dag.add_node(size)).collect();
    for &(caller, callee) in calls
    {
        dag.update_edge(nodes[caller], nodes[callee], ());
    }

    let order = toposort(&dag, None).expect("calls only go to higher indices");
    let mut totals = vec![0u64; sizes.len()];
    for ix in order.into_iter().rev()
    {
        let deepest = dag.neighbors(ix).map(|callee| totals[callee.index()]).max().unwrap_or(0);
        totals[ix.index()] = dag[ix] + deepest;
    }
    totals
}


proptest!
{
    #[test]
    fn totals_are_the_deepest_call_chain((sizes, calls) in call_dag())
    {
        let (mut graph, nodes) = build(&sizes, &calls);
        let verdict = calculate_stack(&mut graph, &Config::quiet());

        let expected = expected_totals(&sizes, &calls);
        for (i, &ix) in nodes.iter().enumerate()
        {
            prop_assert_eq!(graph[ix].total, expected[i], "f{}", i);
            prop_assert!(!graph[ix].imprecise);
            prop_assert!(!graph[ix].cycle);
        }

        prop_assert!(verdict.precise);
        prop_assert!(verdict.cycles.is_empty());
        prop_assert_eq!(verdict.limit, expected.iter().copied().max().unwrap_or(0));
    }

    #[test]
    fn leaves_only_count_themselves((sizes, calls) in call_dag())
    {
        let (mut graph, nodes) = build(&sizes, &calls);
        calculate_stack(&mut graph, &Config::quiet());

        for &ix in &nodes
        {
            if graph.calls(ix).is_empty()
            {
                prop_assert_eq!(graph[ix].total, graph[ix].size);
            }
            prop_assert!(graph[ix].total >= graph[ix].size);
        }
    }

    #[test]
    fn a_pointer_call_taints_every_caller((sizes, calls) in call_dag(), pick in any::<prop::sample::Index>())
    {
        let (mut graph, nodes) = build(&sizes, &calls);
        let tainted = pick.index(nodes.len());
        let pointer = graph.pointer();
        graph.add_call(nodes[tainted], pointer);

        let verdict = calculate_stack(&mut graph, &Config::quiet());

        // everything that reaches the tainted function is imprecise
        let mut reaches = vec![false; nodes.len()];
        reaches[tainted] = true;
        for i in (0..nodes.len()).rev()
        {
            if calls.iter().any(|&(caller, callee)| caller == i && reaches[callee])
            {
                reaches[i] = true;
            }
        }

        for (i, &ix) in nodes.iter().enumerate()
        {
            prop_assert_eq!(graph[ix].imprecise, reaches[i], "f{}", i);
        }
        prop_assert!(!verdict.precise);
    }
}

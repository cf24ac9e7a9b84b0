//! Worst-case stack usage of every function of a [`CallGraph`].
//!
//! The graph is walked with a [`Visitor`] so deep or recursive call chains
//! don't grow the native stack. A function's `total` is computed once all
//! its callees are done; dynamic stack operations, calls through function
//! pointers and recursion make the whole call chain leading to them
//! imprecise.

use std::collections::VecDeque;

use log::{debug, warn};
use petgraph::{algo, stable_graph::NodeIndex};

use crate::config::Config;
use crate::graph::CallGraph;
use crate::visitor::Visitor;


/// Result of a stack calculation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verdict
{
    /// No entrance ended up imprecise.
    pub precise:    bool,
    /// The largest `total` of all functions.
    pub limit:      u64,
    /// Strongly connected components with at least one call inside,
    /// ordered by address.
    pub cycles:     Vec<Vec<NodeIndex>>,
}


/// Which kind of warning was already shown when they are only shown once.
#[derive(Clone, Copy, Debug, Default)]
struct Warned
{
    dynamic:    bool,
    pointer:    bool,
    cycle:      bool,
}


struct Analysis<'g, 'c>
{
    graph:      &'g mut CallGraph,
    config:     &'c Config,
    warned:     Warned,
}


/// Compute `total`, `imprecise` and `cycle` of every function.
pub fn calculate_stack(graph: &mut CallGraph, config: &Config) -> Verdict
{
    let entrances = graph.entrances();

    let mut analysis = Analysis { graph, config, warned: Warned::default() };
    analysis.walk(&entrances);

    // functions only reachable through a cycle
    let rest: Vec<NodeIndex> = analysis.graph.functions().collect();
    for ix in rest
    {
        if !analysis.graph[ix].visited
        {
            analysis.walk(&[ix]);
        }
    }

    let cycles = analysis.mark_cycles();
    analysis.propagate_imprecision();

    let graph = analysis.graph;
    Verdict
    {
        precise:    entrances.iter().all(|&ix| !graph[ix].imprecise),
        limit:      graph.stack_limit(),
        cycles,
    }
}


impl<'g, 'c> Analysis<'g, 'c>
{
    fn walk(&mut self, roots: &[NodeIndex])
    {
        let mut visitor = Visitor::new(roots);

        while visitor.down(self.graph).is_some()
        {
            self.handle_node(&visitor);

            if visitor.up(self.graph).is_none()
            {
                break;
            }
        }
    }

    /// Whether dynamic stack operations and function pointers of `ix`
    /// are reported.
    fn regard_function(&self, ix: NodeIndex) -> bool
    {
        if self.graph.is_pointer(ix)
        {
            return false;
        }
        self.config.regards(&self.graph[ix])
    }

    fn handle_node(&mut self, visitor: &Visitor)
    {
        let tail = match visitor.tail()
        {
            Some(tail) => tail,
            None       => return,
        };

        // the duplicate frame closing a cycle is never computed
        if let Some(start) = visitor.cycle_start()
        {
            self.handle_cycle(visitor.path(), start);
            return;
        }

        if self.graph[tail].visited
        {
            return;
        }

        if self.regard_function(tail)
        {
            if self.graph[tail].dynamic
            {
                self.handle_dynamic(visitor.path());
            }
            if self.graph.calls_pointer(tail)
            {
                self.handle_function_pointer(visitor.path());
            }
        }

        self.graph[tail].visited = true;
        if self.graph.is_pointer(tail)
        {
            return;
        }

        let callees: Vec<NodeIndex> = self
            .graph
            .calls(tail)
            .into_iter()
            .filter(|&ix| !self.graph.is_pointer(ix))
            .collect();

        let deepest = callees.iter().map(|&ix| self.graph[ix].total).max().unwrap_or(0);
        let inherited = callees.iter().any(|&ix| self.graph[ix].imprecise);

        let function = &mut self.graph[tail];
        function.total = function.size + deepest;
        function.imprecise |= inherited;
    }

    /// The whole path, tail included, depends on an unknown value.
    fn mark_path_imprecise(&mut self, path: &[NodeIndex])
    {
        for &ix in path
        {
            self.graph[ix].imprecise = true;
        }
    }

    fn handle_dynamic(&mut self, path: &[NodeIndex])
    {
        self.mark_path_imprecise(path);

        if !self.config.warn_dynamic
        {
            return;
        }
        if self.config.multiple_warn
        {
            if let Some(&tail) = path.last()
            {
                warn!("Dynamic stack operation in {}", self.graph[tail].name);
            }
        }
        else if !self.warned.dynamic
        {
            self.warned.dynamic = true;
            warn!("Found dynamic stack operations");
        }
    }

    fn handle_function_pointer(&mut self, path: &[NodeIndex])
    {
        self.mark_path_imprecise(path);

        if !self.config.warn_pointer
        {
            return;
        }
        if self.config.multiple_warn
        {
            if let Some(&tail) = path.last()
            {
                warn!("Function pointer call in {}", self.graph[tail].name);
            }
        }
        else if !self.warned.pointer
        {
            self.warned.pointer = true;
            warn!("Found function pointers");
        }
    }

    /// `path[start]` and the tail are the same function.
    fn handle_cycle(&mut self, path: &[NodeIndex], start: usize)
    {
        let end = path.len() - 1;

        for &ix in &path[..start]
        {
            self.graph[ix].imprecise = true;
        }
        for &ix in &path[start..end]
        {
            let function = &mut self.graph[ix];
            function.imprecise = true;
            function.cycle = true;
        }

        let names: Vec<&str> = path.iter().map(|&ix| self.graph[ix].name.as_str()).collect();
        debug!("Cycle in call path: {}", names.join(" -> "));

        if !self.config.warn_cycle
        {
            return;
        }
        if self.config.multiple_warn
        {
            warn!("Cycle in call graph: {}", names[start..].join(" -> "));
        }
        else if !self.warned.cycle
        {
            self.warned.cycle = true;
            warn!("Found cycles in call graph");
        }
    }

    ///
    /// Mark every function of a strongly connected component. This catches
    /// cycles the walk only touched through an already finished function.
    ///
    fn mark_cycles(&mut self) -> Vec<Vec<NodeIndex>>
    {
        let graph: &CallGraph = self.graph;

        let mut cycles: Vec<Vec<NodeIndex>> = algo::kosaraju_scc(&graph.g)
            .into_iter()
            .filter(|scc| match scc.as_slice()
            {
                [single] => graph.g.find_edge(*single, *single).is_some(),
                _        => true,
            })
            .collect();

        for scc in cycles.iter_mut()
        {
            scc.sort_by_key(|&ix| graph[ix].address);
        }
        cycles.sort_by_key(|scc| scc.first().map(|&ix| graph[ix].address));

        for &ix in cycles.iter().flatten()
        {
            let function = &mut self.graph[ix];
            function.cycle = true;
            function.imprecise = true;
        }
        cycles
    }

    /// Every caller of an imprecise function is imprecise.
    fn propagate_imprecision(&mut self)
    {
        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .functions()
            .filter(|&ix| self.graph[ix].imprecise)
            .collect();

        while let Some(ix) = queue.pop_front()
        {
            for caller in self.graph.callers(ix)
            {
                if !self.graph[caller].imprecise
                {
                    self.graph[caller].imprecise = true;
                    queue.push_back(caller);
                }
            }
        }
    }
}

use std::collections::HashMap;

use petgraph::stable_graph::NodeIndex;

use crate::graph::CallGraph;


///
/// Explicit depth first walk over a [`CallGraph`].
///
/// `path` is the chain of calls from a root down to the function being
/// processed. `pending[tier]` holds the siblings of `path[tier]` that are
/// still to be explored once the walk comes back to that depth; the
/// siblings of the root are the other roots.
///
/// A call back into a function already on `path` is appended once more.
/// That duplicate entry closes the cycle and the walk doesn't descend any
/// further from it.
///
#[derive(Clone, Debug, Default)]
pub struct Visitor
{
    path:       Vec<NodeIndex>,
    pending:    Vec<Vec<NodeIndex>>,

    /// First position of every function on `path`.
    on_path:    HashMap<NodeIndex, usize>,

    /// The tail was reached by backtracking, its children are done.
    returned:   bool,
}

impl Visitor
{
    /// A walk starting at the first root, the others follow in order.
    pub fn new(roots: &[NodeIndex]) -> Self
    {
        let mut visitor = Visitor::default();

        if let Some((first, rest)) = roots.split_first()
        {
            visitor.push(*first, rest.iter().rev().copied().collect());
        }
        visitor
    }

    pub fn path(&self) -> &[NodeIndex]
    {
        &self.path
    }

    pub fn tail(&self) -> Option<NodeIndex>
    {
        self.path.last().copied()
    }

    /// Where the cycle closed by the tail starts, `None` if the tail is not
    /// a duplicate.
    pub fn cycle_start(&self) -> Option<usize>
    {
        let tail = self.tail()?;
        let start = *self.on_path.get(&tail)?;
        (start + 1 < self.path.len()).then_some(start)
    }

    pub fn is_cycle_closing(&self) -> bool
    {
        self.cycle_start().is_some()
    }

    fn push(&mut self, node: NodeIndex, siblings: Vec<NodeIndex>)
    {
        self.on_path.entry(node).or_insert(self.path.len());
        self.path.push(node);
        self.pending.push(siblings);
    }

    fn pop(&mut self) -> Option<(NodeIndex, Vec<NodeIndex>)>
    {
        let node = self.path.pop()?;
        let siblings = self.pending.pop().unwrap_or_default();

        if self.on_path.get(&node) == Some(&self.path.len())
        {
            self.on_path.remove(&node);
        }
        Some((node, siblings))
    }

    ///
    /// Descend from the tail into unvisited callees, the one found last
    /// first, until a function without unvisited callees or a cycle is
    /// reached.
    ///
    /// Returns the new tail.
    ///
    pub fn down(&mut self, graph: &CallGraph) -> Option<NodeIndex>
    {
        if std::mem::take(&mut self.returned)
        {
            return self.tail();
        }

        loop
        {
            let tail = self.tail()?;
            if graph[tail].visited || self.is_cycle_closing()
            {
                return Some(tail);
            }

            let mut children: Vec<NodeIndex> = graph
                .calls(tail)
                .into_iter()
                .filter(|&child| !graph[child].visited)
                .collect();

            match children.pop()
            {
                Some(child) => self.push(child, children),
                None        => return Some(tail),
            }
        }
    }

    ///
    /// Drop the tail and move on to its next unvisited sibling. Without
    /// one the walk returns to the parent.
    ///
    /// Returns the new tail, `None` once every root is done.
    ///
    pub fn up(&mut self, graph: &CallGraph) -> Option<NodeIndex>
    {
        let (_, mut siblings) = self.pop()?;

        while let Some(next) = siblings.pop()
        {
            if !graph[next].visited
            {
                self.push(next, siblings);
                return Some(next);
            }
        }

        let tail = self.tail();
        self.returned = tail.is_some();
        tail
    }
}

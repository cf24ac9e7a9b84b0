use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

use petgraph::{
    stable_graph::{NodeIndex, StableDiGraph},
    Direction,
};

use crate::Max;


/// Names longer than this are cut and end in `...`.
pub const MAX_NAME_LEN: usize = 64;

/// Name of the node standing in for every indirect call target.
pub const FUNCTION_POINTER: &str = "Function Pointer";


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function
{
    pub address:    u64,
    pub name:       String,
    pub file:       Option<String>,
    pub section:    Option<String>,

    /// Bytes pushed or reserved by the function's own instructions.
    pub size:       u64,
    /// Worst case of `size` plus the deepest callee.
    pub total:      u64,

    pub dynamic:    bool,
    /// `total` may understate the real usage.
    pub imprecise:  bool,
    pub cycle:      bool,
    pub visited:    bool,

    /// Stands for every indirect call target; see [`CallGraph::pointer`].
    pub pointer:    bool,
}

impl Function
{
    pub fn new(address: u64, name: &str) -> Self
    {
        Function
        {
            address,
            name:       truncate_name(name),
            file:       None,
            section:    None,
            size:       0,
            total:      0,
            dynamic:    false,
            imprecise:  false,
            cycle:      false,
            visited:    false,
            pointer:    false,
        }
    }

    /// A call target with no symbol, named after its address.
    pub fn unnamed(address: u64) -> Self
    {
        Function::new(address, &address_name(address))
    }

    /// Still named after its address.
    pub fn is_unnamed(&self) -> bool
    {
        self.name == address_name(self.address)
    }

    pub fn rename(&mut self, name: &str)
    {
        self.name = truncate_name(name);
    }

    pub fn max(&self) -> Max
    {
        Max::new(self.total, self.imprecise)
    }
}

fn address_name(address: u64) -> String
{
    format!("{:#x}", address)
}

fn truncate_name(name: &str) -> String
{
    if name.chars().count() > MAX_NAME_LEN
    {
        let mut short: String = name.chars().take(MAX_NAME_LEN - 3).collect();
        short.push_str("...");
        short
    }
    else
    {
        name.to_string()
    }
}




///
/// The function table: every function of a listing by start address,
/// plus the call edges between them.
///
/// Indirect calls all lead to one extra node, the function pointer, which
/// isn't part of the address index. A label at address `0` therefore is an
/// ordinary function.
///
#[derive(Clone, Debug)]
pub struct CallGraph
{
    pub g:          StableDiGraph<Function, ()>,
    indices:        BTreeMap<u64, NodeIndex>,
    pointer:        NodeIndex,
}

impl Default for CallGraph
{
    fn default() -> Self
    {
        CallGraph::new()
    }
}

impl CallGraph
{
    pub fn new() -> Self
    {
        let mut g = StableDiGraph::new();
        let mut sentinel = Function::new(0, FUNCTION_POINTER);
        sentinel.pointer = true;
        let pointer = g.add_node(sentinel);

        CallGraph { g, indices: BTreeMap::new(), pointer }
    }

    /// The function pointer node.
    pub fn pointer(&self) -> NodeIndex
    {
        self.pointer
    }

    pub fn is_pointer(&self, ix: NodeIndex) -> bool
    {
        ix == self.pointer
    }

    pub fn find(&self, address: u64) -> Option<NodeIndex>
    {
        self.indices.get(&address).copied()
    }

    /// The function at `address`, created if it doesn't exist yet.
    pub fn add_function(&mut self, address: u64, name: &str) -> NodeIndex
    {
        self.insert(address, || Function::new(address, name))
    }

    /// Like [`add_function`](Self::add_function), for a call target
    /// without a symbol.
    pub fn add_unnamed(&mut self, address: u64) -> NodeIndex
    {
        self.insert(address, || Function::unnamed(address))
    }

    fn insert(&mut self, address: u64, function: impl FnOnce() -> Function) -> NodeIndex
    {
        if let Some(ix) = self.find(address)
        {
            return ix;
        }

        let ix = self.g.add_node(function());
        self.indices.insert(address, ix);
        ix
    }

    /// Add the edge `caller -> callee` unless it already exists.
    ///
    /// Returns whether an edge was added.
    pub fn add_call(&mut self, caller: NodeIndex, callee: NodeIndex) -> bool
    {
        if self.g.find_edge(caller, callee).is_some()
        {
            return false;
        }
        self.g.add_edge(caller, callee, ());
        true
    }

    /// The callees of `ix`, in the order the calls were found.
    pub fn calls(&self, ix: NodeIndex) -> Vec<NodeIndex>
    {
        // petgraph walks the edges of a node newest first
        let mut calls: Vec<_> = self.g.neighbors_directed(ix, Direction::Outgoing).collect();
        calls.reverse();
        calls
    }

    /// The callers of `ix`, in the order the calls were found.
    pub fn callers(&self, ix: NodeIndex) -> Vec<NodeIndex>
    {
        let mut callers: Vec<_> = self.g.neighbors_directed(ix, Direction::Incoming).collect();
        callers.reverse();
        callers
    }

    pub fn calls_pointer(&self, ix: NodeIndex) -> bool
    {
        self.g.find_edge(ix, self.pointer).is_some()
    }

    /// A function nobody calls.
    pub fn is_entrance(&self, ix: NodeIndex) -> bool
    {
        !self.is_pointer(ix)
            && self.g.neighbors_directed(ix, Direction::Incoming).next().is_none()
    }

    /// Entrances by address.
    pub fn entrances(&self) -> Vec<NodeIndex>
    {
        self.functions().filter(|&ix| self.is_entrance(ix)).collect()
    }

    /// Every function except the function pointer, by address.
    pub fn functions(&self) -> impl Iterator<Item = NodeIndex> + '_
    {
        self.indices.values().copied()
    }

    /// Remove a function together with its edges.
    pub fn remove(&mut self, ix: NodeIndex) -> Option<Function>
    {
        if self.is_pointer(ix)
        {
            return None;
        }

        let function = self.g.remove_node(ix)?;
        self.indices.remove(&function.address);
        Some(function)
    }

    /// Number of functions, the function pointer not included.
    pub fn len(&self) -> usize
    {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.indices.is_empty()
    }

    /// The largest `total` of all functions, 0 for an empty graph.
    pub fn stack_limit(&self) -> u64
    {
        self.functions().map(|ix| self[ix].total).max().unwrap_or(0)
    }
}

impl Index<NodeIndex> for CallGraph
{
    type Output = Function;

    fn index(&self, ix: NodeIndex) -> &Function
    {
        &self.g[ix]
    }
}

impl IndexMut<NodeIndex> for CallGraph
{
    fn index_mut(&mut self, ix: NodeIndex) -> &mut Function
    {
        &mut self.g[ix]
    }
}

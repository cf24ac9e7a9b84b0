use std::collections::BTreeMap;
use std::fmt;


/// How certain the stack effect of an instruction is known, weakest last.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StackImpact
{
    /// Doesn't touch the stack.
    #[default]
    No,
    /// Exact stack effect.
    Clear,
    /// Touches the stack, but its counterpart is tracked instead.
    Potential,
    /// Touches the stack by an unknown amount.
    Weak,
}

impl fmt::Display for StackImpact
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.pad(match self
        {
            StackImpact::No         => "",
            StackImpact::Clear      => "clear",
            StackImpact::Potential  => "potential",
            StackImpact::Weak       => "weak",
        })
    }
}


#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Operation
{
    pub executions:     u64,
    /// The weakest impact any execution was classified with.
    pub impact:         StackImpact,
}


///
/// Tally of the classified instructions, keyed by mnemonic.
///
/// Only used for reporting; nothing in here feeds back into the call
/// graph.
///
#[derive(Clone, Debug, Default)]
pub struct Statistic
{
    pub per_operation:      BTreeMap<String, Operation>,
    pub per_stack_impact:   BTreeMap<StackImpact, u64>,
}

impl Statistic
{
    pub fn new() -> Self
    {
        Statistic::default()
    }

    pub fn add(&mut self, operation: &str, impact: StackImpact)
    {
        let entry = self.per_operation.entry(operation.to_string()).or_default();
        entry.executions += 1;
        entry.impact = entry.impact.max(impact);

        *self.per_stack_impact.entry(impact).or_insert(0) += 1;
    }

    pub fn count(&self, impact: StackImpact) -> u64
    {
        self.per_stack_impact.get(&impact).copied().unwrap_or(0)
    }

    /// Number of tallied instructions.
    pub fn total(&self) -> u64
    {
        self.per_stack_impact.values().sum()
    }

    pub fn is_empty(&self) -> bool
    {
        self.per_operation.is_empty()
    }
}

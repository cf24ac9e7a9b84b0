/*      ███████╗████████╗ █████╗ ████████╗███████╗       */
/*      ██╔════╝╚══██╔══╝██╔══██╗╚══██╔══╝██╔════╝       */
/*      ███████╗   ██║   ███████║   ██║   █████╗         */
/*      ╚════██║   ██║   ██╔══██║   ██║   ██╔══╝         */
/*      ███████║   ██║   ██║  ██║   ██║   ███████╗       */
/*      ╚══════╝   ╚═╝   ╚═╝  ╚═╝   ╚═╝   ╚══════╝       */
/*     ███████████████████████████████████████████╗      */
/*     ╚══════════════════════════════════════════╝      */

use crate::analysis::{self, Verdict};
use crate::config::Config;
use crate::graph::{CallGraph, Function};
use crate::patterns::{self, Line, Pattern};
use crate::statistic::Statistic;
use crate::{Error, Max, Target};

use std::io::BufRead;

use petgraph::stable_graph::NodeIndex;

use log::{debug, info};


/// The stack limit and whether it is exact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary
{
    pub limit:      u64,
    pub precise:    bool,
}


///
/// One analysis run: the listing is fed line by line into the call graph,
/// then the stack usage is calculated on it.
///
#[derive(Debug)]
pub struct State
{
    pub target:         Target,
    pub config:         Config,
    pattern:            Box<dyn Pattern>,

    pub graph:          CallGraph,
    pub statistic:      Statistic,

    /// Strongly connected components of the call graph, after
    /// `calculate_stack()`.
    pub cycles:         Vec<Vec<NodeIndex>>,
    pub precise:        bool,

    // parse position
    file:               Option<String>,
    section:            Option<String>,
    current:            Option<NodeIndex>,
    line_no:            usize,
}


impl State
{
    pub fn new(target: Target, config: Config) -> Result<Self, Error>
    {
        Ok(State
        {
            target,
            config,
            pattern:    patterns::for_target(target)?,
            graph:      CallGraph::new(),
            statistic:  Statistic::new(),
            cycles:     vec![],
            precise:    true,
            file:       None,
            section:    None,
            current:    None,
            line_no:    0,
        })
    }

    pub fn pattern(&self) -> &dyn Pattern
    {
        self.pattern.as_ref()
    }






/*     ██████╗  █████╗ ██████╗ ███████╗███████╗     */
/*     ██╔══██╗██╔══██╗██╔══██╗██╔════╝██╔════╝     */
/*     ██████╔╝███████║██████╔╝███████╗█████╗       */
/*     ██╔═══╝ ██╔══██║██╔══██╗╚════██║██╔══╝       */
/*     ██║     ██║  ██║██║  ██║███████║███████╗     */
/*     ╚═╝     ╚═╝  ╚═╝╚═╝  ╚═╝╚══════╝╚══════╝     */
/*     ████████████████████████████████████████╗    */
/*     ╚═══════════════════════════════════════╝    */

    /// Parse a whole listing, then drop the functions it never labeled.
    ///
    /// Modified fields:
    /// - graph
    /// - statistic
    pub fn parse(&mut self, reader: impl BufRead) -> Result<(), Error>
    {
        for line in reader.lines()
        {
            self.parse_line(&line?)?;
        }

        self.ignore_inner_calls();

        info!(
            "Parsed {} lines, found {} functions",
            self.line_no,
            self.graph.len()
        );
        Ok(())
    }

    ///
    /// Classify one line and apply it to the call graph.
    ///
    /// Modified fields:
    /// - graph
    /// - statistic
    ///
    pub fn parse_line(&mut self, line: &str) -> Result<Line, Error>
    {
        self.line_no += 1;
        let line = line.trim_end_matches(['\r', '\n']);

        let classified = self.pattern.classify(line);

        if classified.needs_function() && self.current.is_none()
        {
            return Err(Error::NoCurrentFunction
            {
                line_no:    self.line_no,
                line:       line.to_string(),
            });
        }
        self.track_operation(line, &classified);

        match &classified
        {
            Line::FileFormat(file) =>
            {
                self.file = Some(file.clone());
                self.section = None;
                self.current = None;
            },
            Line::Section(section) =>
            {
                debug!("Disassembly of section {}:", section);
                self.section = Some(section.clone());
                self.current = None;
            },
            Line::Function { address, name } =>
            {
                debug!("{}:", name);
                let ix = self.graph.add_function(*address, name);

                let function = &mut self.graph[ix];
                if function.is_unnamed()
                {
                    function.rename(name);
                }
                function.file = self.file.clone();
                function.section = self.section.clone();
                function.visited = true;

                self.current = Some(ix);
            },
            Line::StackPush(size) | Line::StackSub(size) =>
            {
                self.current_function()?.size += size;
            },
            Line::StackDynamic =>
            {
                self.current_function()?.dynamic = true;
            },
            Line::FunctionCall { address, name } =>
            {
                let caller = self.current_ix()?;
                // unnamed targets are known by their address
                let callee = if name.is_empty()
                {
                    self.graph.add_unnamed(*address)
                }
                else
                {
                    self.graph.add_function(*address, name)
                };
                self.graph.add_call(caller, callee);

                if self.config.count_return_address
                {
                    let size = self.pattern.get_stack_call_size();
                    self.graph[caller].size += size;
                }
            },
            Line::FunctionPointer =>
            {
                let caller = self.current_ix()?;
                let pointer = self.graph.pointer();
                self.graph.add_call(caller, pointer);
            },
            Line::PotentialStack | Line::NoImpact => {},
        }

        Ok(classified)
    }

    fn current_ix(&self) -> Result<NodeIndex, Error>
    {
        self.current.ok_or_else(|| Error::NoCurrentFunction
        {
            line_no:    self.line_no,
            line:       String::new(),
        })
    }

    fn current_function(&mut self) -> Result<&mut Function, Error>
    {
        let ix = self.current_ix()?;
        Ok(&mut self.graph[ix])
    }

    /// Modified fields:
    /// - statistic
    fn track_operation(&mut self, line: &str, classified: &Line)
    {
        let operation = match self.pattern.base().get_operation(line)
        {
            Some(operation) => operation,
            None            => return,
        };

        let impact = classified.stack_impact();
        self.statistic.add(operation, impact);

        match classified
        {
            Line::StackPush(size) | Line::StackSub(size) =>
                debug!("{:<16} {:<9} {:>6}  {}", classified.kind(), impact, size, line),
            Line::FunctionCall { .. } if self.config.count_return_address =>
                debug!(
                    "{:<16} {:<9} {:>6}  {}",
                    classified.kind(), impact, self.pattern.get_stack_call_size(), line
                ),
            _ =>
                debug!("{:<16} {:<9} {:>6}  {}", classified.kind(), impact, "", line),
        }
    }

    ///
    /// Remove the functions that were called but never labeled. objdump
    /// reports some jumps inside a function as calls to a new function.
    ///
    /// Modified fields:
    /// - graph
    ///
    pub fn ignore_inner_calls(&mut self)
    {
        let phantoms: Vec<NodeIndex> = self
            .graph
            .functions()
            .filter(|&ix| !self.graph[ix].visited)
            .collect();

        for ix in phantoms
        {
            for caller in self.graph.callers(ix)
            {
                debug!(
                    "Ignore inner call in {} to {:#x} ({})",
                    self.graph[caller].name,
                    self.graph[ix].address,
                    self.graph[ix].name
                );
            }
            self.graph.remove(ix);
        }

        for ix in self.graph.g.node_indices().collect::<Vec<_>>()
        {
            self.graph[ix].visited = false;
        }
        self.current = None;
    }






/*      ███████╗████████╗ █████╗  ██████╗██╗  ██╗     */
/*      ██╔════╝╚══██╔══╝██╔══██╗██╔════╝██║ ██╔╝     */
/*      ███████╗   ██║   ███████║██║     █████╔╝      */
/*      ╚════██║   ██║   ██╔══██║██║     ██╔═██╗      */
/*      ███████║   ██║   ██║  ██║╚██████╗██║  ██╗     */
/*      ╚══════╝   ╚═╝   ╚═╝  ╚═╝ ╚═════╝╚═╝  ╚═╝     */
/*     ██████████████████████████████████████████╗    */
/*     ╚═════════════════════════════════════════╝    */

    /// Modified fields:
    /// - graph
    /// - cycles
    /// - precise
    pub fn calculate_stack(&mut self) -> Verdict
    {
        let verdict = analysis::calculate_stack(&mut self.graph, &self.config);

        self.cycles = verdict.cycles.clone();
        self.precise = verdict.precise;
        verdict
    }

    /// The largest total of all functions.
    pub fn stack_limit(&self) -> u64
    {
        self.graph.stack_limit()
    }

    pub fn limit(&self) -> Max
    {
        Max::new(self.stack_limit(), !self.precise)
    }

    pub fn summary(&self) -> Summary
    {
        Summary { limit: self.stack_limit(), precise: self.precise }
    }

    /// Every function, the deepest first.
    pub fn stack_table(&self) -> Vec<&Function>
    {
        let mut table: Vec<&Function> = self.graph.functions().map(|ix| &self.graph[ix]).collect();
        table.sort_by(|a, b| b.total.cmp(&a.total).then(a.address.cmp(&b.address)));
        table
    }

    /// Look up a function by name.
    pub fn function(&self, name: &str) -> Option<&Function>
    {
        self.graph
            .functions()
            .map(|ix| &self.graph[ix])
            .find(|function| function.name == name)
    }
}

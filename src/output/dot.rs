use std::{
    io,
    io::Write as _, // to get write_fmt, granting writeln!
};

use crate::state::State;
use crate::output::escaper::Escaper;





impl State
{
    ///
    /// The call graph in Graphviz format. Imprecise functions are dashed,
    /// every strongly connected component gets a cluster.
    ///
    pub fn output_dot(&self, mut writer: impl io::Write, dc: &DotConf) -> io::Result<()>
    {
        let g = &self.graph.g;

        writeln!(writer, "digraph {{")?;
        writeln!(writer, "    node [fontname={} shape=box]", &dc.font)?;

        for ix in g.node_indices() {
            let node = &g[ix];

            write!(writer, "    {} [label=\"", ix.index())?;

            if self.graph.is_pointer(ix) {
                write!(writer, "{}", node.name)?;
            } else {
                let mut esc = Escaper::new(&mut writer);
                write!(esc, "{:#}", rustc_demangle::demangle(&node.name))?;

                write!(writer, "\\nmax {}", node.max())?;
                write!(writer, "\\nlocal = {}", node.size)?;
            }
            write!(writer, "\"")?;

            if node.imprecise || self.graph.is_pointer(ix) {
                write!(writer, " style=dashed")?;
            }

            writeln!(writer, "]")?;
        }

        for edge in g.edge_indices() {
            if let Some((source, target)) = g.edge_endpoints(edge) {
                writeln!(writer, "    {} -> {}", source.index(), target.index())?;
            }
        }

        for (i, cycle) in self.cycles.iter().enumerate() {
            writeln!(writer, "\n    subgraph cluster_{} {{", i)?;
            writeln!(writer, "        style=dashed")?;
            writeln!(writer, "        fontname={}", &dc.font)?;
            writeln!(writer, "        label=\"SCC{}\"", i)?;

            for node in cycle {
                writeln!(writer, "        {}", node.index())?;
            }

            writeln!(writer, "    }}")?;
        }

        writeln!(writer, "}}")?;

        Ok(())
    }
}



#[derive(Clone, Debug)]
pub struct DotConf
{
    pub font: String,
}

impl Default for DotConf
{
    fn default() -> Self
    {
        DotConf
        {
            font: "monospace".to_string(),
        }
    }
}

use std::io;

use crate::graph::Function;
use crate::output::digits;
use crate::state::State;


#[derive(Clone, Debug, Default)]
pub struct TableConf
{
    pub show_header:    bool,
    pub show_section:   bool,
}


/// Column widths of one table.
struct Widths
{
    address:    usize,
    name:       usize,
    section:    usize,
    file:       usize,
    size:       usize,
    total:      usize,
}

impl Widths
{
    fn new(functions: &[&Function], conf: &TableConf) -> Self
    {
        let header = |title: &str| if conf.show_header { title.len() } else { 1 };

        let mut w = Widths
        {
            address:    header("address"),
            name:       header("function"),
            section:    header("section"),
            file:       header("file"),
            size:       header("fsize"),
            total:      header("tsize"),
        };

        for f in functions
        {
            w.address   = w.address.max(digits(f.address, 16) + 2);
            w.name      = w.name.max(f.name.chars().count());
            w.section   = w.section.max(f.section.as_deref().map_or(0, str::len));
            w.file      = w.file.max(f.file.as_deref().map_or(0, str::len));
            w.size      = w.size.max(digits(f.size, 10));
            w.total     = w.total.max(f.max().to_string().len());
        }
        w
    }
}


impl State
{
    /// All reported functions with their own and their total stack size,
    /// the deepest first. Imprecise totals start with `>`.
    pub fn output_table(&self, mut writer: impl io::Write, conf: &TableConf) -> io::Result<()>
    {
        let functions: Vec<&Function> = self
            .stack_table()
            .into_iter()
            .filter(|f| self.config.regards(f))
            .collect();

        if functions.is_empty()
        {
            return Ok(());
        }

        let w = Widths::new(&functions, conf);

        if conf.show_header
        {
            let section = match conf.show_section
            {
                true  => format!("{:<width$} ", "section", width = w.section),
                false => String::new(),
            };
            let row = format!(
                "{:>aw$} {:<nw$}  {}{:<fw$}  {:>sw$} {:>tw$}",
                "address", "function", section, "file", "fsize", "tsize",
                aw = w.address, nw = w.name, fw = w.file, sw = w.size, tw = w.total,
            );
            writeln!(writer, "{}", row.trim_end())?;
        }

        for f in functions
        {
            let section = match conf.show_section
            {
                true  => format!("{:<width$} ", f.section.as_deref().unwrap_or(""), width = w.section),
                false => String::new(),
            };
            let row = format!(
                "{:#0aw$x} {:<nw$}  {}{:<fw$}  {:>sw$} {:>tw$}",
                f.address,
                f.name,
                section,
                f.file.as_deref().unwrap_or(""),
                f.size,
                f.max().to_string(),
                aw = w.address, nw = w.name, fw = w.file, sw = w.size, tw = w.total,
            );
            writeln!(writer, "{}", row.trim_end())?;
        }
        Ok(())
    }
}

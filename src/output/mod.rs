
// re-exporting functions
mod table;      pub use table::TableConf;
mod tree;
mod statistic;  pub use statistic::StatConf;
mod dot;        pub use dot::DotConf;
mod escaper;    pub use escaper::*;

use std::io;

use crate::state::State;


#[derive( PartialEq, Debug, Clone, Copy)]
pub enum OutputFormat {
    Table,
    Tree,
    Statistic,
    Dot,
}


impl State
{
    /// Render the analysis in `format` with its default settings.
    pub fn output(&self, writer: impl io::Write, format: OutputFormat) -> io::Result<()>
    {
        match format
        {
            OutputFormat::Table     => self.output_table(writer, &TableConf::default()),
            OutputFormat::Tree      => self.output_tree(writer),
            OutputFormat::Statistic => self.output_statistic(writer, &StatConf::default()),
            OutputFormat::Dot       => self.output_dot(writer, &DotConf::default()),
        }
    }
}


/// Number of characters `n` takes in base `radix`.
pub(crate) fn digits(mut n: u64, radix: u64) -> usize
{
    let mut len = 1;
    while n >= radix
    {
        n /= radix;
        len += 1;
    }
    len
}

/// `part` of `total` in percent, rounded.
pub(crate) fn percent(part: u64, total: u64) -> u64
{
    if total == 0
    {
        return 0;
    }
    (200 * part + total) / (2 * total)
}

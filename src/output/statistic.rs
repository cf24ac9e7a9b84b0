use std::io;

use crate::output::{digits, percent};
use crate::state::State;
use crate::statistic::{StackImpact, Statistic};


#[derive(Clone, Debug, Default)]
pub struct StatConf
{
    pub show_header:        bool,
    /// Also list every instruction with its count.
    pub show_operations:    bool,
}


/// One row: title, count, percent and an optional stack impact.
type Row = (String, u64, u64, Option<StackImpact>);


fn write_rows(writer: &mut impl io::Write, rows: &[Row], show_header: bool, impact_column: bool)
    -> io::Result<()>
{
    let min = |title: &str| if show_header { title.len() } else { 1 };

    let title_len = rows
        .iter()
        .map(|row| row.0.len())
        .fold(min(if impact_column { "operation" } else { "" }), usize::max);
    let count_len = rows
        .iter()
        .map(|row| digits(row.1, 10))
        .fold(min("count"), usize::max);

    if show_header
    {
        let header = format!(
            "{:<tw$} {:>cw$} {:>4}  {}",
            if impact_column { "operation" } else { "" },
            "count",
            "%",
            if impact_column { "stack impact" } else { "" },
            tw = title_len, cw = count_len,
        );
        writeln!(writer, "{}", header.trim_end())?;
    }

    for (title, count, percent, impact) in rows
    {
        let impact = impact.map(|i| i.to_string()).unwrap_or_default();
        let row = format!(
            "{:<tw$} {:>cw$} {:>3}%  {}",
            title, count, percent, impact,
            tw = title_len, cw = count_len,
        );
        writeln!(writer, "{}", row.trim_end())?;
    }
    Ok(())
}


/// Executions per instruction, most frequent first.
fn operation_rows(statistic: &Statistic) -> Vec<Row>
{
    let total: u64 = statistic.per_operation.values().map(|op| op.executions).sum();

    let mut rows: Vec<Row> = statistic
        .per_operation
        .iter()
        .map(|(name, op)| (name.clone(), op.executions, percent(op.executions, total), Some(op.impact)))
        .collect();
    // stable, so equal counts stay in name order
    rows.sort_by(|a, b| b.1.cmp(&a.1));

    rows.insert(0, ("total".to_string(), total, 100, None));
    rows
}


fn stack_impact_rows(statistic: &Statistic) -> Vec<Row>
{
    let total = statistic.total();
    let row = |title: &str, count: u64| (title.to_string(), count, percent(count, total), None);

    let clear = statistic.count(StackImpact::Clear);
    let weak = statistic.count(StackImpact::Weak);
    let potential = statistic.count(StackImpact::Potential);
    let unexpected = statistic.count(StackImpact::No);

    vec![
        row("total",                            total),
        row("clear",                            clear),
        row("weak (unknown stack impact)",      weak),
        row("skipped",                          potential + unexpected),
        row("  potential stack instructions",   potential),
        row("  unexpected stack impact",        unexpected),
    ]
}


impl State
{
    /// How the instructions of the listing were classified.
    pub fn output_statistic(&self, mut writer: impl io::Write, conf: &StatConf) -> io::Result<()>
    {
        if self.statistic.is_empty()
        {
            return Ok(());
        }

        if conf.show_operations
        {
            write_rows(&mut writer, &operation_rows(&self.statistic), conf.show_header, true)?;
            writeln!(writer)?;
        }

        write_rows(&mut writer, &stack_impact_rows(&self.statistic), conf.show_header, false)
    }
}

use std::{
    collections::HashSet,
    io,
};

use petgraph::stable_graph::NodeIndex;

use crate::state::State;


impl State
{
    ///
    /// The call tree below every reported entrance.
    ///
    /// A function's callees are listed the first time it shows up; later
    /// occurrences end in `...`. A call back into the current path is
    /// marked `CIRCLE` and not followed.
    ///
    pub fn output_tree(&self, mut writer: impl io::Write) -> io::Result<()>
    {
        let graph = &self.graph;
        let mut expanded: HashSet<NodeIndex> = HashSet::new();

        for root in graph.entrances()
        {
            if !self.config.regards(&graph[root])
            {
                continue;
            }

            let mut path: Vec<NodeIndex> = vec![];
            let mut stack: Vec<(NodeIndex, usize)> = vec![(root, 0)];

            while let Some((ix, depth)) = stack.pop()
            {
                path.truncate(depth);

                let function = &graph[ix];
                let pointer = graph.is_pointer(ix);
                let alight = path.contains(&ix);
                let calls = graph.calls(ix);
                let repeated = !alight && !calls.is_empty() && expanded.contains(&ix);

                let mut line = String::new();
                if depth > 0
                {
                    line.push_str(&" ".repeat(3 * (depth - 1)));
                    line.push_str("-> ");
                }

                if pointer
                {
                    line.push_str("Unknown Function Pointer");
                }
                else
                {
                    line.push_str(&format!("{:#x} {} {}", function.address, function.name, function.max()));
                    if !alight && !function.dynamic
                    {
                        line.push_str(&format!(" ({})", function.size));
                    }
                }

                if function.cycle && alight
                {
                    line.push_str(" CIRCLE");
                }
                if function.dynamic
                {
                    line.push_str(" DYNAMIC");
                }
                if repeated
                {
                    line.push_str(" ...");
                }
                writeln!(writer, "{}", line)?;

                if alight || repeated
                {
                    continue;
                }

                expanded.insert(ix);
                path.push(ix);
                for &callee in calls.iter().rev()
                {
                    stack.push((callee, depth + 1));
                }
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests
{
    use crate::{Config, State, Target};

    fn tree(listing: &str) -> String
    {
        let mut state = State::new(Target::X86_64, Config::quiet()).unwrap();
        state.parse(listing.as_bytes()).unwrap();
        state.calculate_stack();

        let mut out = vec![];
        state.output_tree(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn nested_calls()
    {
        let listing = "\
0000000000400500 <leaf>:
  400500:\t48 83 ec 18          \tsub    $0x18,%rsp
0000000000400510 <middle>:
  400510:\t55                   \tpush   %rbp
  400511:\te8 ea ff ff ff       \tcallq  400500 <leaf>
0000000000400526 <main>:
  400526:\t48 83 ec 28          \tsub    $0x28,%rsp
  40052a:\te8 e1 ff ff ff       \tcallq  400510 <middle>
  40052f:\te8 cc ff ff ff       \tcallq  400500 <leaf>
  400534:\tff d0                \tcallq  *%rax
";
        assert_eq!(
            tree(listing),
            "0x400526 main >72 (40)\n\
             -> 0x400510 middle 32 (8)\n\
             \x20  -> 0x400500 leaf 24 (24)\n\
             -> 0x400500 leaf 24 (24)\n\
             -> Unknown Function Pointer\n"
        );
    }

    #[test]
    fn recursion_is_cut()
    {
        let listing = "\
0000000000400500 <fact>:
  400500:\t55                   \tpush   %rbp
  400501:\te8 fa ff ff ff       \tcallq  400500 <fact>
0000000000400526 <main>:
  400526:\t55                   \tpush   %rbp
  40052a:\te8 d1 ff ff ff       \tcallq  400500 <fact>
";
        assert_eq!(
            tree(listing),
            "0x400526 main >16 (8)\n\
             -> 0x400500 fact >8 (8)\n\
             \x20  -> 0x400500 fact >8 CIRCLE\n"
        );
    }

    #[test]
    fn shared_subtrees_are_listed_once()
    {
        let listing = "\
0000000000400500 <leaf>:
  400500:\t55                   \tpush   %rbp
0000000000400510 <shared>:
  400510:\t55                   \tpush   %rbp
  400511:\te8 ea ff ff ff       \tcallq  400500 <leaf>
0000000000400520 <a>:
  400520:\te8 eb ff ff ff       \tcallq  400510 <shared>
0000000000400530 <b>:
  400530:\te8 db ff ff ff       \tcallq  400510 <shared>
";
        assert_eq!(
            tree(listing),
            "0x400520 a 16 (0)\n\
             -> 0x400510 shared 16 (8)\n\
             \x20  -> 0x400500 leaf 8 (8)\n\
             0x400530 b 16 (0)\n\
             -> 0x400510 shared 16 (8) ...\n"
        );
    }
}

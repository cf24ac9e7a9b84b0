use stacklimit::{Config, Error, Max, State, Summary, Target};
use stacklimit::graph::Function;
use stacklimit::statistic::StackImpact;


const X86_64: &str = include_str!("data/x86_64.lst");
const X86: &str = include_str!("data/x86.lst");
const ARM: &str = include_str!("data/arm.lst");
const AARCH64: &str = include_str!("data/aarch64.lst");


fn analyse(target: Target, listing: &str, config: Config) -> State
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut state = State::new(target, config).unwrap();
    state.parse(listing.as_bytes()).unwrap();
    state.calculate_stack();
    state
}

fn function<'s>(state: &'s State, name: &str) -> &'s Function
{
    state.function(name).unwrap_or_else(|| panic!("{} not found", name))
}


#[test]
fn x86_64_call_chain()
{
    let state = analyse(Target::X86_64, X86_64, Config::default());

    let leaf = function(&state, "leaf");
    assert_eq!((leaf.size, leaf.total), (24, 24));
    assert!(!leaf.imprecise);

    let middle = function(&state, "middle");
    assert_eq!((middle.size, middle.total), (8, 32));

    let main = function(&state, "main");
    assert_eq!((main.size, main.total), (40, 72));
    assert!(!main.imprecise);
    assert_eq!(main.section.as_deref(), Some(".text"));
    assert_eq!(main.file.as_deref(), Some("prog"));

    // _init calls through a pointer
    let init = function(&state, "_init");
    assert_eq!(init.section.as_deref(), Some(".init"));
    assert!(init.imprecise);

    assert_eq!(state.summary(), Summary { limit: 72, precise: false });
    assert_eq!(state.limit().to_string(), ">72");

    let order: Vec<&str> = state.stack_table().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(order, ["main", "middle", "leaf", "_init"]);
}

#[test]
fn x86_64_without_os_functions()
{
    let config = Config { regard_os_functions: false, ..Config::quiet() };
    let state = analyse(Target::X86_64, X86_64, config);

    assert!(!function(&state, "_init").imprecise);
    assert_eq!(state.summary(), Summary { limit: 72, precise: true });
    assert_eq!(state.limit(), Max::Exact(72));
}

#[test]
fn x86_pointer_and_dynamic_allocation()
{
    let state = analyse(Target::X86, X86, Config::quiet());

    let leaf = function(&state, "leaf");
    assert_eq!((leaf.size, leaf.total), (20, 20));
    assert!(!leaf.imprecise);

    let walk = function(&state, "walk");
    assert_eq!((walk.size, walk.total), (28, 48));
    assert!(walk.imprecise && !walk.dynamic);

    let main = function(&state, "main");
    assert_eq!((main.size, main.total), (8, 56));
    assert!(main.imprecise && main.dynamic);

    let walk_ix = state.graph.find(0x8048410).unwrap();
    assert!(state.graph.calls_pointer(walk_ix));

    assert_eq!(state.limit(), Max::LowerBound(56));
    assert!(!state.precise);
}

#[test]
fn x86_return_addresses()
{
    let config = Config { count_return_address: true, ..Config::quiet() };
    let state = analyse(Target::X86, X86, config);

    // only direct calls push a counted return address
    assert_eq!(function(&state, "walk").size, 32);
    assert_eq!(function(&state, "main").size, 12);
    assert_eq!(function(&state, "main").total, 64);
}

#[test]
fn arm_register_lists_and_inner_branches()
{
    let state = analyse(Target::Arm, ARM, Config::quiet());

    let alpha = function(&state, "func_alpha");
    assert_eq!((alpha.size, alpha.total), (16, 16));

    let beta = function(&state, "func_beta");
    assert_eq!((beta.size, beta.total), (8, 24));
    assert!(!beta.imprecise);

    // the branch to func_beta+0x18 is no call
    assert_eq!(state.graph.find(0x104d4), None);
    let beta_ix = state.graph.find(0x104bc).unwrap();
    assert_eq!(state.graph.calls(beta_ix), vec![state.graph.find(0x104a4).unwrap()]);

    let main = function(&state, "main");
    assert_eq!((main.size, main.total), (16, 40));
    assert!(main.imprecise);

    assert_eq!(state.summary(), Summary { limit: 40, precise: false });
}

#[test]
fn arm_statistic()
{
    let state = analyse(Target::Arm, ARM, Config::quiet());

    assert_eq!(state.statistic.per_operation["push"].executions, 3);
    assert_eq!(state.statistic.per_operation["push"].impact, StackImpact::Clear);
    assert_eq!(state.statistic.per_operation["pop"].impact, StackImpact::Potential);
    assert_eq!(state.statistic.per_operation["blx"].impact, StackImpact::Weak);
    assert_eq!(state.statistic.per_operation[".word"].impact, StackImpact::No);
}

#[test]
fn aarch64_pre_indexed_store()
{
    let state = analyse(Target::Aarch64, AARCH64, Config::quiet());

    let leaf = function(&state, "leaf");
    assert_eq!((leaf.size, leaf.total), (16, 16));
    assert!(!leaf.imprecise);

    let main = function(&state, "main");
    assert_eq!((main.size, main.total), (32, 48));
    assert!(main.imprecise);

    assert_eq!(state.limit().to_string(), ">48");
}

#[test]
fn mutual_recursion()
{
    let listing = "\
prog:     file format elf64-x86-64

Disassembly of section .text:

0000000000400500 <even>:
  400500:\t48 83 ec 08          \tsub    $0x8,%rsp
  400504:\te8 07 00 00 00       \tcallq  400510 <odd>
  400509:\tc3                   \tretq
0000000000400510 <odd>:
  400510:\t48 83 ec 18          \tsub    $0x18,%rsp
  400514:\te8 e7 ff ff ff       \tcallq  400500 <even>
  400519:\tc3                   \tretq
0000000000400526 <main>:
  400526:\t55                   \tpush   %rbp
  400527:\te8 d4 ff ff ff       \tcallq  400500 <even>
  40052c:\tc3                   \tretq
";
    let state = analyse(Target::X86_64, listing, Config::quiet());

    let even = function(&state, "even");
    let odd = function(&state, "odd");
    let main = function(&state, "main");

    assert!(even.cycle && odd.cycle);
    assert!(even.imprecise && odd.imprecise);
    assert!(!main.cycle && main.imprecise);

    // one pass around the cycle is counted
    assert_eq!(odd.total, 24);
    assert_eq!(even.total, 32);
    assert_eq!(main.total, 40);

    assert_eq!(state.cycles.len(), 1);
    assert_eq!(state.cycles[0].len(), 2);
    assert_eq!(state.limit(), Max::LowerBound(40));
}

#[test]
fn instruction_outside_of_a_function()
{
    let listing = "\
prog:     file format elf64-x86-64

Disassembly of section .text:

  400500:\t48 83 ec 08          \tsub    $0x8,%rsp
";
    let mut state = State::new(Target::X86_64, Config::quiet()).unwrap();
    match state.parse(listing.as_bytes())
    {
        Err(Error::NoCurrentFunction { line_no, .. }) => assert_eq!(line_no, 5),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn empty_listing()
{
    let state = analyse(Target::Arm, "", Config::quiet());
    assert!(state.graph.is_empty());
    assert_eq!(state.summary(), Summary { limit: 0, precise: true });
}

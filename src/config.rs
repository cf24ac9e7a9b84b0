use crate::graph::Function;


/// Functions which belong to the initialization and termination code of
/// the OS rather than to the program itself.
pub const OS_FUNCTIONS: &[&str] = &[
    "register_tm_clones",
    "deregister_tm_clones",
    "frame_dummy",
    "call_weak_fn",
    "abort@plt",
    ".plt",
    "_init",
    "_start",
    "_fini",
    "__libc_csu_init",
    "__libc_csu_fini",
    "__init_array_start",
    "__init_array_end",
    "__do_global_dtors_aux",
    "__do_global_dtors_aux_fini_array_entry",
    "__frame_dummy_init_array_entry",
    "__libc_start_main@plt",
    "__gmon_start__@plt",
];

///
/// Switches for the parse and the stack calculation.
///
/// The warning switches only control what is logged; the `imprecise`,
/// `dynamic` and `cycle` flags are always set.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config
{
    pub warn_dynamic:           bool,
    pub warn_pointer:           bool,
    pub warn_cycle:             bool,

    /// Warn on every occurrence. Otherwise each kind of warning is only
    /// shown once, without naming the function.
    pub multiple_warn:          bool,

    /// Also analyse the functions listed in [`OS_FUNCTIONS`] and functions
    /// outside of `.text`.
    pub regard_os_functions:    bool,

    /// Add the return address a direct call pushes to the caller's size.
    pub count_return_address:   bool,
}

impl Default for Config
{
    fn default() -> Self
    {
        Config
        {
            warn_dynamic:           true,
            warn_pointer:           true,
            warn_cycle:             true,
            multiple_warn:          true,
            regard_os_functions:    true,
            count_return_address:   false,
        }
    }
}

impl Config
{
    /// All warnings switched off.
    pub fn quiet() -> Self
    {
        Config
        {
            warn_dynamic:   false,
            warn_pointer:   false,
            warn_cycle:     false,
            ..Config::default()
        }
    }

    pub fn is_os_function(name: &str) -> bool
    {
        OS_FUNCTIONS.contains(&name)
    }

    /// Whether `function` is reported: its warnings, its row in the stack
    /// table and its branch of the call tree.
    pub fn regards(&self, function: &Function) -> bool
    {
        self.regard_os_functions
            || (function.section.as_deref() == Some(".text")
                && !Config::is_os_function(&function.name))
    }
}

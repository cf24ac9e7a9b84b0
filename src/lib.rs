//! Worst-case stack depth of a binary, computed from its `objdump -d`
//! listing.
//!
//! The pipeline is driven through [`state::State`]: every listing line is
//! classified by the [`patterns::Pattern`] of the selected [`Target`], the
//! classified lines build the [`graph::CallGraph`], and
//! [`state::State::calculate_stack`] walks the graph to find the worst-case
//! `total` of every function.

pub mod analysis;
pub mod config;
pub mod error;
pub mod graph;
pub mod input;
pub mod output;
pub mod patterns;
pub mod state;
pub mod statistic;
pub mod visitor;

pub use config::Config;
pub use error::Error;
pub use state::{State, Summary};









/*      ████████╗ █████╗ ██████╗  ██████╗ ███████╗████████╗       */
/*      ╚══██╔══╝██╔══██╗██╔══██╗██╔════╝ ██╔════╝╚══██╔══╝       */
/*         ██║   ███████║██████╔╝██║  ███╗█████╗     ██║          */
/*         ██║   ██╔══██║██╔══██╗██║   ██║██╔══╝     ██║          */
/*         ██║   ██║  ██║██║  ██║╚██████╔╝███████╗   ██║          */
/*         ╚═╝   ╚═╝  ╚═╝╚═╝  ╚═╝ ╚═════╝ ╚══════╝   ╚═╝          */
/*     ████████████████████████████████████████████████████╗      */
/*     ╚═══════════════════════════════════════════════════╝      */

use core::str::FromStr;

/// The architecture profile a listing is classified with.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Target {
    Arm,
    Aarch64,
    X86,
    X86_64,
}

impl Target {
    pub const ALL: [Target; 4] = [Target::Arm, Target::Aarch64, Target::X86, Target::X86_64];

    pub fn name(&self) -> &'static str
    {
        match *self
        {
            Target::Arm     => "arm",
            Target::Aarch64 => "aarch64",
            Target::X86     => "x86",
            Target::X86_64  => "x86_64",
        }
    }
}

impl FromStr for Target
{
    type Err = Error;

    /// Accepts the profile names as well as the spellings used by
    /// `readelf -h` and `objdump -a` (e.g. `Intel 80386`, `elf64-x86-64`).
    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let arch = s.trim().to_lowercase().replace('-', "_");
        let last = arch.split_whitespace().last().unwrap_or("");

        let target = match last
        {
            "arm" | "armv7" | "armv6" | "thumb" | "elf32_littlearm"
                                            => Some(Target::Arm),
            "aarch64" | "arm64" | "elf64_littleaarch64"
                                            => Some(Target::Aarch64),
            "x86" | "80386" | "i386" | "i686" | "elf32_i386"
                                            => Some(Target::X86),
            "x86_64" | "amd64" | "elf64_x86_64"
                                            => Some(Target::X86_64),
            _                               => None,
        };

        // "80386" and friends end like "x86", "x86_64" ends like itself
        let target = target.or_else(|| {
            if last.contains("86_64") {
                Some(Target::X86_64)
            } else if last.ends_with("86") {
                Some(Target::X86)
            } else {
                None
            }
        });

        target.ok_or_else(|| Error::UnsupportedTarget(s.to_string()))
    }
}

impl fmt::Display for Target
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.write_str(self.name())
    }
}











/*      ███╗   ███╗ █████╗ ██╗  ██╗      */
/*      ████╗ ████║██╔══██╗╚██╗██╔╝      */
/*      ██╔████╔██║███████║ ╚███╔╝       */
/*      ██║╚██╔╝██║██╔══██║ ██╔██╗       */
/*      ██║ ╚═╝ ██║██║  ██║██╔╝ ██╗      */
/*      ╚═╝     ╚═╝╚═╝  ╚═╝╚═╝  ╚═╝      */
/*     ████████████████████████████╗     */
/*     ╚═══════════════════════════╝     */
use core::fmt;

/// A stack bound. Imprecise totals are only known to be a lower bound.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Max
{
    Exact(u64),
    LowerBound(u64),
}

impl Max
{
    pub fn new(bytes: u64, imprecise: bool) -> Max
    {
        if imprecise { Max::LowerBound(bytes) } else { Max::Exact(bytes) }
    }
}

impl fmt::Display for Max
{
    /// `>` marks a total that may understate the real usage.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match *self
        {
            Max::Exact(n)      => write!(f, "{}", n),
            Max::LowerBound(n) => write!(f, ">{}", n),
        }
    }
}

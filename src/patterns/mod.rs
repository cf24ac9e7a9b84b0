//! Classification of `objdump -d` lines into stack relevant categories.
//!
//! Every architecture implements [`Pattern`]; the 64 bit profiles wrap
//! their 32 bit base and only replace the push and decrement decoding.
//! Only instructions touching the stack pointer are recognized, every
//! other instruction is [`Line::NoImpact`].

use std::fmt;

use log::debug;
use regex::Regex;

use crate::statistic::StackImpact;
use crate::{Error, Target};

mod aarch64;
mod arm;
mod x86;
mod x86_64;

pub use aarch64::Aarch64;
pub use arm::Arm;
pub use x86::X86;
pub use x86_64::X86_64;


/// A classified listing line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line
{
    /// `dir/binary:     file format elf64-x86-64`
    FileFormat(String),
    /// `Disassembly of section .text:`
    Section(String),
    /// `000000000040076d <main>:`
    Function { address: u64, name: String },
    /// Stack grows by the given number of bytes.
    StackPush(u64),
    /// Stack pointer decremented by the given number of bytes.
    StackSub(u64),
    /// Stack pointer adjusted by a value only known at run time.
    StackDynamic,
    FunctionCall { address: u64, name: String },
    /// Call through a register or memory operand.
    FunctionPointer,
    /// Might touch the stack, but its counterpart is already tracked.
    PotentialStack,
    NoImpact,
}

impl Line
{
    pub fn stack_impact(&self) -> StackImpact
    {
        match self
        {
            Line::StackPush(_)
            | Line::StackSub(_)
            | Line::FunctionCall { .. }     => StackImpact::Clear,
            Line::StackDynamic
            | Line::FunctionPointer         => StackImpact::Weak,
            Line::PotentialStack            => StackImpact::Potential,
            _                               => StackImpact::No,
        }
    }

    /// Name of the category as shown in the debug log.
    pub fn kind(&self) -> &'static str
    {
        match self
        {
            Line::FileFormat(_)             => "FileFormat",
            Line::Section(_)                => "Section",
            Line::Function { .. }           => "Function",
            Line::StackPush(_)              => "StackPushOp",
            Line::StackSub(_)               => "StackSubOp",
            Line::StackDynamic              => "StackDynamicOp",
            Line::FunctionCall { .. }       => "FunctionCall",
            Line::FunctionPointer           => "FunctionPointer",
            Line::PotentialStack            => "PotentialStackOp",
            Line::NoImpact                  => "",
        }
    }

    /// Whether the line acts on the current function.
    pub fn needs_function(&self) -> bool
    {
        matches!(
            self,
            Line::StackPush(_)
                | Line::StackSub(_)
                | Line::StackDynamic
                | Line::FunctionCall { .. }
                | Line::FunctionPointer
        )
    }
}



///
/// The grammar every architecture shares: scope markers, function labels
/// and the instruction column used as key of the operation statistic.
///
#[derive(Debug)]
pub struct Base
{
    file_format:    Regex,
    section:        Regex,
    function:       Regex,
    operation:      Regex,
}

impl Base
{
    pub fn new() -> Result<Self, Error>
    {
        Ok(Base
        {
            // dir/binary:     file format elf64-x86-64
            file_format:    Regex::new(r"^(.+?):[ \t]*file format ")?,
            // Disassembly of section .text:
            section:        Regex::new(r"^Disassembly of section (\S+):")?,
            // 000000000040076d <main>:
            function:       Regex::new(r"^([0-9a-f]+) <(.*)>:$")?,
            //   4004c3:   55                      push   %rbp
            operation:      Regex::new(r"^\s*[0-9a-f]+:\s+(?:[0-9a-f]+ )+\s+(\S+)")?,
        })
    }

    /// The object file name (without directories) of a file format line.
    pub fn get_file(&self, line: &str) -> Option<String>
    {
        let caps = self.file_format.captures(line)?;
        let path = caps.get(1)?.as_str();
        Some(path.rsplit('/').next().unwrap_or(path).to_string())
    }

    pub fn get_section(&self, line: &str) -> Option<String>
    {
        self.section.captures(line).map(|caps| caps[1].to_string())
    }

    /// The start address and name of a function label.
    pub fn get_function(&self, line: &str) -> Option<(u64, String)>
    {
        let caps = self.function.captures(line)?;
        let address = u64::from_str_radix(&caps[1], 16).ok()?;
        Some((address, caps[2].to_string()))
    }

    /// The instruction name of an instruction line.
    pub fn get_operation<'l>(&self, line: &'l str) -> Option<&'l str>
    {
        self.operation.captures(line).and_then(|caps| caps.get(1)).map(|m| m.as_str())
    }
}



///
/// The instruction grammar of one architecture.
///
/// The `*_op` accessors return the recognizer of a category, `None` when
/// the architecture has no such instruction. The `get_*` methods decode a
/// line the matching recognizer accepted.
///
pub trait Pattern: fmt::Debug
{
    fn target(&self) -> Target;

    fn base(&self) -> &Base;

    /// Remove the disassembler's trailing annotation from an instruction.
    fn strip_comment<'l>(&self, line: &'l str) -> &'l str
    {
        line
    }

    fn stack_push_op(&self) -> Option<&Regex>
    {
        None
    }

    fn stack_sub_op(&self) -> Option<&Regex>
    {
        None
    }

    fn stack_dynamic_op(&self) -> Option<&Regex>
    {
        None
    }

    fn function_pointer(&self) -> Option<&Regex>
    {
        None
    }

    fn potential_stack_op(&self) -> Option<&Regex>
    {
        None
    }

    /// The address and name of the called function, `None` if the line
    /// isn't a direct call.
    fn get_function_call(&self, line: &str) -> Option<(u64, String)>;

    /// How many bytes the stack grows by a push.
    fn get_stack_push_size(&self, line: &str) -> u64;

    /// The raw immediate of a stack decrement, before it is corrected by
    /// [`correct_decrement`].
    fn get_stack_sub_size(&self, line: &str) -> Option<u64>;

    /// Bytes of the return address a call pushes.
    fn get_stack_call_size(&self) -> u64
    {
        0
    }

    /// Classify a line. The first category matching wins.
    fn classify(&self, line: &str) -> Line
    {
        let base = self.base();

        if let Some(file) = base.get_file(line)
        {
            return Line::FileFormat(file);
        }
        if let Some(section) = base.get_section(line)
        {
            return Line::Section(section);
        }
        if let Some((address, name)) = base.get_function(line)
        {
            return Line::Function { address, name };
        }

        let code = self.strip_comment(line).trim_end();
        if code.is_empty()
        {
            return Line::NoImpact;
        }

        if is_match(self.stack_push_op(), code)
        {
            return Line::StackPush(self.get_stack_push_size(code));
        }

        if is_match(self.stack_sub_op(), code)
        {
            return match self.get_stack_sub_size(code).and_then(correct_decrement)
            {
                Some(size) => Line::StackSub(size),
                None       =>
                {
                    debug!("ignore stack decrement of unreasonable size: {}", line);
                    Line::NoImpact
                },
            };
        }

        if is_match(self.stack_dynamic_op(), code)
        {
            return Line::StackDynamic;
        }

        if let Some((address, name)) = self.get_function_call(code)
        {
            return Line::FunctionCall { address, name };
        }

        if is_match(self.function_pointer(), code)
        {
            return Line::FunctionPointer;
        }

        if is_match(self.potential_stack_op(), code)
        {
            return Line::PotentialStack;
        }

        Line::NoImpact
    }
}


/// The classifier of a target.
pub fn for_target(target: Target) -> Result<Box<dyn Pattern>, Error>
{
    Ok(match target
    {
        Target::Arm     => Box::new(Arm::new()?),
        Target::Aarch64 => Box::new(Aarch64::new()?),
        Target::X86     => Box::new(X86::new()?),
        Target::X86_64  => Box::new(X86_64::new()?),
    })
}


fn is_match(re: Option<&Regex>, line: &str) -> bool
{
    re.map(|re| re.is_match(line)).unwrap_or(false)
}


/// Decode a hexadecimal (`0x` prefixed) or decimal immediate.
pub fn parse_immediate(text: &str) -> Option<u64>
{
    match text.strip_prefix("0x")
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None      => text.parse().ok(),
    }
}


///
/// Undo the two's complement artifacts some disassemblers print for
/// stack decrements and reject values which can't be a stack frame.
///
/// Returns `None` for lines that were most likely data misread as an
/// instruction.
///
pub fn correct_decrement(size: u64) -> Option<u64>
{
    if size > 0xF000_0000_0000_0000
    {
        return None;
    }

    let size = if size > 0xF000_0000
    {
        // a negative 32 bit immediate; anything wider is garbage
        if size > 0xFFFF_FFFF
        {
            return None;
        }
        0x1_0000_0000 - size
    }
    else
    {
        size
    };

    if size > 0x1000_0000
    {
        return None;
    }

    Some(size)
}

use regex::Regex;

use crate::patterns::{parse_immediate, Arm, Base, Pattern};
use crate::{Error, Target};


/// A64 shares its recognizers with [`Arm`] but has no push, and its
/// decrements may carry a `lsl #12` shift.
#[derive(Debug)]
pub struct Aarch64
{
    arm:        Arm,
    immediate:  Regex,
}

impl Aarch64
{
    pub fn new() -> Result<Self, Error>
    {
        Ok(Aarch64
        {
            arm:        Arm::new()?,
            immediate:  Regex::new(r"#-?(0x[0-9a-f]+|[0-9]+)(,\s*lsl\s*#12)?")?,
        })
    }
}

impl Pattern for Aarch64
{
    fn target(&self) -> Target
    {
        Target::Aarch64
    }

    fn base(&self) -> &Base
    {
        self.arm.base()
    }

    fn strip_comment<'l>(&self, line: &'l str) -> &'l str
    {
        self.arm.strip_comment(line)
    }

    fn stack_sub_op(&self) -> Option<&Regex>
    {
        self.arm.stack_sub_op()
    }

    fn stack_dynamic_op(&self) -> Option<&Regex>
    {
        self.arm.stack_dynamic_op()
    }

    fn function_pointer(&self) -> Option<&Regex>
    {
        self.arm.function_pointer()
    }

    fn potential_stack_op(&self) -> Option<&Regex>
    {
        self.arm.potential_stack_op()
    }

    fn get_function_call(&self, line: &str) -> Option<(u64, String)>
    {
        self.arm.get_function_call(line)
    }

    fn get_stack_push_size(&self, _line: &str) -> u64
    {
        0
    }

    /// The first immediate, scaled by 4096 when shifted.
    fn get_stack_sub_size(&self, line: &str) -> Option<u64>
    {
        let caps = self.immediate.captures(line)?;
        let imm = parse_immediate(&caps[1])?;
        match caps.get(2)
        {
            Some(_) => imm.checked_mul(4096),
            None    => Some(imm),
        }
    }
}

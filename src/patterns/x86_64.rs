use regex::Regex;

use crate::patterns::{Base, Pattern, X86};
use crate::{Error, Target};


/// The IA-32 grammar with 64 bit words: an unsized push and a return
/// address occupy 8 bytes.
#[derive(Debug)]
pub struct X86_64
{
    x86:    X86,
}

impl X86_64
{
    pub fn new() -> Result<Self, Error>
    {
        Ok(X86_64 { x86: X86::with_word(8)? })
    }
}

impl Pattern for X86_64
{
    fn target(&self) -> Target
    {
        Target::X86_64
    }

    fn base(&self) -> &Base
    {
        self.x86.base()
    }

    fn strip_comment<'l>(&self, line: &'l str) -> &'l str
    {
        self.x86.strip_comment(line)
    }

    fn stack_push_op(&self) -> Option<&Regex>
    {
        self.x86.stack_push_op()
    }

    fn stack_sub_op(&self) -> Option<&Regex>
    {
        self.x86.stack_sub_op()
    }

    fn stack_dynamic_op(&self) -> Option<&Regex>
    {
        self.x86.stack_dynamic_op()
    }

    fn function_pointer(&self) -> Option<&Regex>
    {
        self.x86.function_pointer()
    }

    fn potential_stack_op(&self) -> Option<&Regex>
    {
        self.x86.potential_stack_op()
    }

    fn get_function_call(&self, line: &str) -> Option<(u64, String)>
    {
        self.x86.get_function_call(line)
    }

    fn get_stack_push_size(&self, line: &str) -> u64
    {
        self.x86.get_stack_push_size(line)
    }

    fn get_stack_sub_size(&self, line: &str) -> Option<u64>
    {
        self.x86.get_stack_sub_size(line)
    }

    fn get_stack_call_size(&self) -> u64
    {
        self.x86.get_stack_call_size()
    }
}


#[cfg(test)]
mod tests
{
    use super::*;
    use crate::patterns::Line;

    #[test]
    fn unsized_push_is_a_quad_word()
    {
        let x64 = X86_64::new().unwrap();
        assert_eq!(x64.classify("  4004c4:\t6a 00                \tpush   $0x0"), Line::StackPush(8));
        assert_eq!(x64.classify("  4004c3:\t55                   \tpush   %rbp"), Line::StackPush(8));
        assert_eq!(x64.classify("  4004c3:\t41 54                \tpush   %r12"), Line::StackPush(8));
        assert_eq!(x64.get_stack_call_size(), 8);
        assert_eq!(x64.target(), Target::X86_64);
    }

    #[test]
    fn frame_setup()
    {
        let x64 = X86_64::new().unwrap();
        assert_eq!(x64.classify("  4004c8:\t48 83 ec 20          \tsub    $0x20,%rsp"), Line::StackSub(32));
        assert_eq!(x64.classify("  4004c8:\t48 29 c4             \tsub    %rax,%rsp"), Line::StackDynamic);
        assert_eq!(x64.classify("  4004d6:\tc9                   \tleaveq "), Line::PotentialStack);
        assert_eq!(x64.classify("  4004d7:\tc3                   \tretq   "), Line::NoImpact);
    }

    #[test]
    fn calls_without_a_symbol()
    {
        let x64 = X86_64::new().unwrap();
        assert_eq!(
            x64.classify("  400734:\te8 b0 fe ff ff       \tcallq  4005e9"),
            Line::FunctionCall { address: 0x4005e9, name: String::new() }
        );
        assert_eq!(
            x64.classify("  400734:\te8 b0 fe ff ff       \tcallq  4005e9 <function_e>"),
            Line::FunctionCall { address: 0x4005e9, name: "function_e".to_string() }
        );
    }
}

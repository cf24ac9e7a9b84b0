use regex::Regex;

use crate::patterns::{parse_immediate, Base, Pattern};
use crate::{Error, Target};


const SP: &str = r"%(?:e|r|l)?sp";
const IMM: &str = r"(?:0x[0-9a-f]+|[0-9]+)";

const REG8: &str = "rax|rbx|rcx|rdx|rsi|rdi|rbp|rsp|r8|r9|r10|r11|r12|r13|r14|r15";
const REG4: &str = "eax|ebx|ecx|edx|esi|edi|ebp|esp|r8d|r9d|r10d|r11d|r12d|r13d|r14d|r15d";
const REG2: &str = "ax|bx|cx|dx|si|di|bp|sp|r8w|r9w|r10w|r11w|r12w|r13w|r14w|r15w";
const REG1: &str = "al|bl|cl|dl|ah|bh|ch|dh|sil|dil|bpl|spl|r8b|r9b|r10b|r11b|r12b|r13b|r14b|r15b";


/// AT&T syntax, as printed by GNU objdump for IA-32.
#[derive(Debug)]
pub struct X86
{
    base:           Base,
    /// Bytes of a push without a size hint, and of a return address.
    word:           u64,

    push:           Regex,
    sub:            Regex,
    dynamic:        Regex,
    call:           Regex,
    pointer:        Regex,
    potential:      Regex,

    /// Push operand width, widest first.
    registers:      [(Regex, u64); 4],
}

impl X86
{
    pub fn new() -> Result<Self, Error>
    {
        X86::with_word(4)
    }

    pub(super) fn with_word(word: u64) -> Result<Self, Error>
    {
        let register = |names: &str| Regex::new(&format!(r"\s%(?:{})$", names));

        Ok(X86
        {
            base:       Base::new()?,
            word,

            push:       Regex::new(r"\spush([wlq]?)[ \t]")?,
            sub:        Regex::new(&format!(r"\ssub[lq]?\s+\$({}),\s*{}$", IMM, SP))?,
            dynamic:    Regex::new(&format!(r"\ssub[lq]?\s+%[0-9a-z]+,\s*{}$", SP))?,
            // callq 4005e9 <function_e> | callq 4005e9
            call:       Regex::new(r"\scall[lq]?\s+([0-9a-f]+)(?:\s+<(.*)>)?\s*$")?,
            pointer:    Regex::new(r"\scall[lq]?\s+\*")?,
            potential:  Regex::new(&format!(
                r"\s(?:enter[wlq]?|leave[wlq]?|fdecstp|push(?:f[wlq]?|a[wl]?)|pop(?:[wlq]|f[wlq]?|a[wl]?)?)(?:\s|$)|\sadd[lq]?\s+\${},\s*{}$",
                IMM, SP
            ))?,

            registers:
            [
                (register(REG8)?, 8),
                (register(REG4)?, 4),
                (register(REG2)?, 2),
                (register(REG1)?, 1),
            ],
        })
    }

    /// Width of a pushed register, `None` for immediates and memory.
    fn register_size(&self, line: &str) -> Option<u64>
    {
        self.registers
            .iter()
            .find(|(re, _)| re.is_match(line))
            .map(|(_, size)| *size)
    }

    /// Width announced by the `w`, `l` or `q` suffix of `push`.
    fn suffix_size(&self, line: &str) -> Option<u64>
    {
        let caps = self.push.captures(line)?;
        match caps.get(1).map(|m| m.as_str())
        {
            Some("w") => Some(2),
            Some("l") => Some(4),
            Some("q") => Some(8),
            _         => None,
        }
    }
}

impl Pattern for X86
{
    fn target(&self) -> Target
    {
        Target::X86
    }

    fn base(&self) -> &Base
    {
        &self.base
    }

    fn strip_comment<'l>(&self, line: &'l str) -> &'l str
    {
        line.split('#').next().unwrap_or(line)
    }

    fn stack_push_op(&self) -> Option<&Regex>
    {
        Some(&self.push)
    }

    fn stack_sub_op(&self) -> Option<&Regex>
    {
        Some(&self.sub)
    }

    fn stack_dynamic_op(&self) -> Option<&Regex>
    {
        Some(&self.dynamic)
    }

    fn function_pointer(&self) -> Option<&Regex>
    {
        Some(&self.pointer)
    }

    fn potential_stack_op(&self) -> Option<&Regex>
    {
        Some(&self.potential)
    }

    fn get_function_call(&self, line: &str) -> Option<(u64, String)>
    {
        let caps = self.call.captures(line)?;
        let address = u64::from_str_radix(&caps[1], 16).ok()?;
        let name = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
        Some((address, name))
    }

    fn get_stack_push_size(&self, line: &str) -> u64
    {
        self.register_size(line)
            .or_else(|| self.suffix_size(line))
            .unwrap_or(self.word)
    }

    fn get_stack_sub_size(&self, line: &str) -> Option<u64>
    {
        let caps = self.sub.captures(line)?;
        parse_immediate(&caps[1])
    }

    fn get_stack_call_size(&self) -> u64
    {
        self.word
    }
}


#[cfg(test)]
mod tests
{
    use super::*;
    use crate::patterns::Line;

    fn line(op: &str) -> String
    {
        format!("  4004c3:\t55                   \t{}", op)
    }

    #[test]
    fn push_size_follows_the_operand()
    {
        let x86 = X86::new().unwrap();
        for (op, size) in [
            ("push   %rbp",         8),
            ("push   %ebp",         4),
            ("pushl  %ebx",         4),
            ("push   %bp",          2),
            ("push   %r12w",        2),
            ("push   %al",          1),
            ("pushw  $0x10",        2),
            ("pushq  $0x0",         8),
            ("pushl  0x8(%ebp)",    4),
            ("push   $0x0",         4),
        ]
        {
            assert_eq!(x86.classify(&line(op)), Line::StackPush(size), "{}", op);
        }
    }

    #[test]
    fn decrements()
    {
        let x86 = X86::new().unwrap();
        assert_eq!(x86.classify(&line("sub    $0x18,%esp")), Line::StackSub(0x18));
        assert_eq!(x86.classify(&line("subl   $0x20,%esp")), Line::StackSub(0x20));
        assert_eq!(x86.classify(&line("sub    $0xffffffbf,%esp")), Line::StackSub(0x41));
        assert_eq!(x86.classify(&line("sub    $0xffffffffffffffbf,%rsp")), Line::NoImpact);
        assert_eq!(x86.classify(&line("sub    $0x18,%eax")), Line::NoImpact);
    }

    #[test]
    fn dynamic_decrement()
    {
        let x86 = X86::new().unwrap();
        assert_eq!(x86.classify(&line("sub    %eax,%esp")), Line::StackDynamic);
        assert_eq!(x86.classify(&line("sub    %rax,%rsp")), Line::StackDynamic);
    }

    #[test]
    fn calls()
    {
        let x86 = X86::new().unwrap();
        assert_eq!(
            x86.classify("  400734: e8 b0 fe ff ff callq 4005e9 <function_e>"),
            Line::FunctionCall { address: 0x4005e9, name: "function_e".to_string() }
        );
        assert_eq!(
            x86.classify(&line("call   80483f0 <puts@plt>")),
            Line::FunctionCall { address: 0x80483f0, name: "puts@plt".to_string() }
        );
        assert_eq!(
            x86.classify(&line("call   80483f0")),
            Line::FunctionCall { address: 0x80483f0, name: String::new() }
        );
        assert_eq!(x86.classify(&line("call   *%eax")), Line::FunctionPointer);
        assert_eq!(x86.classify(&line("callq  *0x200a2c(%rip)        # 600ff0 <f>")), Line::FunctionPointer);
    }

    #[test]
    fn potential_stack_operations()
    {
        let x86 = X86::new().unwrap();
        for op in ["leave", "leaveq", "pop    %ebp", "popq   %rbx", "pushf", "enter  $0x8,$0x0", "add    $0x10,%esp"]
        {
            assert_eq!(x86.classify(&line(op)), Line::PotentialStack, "{}", op);
        }
    }

    #[test]
    fn unrelated_instructions()
    {
        let x86 = X86::new().unwrap();
        for op in ["mov    %esp,%ebp", "ret", "popcnt %eax,%ebx", "lea    0x4(%esp),%ecx", "nop"]
        {
            assert_eq!(x86.classify(&line(op)), Line::NoImpact, "{}", op);
        }
    }

    #[test]
    fn comments_are_ignored()
    {
        let x86 = X86::new().unwrap();
        assert_eq!(x86.classify(&line("mov    0x200b89(%rip),%eax        # 601040 <sub $0x10,%esp>")), Line::NoImpact);
    }
}

use regex::Regex;

use crate::patterns::{parse_immediate, Base, Pattern};
use crate::{Error, Target};


const SP: &str = r"w?sp";
const IMM: &str = r"(?:0x[0-9a-f]+|[0-9]+)";
const COND: &str = r"(?:eq|ne|cs|hs|cc|lo|mi|pl|vs|vc|hi|ls|ge|lt|gt|le|al)";
/// General purpose registers that may hold a branch target.
const REG: &str = r"(?:r[0-9]|r1[0-2]|ip|fp|sl|sb)";


///
/// Unified assembler syntax of A32 and T32 as printed by objdump.
///
/// The A64 profile reuses the recognizers that have the same shape in
/// both instruction sets.
///
#[derive(Debug)]
pub struct Arm
{
    base:       Base,

    push:       Regex,
    sub:        Regex,
    dynamic:    Regex,
    call:       Regex,
    cbz:        Regex,
    pointer:    Regex,
    potential:  Regex,
}

impl Arm
{
    pub fn new() -> Result<Self, Error>
    {
        Ok(Arm
        {
            base:       Base::new()?,

            // push {r4, lr} | vpush {d8-d15} | stmdb sp!, {r4, r5}
            push:       Regex::new(&format!(
                r"\sv?push{c}?(?:\.[wn])?\s+\{{|\sstm(?:db|fd){c}?(?:\.w)?\s+sp!,\s*\{{",
                c = COND
            ))?,
            // sub sp, sp, #16 | add sp, sp, #-16 | str r4, [sp, #-4]! | stp x29, x30, [sp, #-32]!
            sub:        Regex::new(&format!(
                concat!(
                    r"\ssub[sw]?{c}?(?:\.[wn])?\s+{sp},\s*(?:{sp},\s*)?#{imm}",
                    r"|\sadd[sw]?{c}?(?:\.[wn])?\s+{sp},\s*(?:{sp},\s*)?#-{imm}",
                    r"|\sstr[bhd]?{c}?(?:\.w)?\s+[a-z][a-z0-9]*,\s*(?:[a-z][a-z0-9]*,\s*)?\[{sp},\s*#-{imm}\]!",
                    r"|\sstp\s+[a-z][a-z0-9]*,\s*[a-z][a-z0-9]*,\s*\[{sp},\s*#-{imm}\]!",
                ),
                c = COND, sp = SP, imm = IMM
            ))?,
            dynamic:    Regex::new(&format!(
                r"\ssub[sw]?{c}?(?:\.[wn])?\s+{sp},\s*(?:{sp},\s*)?(?:r[0-9]+|ip|fp|sl|sb|lr|[xw][0-9]+)(?:,|\s|$)",
                c = COND, sp = SP
            ))?,
            // bl 104a4 <func_alpha> | bne.n 8150 <foo+0xc>
            call:       Regex::new(&format!(
                r"\s(?:bl|blx|b){c}?(?:\.[wn])?\s+([0-9a-f]+)(?:\s+<(.*)>)?$",
                c = COND
            ))?,
            cbz:        Regex::new(r"\scbn?z\s+[a-z][a-z0-9]*,\s*([0-9a-f]+)(?:\s+<(.*)>)?$")?,
            // bx lr is a return
            pointer:    Regex::new(&format!(
                r"\s(?:bx|blx|bxj){c}?(?:\.[wn])?\s+{r}$|\s(?:blr|br)\s+x(?:[0-9]|[12][0-9]|30)$",
                c = COND, r = REG
            ))?,
            potential:  Regex::new(&format!(
                concat!(
                    r"\sv?pop{c}?(?:\.[wn])?\s+\{{",
                    r"|\sldm(?:ia|fd)?{c}?(?:\.w)?\s+sp!",
                    r"|\sld(?:r|rd|p)[a-z]*\s+[^\[]*\[{sp}\],\s*#",
                    r"|\sadd[sw]?{c}?(?:\.[wn])?\s+{sp},\s*(?:{sp},\s*)?#{imm}",
                ),
                c = COND, sp = SP, imm = IMM
            ))?,
        })
    }
}


/// Bytes of a register list like `{r4, r5, lr}` or `{d8-d15}`.
fn register_list_size(line: &str) -> u64
{
    let list = match line.split_once('{').and_then(|(_, rest)| rest.split_once('}'))
    {
        Some((list, _)) => list,
        None            => return 0,
    };

    list.split(',')
        .map(str::trim)
        .filter(|reg| !reg.is_empty())
        .map(|reg| register_count(reg) * register_size(reg))
        .sum()
}

fn register_size(reg: &str) -> u64
{
    match reg.chars().next()
    {
        Some('d') => 8,
        Some('q') => 16,
        _         => 4,
    }
}

fn register_count(reg: &str) -> u64
{
    let number = |r: &str| r.trim().get(1..).and_then(|n| n.parse::<u64>().ok());

    match reg.split_once('-')
    {
        Some((lo, hi)) => match (number(lo), number(hi))
        {
            (Some(lo), Some(hi)) if hi >= lo => hi - lo + 1,
            _                                => 1,
        },
        None => 1,
    }
}


impl Pattern for Arm
{
    fn target(&self) -> Target
    {
        Target::Arm
    }

    fn base(&self) -> &Base
    {
        &self.base
    }

    fn strip_comment<'l>(&self, line: &'l str) -> &'l str
    {
        let end = [line.find(';'), line.find("//")]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(line.len());
        &line[..end]
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
        let caps = self.call.captures(line).or_else(|| self.cbz.captures(line))?;
        let address = u64::from_str_radix(&caps[1], 16).ok()?;
        let name = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
        Some((address, name))
    }

    fn get_stack_push_size(&self, line: &str) -> u64
    {
        register_list_size(line)
    }

    /// The immediate after the last `#`.
    fn get_stack_sub_size(&self, line: &str) -> Option<u64>
    {
        let (_, imm) = line.rsplit_once('#')?;
        let imm = imm.trim_start_matches('-');
        let imm = imm.split(|c: char| !c.is_ascii_alphanumeric()).next()?;
        parse_immediate(imm)
    }
}

use std::{ io, fs, path::PathBuf, };
use log::info;
use xmas_elf::{ header::Machine, ElfFile };

use thiserror::Error;

use crate::Target;



///
/// Errors which may occur when detecting the target of a binary.
///
#[derive(Error, Debug)]
pub enum InputError
{
        #[error("std::fs::read() raised this error: {0:?}")]
        IoErr(#[from] io::Error),

        #[error("Not a valid ELF: {0}")]
        BadXmas(String),

        #[error("Unsupported machine {0}; supported are arm, aarch64, x86 and x86_64.")]
        UnknownMachine(String),
}



///
/// A binary and the target its listing is classified with.
///
#[derive(Clone, Debug)]
pub struct InputData
{
    pub elf_path:   PathBuf,
    pub elf_bytes:  Vec<u8>,
    pub target:     Target,
}


///
/// The target of an ELF image, from the machine field of its header.
///
pub fn detect_target(elf_bytes: &[u8]) -> Result<Target, InputError>
{
    let elf = ElfFile::new(elf_bytes).map_err(|s|
                InputError::BadXmas( s.to_string() ))?;

    match elf.header.pt2.machine().as_machine()
    {
        Machine::X86        => Ok(Target::X86),
        Machine::X86_64     => Ok(Target::X86_64),
        Machine::Arm        => Ok(Target::Arm),
        Machine::AArch64    => Ok(Target::Aarch64),
        other               => Err(InputError::UnknownMachine(format!("{:?}", other))),
    }
}

///
/// Load the file provided by `elf_fp` and detect its target.
///
pub fn load_target(elf_fp: PathBuf) -> Result<InputData, InputError>
{
    let elf_bytes: Vec<u8> = fs::read(&elf_fp)?;
    let target = detect_target(&elf_bytes)?;

    info!("{:?} is a {} binary", elf_fp, target);

    Ok(InputData
    {
        elf_path: elf_fp,
        elf_bytes,
        target,
    })
}

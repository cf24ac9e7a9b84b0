
use std::io;

///
/// Writer adapter which escapes everything written through it for use
/// inside a double quoted DOT string.
///
pub struct Escaper<W>
where
    W: io::Write,
{
    pub writer: W,
}


impl<W> Escaper<W>
where
    W: io::Write,
{
    pub fn new(writer: W) -> Self {
        Escaper { writer }
    }
}


impl<W> io::Write for Escaper<W>
where
    W: io::Write
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>
    {
        for &c in buf
        {
            match c
            {
                b'"' | b'\\'    => self.writer.write_all(&[b'\\', c])?,
                b'\n'           => self.writer.write_all(b"\\n")?,
                _               => self.writer.write_all(&[c])?,
            }
        }
        // every input byte was consumed
        Ok( buf.len() )
    }

    fn flush(&mut self) -> io::Result<()>
    {
        self.writer.flush()
    }
}


#[cfg(test)]
mod tests
{
    use super::*;
    use std::io::Write as _;

    #[test]
    fn quotes_and_backslashes()
    {
        let mut out = vec![];
        write!(Escaper::new(&mut out), "<\"a\" as b\\c>").unwrap();
        assert_eq!(out, b"<\\\"a\\\" as b\\\\c>");
    }
}

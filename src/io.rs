use std::io::{BufRead, Read, Write};

use bytemuck::Pod;

/// One node of a binary `$Nodes` section.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, packed)]
pub struct NodeRecord {
    pub id: i32,
    pub coords: [f64; 3],
}

/// Header preceding a run of same-shaped binary element records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct ElementBlockHeader {
    pub element_type: i32,
    pub count: i32,
    pub n_tags: i32,
}

/// Buffered input that can be consumed by lines and by exact byte counts.
///
/// Both kinds of reads go through the same `BufRead`, so switching from
/// text to binary in the middle of a file never loses buffered bytes.
pub struct MshStream<R> {
    inner: R,
    line_no: usize,
}

impl<R: BufRead> MshStream<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, line_no: 0 }
    }

    /// Number of lines consumed so far.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Reads the next non-blank line into `buf`, trimmed.
    ///
    /// Returns `false` at end of input.
    pub fn next_line(&mut self, buf: &mut String) -> std::io::Result<bool> {
        while self.next_raw_line(buf)? {
            if !buf.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Reads the next line into `buf`, trimmed, even if it is blank.
    pub fn next_raw_line(&mut self, buf: &mut String) -> std::io::Result<bool> {
        buf.clear();
        if self.inner.read_line(buf)? == 0 {
            return Ok(false);
        }
        self.line_no += 1;
        let end = buf.trim_end().len();
        buf.truncate(end);
        let start = buf.len() - buf.trim_start().len();
        if start > 0 {
            buf.drain(..start);
        }
        Ok(true)
    }

    pub fn read_pod<T: Pod>(&mut self) -> std::io::Result<T> {
        let mut value = T::zeroed();
        self.inner.read_exact(bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }

    pub fn read_pod_vec<T: Pod>(&mut self, n: usize) -> std::io::Result<Vec<T>> {
        let mut values = vec![T::zeroed(); n];
        self.inner.read_exact(bytemuck::cast_slice_mut(&mut values))?;
        Ok(values)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

pub fn write_pod<T: Pod>(write: &mut dyn Write, value: &T) -> std::io::Result<()> {
    write.write_all(bytemuck::bytes_of(value))
}

pub fn write_pod_slice<T: Pod>(write: &mut dyn Write, values: &[T]) -> std::io::Result<()> {
    write.write_all(bytemuck::cast_slice(values))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn lines_and_bytes_share_position() {
        let mut data = b"  first \n\n2\n".to_vec();
        data.extend_from_slice(&7i32.to_ne_bytes());
        data.extend_from_slice(b"\nlast\n");
        let mut stream = MshStream::new(Cursor::new(data));
        let mut line = String::new();
        assert!(stream.next_line(&mut line).unwrap());
        assert_eq!(line, "first");
        assert!(stream.next_line(&mut line).unwrap());
        assert_eq!(line, "2");
        assert_eq!(stream.read_pod::<i32>().unwrap(), 7);
        assert_eq!(stream.read_pod::<u8>().unwrap(), b'\n');
        assert!(stream.next_line(&mut line).unwrap());
        assert_eq!(line, "last");
        assert!(!stream.next_line(&mut line).unwrap());
    }

    #[test]
    fn raw_lines_keep_blanks() {
        let mut stream = MshStream::new(Cursor::new(b"a\n\n b \nrest".to_vec()));
        let mut line = String::new();
        assert!(stream.next_raw_line(&mut line).unwrap());
        assert_eq!(line, "a");
        assert!(stream.next_raw_line(&mut line).unwrap());
        assert_eq!(line, "");
        assert!(stream.next_raw_line(&mut line).unwrap());
        assert_eq!(line, "b");
        assert_eq!(stream.line_no(), 3);
        let rest = stream.into_inner();
        assert_eq!(&rest.get_ref()[rest.position() as usize..], b"rest");
    }

    #[test]
    fn node_record_is_packed() {
        assert_eq!(std::mem::size_of::<NodeRecord>(), 4 + 3 * 8);
        assert_eq!(std::mem::size_of::<ElementBlockHeader>(), 12);
    }
}

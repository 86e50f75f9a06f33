use std::borrow::Cow;

/// A little-endian byte buffer meant for reading.
///
/// Example usage:
///
/// ```
/// use std::borrow::Cow;
/// let mut bb = alon_schema::ByteBuffer::new(&[3, 0, 0, 0, 102, 111, 111, 232, 3]);
/// assert_eq!(bb.read_string(), Ok(Cow::Borrowed("foo")));
/// assert_eq!(bb.read_u16(), Ok(1000));
/// ```
///
pub struct ByteBuffer<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice. The lifetime
    /// of the returned ByteBuffer must not outlive the lifetime of the byte
    /// slice.
    pub fn new(data: &[u8]) -> ByteBuffer {
        ByteBuffer { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice. This starts
    /// off as 0 and ends up as `self.data().len()` when everything has been
    /// read.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// Try to read a byte starting at the current index.
    pub fn read_byte(&mut self) -> Result<u8, ()> {
        if self.index >= self.data.len() {
            Err(())
        } else {
            let value = self.data[self.index];
            self.index += 1;
            Ok(value)
        }
    }

    /// Try to read `len` raw bytes starting at the current index.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ()> {
        if len > self.remaining() {
            Err(())
        } else {
            let value = &self.data[self.index..self.index + len];
            self.index += len;
            Ok(value)
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ()> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u16(&mut self) -> Result<u16, ()> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ()> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ()> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, ()> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, ()> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Try to read a length-prefixed string starting at the current index.
    /// Invalid UTF-8 is replaced rather than rejected, since the generated C
    /// treats the payload as opaque bytes.
    pub fn read_string(&mut self) -> Result<Cow<'a, str>, ()> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes))
    }
}

#[test]
fn read_byte() {
    let read = |bytes| ByteBuffer::new(bytes).read_byte();
    assert_eq!(read(&[]), Err(()));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[1]), Ok(1));
    assert_eq!(read(&[254]), Ok(254));
    assert_eq!(read(&[255]), Ok(255));
}

#[test]
fn read_bytes() {
    let read = |bytes, len| ByteBuffer::new(bytes).read_bytes(len);
    assert_eq!(read(&[], 0), Ok(vec![].as_slice()));
    assert_eq!(read(&[], 1), Err(()));
    assert_eq!(read(&[0], 0), Ok(vec![].as_slice()));
    assert_eq!(read(&[0], 1), Ok(vec![0].as_slice()));
    assert_eq!(read(&[0], 2), Err(()));
}

#[test]
fn read_fixed_width() {
    assert_eq!(ByteBuffer::new(&[232, 3]).read_u16(), Ok(1000));
    assert_eq!(ByteBuffer::new(&[232]).read_u16(), Err(()));
    assert_eq!(ByteBuffer::new(&[50, 0, 0, 0]).read_u32(), Ok(50));
    assert_eq!(
        ByteBuffer::new(&[255, 255, 255, 255, 255, 255, 255, 255]).read_u64(),
        Ok(u64::MAX)
    );
    assert_eq!(ByteBuffer::new(&[0, 0, 0, 63]).read_f32(), Ok(0.5));
    assert_eq!(ByteBuffer::new(&[0, 0, 0, 0, 0, 0, 224, 63]).read_f64(), Ok(0.5));
}

#[test]
fn read_string() {
    let read = |bytes| ByteBuffer::new(bytes).read_string();
    assert_eq!(read(&[0, 0, 0, 0]), Ok(Cow::Borrowed("")));
    assert_eq!(read(&[3, 0, 0, 0, 102, 111, 111]), Ok(Cow::Borrowed("foo")));
    assert_eq!(read(&[3, 0, 0, 0, 102, 111]), Err(()));
    assert_eq!(read(&[3, 0, 0]), Err(()));
    assert_eq!(
        read(&[4, 0, 0, 0, 240, 159, 141, 149]),
        Ok(Cow::Borrowed("🍕"))
    );
}

#[test]
fn read_sequence() {
    let mut bb = ByteBuffer::new(&[10, 232, 3, 1, 0, 0, 0, 97, 7]);
    assert_eq!(bb.read_byte(), Ok(10));
    assert_eq!(bb.read_u16(), Ok(1000));
    assert_eq!(bb.read_string(), Ok(Cow::Borrowed("a")));
    assert_eq!(bb.index(), 8);
    assert_eq!(bb.remaining(), 1);
    assert_eq!(bb.read_byte(), Ok(7));
    assert_eq!(bb.read_byte(), Err(()));
}

/// A little-endian byte buffer meant for writing.
///
/// Example usage:
///
/// ```
/// let mut bb = alon_schema::ByteBufferMut::new();
/// bb.write_u32(50);
/// bb.write_u16(1000);
/// assert_eq!(bb.data(), [50, 0, 0, 0, 232, 3]);
/// ```
///
#[derive(Default)]
pub struct ByteBufferMut {
    data: Vec<u8>,
}

impl ByteBufferMut {
    /// Creates an empty ByteBufferMut ready for writing.
    pub fn new() -> ByteBufferMut {
        ByteBufferMut { data: vec![] }
    }

    /// Consumes this buffer and returns the underlying backing store. Use this
    /// to get the data out when you're done writing to the buffer.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a byte to the end of the buffer.
    pub fn write_byte(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Write a raw byte slice to the end of the buffer.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Write a u32 length prefix followed by the string's bytes. No
    /// terminator goes on the wire. Returns `Err(())` if the string is too
    /// long for the prefix.
    pub fn write_string(&mut self, value: &str) -> Result<(), ()> {
        let len = u32::try_from(value.len()).map_err(|_| ())?;
        self.write_u32(len);
        self.write_bytes(value.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut ByteBufferMut)) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    cb(&mut bb);
    bb.data()
}

#[test]
fn write_byte() {
    assert_eq!(write_once(|bb| bb.write_byte(0)), [0]);
    assert_eq!(write_once(|bb| bb.write_byte(1)), [1]);
    assert_eq!(write_once(|bb| bb.write_byte(254)), [254]);
    assert_eq!(write_once(|bb| bb.write_byte(255)), [255]);
}

#[test]
fn write_bytes() {
    let mut bb = ByteBufferMut::new();
    bb.write_bytes(&[1, 2, 3]);
    bb.write_bytes(&[]);
    bb.write_bytes(&[4, 5]);
    assert_eq!(bb.data(), [1, 2, 3, 4, 5]);
}

#[test]
fn write_fixed_width() {
    assert_eq!(write_once(|bb| bb.write_u16(1000)), [232, 3]);
    assert_eq!(write_once(|bb| bb.write_u32(50)), [50, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_u64(1)), [1, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_f32(0.5)), [0, 0, 0, 63]);
    assert_eq!(write_once(|bb| bb.write_f64(0.5)), [0, 0, 0, 0, 0, 0, 224, 63]);
}

#[test]
fn write_string() {
    assert_eq!(write_once(|bb| bb.write_string("").unwrap()), [0, 0, 0, 0]);
    assert_eq!(write_once(|bb| bb.write_string("a").unwrap()), [1, 0, 0, 0, 97]);
    assert_eq!(
        write_once(|bb| bb.write_string("bar").unwrap()),
        [3, 0, 0, 0, 98, 97, 114]
    );
}

#[test]
fn write_sequence() {
    let mut bb = ByteBufferMut::new();
    bb.write_byte(1);
    bb.write_string("bruh").unwrap();
    assert_eq!(bb.len(), 9);
    assert_eq!(bb.data(), [1, 4, 0, 0, 0, 98, 114, 117, 104]);
}

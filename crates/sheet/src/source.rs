use crate::error::Result;
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// Where an adapter reads its data from
pub enum Input<'a> {
    /// A file on disk
    Path(&'a Path),
    /// An in-memory byte buffer
    Bytes(&'a [u8]),
    /// In-memory text (meaningful for delimited text; other adapters see its bytes)
    Text(&'a str),
    /// An open readable stream, consumed to the end
    Stream(&'a mut dyn Read),
}

impl<'a> Input<'a> {
    /// Read the whole input into memory.
    pub fn into_bytes(self) -> Result<Cow<'a, [u8]>> {
        match self {
            Input::Path(path) => Ok(Cow::Owned(std::fs::read(path)?)),
            Input::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            Input::Text(text) => Ok(Cow::Borrowed(text.as_bytes())),
            Input::Stream(reader) => {
                let mut buffer = Vec::new();
                reader.read_to_end(&mut buffer)?;
                Ok(Cow::Owned(buffer))
            }
        }
    }
}

impl fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Input::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Input::Text(text) => write!(f, "Text({} chars)", text.chars().count()),
            Input::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl<'a> From<&'a Path> for Input<'a> {
    fn from(path: &'a Path) -> Self {
        Input::Path(path)
    }
}

impl<'a> From<&'a [u8]> for Input<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Input::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(text: &'a str) -> Self {
        Input::Text(text)
    }
}

/// A seekable view over an input, as required by the zip and OLE based codecs.
pub(crate) enum SeekableInput<'a> {
    File(BufReader<File>),
    Memory(Cursor<Cow<'a, [u8]>>),
}

impl<'a> SeekableInput<'a> {
    pub(crate) fn open(input: Input<'a>) -> Result<Self> {
        match input {
            Input::Path(path) => Ok(SeekableInput::File(BufReader::new(File::open(path)?))),
            other => Ok(SeekableInput::Memory(Cursor::new(other.into_bytes()?))),
        }
    }
}

impl Read for SeekableInput<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            SeekableInput::File(reader) => reader.read(buf),
            SeekableInput::Memory(cursor) => cursor.read(buf),
        }
    }
}

impl std::io::Seek for SeekableInput<'_> {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            SeekableInput::File(reader) => reader.seek(pos),
            SeekableInput::Memory(cursor) => cursor.seek(pos),
        }
    }
}

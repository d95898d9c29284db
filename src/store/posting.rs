use crate::store::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use memmap2::{Mmap, MmapOptions};
use std::cmp::Ordering;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};
use std::path::Path;

/// term_id(32bit) + doc_id(32bit) + term_freq(32bit), little endian
pub const POSTING_SIZE: u64 = (32 + 32 + 32) / 8;

/// One occurrence record. Identity and ordering are the
/// `(term_id, doc_id)` key; the frequency is payload.
#[derive(Debug, Clone, Copy)]
pub struct Posting {
    pub term_id: u32,
    pub doc_id: u32,
    pub term_freq: u32,
}

impl Posting {
    pub fn new(term_id: u32, doc_id: u32, term_freq: u32) -> Self {
        Posting {
            term_id,
            doc_id,
            term_freq,
        }
    }

    #[inline(always)]
    pub fn key(&self) -> (u32, u32) {
        (self.term_id, self.doc_id)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.term_id)?;
        writer.write_u32::<LittleEndian>(self.doc_id)?;
        writer.write_u32::<LittleEndian>(self.term_freq)?;

        Ok(())
    }

    /// `buf` must hold at least one whole record.
    pub fn decode(buf: &[u8]) -> Self {
        Posting {
            term_id: LittleEndian::read_u32(buf),
            doc_id: LittleEndian::read_u32(&buf[4..]),
            term_freq: LittleEndian::read_u32(&buf[8..]),
        }
    }
}

impl PartialEq for Posting {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Posting {}

impl Hash for Posting {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Posting {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Posting {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Streaming decoder over a postings byte stream. A clean end of
/// input yields `None`; a record cut short is `Corrupt`.
#[derive(Debug)]
pub struct PostingReader<R: Read> {
    reader: R,
}

impl<R: Read> PostingReader<R> {
    pub fn new(reader: R) -> Self {
        PostingReader { reader }
    }

    pub fn next(&mut self) -> Result<Option<Posting>> {
        let mut buf = [0u8; POSTING_SIZE as usize];
        let mut filled = 0;

        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => (),
                Err(e) => return Err(Error::Io(e)),
            }
        }

        match filled {
            0 => Ok(None),
            n if n == buf.len() => Ok(Some(Posting::decode(&buf))),
            _ => Err(Error::Corrupt),
        }
    }
}

/// Read-only view over a sealed postings file. Every record is
/// reachable by index because the record size is fixed.
#[derive(Debug)]
pub struct PostingFile {
    mmap: Option<Mmap>,
    len: u64,
}

impl PostingFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        if size % POSTING_SIZE != 0 {
            return Err(Error::Corrupt);
        }

        let mmap = if size == 0 {
            None
        } else {
            Some(unsafe { MmapOptions::new().map(&file)? })
        };

        Ok(PostingFile {
            mmap,
            len: size / POSTING_SIZE,
        })
    }

    /// Number of records.
    #[inline(always)]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: u64) -> Result<Posting> {
        if index >= self.len {
            return Err(Error::OutOfRange);
        }

        let start = (index * POSTING_SIZE) as usize;
        match self.mmap {
            Some(ref mmap) => Ok(Posting::decode(&mmap[start..])),
            None => Err(Error::OutOfRange),
        }
    }

    /// Run of `count` records starting at byte `offset`. The whole
    /// range is bounds-checked here so iteration is infallible.
    pub fn range(&self, offset: u64, count: u32) -> Result<Occurrences<'_>> {
        if offset % POSTING_SIZE != 0 {
            return Err(Error::Corrupt);
        }

        let bytes = u64::from(count) * POSTING_SIZE;
        if offset + bytes > self.len * POSTING_SIZE {
            return Err(Error::OutOfRange);
        }

        let buf = match self.mmap {
            Some(ref mmap) => &mmap[offset as usize..(offset + bytes) as usize],
            None => &[],
        };

        Ok(Occurrences { buf })
    }
}

#[derive(Debug)]
pub struct Occurrences<'a> {
    buf: &'a [u8],
}

impl<'a> Iterator for Occurrences<'a> {
    type Item = Posting;

    fn next(&mut self) -> Option<Posting> {
        if self.buf.is_empty() {
            return None;
        }

        let posting = Posting::decode(self.buf);
        self.buf = &self.buf[POSTING_SIZE as usize..];
        Some(posting)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.buf.len() / POSTING_SIZE as usize;
        (n, Some(n))
    }
}

impl<'a> ExactSizeIterator for Occurrences<'a> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn encode(postings: &[Posting]) -> Vec<u8> {
        let mut buf = Vec::new();
        for p in postings {
            p.write_to(&mut buf).unwrap();
        }
        buf
    }

    #[test]
    fn codec_round_trip() {
        let posting = Posting::new(7, 42, 3);
        let buf = encode(&[posting]);
        assert_eq!(buf.len() as u64, POSTING_SIZE);

        let decoded = Posting::decode(&buf);
        assert_eq!(decoded.term_id, 7);
        assert_eq!(decoded.doc_id, 42);
        assert_eq!(decoded.term_freq, 3);
    }

    #[test]
    fn order_is_term_id_then_doc_id() {
        let mut postings = vec![
            Posting::new(2, 1, 1),
            Posting::new(1, 9, 1),
            Posting::new(1, 2, 1),
            Posting::new(0, 5, 1),
        ];
        postings.sort();

        let keys: Vec<(u32, u32)> = postings.iter().map(Posting::key).collect();
        assert_eq!(keys, vec![(0, 5), (1, 2), (1, 9), (2, 1)]);
    }

    #[test]
    fn equality_ignores_frequency() {
        assert_eq!(Posting::new(1, 2, 3), Posting::new(1, 2, 99));
        assert_ne!(Posting::new(1, 2, 3), Posting::new(1, 3, 3));
    }

    #[test]
    fn reader_streams_until_clean_eof() {
        let buf = encode(&[Posting::new(0, 1, 2), Posting::new(0, 2, 1)]);
        let mut reader = PostingReader::new(&buf[..]);

        assert_eq!(reader.next().unwrap().unwrap().doc_id, 1);
        assert_eq!(reader.next().unwrap().unwrap().doc_id, 2);
        assert!(reader.next().unwrap().is_none());
    }

    #[test]
    fn reader_rejects_short_record() {
        let mut buf = encode(&[Posting::new(0, 1, 2)]);
        buf.truncate(buf.len() - 5);
        let mut reader = PostingReader::new(&buf[..]);

        match reader.next() {
            Err(Error::Corrupt) => (),
            other => panic!("expected Corrupt, got {:?}", other),
        }
    }

    #[test]
    fn posting_file_serves_ranges() {
        let postings = [
            Posting::new(0, 1, 2),
            Posting::new(1, 1, 1),
            Posting::new(1, 3, 4),
        ];

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&encode(&postings)).unwrap();
        tmp.flush().unwrap();

        let file = PostingFile::open(tmp.path()).unwrap();
        assert_eq!(file.len(), 3);
        assert_eq!(file.get(1).unwrap().key(), (1, 1));

        let run: Vec<Posting> = file.range(POSTING_SIZE, 2).unwrap().collect();
        assert_eq!(run.len(), 2);
        assert_eq!(run[0].key(), (1, 1));
        assert_eq!(run[1].key(), (1, 3));
        assert_eq!(run[1].term_freq, 4);

        match file.range(POSTING_SIZE, 3) {
            Err(Error::OutOfRange) => (),
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn posting_file_rejects_torn_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&[0u8; 13]).unwrap();
        tmp.flush().unwrap();

        match PostingFile::open(tmp.path()) {
            Err(Error::Corrupt) => (),
            other => panic!("expected Corrupt, got {:?}", other),
        }
    }
}

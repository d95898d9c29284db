use crate::store::constants::{
    POSTING_FILE_PREFIX, POSTING_FILE_SUFFIX, TMP_OCCURRENCES_LIMIT, VERSION,
    VOCAB_DICT_FILE_NAME, VOCAB_DICT_MAGIC_NUMBER, VOCAB_INDEX_FILE_NAME,
    VOCAB_INDEX_MAGIC_NUMBER,
};
use crate::store::error::{Error, Result};
use crate::store::index::Index;
use crate::store::posting::{Posting, PostingFile, PostingReader, POSTING_SIZE};
use crate::store::term::{TermEntry, Vocabulary};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use fst::Streamer;
use log::{debug, info};
use memmap2::MmapOptions;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::mem;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    store_dir: PathBuf,
    tmp_limit: usize,
}

impl Config {
    pub fn new(store_dir: PathBuf) -> Self {
        Config {
            store_dir,
            tmp_limit: TMP_OCCURRENCES_LIMIT,
        }
    }

    /// Smaller limits force more merge generations; mostly for tests.
    pub fn tmp_limit(mut self, tmp_limit: usize) -> Self {
        self.tmp_limit = tmp_limit.max(1);
        self
    }

    fn posting_file_path(&self, counter: u32) -> PathBuf {
        let mut buf = self.store_dir.clone();
        buf.push(format!(
            "{}{}{}",
            POSTING_FILE_PREFIX, counter, POSTING_FILE_SUFFIX
        ));
        buf
    }

    fn vocab_index_path(&self) -> PathBuf {
        let mut buf = self.store_dir.clone();
        buf.push(VOCAB_INDEX_FILE_NAME);
        buf
    }

    fn vocab_dict_path(&self) -> PathBuf {
        let mut buf = self.store_dir.clone();
        buf.push(VOCAB_DICT_FILE_NAME);
        buf
    }
}

/// Disk-backed inverted index built with an external merge sort.
///
/// `add` buffers postings in memory; whenever the buffer reaches the
/// configured limit it is sorted and two-way merged with the previous
/// on-disk generation into `occur_index_<k+1>.idx`. Peak memory stays
/// bounded by the buffer plus two streaming file buffers no matter how
/// large the corpus grows. `finalize` merges the remainder, scans the
/// final file once to fill in per-term offsets and document counts,
/// and seals the index for reading.
#[derive(Debug)]
pub struct FileIndex {
    config: Config,
    vocab: Vocabulary,
    buffer: Vec<Posting>,
    documents: HashSet<u32>,
    doc_count: u32,
    file_counter: u32,
    current_file: Option<PathBuf>,
    postings: Option<PostingFile>,
    poisoned: bool,
}

impl FileIndex {
    pub fn new(config: Config) -> Self {
        FileIndex {
            config,
            vocab: Vocabulary::new(),
            buffer: Vec::new(),
            documents: HashSet::new(),
            doc_count: 0,
            file_counter: 0,
            current_file: None,
            postings: None,
            poisoned: false,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.postings.is_some()
    }

    /// Authoritative postings file, once one exists.
    pub fn posting_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    /// Counts a document that contributed no postings (for example,
    /// one whose terms were all stop words) toward `document_count`.
    pub fn register_document(&mut self, doc_id: u32) -> Result<()> {
        if self.is_sealed() || self.poisoned {
            return Err(Error::InvalidState);
        }

        if self.documents.insert(doc_id) {
            self.doc_count += 1;
        }

        Ok(())
    }

    fn spill_and_merge(&mut self) -> Result<()> {
        let mut buffer = mem::take(&mut self.buffer);
        buffer.sort_unstable();
        fuse_sorted(&mut buffer);

        let old_path = self.current_file.clone();
        if old_path.is_some() {
            self.file_counter += 1;
        }
        let new_path = self.config.posting_file_path(self.file_counter);

        let written = match merge_into(&new_path, buffer, old_path.as_deref()) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&new_path);
                self.poisoned = true;
                return Err(e);
            }
        };

        if let Some(ref old) = old_path {
            if let Err(e) = fs::remove_file(old) {
                self.poisoned = true;
                return Err(Error::Io(e));
            }
        }

        self.current_file = Some(new_path);
        debug!(
            "spill: {} postings in generation {}",
            written, self.file_counter
        );

        Ok(())
    }

    /// Writes the vocabulary of a sealed index: an fst from term to
    /// dict offset, and a dict file of fixed-size metadata records.
    pub fn save(&self) -> Result<()> {
        if !self.is_sealed() {
            return Err(Error::InvalidState);
        }

        let mut terms: Vec<(&str, &TermEntry)> = self.vocab.iter().collect();
        terms.sort_by_key(|&(term, _)| term);

        let index_file = File::create(self.config.vocab_index_path())?;
        let mut index_writer = BufWriter::new(index_file);
        index_writer.write_u64::<LittleEndian>(VOCAB_INDEX_MAGIC_NUMBER)?;
        index_writer.write_u8(VERSION)?;

        let dict_file = File::create(self.config.vocab_dict_path())?;
        let mut dict_writer = BufWriter::new(dict_file);
        let mut dict_offset = self.write_dict_header(&mut dict_writer)?;

        let mut fst_builder = fst::MapBuilder::new(index_writer)?;

        for (term, entry) in terms {
            fst_builder.insert(term, dict_offset)?;
            dict_offset += write_dict_entry(&mut dict_writer, entry)?;
        }

        fst_builder.finish()?;
        dict_writer.flush()?;

        debug!("saved vocabulary: {} terms", self.vocab.len());

        Ok(())
    }

    /// Reopens a saved index for reading. The result is sealed.
    pub fn open(config: Config) -> Result<FileIndex> {
        let index_file = File::open(config.vocab_index_path())?;
        let index_offset = check_vocab_index(&index_file)?;

        let mmap = unsafe {
            MmapOptions::new()
                .offset(index_offset)
                .map(&index_file)?
        };
        let term_index = fst::Map::new(mmap)?;

        let mut dict_file = File::open(config.vocab_dict_path())?;
        let (doc_count, file_counter, header_len) = check_vocab_dict(&mut dict_file)?;

        let mut dict = Vec::new();
        dict_file.read_to_end(&mut dict)?;

        let mut vocab = Vocabulary::new();
        let mut stream = term_index.stream();

        while let Some((term_bytes, dict_offset)) = stream.next() {
            let term = std::str::from_utf8(term_bytes)
                .map_err(|_| Error::Corrupt)?
                .to_string();

            let rel = dict_offset
                .checked_sub(header_len)
                .ok_or(Error::Corrupt)? as usize;
            if rel + DICT_ENTRY_SIZE as usize > dict.len() {
                return Err(Error::Corrupt);
            }

            let term_id = LittleEndian::read_u32(&dict[rel..]);
            let posting_start = LittleEndian::read_u64(&dict[rel + 4..]);
            let doc_count_with_term = LittleEndian::read_u32(&dict[rel + 12..]);

            vocab.insert_restored(
                term,
                TermEntry::restore(term_id, posting_start, doc_count_with_term),
            );
        }

        let posting_path = config.posting_file_path(file_counter);
        let postings = PostingFile::open(&posting_path)?;

        info!(
            "opened index: {} terms, {} documents, {} postings",
            vocab.len(),
            doc_count,
            postings.len()
        );

        Ok(FileIndex {
            config,
            vocab,
            buffer: Vec::new(),
            documents: HashSet::new(),
            doc_count,
            file_counter,
            current_file: Some(posting_path),
            postings: Some(postings),
            poisoned: false,
        })
    }

    #[inline]
    fn write_dict_header(&self, writer: &mut BufWriter<File>) -> Result<u64> {
        writer.write_u64::<LittleEndian>(VOCAB_DICT_MAGIC_NUMBER)?;
        writer.write_u8(VERSION)?;
        writer.write_u32::<LittleEndian>(self.doc_count)?;
        writer.write_u32::<LittleEndian>(self.file_counter)?;

        Ok((64 + 8 + 32 + 32) / 8)
    }
}

impl Index for FileIndex {
    fn add(&mut self, term: &str, doc_id: u32, term_freq: u32) -> Result<()> {
        if self.is_sealed() || self.poisoned {
            return Err(Error::InvalidState);
        }

        let term_id = self.vocab.intern(term)?;
        self.buffer.push(Posting::new(term_id, doc_id, term_freq));

        if self.documents.insert(doc_id) {
            self.doc_count += 1;
        }

        if self.buffer.len() >= self.config.tmp_limit {
            self.spill_and_merge()?;
        }

        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        if self.is_sealed() || self.poisoned {
            return Err(Error::InvalidState);
        }

        // The empty corpus still seals over an empty generation 0.
        if !self.buffer.is_empty() || self.current_file.is_none() {
            self.spill_and_merge()?;
        }

        let path = match self.current_file.clone() {
            Some(path) => path,
            None => return Err(Error::InvalidState),
        };

        let reverse_map = self.vocab.reverse_map();
        let mut reader = PostingReader::new(BufReader::new(File::open(&path)?));
        let mut offset = 0u64;

        while let Some(posting) = reader.next()? {
            let term = reverse_map
                .get(posting.term_id as usize)
                .ok_or(Error::Corrupt)?;
            let entry = self.vocab.get_mut(term).ok_or(Error::Corrupt)?;

            if entry.posting_start().is_none() {
                entry.set_posting_start(offset);
            }
            entry.bump_doc_count();

            offset += POSTING_SIZE;
        }

        self.postings = Some(PostingFile::open(&path)?);
        self.buffer.shrink_to_fit();

        info!(
            "sealed index: {} terms, {} documents, {} postings",
            self.vocab.len(),
            self.doc_count,
            offset / POSTING_SIZE
        );

        Ok(())
    }

    fn term_id(&self, term: &str) -> Option<u32> {
        self.vocab.get(term).map(|entry| entry.term_id())
    }

    fn occurrences<'a>(&'a self, term: &str) -> Result<Box<dyn Iterator<Item = Posting> + 'a>> {
        let postings = match self.postings {
            Some(ref postings) => postings,
            None => return Err(Error::InvalidState),
        };

        let entry = match self.vocab.get(term) {
            Some(entry) => entry,
            None => return Ok(Box::new(std::iter::empty())),
        };

        match entry.posting_start() {
            Some(start) => Ok(Box::new(postings.range(start, entry.doc_count())?)),
            None => Ok(Box::new(std::iter::empty())),
        }
    }

    fn document_count_with_term(&self, term: &str) -> u32 {
        self.vocab.get(term).map_or(0, |entry| entry.doc_count())
    }

    fn document_count(&self) -> u32 {
        self.doc_count
    }

    fn vocabulary(&self) -> Vec<&str> {
        self.vocab.terms().collect()
    }
}

/// term_id(32bit) + posting_start(64bit) + doc_count(32bit)
const DICT_ENTRY_SIZE: u64 = (32 + 64 + 32) / 8;

#[inline]
fn write_dict_entry(writer: &mut BufWriter<File>, entry: &TermEntry) -> Result<u64> {
    let posting_start = entry.posting_start().ok_or(Error::InvalidState)?;

    writer.write_u32::<LittleEndian>(entry.term_id())?;
    writer.write_u64::<LittleEndian>(posting_start)?;
    writer.write_u32::<LittleEndian>(entry.doc_count())?;

    Ok(DICT_ENTRY_SIZE)
}

/// Sums frequencies of adjacent equal keys in a sorted buffer.
fn fuse_sorted(buffer: &mut Vec<Posting>) {
    buffer.dedup_by(|dup, kept| {
        if dup.key() == kept.key() {
            kept.term_freq = kept.term_freq.saturating_add(dup.term_freq);
            true
        } else {
            false
        }
    });
}

/// Two-way merge of the sorted buffer with the previous generation
/// into `new_path`. An exhausted side always loses the comparison;
/// equal keys across the two streams fuse by summing frequencies.
fn merge_into(new_path: &Path, buffer: Vec<Posting>, old_path: Option<&Path>) -> Result<u64> {
    let mut old = match old_path {
        Some(path) => Some(PostingReader::new(BufReader::new(File::open(path)?))),
        None => None,
    };

    let mut writer = BufWriter::new(File::create(new_path)?);
    let mut written = 0u64;

    let mut from_buffer = buffer.into_iter();
    let mut head_buffer = from_buffer.next();
    let mut head_file = next_from(&mut old)?;

    loop {
        match (head_buffer, head_file) {
            (None, None) => break,
            (Some(b), Some(f)) => {
                if b.key() == f.key() {
                    let freq = b.term_freq.saturating_add(f.term_freq);
                    Posting::new(b.term_id, b.doc_id, freq).write_to(&mut writer)?;
                    head_buffer = from_buffer.next();
                    head_file = next_from(&mut old)?;
                } else if b < f {
                    b.write_to(&mut writer)?;
                    head_buffer = from_buffer.next();
                } else {
                    f.write_to(&mut writer)?;
                    head_file = next_from(&mut old)?;
                }
            }
            (Some(b), None) => {
                b.write_to(&mut writer)?;
                head_buffer = from_buffer.next();
            }
            (None, Some(f)) => {
                f.write_to(&mut writer)?;
                head_file = next_from(&mut old)?;
            }
        }
        written += 1;
    }

    writer.flush()?;

    Ok(written)
}

#[inline]
fn next_from(reader: &mut Option<PostingReader<BufReader<File>>>) -> Result<Option<Posting>> {
    match reader {
        Some(reader) => reader.next(),
        None => Ok(None),
    }
}

fn check_vocab_index(mut reader: impl Read) -> Result<u64> {
    if reader.read_u64::<LittleEndian>()? != VOCAB_INDEX_MAGIC_NUMBER
        || reader.read_u8()? != VERSION
    {
        return Err(Error::Incompatible);
    }

    Ok((64 + 8) / 8)
}

fn check_vocab_dict(mut reader: impl Read) -> Result<(u32, u32, u64)> {
    if reader.read_u64::<LittleEndian>()? != VOCAB_DICT_MAGIC_NUMBER
        || reader.read_u8()? != VERSION
    {
        return Err(Error::Incompatible);
    }

    let doc_count = reader.read_u32::<LittleEndian>()?;
    let file_counter = reader.read_u32::<LittleEndian>()?;

    Ok((doc_count, file_counter, (64 + 8 + 32 + 32) / 8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        Config::new(dir.path().to_path_buf())
    }

    fn read_all(path: &Path) -> Vec<Posting> {
        let mut reader = PostingReader::new(BufReader::new(File::open(path).unwrap()));
        let mut all = Vec::new();
        while let Some(posting) = reader.next().unwrap() {
            all.push(posting);
        }
        all
    }

    #[test]
    fn spill_heavy_build_keeps_the_file_sorted_and_complete() {
        let dir = TempDir::new().unwrap();
        let mut index = FileIndex::new(config(&dir).tmp_limit(4));

        let adds = [
            ("cat", 3, 2),
            ("dog", 1, 1),
            ("bird", 5, 4),
            ("cat", 1, 1),
            ("dog", 4, 2),
            ("cat", 5, 3),
            ("bird", 2, 1),
            ("dog", 2, 5),
            ("cat", 2, 2),
            ("bird", 1, 2),
        ];
        for &(term, doc_id, freq) in adds.iter() {
            index.add(term, doc_id, freq).unwrap();
        }
        index.finalize().unwrap();

        let all = read_all(index.posting_file().unwrap());
        assert_eq!(all.len(), 10);
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1]);
        }

        for &(term, doc_id, freq) in adds.iter() {
            let term_id = index.term_id(term).unwrap();
            let matches: Vec<&Posting> = all
                .iter()
                .filter(|p| p.term_id == term_id && p.doc_id == doc_id)
                .collect();
            assert_eq!(matches.len(), 1, "{} in doc {}", term, doc_id);
            assert_eq!(matches[0].term_freq, freq);
        }

        for &term in ["cat", "dog", "bird"].iter() {
            let term_id = index.term_id(term).unwrap();
            let run: Vec<Posting> = index.occurrences(term).unwrap().collect();
            assert_eq!(run.len() as u32, index.document_count_with_term(term));
            assert!(run.iter().all(|p| p.term_id == term_id));
            for pair in run.windows(2) {
                assert!(pair[0].doc_id < pair[1].doc_id);
            }
        }

        assert_eq!(index.document_count(), 5);
    }

    #[test]
    fn duplicates_fuse_across_generations() {
        let dir = TempDir::new().unwrap();
        let mut index = FileIndex::new(config(&dir).tmp_limit(2));

        index.add("cat", 1, 2).unwrap();
        index.add("dog", 9, 1).unwrap();
        index.add("cat", 1, 3).unwrap();
        index.add("cat", 2, 1).unwrap();
        index.finalize().unwrap();

        let run: Vec<(u32, u32)> = index
            .occurrences("cat")
            .unwrap()
            .map(|p| (p.doc_id, p.term_freq))
            .collect();
        assert_eq!(run, vec![(1, 5), (2, 1)]);
        assert_eq!(index.document_count_with_term("cat"), 2);
    }

    #[test]
    fn empty_corpus_seals_an_empty_file() {
        let dir = TempDir::new().unwrap();
        let mut index = FileIndex::new(config(&dir));
        index.finalize().unwrap();

        assert_eq!(index.document_count(), 0);
        assert!(index.vocabulary().is_empty());
        assert_eq!(index.occurrences("anything").unwrap().count(), 0);
        assert_eq!(read_all(index.posting_file().unwrap()).len(), 0);
    }

    #[test]
    fn lifecycle_is_enforced() {
        let dir = TempDir::new().unwrap();
        let mut index = FileIndex::new(config(&dir));
        index.add("cat", 1, 1).unwrap();

        match index.occurrences("cat") {
            Err(Error::InvalidState) => (),
            _ => panic!("read before finalize must fail"),
        }

        index.finalize().unwrap();

        match index.add("dog", 2, 1) {
            Err(Error::InvalidState) => (),
            _ => panic!("add after finalize must fail"),
        }
        match index.finalize() {
            Err(Error::InvalidState) => (),
            _ => panic!("second finalize must fail"),
        }
    }

    #[test]
    fn postingless_documents_still_count() {
        let dir = TempDir::new().unwrap();
        let mut index = FileIndex::new(config(&dir));

        index.register_document(7).unwrap();
        index.add("cat", 1, 1).unwrap();
        index.register_document(1).unwrap();
        index.finalize().unwrap();

        assert_eq!(index.document_count(), 2);
        assert_eq!(index.occurrences("cat").unwrap().count(), 1);
    }

    #[test]
    fn save_and_open_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut index = FileIndex::new(config(&dir));

        index.add("zebra", 1, 2).unwrap();
        index.add("apple", 1, 1).unwrap();
        index.add("zebra", 2, 1).unwrap();
        index.add("mango", 3, 4).unwrap();
        index.finalize().unwrap();
        index.save().unwrap();

        let reopened = FileIndex::open(config(&dir)).unwrap();

        // intern order survives, not lexicographic order
        assert_eq!(reopened.term_id("zebra"), Some(0));
        assert_eq!(reopened.term_id("apple"), Some(1));
        assert_eq!(reopened.term_id("mango"), Some(2));

        assert!(reopened.is_sealed());
        assert_eq!(reopened.document_count(), 3);

        for &term in ["zebra", "apple", "mango"].iter() {
            let before: Vec<(u32, u32, u32)> = index
                .occurrences(term)
                .unwrap()
                .map(|p| (p.term_id, p.doc_id, p.term_freq))
                .collect();
            let after: Vec<(u32, u32, u32)> = reopened
                .occurrences(term)
                .unwrap()
                .map(|p| (p.term_id, p.doc_id, p.term_freq))
                .collect();
            assert_eq!(before, after);
            assert_eq!(
                reopened.document_count_with_term(term),
                index.document_count_with_term(term)
            );
        }

        let mut reopened = reopened;
        match reopened.add("pear", 9, 1) {
            Err(Error::InvalidState) => (),
            _ => panic!("a reopened index is sealed"),
        }
    }

    #[test]
    fn save_requires_a_sealed_index() {
        let dir = TempDir::new().unwrap();
        let mut index = FileIndex::new(config(&dir));
        index.add("cat", 1, 1).unwrap();

        match index.save() {
            Err(Error::InvalidState) => (),
            _ => panic!("save before finalize must fail"),
        }
    }

    #[test]
    fn open_rejects_an_unknown_magic_number() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(VOCAB_INDEX_FILE_NAME), [0u8; 16]).unwrap();

        match FileIndex::open(config(&dir)) {
            Err(Error::Incompatible) => (),
            other => panic!("expected Incompatible, got {:?}", other.map(|_| ())),
        }
    }
}

use super::format::{encode_frame, read_frame, FileHeader};
use super::{check_dimension, Scan, VectorStore};
use crate::error::{ForgeKnnError, Result};
use crate::types::{Label, VectorId};
use crate::vector::VectorRecord;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Append-only store persisted to a single file.
///
/// Inserts are buffered; every [`scan`](VectorStore::scan) flushes pending
/// writes first and then reads the file from a fresh handle, so a scan
/// always sees every record inserted before it started.
///
/// See the [`format`](super::format) module for the file layout.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    dimension: usize,
    writer: Mutex<BufWriter<File>>,
    count: usize,
    next_id: VectorId,
}

impl FileStore {
    /// Create a new, empty store file, replacing any existing file.
    pub fn create(path: impl AsRef<Path>, dimension: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dim = u32::try_from(dimension).map_err(|_| {
            ForgeKnnError::invalid_argument(format!(
                "dimension {} does not fit the file format",
                dimension
            ))
        })?;

        let mut file = File::create(&path)?;
        file.write_all(&FileHeader::new(dim).to_bytes())?;
        file.sync_all()?;

        tracing::info!(path = %path.display(), dimension, "created file store");

        Ok(Self {
            path,
            dimension,
            writer: Mutex::new(BufWriter::new(file)),
            count: 0,
            next_id: VectorId(0),
        })
    }

    /// Open an existing store file and recover its record count.
    ///
    /// Every frame is read and checksummed once, so corruption anywhere in
    /// the file is reported here rather than in the middle of a search.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&path)?);
        let header = read_header(&mut reader)?;
        let dimension = header.dimension as usize;

        let mut count = 0usize;
        let mut next_id = VectorId(0);
        for record in FrameIter::new(reader, dimension) {
            let record = record?;
            if record.id != next_id {
                return Err(ForgeKnnError::invalid_format(format!(
                    "expected record {} but found {}",
                    next_id, record.id
                )));
            }
            next_id = next_id.next();
            count += 1;
        }

        let file = OpenOptions::new().append(true).open(&path)?;
        if count == 0 {
            tracing::warn!(path = %path.display(), "opened file store with no records");
        }
        tracing::info!(path = %path.display(), dimension, records = count, "opened file store");

        Ok(Self {
            path,
            dimension,
            writer: Mutex::new(BufWriter::new(file)),
            count,
            next_id,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered records to the operating system.
    pub fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    /// Flush and fsync buffered records.
    pub fn sync(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }
}

impl VectorStore for FileStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn insert(&mut self, label: Label, embedding: &[f32]) -> Result<VectorId> {
        check_dimension(self.dimension, embedding)?;

        let id = self.next_id;
        let frame = encode_frame(id, label, embedding)?;
        append_frame(self.writer.get_mut(), &frame)?;
        self.next_id = id.next();
        self.count += 1;
        Ok(id)
    }

    fn scan(&self) -> Result<Scan<'_>> {
        self.flush()?;

        let mut reader = BufReader::new(File::open(&self.path)?);
        read_header(&mut reader)?;
        Ok(Box::new(FrameIter::new(reader, self.dimension)))
    }

    fn count(&self) -> usize {
        self.count
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(e) = self.writer.get_mut().flush() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to flush file store on drop");
        }
    }
}

/// A writable file that can be cut back to a given length.
trait Truncate: Write + Seek {
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl Truncate for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Append a whole frame or nothing.
///
/// A frame that fits the buffer is staged there in full. A larger one goes
/// straight to the file, which is cut back to its previous length if the
/// write fails partway, so a retried insert never lands after a torn frame.
fn append_frame<F: Truncate>(writer: &mut BufWriter<F>, frame: &[u8]) -> Result<()> {
    if writer.buffer().len() + frame.len() > writer.capacity() {
        writer.flush()?;
    }
    if frame.len() <= writer.capacity() {
        writer.write_all(frame)?;
        return Ok(());
    }
    append_or_rollback(writer.get_mut(), frame)
}

fn append_or_rollback<F: Truncate>(file: &mut F, frame: &[u8]) -> Result<()> {
    let len = file.seek(SeekFrom::End(0))?;
    if let Err(e) = file.write_all(frame) {
        tracing::warn!(len, error = %e, "frame write failed, truncating torn frame");
        file.truncate(len)?;
        file.seek(SeekFrom::Start(len))?;
        return Err(e.into());
    }
    Ok(())
}

fn read_header<R: Read + Seek>(reader: &mut R) -> Result<FileHeader> {
    reader.seek(SeekFrom::Start(0))?;
    let mut bytes = [0u8; FileHeader::SIZE];
    reader
        .read_exact(&mut bytes)
        .map_err(|_| ForgeKnnError::invalid_format("file too small for header"))?;
    FileHeader::from_bytes(&bytes)
}

/// Sequential frame decoder. Stops after the first error.
struct FrameIter<R> {
    reader: R,
    offset: u64,
    dimension: usize,
    done: bool,
}

impl<R: Read> FrameIter<R> {
    fn new(reader: R, dimension: usize) -> Self {
        Self {
            reader,
            offset: FileHeader::SIZE as u64,
            dimension,
            done: false,
        }
    }

    fn next_record(&mut self) -> Result<Option<VectorRecord>> {
        let Some((record, size)) = read_frame(&mut self.reader, self.offset)? else {
            return Ok(None);
        };

        if record.dim() != self.dimension {
            return Err(ForgeKnnError::invalid_format(format!(
                "record at byte offset {} has dimension {}, file declares {}",
                self.offset,
                record.dim(),
                self.dimension
            )));
        }

        self.offset += size;
        Ok(Some(record))
    }
}

impl<R: Read> Iterator for FrameIter<R> {
    type Item = Result<VectorRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_insert_then_scan() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::create(dir.path().join("corpus.fknn"), 2).unwrap();

        assert_eq!(store.insert(Label(0), &[0.0, 0.0]).unwrap(), VectorId(0));
        assert_eq!(store.insert(Label(1), &[1.0, 0.5]).unwrap(), VectorId(1));
        assert_eq!(store.count(), 2);

        let records: Vec<VectorRecord> = store.scan().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].label, Label(1));
        assert_eq!(&records[1].embedding[..], &[1.0, 0.5]);
        assert!(store.as_slice().is_none());
    }

    #[test]
    fn test_rejects_wrong_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::create(dir.path().join("corpus.fknn"), 3).unwrap();
        let err = store.insert(Label(0), &[1.0]).unwrap_err();
        assert!(matches!(err, ForgeKnnError::DimensionMismatch { .. }));
        assert_eq!(store.count(), 0);
    }

    /// Accepts `budget` bytes, then fails every write.
    struct FailingFile {
        inner: Cursor<Vec<u8>>,
        budget: usize,
    }

    impl FailingFile {
        fn new(existing: &[u8], budget: usize) -> Self {
            let mut inner = Cursor::new(existing.to_vec());
            inner.set_position(existing.len() as u64);
            Self { inner, budget }
        }
    }

    impl Write for FailingFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "device full"));
            }
            let n = self.inner.write(&buf[..buf.len().min(self.budget)])?;
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for FailingFile {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    impl Truncate for FailingFile {
        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.inner.get_mut().truncate(len as usize);
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_leaves_no_torn_frame() {
        let mut file = FailingFile::new(&[1, 2, 3], 10);
        let err = append_or_rollback(&mut file, &[7u8; 100]).unwrap_err();
        assert!(matches!(err, ForgeKnnError::Io(_)));
        assert_eq!(file.inner.get_ref(), &vec![1, 2, 3]);

        // A retry appends right after the last good byte.
        file.budget = usize::MAX;
        append_or_rollback(&mut file, &[7u8; 100]).unwrap();
        assert_eq!(file.inner.get_ref().len(), 103);
        assert_eq!(file.inner.get_ref()[3], 7);
    }

    #[test]
    fn test_oversized_frame_bypasses_buffer_atomically() {
        let mut writer = BufWriter::with_capacity(16, FailingFile::new(&[], 20));
        let frame = encode_frame(VectorId(0), Label(1), &[0.5; 16]).unwrap();
        assert!(frame.len() > 16);

        assert!(append_frame(&mut writer, &frame).is_err());
        assert!(writer.get_ref().inner.get_ref().is_empty());

        writer.get_mut().budget = usize::MAX;
        append_frame(&mut writer, &frame).unwrap();
        writer.flush().unwrap();
        let bytes = writer.get_ref().inner.get_ref().clone();
        let (record, _) = read_frame(&mut Cursor::new(bytes), 0).unwrap().unwrap();
        assert_eq!(record.label, Label(1));
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileStore::open(dir.path().join("missing.fknn")).unwrap_err();
        assert!(matches!(err, ForgeKnnError::Io(_)));
    }
}

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Where capture files live. Names are plain file names; the storage
/// decides the directory.
pub trait Storage {
    type File: Write;

    fn exists(&self, name: &str) -> bool;

    /// Opens `name` for appending, creating it when missing.
    fn open_append(&mut self, name: &str) -> std::io::Result<Self::File>;
}

pub struct DirectoryStorage {
    directory: PathBuf,
}

impl DirectoryStorage {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }
}

impl Storage for DirectoryStorage {
    type File = DurableFile;

    fn exists(&self, name: &str) -> bool {
        self.directory.join(name).exists()
    }

    fn open_append(&mut self, name: &str) -> std::io::Result<Self::File> {
        std::fs::create_dir_all(&self.directory)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.directory.join(name))?;

        Ok(DurableFile {
            inner: BufWriter::new(file),
        })
    }
}

/// Buffered file whose `flush` also commits the data to the device.
pub struct DurableFile {
    inner: BufWriter<File>,
}

impl Write for DurableFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()?;
        self.inner.get_ref().sync_data()
    }
}

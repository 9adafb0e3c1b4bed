use crate::radio::{FrameCallback, RadioDriver, RadioError, RawFrame};
use crate::storage::Storage;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RadioState {
    callback: Option<FrameCallback>,
    promiscuous: bool,
    channels: Vec<u8>,
    transmitted: Vec<Vec<u8>>,
    fail_transmit: bool,
    fail_promiscuous: bool,
}

/// Radio stand-in. Clones share state, so a test keeps one handle while
/// the controller owns another.
#[derive(Clone, Default)]
pub struct MockRadio {
    state: Arc<Mutex<RadioState>>,
}

impl MockRadio {
    /// Runs the registered callback the way a driver would. Frames are
    /// only delivered while promiscuous reception is on.
    pub fn deliver(&self, frame: RawFrame<'_>) -> bool {
        let mut state = self.state.lock().unwrap();
        if !state.promiscuous {
            return false;
        }
        match state.callback.as_mut() {
            Some(callback) => {
                callback(frame);
                true
            },
            None => false,
        }
    }

    pub fn deliver_bytes(&self, bytes: &[u8], signal: i8) -> bool {
        self.deliver(RawFrame::new(bytes).with_signal(Some(signal)))
    }

    pub fn promiscuous(&self) -> bool {
        self.state.lock().unwrap().promiscuous
    }

    pub fn channels(&self) -> Vec<u8> {
        self.state.lock().unwrap().channels.clone()
    }

    pub fn last_channel(&self) -> Option<u8> {
        self.state.lock().unwrap().channels.last().copied()
    }

    pub fn transmitted(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().transmitted.clone()
    }

    pub fn fail_transmit(&self, fail: bool) {
        self.state.lock().unwrap().fail_transmit = fail;
    }

    /// Reception ends on the driver side, as if the device went away.
    pub fn lose_reception(&self) {
        self.state.lock().unwrap().promiscuous = false;
    }

    pub fn fail_promiscuous(&self, fail: bool) {
        self.state.lock().unwrap().fail_promiscuous = fail;
    }
}

impl RadioDriver for MockRadio {
    fn register_callback(&mut self, callback: FrameCallback) {
        self.state.lock().unwrap().callback = Some(callback);
    }

    fn set_promiscuous(&mut self, enabled: bool) -> Result<(), RadioError> {
        let mut state = self.state.lock().unwrap();
        if enabled && state.fail_promiscuous {
            return Err(RadioError::DriverError("device gone".to_string()));
        }
        state.promiscuous = enabled;
        Ok(())
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), RadioError> {
        if !(1..=14).contains(&channel) {
            return Err(RadioError::UnsupportedChannel(channel));
        }
        self.state.lock().unwrap().channels.push(channel);
        Ok(())
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_transmit {
            return Err(RadioError::DriverError("transmit refused".to_string()));
        }
        state.transmitted.push(frame.to_vec());
        Ok(())
    }

    fn is_receiving(&mut self) -> bool {
        self.state.lock().unwrap().promiscuous
    }
}

/// In-memory file system for capture files.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_open: Arc<AtomicBool>,
    flushes: Arc<AtomicUsize>,
}

impl MemoryStorage {
    pub fn insert(&self, name: &str, contents: Vec<u8>) {
        self.files.lock().unwrap().insert(name.to_string(), contents);
    }

    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl Storage for MemoryStorage {
    type File = MemoryFile;

    fn exists(&self, name: &str) -> bool {
        self.files.lock().unwrap().contains_key(name)
    }

    fn open_append(&mut self, name: &str) -> std::io::Result<Self::File> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("storage unavailable"));
        }

        self.files
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default();

        Ok(MemoryFile {
            name: name.to_string(),
            storage: self.clone(),
        })
    }
}

pub struct MemoryFile {
    name: String,
    storage: MemoryStorage,
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.storage
            .files
            .lock()
            .unwrap()
            .entry(self.name.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.storage.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

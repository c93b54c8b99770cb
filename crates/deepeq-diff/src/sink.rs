//! Output sinks for rendered reports.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// A cloneable in-memory sink. Every clone appends to the same buffer, so
/// one handle can be given to a session and another kept for inspection.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let buf = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Take the contents and leave the buffer empty.
    pub fn take(&self) -> String {
        let mut buf = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let bytes = std::mem::take(&mut *buf);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_storage() {
        let buf = SharedBuffer::new();
        let mut writer = buf.clone();
        write!(writer, "hello").unwrap();
        assert_eq!(buf.contents(), "hello");
        assert_eq!(buf.take(), "hello");
        assert!(buf.is_empty());
    }
}

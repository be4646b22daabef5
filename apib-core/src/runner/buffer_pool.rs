use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// A bounded free-list of fixed-size scratch buffers for draining response bodies.
///
/// Buffers are checked out with [`BufferPool::get`] and go back to the pool when
/// the returned guard is dropped, on every exit path. At most `max_idle` buffers
/// are kept; extras are simply freed.
#[derive(Debug)]
pub struct BufferPool {
    buffer_size: usize,
    max_idle: usize,
    free: Mutex<Vec<Box<[u8]>>>,
}

impl BufferPool {
    #[must_use]
    pub fn new(buffer_size: usize, max_idle: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            max_idle,
            free: Mutex::new(Vec::with_capacity(max_idle)),
        }
    }

    /// Pool sized for `workers` concurrent borrowers of the default buffer size.
    #[must_use]
    pub fn for_workers(workers: usize) -> Self {
        Self::new(DEFAULT_BUFFER_SIZE, workers.max(1))
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    pub fn get(&self) -> PooledBuffer<'_> {
        let buf = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0u8; self.buffer_size].into_boxed_slice());
        PooledBuffer {
            pool: self,
            buf: Some(buf),
        }
    }

    fn put(&self, buf: Box<[u8]>) {
        let mut free = self.free.lock();
        if free.len() < self.max_idle {
            free.push(buf);
        }
    }
}

/// A buffer borrowed from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Option<Box<[u8]>>,
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or(&[])
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or(&mut [])
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.put(buf);
        }
    }
}

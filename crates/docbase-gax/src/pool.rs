//! Connection pool.
//!
//! A [`ConnPool`] owns a fixed set of connections opened when the client is
//! built. Calls pick connections round-robin. Closing the pool closes every
//! connection exactly once; afterwards every use fails with
//! [`Error::Closed`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::status::Status;

/// A transport connection that can be released.
pub trait Connection: Send + Sync {
    /// Releases the connection's resources.
    fn close(&self) -> std::result::Result<(), Status>;
}

/// Round-robin pool of shared connections.
pub struct ConnPool<C: Connection + ?Sized> {
    conns: Vec<Arc<C>>,
    next: AtomicUsize,
    closed: AtomicBool,
}

impl<C: Connection + ?Sized> std::fmt::Debug for ConnPool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnPool")
            .field("size", &self.conns.len())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl<C: Connection + ?Sized> ConnPool<C> {
    /// Opens `size` connections with `dial`.
    ///
    /// If any dial fails, the connections opened so far are closed and the
    /// error is returned.
    pub fn dial<F>(size: usize, mut dial: F) -> Result<Self>
    where
        F: FnMut(usize) -> Result<Arc<C>>,
    {
        if size == 0 {
            return Err(Error::config("connection pool size must be at least 1"));
        }

        let mut conns = Vec::with_capacity(size);
        for i in 0..size {
            match dial(i) {
                Ok(conn) => conns.push(conn),
                Err(e) => {
                    for conn in &conns {
                        let _ = conn.close();
                    }
                    return Err(e);
                }
            }
        }
        Ok(Self::from_connections(conns))
    }

    /// Builds a pool around already-open connections.
    pub fn from_connections(conns: Vec<Arc<C>>) -> Self {
        Self {
            conns,
            next: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of pooled connections.
    pub fn size(&self) -> usize {
        self.conns.len()
    }

    /// True once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// The next connection in round-robin order.
    pub fn conn(&self) -> Result<Arc<C>> {
        if self.is_closed() || self.conns.is_empty() {
            return Err(Error::Closed);
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.conns.len();
        Ok(Arc::clone(&self.conns[idx]))
    }

    /// Closes every connection.
    ///
    /// All connections are closed even if some fail; the first failure is
    /// returned. A second call returns [`Error::Closed`].
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::Closed);
        }

        let mut first_err = None;
        for conn in &self.conns {
            if let Err(status) = conn.close() {
                tracing::warn!(%status, "failed to close pooled connection");
                first_err.get_or_insert(status);
            }
        }
        match first_err {
            Some(status) => Err(Error::Status(status)),
            None => Ok(()),
        }
    }
}

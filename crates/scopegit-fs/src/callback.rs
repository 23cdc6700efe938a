//! Single-fire callback surface.
//!
//! [`CallbackFs`] runs each [`FsClient`] operation on the tokio runtime and
//! reports its result through a callback. Callers that omit the options
//! argument may pass the callback in its place: an [`ArgSlot::Callback`] in
//! the options position is taken as the callback and default options are
//! used.

use std::sync::{Arc, Mutex};

use scopegit_types::{VcsError, VcsResult};
use tokio::task::JoinHandle;

use crate::data::{FileData, WriteData};
use crate::options::{MkdirOptions, ReadOptions, WriteOptions};
use crate::stats::Stats;
use crate::traits::FsClient;

/// Completion callback for one operation.
pub type Callback<T> = Box<dyn FnOnce(VcsResult<T>) + Send + 'static>;

/// The options position of a callback-style call.
pub enum ArgSlot<O, C> {
    Options(O),
    Callback(C),
}

impl<O: Default, C> ArgSlot<O, C> {
    /// Options and callback, whichever position the callback arrived in.
    /// An explicit trailing callback wins over one in the options slot.
    pub fn resolve(self, trailing: Option<C>) -> (O, Option<C>) {
        match self {
            ArgSlot::Options(options) => (options, trailing),
            ArgSlot::Callback(cb) => (O::default(), trailing.or(Some(cb))),
        }
    }
}

impl<O: Default, C> Default for ArgSlot<O, C> {
    fn default() -> Self {
        ArgSlot::Options(O::default())
    }
}

/// A callback that runs at most once, however many completion paths race
/// to fire it.
pub struct OnceCallback<T> {
    slot: Arc<Mutex<Option<Callback<T>>>>,
}

impl<T> Clone for OnceCallback<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> OnceCallback<T> {
    pub fn new(cb: Option<Callback<T>>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(cb)),
        }
    }

    /// Invoke the callback if nothing has yet. Returns whether this call
    /// delivered the result.
    pub fn fire(&self, result: VcsResult<T>) -> bool {
        let cb = self
            .slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match cb {
            Some(cb) => {
                cb(result);
                true
            }
            None => false,
        }
    }

    pub fn is_spent(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }
}

/// Fires an error if the task ends without delivering a result (panic or
/// cancellation).
struct AbandonGuard<T> {
    cb: OnceCallback<T>,
}

impl<T> Drop for AbandonGuard<T> {
    fn drop(&mut self) {
        self.cb.fire(Err(VcsError::Timeout(
            "operation abandoned before completion".into(),
        )));
    }
}

/// Callback-style filesystem over an awaitable [`FsClient`].
///
/// Every method returns the [`JoinHandle`] of the spawned task and must be
/// called from within a tokio runtime.
#[derive(Clone)]
pub struct CallbackFs {
    promises: Arc<dyn FsClient>,
}

impl CallbackFs {
    pub fn new(promises: Arc<dyn FsClient>) -> Self {
        Self { promises }
    }

    /// The awaitable surface this one delegates to.
    pub fn promises(&self) -> &Arc<dyn FsClient> {
        &self.promises
    }

    fn run<T, F, Fut>(&self, cb: Option<Callback<T>>, op: F) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn FsClient>) -> Fut,
        Fut: std::future::Future<Output = VcsResult<T>> + Send + 'static,
    {
        let once = OnceCallback::new(cb);
        let guard = AbandonGuard { cb: once.clone() };
        let fut = op(Arc::clone(&self.promises));
        tokio::spawn(async move {
            let result = fut.await;
            once.fire(result);
            drop(guard);
        })
    }

    pub fn read_file(
        &self,
        path: impl Into<String>,
        options: ArgSlot<ReadOptions, Callback<FileData>>,
        cb: Option<Callback<FileData>>,
    ) -> JoinHandle<()> {
        let path = path.into();
        let (options, cb) = options.resolve(cb);
        self.run(cb, move |fs| async move { fs.read_file(&path, options).await })
    }

    pub fn write_file(
        &self,
        path: impl Into<String>,
        data: WriteData,
        options: ArgSlot<WriteOptions, Callback<()>>,
        cb: Option<Callback<()>>,
    ) -> JoinHandle<()> {
        let path = path.into();
        let (options, cb) = options.resolve(cb);
        self.run(cb, move |fs| async move {
            fs.write_file(&path, data, options).await
        })
    }

    pub fn unlink(&self, path: impl Into<String>, cb: Callback<()>) -> JoinHandle<()> {
        let path = path.into();
        self.run(Some(cb), move |fs| async move { fs.unlink(&path).await })
    }

    pub fn readdir(
        &self,
        path: impl Into<String>,
        options: ArgSlot<(), Callback<Vec<String>>>,
        cb: Option<Callback<Vec<String>>>,
    ) -> JoinHandle<()> {
        let path = path.into();
        let ((), cb) = options.resolve(cb);
        self.run(cb, move |fs| async move { fs.readdir(&path).await })
    }

    pub fn mkdir(
        &self,
        path: impl Into<String>,
        options: ArgSlot<MkdirOptions, Callback<()>>,
        cb: Option<Callback<()>>,
    ) -> JoinHandle<()> {
        let path = path.into();
        let (options, cb) = options.resolve(cb);
        self.run(cb, move |fs| async move {
            fs.mkdir(&path, options).await.map(|_| ())
        })
    }

    pub fn rmdir(
        &self,
        path: impl Into<String>,
        options: ArgSlot<(), Callback<()>>,
        cb: Option<Callback<()>>,
    ) -> JoinHandle<()> {
        let path = path.into();
        let ((), cb) = options.resolve(cb);
        self.run(cb, move |fs| async move { fs.rmdir(&path).await })
    }

    pub fn rename(
        &self,
        old_path: impl Into<String>,
        new_path: impl Into<String>,
        cb: Callback<()>,
    ) -> JoinHandle<()> {
        let (old_path, new_path) = (old_path.into(), new_path.into());
        self.run(Some(cb), move |fs| async move {
            fs.rename(&old_path, &new_path).await
        })
    }

    pub fn stat(
        &self,
        path: impl Into<String>,
        options: ArgSlot<(), Callback<Stats>>,
        cb: Option<Callback<Stats>>,
    ) -> JoinHandle<()> {
        let path = path.into();
        let ((), cb) = options.resolve(cb);
        self.run(cb, move |fs| async move { fs.stat(&path).await })
    }

    pub fn lstat(
        &self,
        path: impl Into<String>,
        options: ArgSlot<(), Callback<Stats>>,
        cb: Option<Callback<Stats>>,
    ) -> JoinHandle<()> {
        let path = path.into();
        let ((), cb) = options.resolve(cb);
        self.run(cb, move |fs| async move { fs.lstat(&path).await })
    }

    pub fn symlink(
        &self,
        target: impl Into<String>,
        path: impl Into<String>,
        cb: Callback<()>,
    ) -> JoinHandle<()> {
        let (target, path) = (target.into(), path.into());
        self.run(Some(cb), move |fs| async move { fs.symlink(&target, &path).await })
    }

    pub fn readlink(
        &self,
        path: impl Into<String>,
        options: ArgSlot<(), Callback<String>>,
        cb: Option<Callback<String>>,
    ) -> JoinHandle<()> {
        let path = path.into();
        let ((), cb) = options.resolve(cb);
        self.run(cb, move |fs| async move { fs.readlink(&path).await })
    }
}

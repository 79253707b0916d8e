use parking_lot::{Condvar, Mutex};
use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
struct LockState {
    readers: usize,
    writers: usize,
    writer: Option<ThreadId>,
}

/// Reader/writer lock guarding a value: any number of concurrent readers or
/// exactly one writer, never both. Unlike the std lock it tracks which
/// thread holds the write lock and treats a release from any other thread
/// as a fatal programming error. Waiters block on a condvar and recheck;
/// writers win implicitly because readers cannot enter while `writers > 0`.
pub struct ReadWriteLock<T> {
    state: Mutex<LockState>,
    changed: Condvar,
    data: UnsafeCell<T>,
}

// Exclusion is enforced by the reader/writer state machine, so the usual
// RwLock bounds apply.
unsafe impl<T: Send> Send for ReadWriteLock<T> {}
unsafe impl<T: Send + Sync> Sync for ReadWriteLock<T> {}

impl<T> ReadWriteLock<T> {
    pub fn new(data: T) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            changed: Condvar::new(),
            data: UnsafeCell::new(data),
        }
    }

    /// Blocks while a writer is active, then registers a reader and returns
    /// a shared guard.
    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut state = self.state.lock();
        while state.writers > 0 {
            self.changed.wait(&mut state);
        }
        state.readers += 1;
        ReadGuard { lock: self }
    }

    /// Blocks while any reader or writer is active, then registers the
    /// calling thread as the writer and returns an exclusive guard.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut state = self.state.lock();
        while state.readers > 0 || state.writers > 0 {
            self.changed.wait(&mut state);
        }
        state.writers += 1;
        state.writer = Some(thread::current().id());
        WriteGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// The number of active readers.
    pub fn readers(&self) -> usize {
        self.state.lock().readers
    }

    /// The number of active writers, 0 or 1.
    pub fn writers(&self) -> usize {
        self.state.lock().writers
    }

    fn release_read(&self) {
        let mut state = self.state.lock();
        state.readers -= 1;
        self.changed.notify_all();
    }

    /// Panics when the calling thread is not the one that acquired the
    /// write lock or no write lock is held; either indicates corrupted
    /// locking discipline rather than a recoverable condition.
    fn release_write(&self) {
        let mut state = self.state.lock();
        if state.writers == 0 || state.writer != Some(thread::current().id()) {
            panic!("write lock released by a thread that does not hold it");
        }
        state.writers -= 1;
        state.writer = None;
        self.changed.notify_all();
    }
}

impl<T: Default> Default for ReadWriteLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

pub struct ReadGuard<'a, T> {
    lock: &'a ReadWriteLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // readers hold the lock in shared mode, so no writer can alias
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

pub struct WriteGuard<'a, T> {
    lock: &'a ReadWriteLock<T>,
    // the write lock must be released on the thread that acquired it
    _not_send: PhantomData<*const ()>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // the writer holds the lock exclusively
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}

/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Memory accounting.
//!
//! An [`AllocationTracker`] is an explicit handle counting the bytes held by
//! the buffers of a computation. It is owned by the caller and passed by
//! reference to the components that allocate, so that several computations
//! may share one, or none at all.
//!
//! The size estimators in this module return the number of bytes of the
//! payload of a boxed slice or of an instance, and are used both for
//! accounting and for [budgeting](crate::rank::budget).

use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe counter of allocated bytes.
///
/// A [disabled](AllocationTracker::disabled) tracker ignores every update.
#[derive(Debug)]
pub struct AllocationTracker {
    enabled: bool,
    bytes: AtomicU64,
}

impl Default for AllocationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationTracker {
    /// Creates a new enabled tracker with no tracked bytes.
    pub const fn new() -> Self {
        Self {
            enabled: true,
            bytes: AtomicU64::new(0),
        }
    }

    /// Creates a tracker that ignores every update.
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            bytes: AtomicU64::new(0),
        }
    }

    /// Returns whether this tracker records updates.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records the allocation of `bytes` bytes.
    pub fn add(&self, bytes: u64) {
        if self.enabled {
            self.bytes.fetch_add(bytes, Ordering::Relaxed);
        }
    }

    /// Records the release of `bytes` bytes.
    ///
    /// The count saturates at zero.
    pub fn remove(&self, bytes: u64) {
        if self.enabled {
            let _ = self
                .bytes
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                    Some(current.saturating_sub(bytes))
                });
        }
    }

    /// Returns the number of bytes currently tracked.
    pub fn tracked(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

/// Returns the number of bytes of a slice of `len` elements of type `T`.
#[inline(always)]
pub fn size_of_slice<T>(len: usize) -> u64 {
    (len as u64).saturating_mul(core::mem::size_of::<T>() as u64)
}

#[inline(always)]
pub fn size_of_f64_array(len: usize) -> u64 {
    size_of_slice::<f64>(len)
}

#[inline(always)]
pub fn size_of_f32_array(len: usize) -> u64 {
    size_of_slice::<f32>(len)
}

#[inline(always)]
pub fn size_of_i32_array(len: usize) -> u64 {
    size_of_slice::<i32>(len)
}

#[inline(always)]
pub fn size_of_u64_array(len: usize) -> u64 {
    size_of_slice::<u64>(len)
}

/// Returns the number of bytes of a slice of `len` boxed slices (the
/// pointers only).
#[inline(always)]
pub fn size_of_object_array(len: usize) -> u64 {
    size_of_slice::<Box<[u8]>>(len)
}

/// Returns the number of bytes of an instance of `T`, not including the
/// heap memory it owns.
#[inline(always)]
pub fn size_of_instance<T>() -> u64 {
    core::mem::size_of::<T>() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker() {
        let tracker = AllocationTracker::new();
        tracker.add(100);
        tracker.add(28);
        assert_eq!(tracker.tracked(), 128);
        tracker.remove(100);
        assert_eq!(tracker.tracked(), 28);
        tracker.remove(1000);
        assert_eq!(tracker.tracked(), 0);

        let disabled = AllocationTracker::disabled();
        disabled.add(100);
        assert_eq!(disabled.tracked(), 0);
        assert!(!disabled.is_enabled());
    }

    #[test]
    fn test_sizes() {
        assert_eq!(size_of_f64_array(10), 80);
        assert_eq!(size_of_f32_array(10), 40);
        assert_eq!(size_of_i32_array(3), 12);
        assert_eq!(size_of_u64_array(0), 0);
        assert_eq!(size_of_object_array(2), 4 * core::mem::size_of::<usize>() as u64);
        assert_eq!(size_of_slice::<u64>(usize::MAX), u64::MAX);
    }
}

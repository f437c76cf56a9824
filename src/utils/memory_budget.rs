/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use sysinfo::System;

/// A source for the number of bytes a computation may allocate.
///
/// The embedding application decides what "available" means: the physical
/// memory left on the host ([`SystemMemory`]), a fixed quota
/// ([`FixedBudget`]), or no limit at all ([`UnboundedBudget`]).
pub trait MemoryBudget {
    /// Returns the number of bytes available for allocation.
    fn available_bytes(&self) -> u64;
}

/// The memory currently available on the host, as reported by [`sysinfo`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMemory;

impl MemoryBudget for SystemMemory {
    fn available_bytes(&self) -> u64 {
        let mut system = System::new();
        system.refresh_memory();
        system.available_memory()
    }
}

/// A fixed number of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBudget(pub u64);

impl MemoryBudget for FixedBudget {
    fn available_bytes(&self) -> u64 {
        self.0
    }
}

/// An unlimited amount of memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnboundedBudget;

impl MemoryBudget for UnboundedBudget {
    fn available_bytes(&self) -> u64 {
        u64::MAX
    }
}

impl<B: MemoryBudget + ?Sized> MemoryBudget for &B {
    fn available_bytes(&self) -> u64 {
        (**self).available_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budgets() {
        assert_eq!(FixedBudget(42).available_bytes(), 42);
        assert_eq!(UnboundedBudget.available_bytes(), u64::MAX);
        let budget: &dyn MemoryBudget = &FixedBudget(7);
        assert_eq!(budget.available_bytes(), 7);
    }
}

/*
 * SPDX-FileCopyrightText: 2025 The rankprop developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Miscellaneous utilities.

mod mem;
pub use mem::*;

mod memory_budget;
pub use memory_budget::*;

/// Minimum length of the slices handed to a Rayon task by the parallel
/// passes over all nodes.
pub const RAYON_MIN_LEN: usize = 100_000;

/// Returns the number of batches of size `batch_size` needed to cover
/// `elements` elements.
///
/// A batch size of zero is treated as one.
#[inline(always)]
pub fn thread_size(batch_size: usize, elements: usize) -> usize {
    elements.div_ceil(batch_size.max(1))
}

/// Formats a number of bytes using binary prefixes.
pub fn humanize_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for u in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = u;
    }
    format!("{:.2} {}", value, unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_size() {
        assert_eq!(thread_size(4, 0), 0);
        assert_eq!(thread_size(4, 8), 2);
        assert_eq!(thread_size(4, 9), 3);
        assert_eq!(thread_size(0, 3), 3);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize_bytes(0), "0 B");
        assert_eq!(humanize_bytes(1023), "1023 B");
        assert_eq!(humanize_bytes(1024), "1.00 KiB");
        assert_eq!(humanize_bytes(3 << 29), "1.50 GiB");
    }
}

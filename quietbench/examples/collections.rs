//! quietbench Example Benchmarks
//!
//! A small suite over standard collections. Serves as a template for your
//! own benchmark binary.
//!
//! Run with:
//!   cargo run --release --example collections                   # Run all benchmarks
//!   cargo run --release --example collections -- --quick        # Fewer trials
//!   cargo run --release --example collections -- list           # List benchmarks
//!   cargo run --release --example collections -- --group maps   # Only the maps group
//!   cargo run --release --example collections -- --format json  # Structured output
//!
//! Point `--gc-log` (or `QUIETBENCH_GC_LOG`) at the host runtime's GC log to
//! enable interference detection.

use quietbench::bench;
use std::collections::{BTreeMap, HashMap};
use std::hint::black_box;
use std::sync::LazyLock;

#[global_allocator]
static GLOBAL: quietbench::TrackingAllocator = quietbench::TrackingAllocator;

static UNSORTED: LazyLock<Vec<u64>> = LazyLock::new(|| {
    let mut x = 0x2545_f491_4f6c_dd1du64;
    (0..10_000)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            x
        })
        .collect()
});

// ============================================================================
// Vectors
// ============================================================================

bench!(vec_push, group = "vectors", {
    let mut v = Vec::new();
    for i in 0..1024u64 {
        v.push(black_box(i));
    }
    v.len()
});

bench!(vec_sum, group = "vectors", {
    UNSORTED.iter().fold(0u64, |acc, x| acc.wrapping_add(*x))
});

bench!(vec_sort, group = "vectors", {
    let mut v = UNSORTED.clone();
    v.sort_unstable();
    v[v.len() / 2]
});

// ============================================================================
// Maps
// ============================================================================

bench!(hashmap_insert, group = "maps", {
    let mut map = HashMap::with_capacity(256);
    for i in 0..256u64 {
        map.insert(i, i * 2);
    }
    map.len()
});

bench!(btreemap_insert, group = "maps", {
    let mut map = BTreeMap::new();
    for i in 0..256u64 {
        map.insert(i, i * 2);
    }
    map.len()
});

// ============================================================================
// Strings
// ============================================================================

bench!(string_format, {
    let mut s = String::new();
    for i in 0..64 {
        s.push_str(&format!("{i},"));
    }
    s
});

fn main() -> anyhow::Result<()> {
    quietbench::run()
}

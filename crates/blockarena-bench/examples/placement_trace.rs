//! Placement walk-through on a 12-byte arena.
//!
//! Replays the reference sequence (pack, dedicate, recycle, reuse) with
//! trace-level logging so every placement decision is printed.
//!
//! Run with:
//!   cargo run -p blockarena-bench --example placement_trace
//!
//! Override the filter with `RUST_LOG`, e.g. `RUST_LOG=blockarena=debug`.

use blockarena::Arena;
use blockarena_bench::{run_steps, DEMO_BLOCK_SIZE, DEMO_SEQUENCE};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("blockarena=trace"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut arena = match Arena::create(DEMO_BLOCK_SIZE) {
        Ok(arena) => arena,
        Err(e) => {
            eprintln!("failed to create arena: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_steps(&mut arena, &DEMO_SEQUENCE) {
        eprintln!("demo sequence failed: {e}");
        std::process::exit(1);
    }

    println!("\nfinal chain (newest first):");
    for block in arena.blocks() {
        println!(
            "  block {:>2}: {:<9} {:>3}/{:<3} bytes (gen {})",
            block.id.0, block.state, block.used, block.capacity, block.generation
        );
    }
    let stats = arena.stats();
    println!(
        "\n{} blocks, {} of {} bytes handed out",
        stats.block_count, stats.used_bytes, stats.capacity_bytes
    );

    arena.release();
}

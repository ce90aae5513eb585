//! Test command implementation.
//!
//! Runs a few sampling ticks and prints the resulting records.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::sampler::{Sampler, SamplerSettings};
use crate::sink::ChannelSink;

/// Records printed per tick unless `verbose` is set.
const PREVIEW_RECORDS: usize = 5;

/// Runs `iterations` ticks back to back and prints their records.
pub async fn command_test(iterations: usize, verbose: bool, config: &Config) -> anyhow::Result<()> {
    println!("🧪 watch-process - Test Mode");
    println!("============================");

    let settings = SamplerSettings::from_config(config).await?;
    println!("   🖥️  Platform: {}", settings.platform());
    println!("   🏷️  Tag: {}", settings.tag);
    println!("   ⚙️  Command: {}", settings.command);

    let (sink, mut rx) = ChannelSink::new();
    let sampler = Sampler::new(settings, Arc::new(sink));

    for iteration in 1..=iterations {
        println!("\n🔄 Iteration {}/{}:", iteration, iterations);

        let start = Instant::now();
        let result = sampler.run_tick().await;
        let duration = start.elapsed();

        let mut printed = 0;
        while let Ok(emitted) = rx.try_recv() {
            if verbose || printed < PREVIEW_RECORDS {
                println!("   {}", serde_json::to_string(&emitted)?);
                printed += 1;
            }
        }

        match result {
            Ok(summary) => {
                println!(
                    "   ⏱️  Tick duration: {:.2}ms",
                    duration.as_secs_f64() * 1000.0
                );
                println!("   📊 Emitted: {} records", summary.emitted);
                println!("   ⏭️  Dropped by filter: {}", summary.dropped);
                println!("   ❌ Unparseable lines: {}", summary.skipped);
            }
            Err(e) => {
                println!("   ❌ Tick failed: {}", e);
            }
        }
    }

    println!("\n✅ Test completed");
    Ok(())
}

//! Check command implementation.
//!
//! Validates the configuration and that the listing command can be run.

use std::sync::Arc;

use crate::config::{validate_effective_config, Config};
use crate::sampler::{Sampler, SamplerSettings};
use crate::sink::ChannelSink;
use crate::tag::has_hostname_placeholder;

/// Validates configuration and, with `sample`, runs one tick.
pub async fn command_check(sample: bool, config: &Config) -> anyhow::Result<()> {
    println!("🔍 watch-process - System Check");
    println!("===============================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    let platform = config.effective_platform();
    println!("\n🖥️  Platform: {}", platform);
    println!("   Keys: {}", config.effective_keys(platform).join(","));

    if all_ok {
        if config.tag.as_deref().is_some_and(has_hostname_placeholder) {
            println!("\n🏷️  Resolving tag via '{}'...", config.hostname_command());
        }

        match SamplerSettings::from_config(config).await {
            Ok(settings) => {
                println!("   ✅ Tag: {}", settings.tag);
                println!("   ✅ Command: {}", settings.command);

                if sample {
                    println!("\n🔄 Running one sampling tick...");
                    let (sink, mut rx) = ChannelSink::new();
                    let sampler = Sampler::new(settings, Arc::new(sink));
                    match sampler.run_tick().await {
                        Ok(summary) => {
                            rx.close();
                            println!(
                                "   ✅ {} records emitted, {} lines skipped, {} dropped",
                                summary.emitted, summary.skipped, summary.dropped
                            );
                            if summary.emitted == 0 {
                                println!("   ⚠️  The listing command produced no records");
                            }
                        }
                        Err(e) => {
                            println!("   ❌ Sampling tick failed: {}", e);
                            all_ok = false;
                        }
                    }
                }
            }
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        std::process::exit(1);
    }
}

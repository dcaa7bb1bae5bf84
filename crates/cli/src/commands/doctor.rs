//! `researchflow doctor` — Diagnose configuration and connectivity.

use std::path::Path;

use researchflow_config::{GENERATION_API_KEY_VAR, SEARCH_API_KEY_VAR};
use researchflow_providers::build_from_config;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 ResearchFlow Doctor — System Diagnostics");
    println!("===========================================\n");

    let mut issues = 0;
    let path = super::config_path(config_path);

    // Check config
    let config = match super::load_config(config_path) {
        Ok(config) => {
            if path.exists() {
                println!("  ✅ Config file valid ({})", path.display());
            } else {
                println!("  ⚠️  No config file at {}, using defaults — run `researchflow init`", path.display());
            }
            config
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. Fix the config file and re-run.");
            return Ok(());
        }
    };

    // Check credentials
    for (variable, present) in [
        (SEARCH_API_KEY_VAR, config.search.api_key.is_some()),
        (GENERATION_API_KEY_VAR, config.generation.api_key.is_some()),
    ] {
        if present {
            println!("  ✅ {variable} set");
        } else {
            println!("  ❌ {variable} missing — export it or add it to .env");
            issues += 1;
        }
    }

    // Check output directory
    match check_writable(&config.output_dir) {
        Ok(()) => println!("  ✅ Output directory writable ({})", config.output_dir.display()),
        Err(e) => {
            println!("  ❌ Output directory not writable ({}): {e}", config.output_dir.display());
            issues += 1;
        }
    }

    // Check generation endpoint
    match config.credentials() {
        Ok(credentials) => {
            let providers = build_from_config(&config, &credentials);
            match providers.generation.health_check().await {
                Ok(true) => println!("  ✅ {} reachable", config.generation.provider_name),
                Ok(false) => {
                    println!("  ❌ {} rejected the health check", config.generation.provider_name);
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ {} unreachable: {e}", config.generation.provider_name);
                    issues += 1;
                }
            }
        }
        Err(_) => println!("  ⏭️  Skipping connectivity check (credentials missing)"),
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Create `dir` if needed and prove a file can be written there.
fn check_writable(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let marker = dir.join(".researchflow_write_check");
    std::fs::write(&marker, b"ok")?;
    std::fs::remove_file(&marker)
}

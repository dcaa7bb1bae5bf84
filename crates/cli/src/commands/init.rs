//! `researchflow init` — Write the default config file.

use std::path::{Path, PathBuf};

use researchflow_config::{AppConfig, GENERATION_API_KEY_VAR, SEARCH_API_KEY_VAR};

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = super::config_path(config_path);

    println!("🔧 ResearchFlow — Setup");
    println!("=======================\n");

    match write_default(&path)? {
        Some(path) => {
            println!("✅ Created config at: {}", path.display());
            println!("\n📝 Next steps:");
            println!("   1. Set {SEARCH_API_KEY_VAR} and {GENERATION_API_KEY_VAR} (environment or .env)");
            println!("   2. Run: researchflow doctor");
            println!("   3. Run: researchflow research");
        }
        None => {
            println!("⚠️  Config already exists at: {}", path.display());
            println!("   Edit it manually or delete and re-run init.");
        }
    }

    Ok(())
}

/// Write the default config unless `path` exists. Returns the written path.
fn write_default(path: &Path) -> std::io::Result<Option<PathBuf>> {
    if path.exists() {
        return Ok(None);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(Some(path.to_path_buf()))
}

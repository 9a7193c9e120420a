use std::path::Path;

use crate::error::{Result, SpyError};
use crate::settings::{save_settings, settings_path, Settings};

pub fn run(path: Option<&Path>, force: bool) -> Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(settings_path);
    if path.exists() && !force {
        return Err(SpyError::Settings(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    save_settings(&Settings::default(), &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

use crate::error::Result;
use crate::settings::Settings;

pub fn run(description: &str, settings: &Settings) -> Result<()> {
    println!("{}", settings.keyword_table().categorize(description));
    Ok(())
}

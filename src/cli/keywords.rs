use crate::cli::text::format_keywords;
use crate::error::Result;
use crate::settings::Settings;

pub fn run(settings: &Settings) -> Result<()> {
    println!("{}", format_keywords(&settings.keyword_table()));
    println!("First matching row wins; descriptions with no match are Other.");
    Ok(())
}

//! `emeter link` – resolve a car's E-Meter link and identifiers without downloading.

use anyhow::Result;
use emeter_core::archive;
use emeter_core::config::EmeterConfig;
use emeter_core::identifier::TeamIdentifier;
use emeter_core::link;
use emeter_core::source::{HttpArchiveSource, TeamArchiveSource};

pub fn run_link(cfg: &EmeterConfig, car: u32) -> Result<()> {
    let mut source = HttpArchiveSource::new(cfg)?;
    let page = link::results_page_url(&cfg.results_base, car, &cfg.results_tab);
    let Some(team_link) = source.team_link(car)? else {
        println!("No E-Meter link on {}", page);
        return Ok(());
    };
    let id = TeamIdentifier::from_team_data_url(&team_link)?;
    println!("{:<15} {}", "PAGE", page);
    println!("{:<15} {}", "LINK", team_link);
    println!("{:<15} {}", "COMPETITION ID", id.competition_id);
    println!("{:<15} {}", "TEAM ID", id.team_id);
    println!("{:<15} {}", "STUB", archive::stub_url(&cfg.api_host, &id));
    Ok(())
}

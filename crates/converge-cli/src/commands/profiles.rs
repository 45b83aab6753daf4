use colored::Colorize;
use converge_config::WaitProfiles;

pub fn handle() -> anyhow::Result<()> {
    let path = converge_config::find_config_file()?;
    let profiles = WaitProfiles::load(&path)?;

    println!("{}", format!("Profiles in {}", path.display()).dimmed());
    if profiles.profiles.is_empty() {
        println!("{}", "(none)".dimmed());
        return Ok(());
    }

    for (name, profile) in &profiles.profiles {
        let mut bounds = Vec::new();
        if let Some(secs) = profile.timeout_secs {
            bounds.push(format!("timeout {}s", secs));
        }
        if let Some(attempts) = profile.max_attempts {
            bounds.push(format!("{} attempts", attempts));
        }
        println!(
            "  {:<20} every {}ms, {}",
            name.cyan(),
            profile.interval_ms,
            bounds.join(", ")
        );
    }
    Ok(())
}

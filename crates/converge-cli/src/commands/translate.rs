use colored::Colorize;
use converge::{LifecycleState, NativeStatus, ResourceKind, StatusRegistry};

pub fn handle(provider: &str, kind: &str, status: &str) -> anyhow::Result<()> {
    let kind: ResourceKind = kind.parse().map_err(anyhow::Error::msg)?;
    let registry = StatusRegistry::builtin();

    if registry.table(provider, kind).is_none() {
        let known = registry.providers().join(", ");
        println!(
            "{}",
            format!("ℹ No table for {}/{}; known providers: {}", provider, kind, known).dimmed()
        );
    }

    // integer codes (vCloud Director vApps, CloudStack jobs) are looked up by value
    let native = match status.parse::<i64>() {
        Ok(code) => NativeStatus::Code(code),
        Err(_) => NativeStatus::from(status),
    };
    let state = registry.translate(provider, kind, &native);
    println!("{} → {}", native, paint(state));
    Ok(())
}

pub fn handle_tables(provider: Option<&str>) {
    let mut tables: Vec<_> = StatusRegistry::builtin()
        .tables()
        .filter(|t| provider.is_none_or(|p| t.provider() == p))
        .collect();
    tables.sort_by_key(|t| (t.provider(), t.kind().to_string()));

    if tables.is_empty() {
        println!("{}", "No matching tables".dimmed());
        return;
    }

    for table in tables {
        println!("{}", format!("{} / {}", table.provider(), table.kind()).cyan().bold());
        for (native, state) in table.entries() {
            println!("  {:<16} {}", native, paint(*state));
        }
        println!();
    }
}

pub fn paint(state: LifecycleState) -> colored::ColoredString {
    let label = state.to_string();
    match state {
        LifecycleState::Active => label.green(),
        LifecycleState::Pending => label.yellow(),
        LifecycleState::Suspended => label.blue(),
        LifecycleState::Error => label.red().bold(),
        LifecycleState::Deleted => label.dimmed(),
        LifecycleState::Unrecognized => label.magenta(),
    }
}

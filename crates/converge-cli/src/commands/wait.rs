use super::translate::paint;
use crate::args::{Target, WaitArgs};
use colored::Colorize;
use converge::{
    AwaitSpec, ConvergenceOutcome, LifecycleState, Poller, ResourceAccessor, ResourceId,
    ResourceSnapshot,
};
use converge_sakura::{SakuraDisks, SakuraServers, Usacloud};

pub async fn handle(
    zone: &str,
    target: Target,
    id: &str,
    state: LifecycleState,
    args: &WaitArgs,
) -> anyhow::Result<()> {
    let spec = args.to_spec(state)?;
    let name = target_name(target);
    println!("{}", format!("Waiting for {} {} to become {}...", name, id, state).yellow());
    run(zone, target, id, &spec, args.json).await
}

pub async fn handle_deleted(
    zone: &str,
    target: Target,
    id: &str,
    args: &WaitArgs,
) -> anyhow::Result<()> {
    let spec = args.to_deleted_spec()?;
    let name = target_name(target);
    println!("{}", format!("Waiting for {} {} to be deleted...", name, id).yellow());
    run(zone, target, id, &spec, args.json).await
}

/// Poll `id` until `spec` decides; Ctrl-C cancels the wait.
pub async fn run(
    zone: &str,
    target: Target,
    id: &str,
    spec: &AwaitSpec,
    json: bool,
) -> anyhow::Result<()> {
    let usacloud = Usacloud::new(zone);
    let (poller, accessor): (Poller, Box<dyn ResourceAccessor>) = match target {
        Target::Server => (SakuraServers::poller(), Box::new(SakuraServers::new(usacloud))),
        Target::Disk => (SakuraDisks::poller(), Box::new(SakuraDisks::new(usacloud))),
    };

    let token = poller.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let resource = ResourceId::from(id);
    let outcome = poller.wait_for_resource(accessor.as_ref(), &resource, spec).await?;
    report(&poller, &outcome);
    let snapshot = outcome.into_result(id)?;
    if json {
        if let Some(snapshot) = snapshot {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }
    Ok(())
}

fn report(poller: &Poller, outcome: &ConvergenceOutcome<ResourceSnapshot>) {
    match outcome {
        ConvergenceOutcome::Converged(Some(snapshot)) => {
            println!();
            let state = poller.translate(snapshot);
            println!(
                "{}",
                format!("✓ {} is {} ({})", snapshot.id, state, snapshot.status)
                    .green()
                    .bold()
            );
            if let Some(ip) = snapshot.get_attribute::<String>("ip_address") {
                println!("  IP: {}", ip.cyan());
            }
        }
        ConvergenceOutcome::Converged(None) => {
            println!();
            println!("{}", "✓ Resource no longer exists".green().bold());
        }
        ConvergenceOutcome::Failed { state, snapshot } => {
            println!();
            println!(
                "{} {} ({})",
                format!("✗ {} reached", snapshot.id).red().bold(),
                paint(*state),
                snapshot.status
            );
        }
        ConvergenceOutcome::TimedOut {
            last_state,
            attempts,
            elapsed,
            ..
        } => {
            println!();
            let last = last_state
                .map(|s| paint(s).to_string())
                .unwrap_or_else(|| "not found".dimmed().to_string());
            println!(
                "{} (last state: {})",
                format!("✗ Gave up after {} polls in {:.0?}", attempts, elapsed).red().bold(),
                last
            );
        }
    }
}

fn target_name(target: Target) -> &'static str {
    match target {
        Target::Server => "server",
        Target::Disk => "disk",
    }
}

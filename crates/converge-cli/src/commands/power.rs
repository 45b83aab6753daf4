use crate::args::{Target, WaitArgs};
use colored::Colorize;
use converge::LifecycleState;
use converge_sakura::Usacloud;

/// usacloud client for `zone`, after confirming it can act on the account
async fn connect(zone: &str) -> anyhow::Result<Usacloud> {
    let usacloud = Usacloud::new(zone);
    let auth = usacloud.check_auth().await?;
    if let Some(account) = auth.account {
        tracing::debug!(account = %account.name, zone, "usacloud authenticated");
    }
    Ok(usacloud)
}

pub async fn handle_power_on(
    zone: &str,
    id: &str,
    wait: bool,
    args: &WaitArgs,
) -> anyhow::Result<()> {
    // bad flags fail before anything is submitted
    let spec = args.to_spec(LifecycleState::Active)?;
    let usacloud = connect(zone).await?;

    println!("{}", format!("Powering on server {}...", id).yellow());
    usacloud.power_on(id).await?;
    println!("{}", "✓ Power-on accepted".green());

    if wait {
        super::wait::run(zone, Target::Server, id, &spec, args.json).await?;
    }
    Ok(())
}

pub async fn handle_shutdown(
    zone: &str,
    id: &str,
    force: bool,
    wait: bool,
    args: &WaitArgs,
) -> anyhow::Result<()> {
    let spec = args.to_spec(LifecycleState::Suspended)?;
    let usacloud = connect(zone).await?;

    let how = if force { "Force stopping" } else { "Shutting down" };
    println!("{}", format!("{} server {}...", how, id).yellow());
    usacloud.shutdown(id, force).await?;
    println!("{}", "✓ Shutdown accepted".green());

    if wait {
        super::wait::run(zone, Target::Server, id, &spec, args.json).await?;
    }
    Ok(())
}

pub async fn handle_delete(
    zone: &str,
    target: Target,
    id: &str,
    with_disks: bool,
    wait: bool,
    args: &WaitArgs,
) -> anyhow::Result<()> {
    if with_disks && target == Target::Disk {
        anyhow::bail!("--with-disks only applies to servers");
    }
    let spec = args.to_deleted_spec()?;
    let usacloud = connect(zone).await?;

    match target {
        Target::Server => {
            println!("{}", format!("Deleting server {}...", id).yellow());
            usacloud.delete_server(id, with_disks).await?;
        }
        Target::Disk => {
            println!("{}", format!("Deleting disk {}...", id).yellow());
            usacloud.delete_disk(id).await?;
        }
    }
    println!("{}", "✓ Delete accepted".green());

    if wait {
        super::wait::run(zone, target, id, &spec, args.json).await?;
    }
    Ok(())
}

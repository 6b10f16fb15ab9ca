//! Command execution.

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;

use crate::session::SessionProvider;

use super::args::{Command, ListCommand};
use super::bootstrap::CliContext;
use super::output::{follow, print_message, print_state};

pub async fn execute(ctx: &CliContext) -> Result<()> {
    let json = ctx.args.json;

    match &ctx.args.command {
        Command::Login { username, password } => {
            let session = ctx.dashboard.login(username, password).await?;
            print_message(
                "login",
                &format!("Logged in as {}", session.display_name),
                json,
            )
        }
        Command::Logout => {
            ctx.dashboard.logout()?;
            print_message("logout", "Logged out", json)
        }
        Command::Whoami => match ctx.dashboard.sessions().get_session() {
            Some(session) => print_message("whoami", &session.display_name, json),
            None => print_message("whoami", "Not logged in.", json),
        },
        Command::Watch { once: true } => watch_once(ctx).await,
        Command::Watch { once: false } => watch(ctx).await,
        Command::List { action } => list(ctx, action).await,
    }
}

async fn watch_once(ctx: &CliContext) -> Result<()> {
    let json = ctx.args.json;
    let widgets = ctx.dashboard.widgets();
    ctx.dashboard.start();

    let (sensor, weather, list) = tokio::join!(
        widgets.sensor.settled(),
        widgets.weather.settled(),
        widgets.shopping_list.settled(),
    );
    print_state(widgets.sensor.name(), &sensor, json)?;
    print_state(widgets.weather.name(), &weather, json)?;
    print_state(widgets.shopping_list.name(), &list, json)?;

    ctx.dashboard.stop();
    Ok(())
}

/// Follow every widget until Ctrl-C.
async fn watch(ctx: &CliContext) -> Result<()> {
    let json = ctx.args.json;
    let widgets = ctx.dashboard.widgets();
    ctx.dashboard.start();

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping widgets");
        }
        interrupt.cancel();
    });

    let (sensor, weather, list) = tokio::join!(
        follow(widgets.sensor.name(), widgets.sensor.subscribe(), json, cancel.clone()),
        follow(widgets.weather.name(), widgets.weather.subscribe(), json, cancel.clone()),
        follow(
            widgets.shopping_list.name(),
            widgets.shopping_list.subscribe(),
            json,
            cancel.clone()
        ),
    );

    ctx.dashboard.stop();
    sensor.and(weather).and(list)
}

async fn list(ctx: &CliContext, action: &ListCommand) -> Result<()> {
    let json = ctx.args.json;
    let widget = &ctx.dashboard.widgets().shopping_list;
    widget.start();
    widget.settled().await;

    let outcome = match action {
        ListCommand::Show => Ok(()),
        ListCommand::Add { content } => widget.add_entry(content).await,
        ListCommand::Remove { id } => widget.remove_entry(id).await,
    };

    print_state(widget.name(), &widget.state(), json)?;
    widget.stop();

    if let Err(err) = outcome {
        bail!(err.user_message());
    }
    Ok(())
}

//! Account commands - show the user and list devices

use anyhow::Result;
use eldom_client::EldomClient;

use crate::output::{DeviceRow, OutputContext};

/// Show the logged-in account
pub async fn user(client: &EldomClient, ctx: &OutputContext) -> Result<()> {
    let user = client.get_user().await?;

    let pairs = vec![
        ("ID".to_string(), user.id.to_string()),
        ("Login".to_string(), user.login),
        ("Email".to_string(), user.email),
    ];

    ctx.print_kv(&pairs);
    Ok(())
}

/// List devices registered to the account
pub async fn devices(client: &EldomClient, ctx: &OutputContext) -> Result<()> {
    let devices = client.get_devices().await?;

    let rows: Vec<DeviceRow> = devices
        .into_iter()
        .map(|d| DeviceRow {
            uuid: d.uuid,
            name: d.name,
            model: d.model,
            fmodel: d.fmodel,
            pair_tok: d.pair_tok,
        })
        .collect();

    ctx.print(&rows);
    Ok(())
}

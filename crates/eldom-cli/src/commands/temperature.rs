//! Temperature command - set a convector target temperature

use anyhow::{Context, Result};
use eldom_client::EldomClient;

use crate::commands::state::report;
use crate::output::OutputContext;

/// Set the target temperature of a convector heater
pub async fn temperature(
    client: &EldomClient,
    device: &str,
    degrees: i32,
    ctx: &OutputContext,
) -> Result<()> {
    let device = client
        .find_device(device)
        .await
        .with_context(|| format!("Failed to look up device '{}'", device))?;

    let ack = client
        .convector_heater()
        .set_temperature(&device, degrees)
        .await?;

    report(&ack, &device.name, ctx);
    Ok(())
}

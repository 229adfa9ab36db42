//! Status command - show the state of one device

use anyhow::{Context, Result};
use eldom_client::{DeviceFamily, EldomClient};

use crate::output::{or_dash, OutputContext};

/// Show the status of a device
pub async fn status(
    client: &EldomClient,
    device: &str,
    family: DeviceFamily,
    ctx: &OutputContext,
) -> Result<()> {
    let device = client
        .find_device(device)
        .await
        .with_context(|| format!("Failed to look up device '{}'", device))?;

    let pairs = match family {
        DeviceFamily::ConvectorHeater => {
            let status = client.convector_heater().get_status(&device).await?;
            vec![
                ("ID".to_string(), status.id.clone()),
                ("Temperature".to_string(), or_dash(status.temperature())),
                (
                    "Target".to_string(),
                    or_dash(status.target_temperature()),
                ),
                (
                    "State".to_string(),
                    or_dash(status.state().map(|s| s.request())),
                ),
                ("Status".to_string(), status.status),
            ]
        }
        DeviceFamily::FlatBoiler => {
            let status = client.flat_boiler().get_status(&device).await?;
            let mut pairs = vec![("ID".to_string(), status.id.clone())];
            pairs.extend(
                status
                    .fields
                    .keys()
                    .filter_map(|k| status.field_text(k).map(|v| (k.clone(), v))),
            );
            pairs
        }
    };

    ctx.print_kv(&pairs);
    Ok(())
}

//! State command - switch a device on, off or between boiler modes

use anyhow::{Context, Result};
use eldom_client::{ConvectorState, DeviceFamily, EldomClient, FlatBoilerMode, StateChangeAck};

use crate::output::OutputContext;

/// Change the state of a device
///
/// `value` is a domain value or a state name.
pub async fn state(
    client: &EldomClient,
    device: &str,
    value: &str,
    family: DeviceFamily,
    ctx: &OutputContext,
) -> Result<()> {
    let device = client
        .find_device(device)
        .await
        .with_context(|| format!("Failed to look up device '{}'", device))?;
    let value = domain_value(family, value);

    let ack = match family {
        DeviceFamily::ConvectorHeater => {
            let raw: u8 = value
                .parse()
                .with_context(|| format!("Invalid convector state: {}. Use 0/16 or off/on", value))?;
            client.convector_heater().set_state(&device, raw).await?
        }
        DeviceFamily::FlatBoiler => client.flat_boiler().set_state(&device, &value).await?,
    };

    report(&ack, &device.name, ctx);
    Ok(())
}

/// Print the acknowledgment of a state change
pub(crate) fn report(ack: &StateChangeAck, name: &str, ctx: &OutputContext) {
    if ack.is_empty() {
        ctx.success(&format!("{}: request sent", name));
    } else if ack.is_success() {
        ctx.success(&format!("{}: {} ({})", name, ack.result, ack.reason));
    } else {
        ctx.warn(&format!(
            "{}: {} rejected with code {} ({})",
            name, ack.result, ack.code, ack.reason
        ));
    }
}

/// Translate a state name to its domain value; other input passes through
fn domain_value(family: DeviceFamily, value: &str) -> String {
    let name = value.trim().to_ascii_lowercase();
    match family {
        DeviceFamily::ConvectorHeater => match name.as_str() {
            "off" => ConvectorState::Off.domain_value().to_string(),
            "on" => ConvectorState::On.domain_value().to_string(),
            _ => value.trim().to_string(),
        },
        DeviceFamily::FlatBoiler => FlatBoilerMode::ALL
            .iter()
            .find(|mode| {
                let request = mode.request().to_ascii_lowercase();
                request == name || request.strip_suffix('l') == Some(name.as_str())
            })
            .map(|mode| mode.domain_value().to_string())
            .unwrap_or_else(|| value.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convector_names() {
        assert_eq!(domain_value(DeviceFamily::ConvectorHeater, "ON"), "16");
        assert_eq!(domain_value(DeviceFamily::ConvectorHeater, "off"), "0");
        assert_eq!(domain_value(DeviceFamily::ConvectorHeater, "16"), "16");
        assert_eq!(domain_value(DeviceFamily::ConvectorHeater, "warm"), "warm");
    }

    #[test]
    fn test_flat_boiler_names() {
        assert_eq!(domain_value(DeviceFamily::FlatBoiler, "smart"), "3");
        assert_eq!(domain_value(DeviceFamily::FlatBoiler, "ExtraSafe"), "4");
        assert_eq!(domain_value(DeviceFamily::FlatBoiler, "powerful"), "5");
        assert_eq!(domain_value(DeviceFamily::FlatBoiler, "Powerfull"), "5");
        assert_eq!(domain_value(DeviceFamily::FlatBoiler, "2"), "2");
        assert_eq!(domain_value(DeviceFamily::FlatBoiler, "9"), "9");
    }
}

//! Flat boiler client

use async_trait::async_trait;
use eldom_proto::flat_boiler::{self, FlatBoilerMode, FlatBoilerStatus};
use eldom_proto::{DeviceFamily, StateChangeAck};
use tracing::instrument;

use crate::direct::{decode_ack, decode_response, DirectRequestClient, DirectRequestDevice};
use crate::error::Result;
use crate::types::Device;

/// Flat boilers require the encrypted envelope in both directions
#[derive(Debug, Clone)]
pub struct FlatBoilerClient {
    direct: DirectRequestClient,
}

impl FlatBoilerClient {
    pub fn new(direct: DirectRequestClient) -> Self {
        Self { direct }
    }

    /// Get the status snapshot of a boiler
    #[instrument(skip(self, device), fields(device = %device.uuid))]
    pub async fn get_status(&self, device: &Device) -> Result<FlatBoilerStatus> {
        let command = flat_boiler::status_command(&device.pair_tok);
        let value = self.send_command(device, &command).await?;
        decode_response(value)
    }

    /// Switch mode by domain value: `"0"` Off, `"1"` On, `"2"` Eco,
    /// `"3"` Smart, `"4"` ExtraSafe, `"5"` Powerful
    ///
    /// Any other value fails before a request is made.
    #[instrument(skip(self, device), fields(device = %device.uuid))]
    pub async fn set_state(&self, device: &Device, state: &str) -> Result<StateChangeAck> {
        let mode = FlatBoilerMode::from_domain(state)?;
        self.set_mode(device, mode).await
    }

    /// Switch mode
    pub async fn set_mode(&self, device: &Device, mode: FlatBoilerMode) -> Result<StateChangeAck> {
        let command = flat_boiler::mode_command(&device.pair_tok, mode);
        decode_ack(self.send_command(device, &command).await?)
    }
}

#[async_trait]
impl DirectRequestDevice for FlatBoilerClient {
    fn family(&self) -> DeviceFamily {
        DeviceFamily::FlatBoiler
    }

    fn direct(&self) -> &DirectRequestClient {
        &self.direct
    }
}

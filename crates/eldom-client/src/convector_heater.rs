//! Convector heater client

use async_trait::async_trait;
use eldom_proto::convector::{self, ConvectorHeaterStatus, ConvectorSchedule, ConvectorState};
use eldom_proto::{DeviceFamily, StateChangeAck};
use tracing::instrument;

use crate::direct::{decode_ack, decode_response, DirectRequestClient, DirectRequestDevice};
use crate::error::Result;
use crate::types::Device;

/// Convector heaters speak plain JSON through the relay
#[derive(Debug, Clone)]
pub struct ConvectorHeaterClient {
    direct: DirectRequestClient,
}

impl ConvectorHeaterClient {
    pub fn new(direct: DirectRequestClient) -> Self {
        Self { direct }
    }

    /// Get the status snapshot of a heater
    #[instrument(skip(self, device), fields(device = %device.uuid))]
    pub async fn get_status(&self, device: &Device) -> Result<ConvectorHeaterStatus> {
        let command = convector::status_command(&device.pair_tok);
        let value = self.send_command(device, &command).await?;
        decode_response(value)
    }

    /// Turn a heater on (`16`) or off (`0`)
    ///
    /// Any other value fails before a request is made.
    #[instrument(skip(self, device), fields(device = %device.uuid))]
    pub async fn set_state(&self, device: &Device, state: u8) -> Result<StateChangeAck> {
        let state = ConvectorState::from_domain(state)?;
        let command = convector::state_command(&device.pair_tok, state);
        decode_ack(self.send_command(device, &command).await?)
    }

    /// Set the target temperature in whole degrees Celsius
    ///
    /// Sends the default schedule fields along with it; see
    /// [`ConvectorHeaterClient::set_temperature_with`] to keep a custom schedule.
    pub async fn set_temperature(&self, device: &Device, degrees: i32) -> Result<StateChangeAck> {
        self.set_temperature_with(device, degrees, &ConvectorSchedule::default())
            .await
    }

    /// Set the target temperature together with explicit schedule fields
    #[instrument(skip(self, device, schedule), fields(device = %device.uuid))]
    pub async fn set_temperature_with(
        &self,
        device: &Device,
        degrees: i32,
        schedule: &ConvectorSchedule,
    ) -> Result<StateChangeAck> {
        let command = convector::temperature_command(&device.pair_tok, degrees, schedule);
        decode_ack(self.send_command(device, &command).await?)
    }
}

#[async_trait]
impl DirectRequestDevice for ConvectorHeaterClient {
    fn family(&self) -> DeviceFamily {
        DeviceFamily::ConvectorHeater
    }

    fn direct(&self) -> &DirectRequestClient {
        &self.direct
    }
}

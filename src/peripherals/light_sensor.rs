//! Ambient light sensing via the APDS-9960
//!
//! Only the ALS clear channel is used; proximity, gesture and the color
//! channels stay disabled.

use embassy_nrf::twim::{self, Twim};

use crate::brightness::LightSensor;

const ADDRESS: u8 = 0x39;

const REG_ENABLE: u8 = 0x80;
const REG_ATIME: u8 = 0x81;
const REG_CONTROL: u8 = 0x8F;
const REG_ID: u8 = 0x92;
const REG_CDATAL: u8 = 0x94;

/// ENABLE: power on
const PON: u8 = 0x01;
/// ENABLE: ALS engine enable
const AEN: u8 = 0x02;

/// 256 - 10: ten 2.78 ms integration cycles, short enough for the 30 ms
/// burst sampling cadence.
const ATIME_27_8_MS: u8 = 0xF6;
/// ALS gain 4x
const AGAIN_4X: u8 = 0x01;

pub struct Apds9960<'a, TWI>
where
    TWI: twim::Instance,
{
    i2c: Twim<'a, TWI>,
}

impl<'a, TWI> Apds9960<'a, TWI>
where
    TWI: twim::Instance,
{
    /// Bring up the ALS engine. An unresponsive sensor is logged but not
    /// fatal: reads keep failing and the brightness controller falls back
    /// to minimum brightness.
    pub async fn init(i2c: Twim<'a, TWI>) -> Self {
        let mut sensor = Self { i2c };

        match sensor.read_register(REG_ID).await {
            Ok(id) => defmt::info!("APDS-9960 id: {=u8:#04x}", id),
            Err(_) => defmt::error!("APDS-9960 not responding"),
        }

        let setup = [
            (REG_ENABLE, 0x00),
            (REG_ATIME, ATIME_27_8_MS),
            (REG_CONTROL, AGAIN_4X),
            (REG_ENABLE, PON | AEN),
        ];
        for (register, value) in setup {
            if sensor.write_register(register, value).await.is_err() {
                defmt::error!("APDS-9960 setup write failed");
                break;
            }
        }

        sensor
    }

    /// Raw clear-channel photodiode count.
    async fn read_clear(&mut self) -> Result<u16, Error> {
        let mut data = [0; 2];
        self.i2c
            .write_read(ADDRESS, &[REG_CDATAL], &mut data)
            .await
            .map_err(|_| Error::Bus)?;

        Ok(u16::from_le_bytes(data))
    }

    async fn read_register(&mut self, register: u8) -> Result<u8, Error> {
        let mut data = [0; 1];
        self.i2c
            .write_read(ADDRESS, &[register], &mut data)
            .await
            .map_err(|_| Error::Bus)?;

        Ok(data[0])
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error> {
        self.i2c
            .write(ADDRESS, &[register, value])
            .await
            .map_err(|_| Error::Bus)
    }
}

impl<'a, TWI> LightSensor for Apds9960<'a, TWI>
where
    TWI: twim::Instance,
{
    type Error = Error;

    async fn read_intensity(&mut self) -> Result<i32, Error> {
        match self.read_clear().await {
            Ok(counts) => Ok(counts as i32),
            Err(err) => {
                defmt::error!("Cannot read ALS data");
                Err(err)
            }
        }
    }
}

#[derive(Debug)]
pub enum Error {
    Bus,
}

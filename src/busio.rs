use i2c_linux::I2c;
#[allow(unused_imports)]
use log::{debug, info};
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::{thread, time};

// -- SPI control bits: bit 7 of the address byte selects read, a cleared
// -- bit 7 selects write; bit 4 of the status register selects the memory page
const SPI_READ_BIT: u8 = 0x80;
const SPI_WRITE_MASK: u8 = 0x7f;
const SPI_REG_STATUS: u8 = 0x73;
const SPI_MEM_PAGE_BIT: u8 = 0x10;

/// Byte-oriented register access against one device on a bus.
///
/// The two implementations cover the device's bus options: an addressed
/// I2C transaction and a chip-select framed SPI transaction. Everything
/// above this trait is bus-agnostic.
pub trait RegisterBus {
    /// Burst-read `data.len()` bytes starting at register `reg`.
    fn read_registers(&mut self, reg: u8, data: &mut [u8]) -> Result<(), std::io::Error>;

    /// Write `data` starting at register `reg`.
    fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<(), std::io::Error>;

    fn read_register(&mut self, reg: u8) -> Result<u8, std::io::Error> {
        let mut data: [u8; 1] = [0];
        self.read_registers(reg, &mut data)?;
        Ok(data[0])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), std::io::Error> {
        self.write_registers(reg, &[value])
    }
}

/// An I2C bus handle shareable between several device adapters. Every
/// adapter locks it per transaction, never across a delay.
pub type SharedI2c = Arc<Mutex<I2c<File>>>;

pub fn open_i2c_bus(bus_path: &Path) -> Result<SharedI2c, std::io::Error> {
    let i2c = I2c::from_path(bus_path)?;
    Ok(Arc::new(Mutex::new(i2c)))
}

/// Plain addressed burst transactions against a 7-bit device address.
pub struct I2cAdapter {
    bus: SharedI2c,
    device_addr: u16,
}

impl I2cAdapter {
    pub fn new(bus: &SharedI2c, device_addr: u16) -> I2cAdapter {
        I2cAdapter {
            bus: Arc::clone(bus),
            device_addr,
        }
    }

    pub fn open(bus_path: &Path, device_addr: u16) -> Result<I2cAdapter, std::io::Error> {
        let bus = open_i2c_bus(bus_path)?;
        Ok(I2cAdapter { bus, device_addr })
    }
}

// -- a poisoned mutex means another bus user panicked mid-transaction
fn acquire<'a, T>(bus: &'a Mutex<T>, label: &str) -> Result<MutexGuard<'a, T>, std::io::Error> {
    bus.lock()
        .map_err(|_| std::io::Error::other(format!("{label} bus mutex poisoned")))
}

impl RegisterBus for I2cAdapter {
    fn read_registers(&mut self, reg: u8, data: &mut [u8]) -> Result<(), std::io::Error> {
        // -- the slave address is set per transaction, the bus may be
        // -- shared with devices at other addresses
        let mut i2c = acquire(&self.bus, "i2c")?;
        i2c.smbus_set_slave_address(self.device_addr, false)?;
        let _bytes_read = i2c.i2c_read_block_data(reg, data)?;
        debug!("Read {_bytes_read} bytes from register {reg:#04x}");
        Ok(())
    }

    fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<(), std::io::Error> {
        let mut i2c = acquire(&self.bus, "i2c")?;
        i2c.smbus_set_slave_address(self.device_addr, false)?;
        i2c.i2c_write_block_data(reg, data)
    }
}

/// A SPI bus handle shareable between adapters on the same chip select.
pub type SharedSpi = Arc<Mutex<Spidev>>;

pub fn open_spi_bus(bus_path: &Path, max_speed_hz: u32) -> Result<SharedSpi, std::io::Error> {
    let mut spi = Spidev::open(bus_path)?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(max_speed_hz)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.configure(&options)?;
    Ok(Arc::new(Mutex::new(spi)))
}

/// Chip-select framed transactions. The kernel pulses chip select per
/// transfer; only seven address bits go over the wire, so the device's
/// memory page bit is kept in sync across calls: registers 0x80..=0xff
/// live on page 0, registers below 0x80 on page 1.
pub struct SpiAdapter {
    bus: SharedSpi,
    mem_page: Option<u8>,
}

impl SpiAdapter {
    pub fn new(bus: &SharedSpi) -> SpiAdapter {
        SpiAdapter {
            bus: Arc::clone(bus),
            // -- unknown until the first transaction selects it
            mem_page: None,
        }
    }

    pub fn open(bus_path: &Path, max_speed_hz: u32) -> Result<SpiAdapter, std::io::Error> {
        let bus = open_spi_bus(bus_path, max_speed_hz)?;
        Ok(SpiAdapter {
            bus,
            mem_page: None,
        })
    }

    fn select_mem_page(
        spi: &mut Spidev,
        current: &mut Option<u8>,
        reg: u8,
    ) -> Result<(), std::io::Error> {
        let page = target_mem_page(reg);
        if *current == Some(page) {
            return Ok(());
        }
        // -- read the status register, update the page bit, write it back
        let tx: [u8; 2] = [SPI_REG_STATUS | SPI_READ_BIT, 0];
        let mut rx: [u8; 2] = [0; 2];
        spi.transfer(&mut SpidevTransfer::read_write(&tx, &mut rx))?;
        let reg_val = (rx[1] & !SPI_MEM_PAGE_BIT) | page;
        let tx: [u8; 2] = [SPI_REG_STATUS & SPI_WRITE_MASK, reg_val];
        spi.transfer(&mut SpidevTransfer::write(&tx))?;
        debug!("Selected SPI memory page bit {page:#04x} for register {reg:#04x}");
        *current = Some(page);
        Ok(())
    }
}

impl RegisterBus for SpiAdapter {
    fn read_registers(&mut self, reg: u8, data: &mut [u8]) -> Result<(), std::io::Error> {
        let mut spi = acquire(&self.bus, "spi")?;
        Self::select_mem_page(&mut spi, &mut self.mem_page, reg)?;
        let tx = spi_read_frame(reg, data.len());
        let mut rx = vec![0u8; data.len() + 1];
        spi.transfer(&mut SpidevTransfer::read_write(&tx, &mut rx))?;
        data.copy_from_slice(&rx[1..]);
        Ok(())
    }

    fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<(), std::io::Error> {
        let mut spi = acquire(&self.bus, "spi")?;
        Self::select_mem_page(&mut spi, &mut self.mem_page, reg)?;
        let tx = spi_write_frame(reg, data);
        spi.transfer(&mut SpidevTransfer::write(&tx))?;
        Ok(())
    }
}

fn target_mem_page(reg: u8) -> u8 {
    if reg >= 0x80 {
        0x00
    } else {
        SPI_MEM_PAGE_BIT
    }
}

fn spi_read_frame(reg: u8, len: usize) -> Vec<u8> {
    let mut tx = vec![0u8; len + 1];
    tx[0] = reg | SPI_READ_BIT;
    tx
}

// -- the device takes SPI writes as (address, value) pairs in one
// -- chip-select frame, the address auto-increment of reads does not apply
fn spi_write_frame(reg: u8, data: &[u8]) -> Vec<u8> {
    let mut tx = Vec::with_capacity(data.len() * 2);
    for (offset, value) in data.iter().enumerate() {
        tx.push(reg.wrapping_add(offset as u8) & SPI_WRITE_MASK);
        tx.push(*value);
    }
    tx
}

pub fn delay(milli_secs: u32) {
    let delay = time::Duration::from_millis(milli_secs as u64);
    thread::sleep(delay);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_page_follows_address_halves() {
        // -- calibration block, chip id, reset registers sit on page 0
        assert_eq!(target_mem_page(0x89), 0x00);
        assert_eq!(target_mem_page(0xd0), 0x00);
        assert_eq!(target_mem_page(0xe0), 0x00);
        // -- field data and control registers sit on page 1
        assert_eq!(target_mem_page(0x1d), SPI_MEM_PAGE_BIT);
        assert_eq!(target_mem_page(0x74), SPI_MEM_PAGE_BIT);
        assert_eq!(target_mem_page(0x7f), SPI_MEM_PAGE_BIT);
        assert_eq!(target_mem_page(0x80), 0x00);
    }

    #[test]
    fn read_frame_sets_read_bit() {
        let tx = spi_read_frame(0x1d, 15);
        assert_eq!(tx.len(), 16);
        assert_eq!(tx[0], 0x1d | SPI_READ_BIT);
        assert!(tx[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn write_frame_pairs_addresses_with_values() {
        let tx = spi_write_frame(0xe0, &[0xb6]);
        assert_eq!(tx, vec![0x60, 0xb6]);
        let tx = spi_write_frame(0x5a, &[0x73, 0x65]);
        assert_eq!(tx, vec![0x5a, 0x73, 0x5b, 0x65]);
    }
}

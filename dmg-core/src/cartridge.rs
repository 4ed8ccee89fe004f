use crate::memory::address;
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

/// One fixed-size slice of cartridge ROM.
pub type RomBank = [u8; address::ROM_BANK_SIZE];

const MAX_BANKS: usize = 32;

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("error reading cartridge file: {source}")]
    FileRead {
        #[from]
        source: io::Error,
    },
    #[error("ROM image is {len} bytes, too short to contain a single {} byte bank", address::ROM_BANK_SIZE)]
    TooShort { len: usize },
    #[error("cartridge has {bank_count} bank(s), bank {bank} is required")]
    MissingBank { bank: usize, bank_count: usize },
}

/// The cartridge ROM, split into banks. Owns the bank storage; the address space only borrows
/// banks 0 and 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    banks: Vec<Box<RomBank>>,
}

impl Cartridge {
    /// Split a raw ROM image into banks. A trailing partial bank is dropped.
    pub fn new(rom: &[u8]) -> Result<Self, CartridgeLoadError> {
        if rom.len() < address::ROM_BANK_SIZE {
            log::warn!("Couldn't load any bank (image is {} bytes)", rom.len());
            return Err(CartridgeLoadError::TooShort { len: rom.len() });
        }

        let mut banks = Vec::new();
        for (i, chunk) in rom.chunks(address::ROM_BANK_SIZE).enumerate() {
            let Ok(bank) = <&RomBank>::try_from(chunk) else {
                log::warn!(
                    "bank #{i} couldn't be loaded properly ({} bytes), not included",
                    chunk.len()
                );
                break;
            };

            if banks.len() == MAX_BANKS {
                log::warn!(
                    "ROM image has more than {MAX_BANKS} banks, ignoring the remaining {} bytes",
                    rom.len() - i * address::ROM_BANK_SIZE
                );
                break;
            }

            banks.push(Box::new(*bank));
        }

        log::debug!("Loaded {} bank(s) successfully", banks.len());

        Ok(Self { banks })
    }

    pub fn from_file<P>(path: P) -> Result<Self, CartridgeLoadError>
    where
        P: AsRef<Path>,
    {
        let raw_data = fs::read(path.as_ref())?;
        Self::new(&raw_data)
    }

    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    /// Return the given bank, or None (with a warning) if the cartridge does not have it.
    pub fn bank(&self, bank: usize) -> Option<&RomBank> {
        let rom_bank = self.banks.get(bank).map(AsRef::as_ref);
        if rom_bank.is_none() {
            log::warn!(
                "Asked for bank {bank} but the cartridge contains only {} bank(s)",
                self.banks.len()
            );
        }
        rom_bank
    }

    /// Return the two fixed banks the address space maps.
    pub fn fixed_banks(&self) -> Result<(&RomBank, &RomBank), CartridgeLoadError> {
        let bank_count = self.banks.len();
        let bank_0 = self
            .bank(0)
            .ok_or(CartridgeLoadError::MissingBank { bank: 0, bank_count })?;
        let bank_1 = self
            .bank(1)
            .ok_or(CartridgeLoadError::MissingBank { bank: 1, bank_count })?;
        Ok((bank_0, bank_1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_banks() {
        let mut rom = vec![0x11; 2 * address::ROM_BANK_SIZE];
        rom[address::ROM_BANK_SIZE] = 0x22;

        let cartridge = Cartridge::new(&rom).expect("two full banks should load");
        assert_eq!(2, cartridge.bank_count());

        let (bank_0, bank_1) = cartridge.fixed_banks().expect("both fixed banks should exist");
        assert_eq!(0x11, bank_0[0]);
        assert_eq!(0x22, bank_1[0]);
    }

    #[test]
    fn partial_trailing_bank_dropped() {
        let rom = vec![0; 2 * address::ROM_BANK_SIZE + 100];

        let cartridge = Cartridge::new(&rom).expect("two full banks should load");
        assert_eq!(2, cartridge.bank_count());
        assert!(cartridge.bank(2).is_none());
    }

    #[test]
    fn too_short() {
        let rom = vec![0; 0x3000];
        assert!(matches!(
            Cartridge::new(&rom),
            Err(CartridgeLoadError::TooShort { len: 0x3000 })
        ));
    }

    #[test]
    fn single_bank_missing_bank_1() {
        let rom = vec![0; address::ROM_BANK_SIZE];

        let cartridge = Cartridge::new(&rom).expect("one full bank should load");
        assert!(matches!(
            cartridge.fixed_banks(),
            Err(CartridgeLoadError::MissingBank { bank: 1, bank_count: 1 })
        ));
    }
}

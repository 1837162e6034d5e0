mod sync_channel;
mod track_channel;
#[cfg(unix)]
mod unix_channel;

pub use sync_channel::SyncChannel;
pub use track_channel::TrackChannel;

#[cfg(unix)]
pub use unix_channel::{unix_channel_pair, UnixChannel};

use crate::{Block, Block512};
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use std::io::{Error, ErrorKind, Result};

/// A trait for managing I/O. `AbstractChannel`s are clonable, and provide basic
/// read/write capabilities for both common and crate-specific types.
///
/// All integers travel in little-endian byte order; a `usize` travels as a `u64`.
pub trait AbstractChannel {
    /// Read a slice of `u8`s from the channel.
    fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<()>;
    /// Write a slice of `u8`s to the channel.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;
    /// Flush the channel.
    fn flush(&mut self) -> Result<()>;
    /// Clone the channel.
    fn clone(&self) -> Self
    where
        Self: Sized;
    /// Read `nbytes` from the channel, and return it as a `Vec`.
    fn read_vec(&mut self, nbytes: usize) -> Result<Vec<u8>> {
        let mut data = vec![0; nbytes];
        self.read_bytes(&mut data)?;
        Ok(data)
    }

    /// Write a `bool` to the channel.
    #[inline(always)]
    fn write_bool(&mut self, b: bool) -> Result<()> {
        self.write_bytes(&[b as u8])?;
        Ok(())
    }

    /// Read a `bool` from the channel.
    #[inline(always)]
    fn read_bool(&mut self) -> Result<bool> {
        let mut data = [0u8; 1];
        self.read_bytes(&mut data)?;
        Ok(data[0] != 0)
    }

    /// Write a `u8` to the channel.
    #[inline(always)]
    fn write_u8(&mut self, s: u8) -> Result<()> {
        let data = [s];
        self.write_bytes(&data)?;
        Ok(())
    }

    /// Read a `u8` from the channel.
    #[inline(always)]
    fn read_u8(&mut self) -> Result<u8> {
        let mut data = [0];
        self.read_bytes(&mut data)?;
        Ok(data[0])
    }

    /// Write a `u32` to the channel.
    #[inline(always)]
    fn write_u32(&mut self, s: u32) -> Result<()> {
        let data: [u8; 4] = s.to_le_bytes();
        self.write_bytes(&data)?;
        Ok(())
    }

    /// Read a `u32` from the channel.
    #[inline(always)]
    fn read_u32(&mut self) -> Result<u32> {
        let mut data = [0u8; 4];
        self.read_bytes(&mut data)?;
        let s = u32::from_le_bytes(data);
        Ok(s)
    }

    /// Write a `u64` to the channel.
    #[inline(always)]
    fn write_u64(&mut self, s: u64) -> Result<()> {
        let data: [u8; 8] = s.to_le_bytes();
        self.write_bytes(&data)?;
        Ok(())
    }

    /// Read a `u64` from the channel.
    #[inline(always)]
    fn read_u64(&mut self) -> Result<u64> {
        let mut data = [0u8; 8];
        self.read_bytes(&mut data)?;
        let s = u64::from_le_bytes(data);
        Ok(s)
    }

    /// Write a `usize` to the channel.
    #[inline(always)]
    fn write_usize(&mut self, s: usize) -> Result<()> {
        self.write_u64(s as u64)
    }

    /// Read a `usize` from the channel.
    #[inline(always)]
    fn read_usize(&mut self) -> Result<usize> {
        let x = self.read_u64()?;
        usize::try_from(x).map_err(|e| Error::new(ErrorKind::InvalidData, e))
    }

    /// Read a `usize` from the channel, failing with `InvalidData` if it
    /// exceeds `max`.
    #[inline]
    fn read_usize_bounded(&mut self, max: usize) -> Result<usize> {
        let x = self.read_usize()?;
        if x > max {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("length {} exceeds the bound {}", x, max),
            ));
        }
        Ok(x)
    }

    /// Write a length-prefixed byte string to the channel.
    #[inline]
    fn write_bytes_prefixed(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_usize(bytes.len())?;
        self.write_bytes(bytes)
    }

    /// Read a length-prefixed byte string of at most `max` bytes from the channel.
    #[inline]
    fn read_bytes_prefixed(&mut self, max: usize) -> Result<Vec<u8>> {
        let n = self.read_usize_bounded(max)?;
        self.read_vec(n)
    }

    /// Write a `Block` to the channel.
    #[inline(always)]
    fn write_block(&mut self, b: &Block) -> Result<()> {
        self.write_bytes(b.as_ref())?;
        Ok(())
    }

    /// Read a `Block` from the channel.
    #[inline(always)]
    fn read_block(&mut self) -> Result<Block> {
        let mut v = Block::default();
        self.read_bytes(v.as_mut())?;
        Ok(v)
    }

    /// Write a slice of `Block`s to the channel.
    #[inline(always)]
    fn write_blocks(&mut self, bs: &[Block]) -> Result<()> {
        self.write_bytes(bytemuck::cast_slice(bs))
    }

    /// Read `n` `Block`s from the channel.
    #[inline(always)]
    fn read_blocks(&mut self, n: usize) -> Result<Vec<Block>> {
        let mut out = vec![Block::default(); n];
        self.read_bytes(bytemuck::cast_slice_mut(&mut out))?;
        Ok(out)
    }

    /// Write a `Block512` to the channel.
    #[inline(always)]
    fn write_block512(&mut self, b: &Block512) -> Result<()> {
        self.write_bytes(b.as_ref())
    }

    /// Read a `Block512` from the channel.
    #[inline(always)]
    fn read_block512(&mut self) -> Result<Block512> {
        let mut out = Block512::default();
        self.read_bytes(out.as_mut())?;
        Ok(out)
    }

    /// Write a `RistrettoPoint` to the channel.
    #[inline(always)]
    fn write_pt(&mut self, pt: &RistrettoPoint) -> Result<()> {
        self.write_bytes(pt.compress().as_bytes())?;
        Ok(())
    }

    /// Read a `RistrettoPoint` from the channel.
    #[inline(always)]
    fn read_pt(&mut self) -> Result<RistrettoPoint> {
        let mut data = [0u8; 32];
        self.read_bytes(&mut data)?;
        match CompressedRistretto(data).decompress() {
            Some(pt) => Ok(pt),
            None => Err(Error::new(
                ErrorKind::InvalidData,
                "unable to decompress ristretto point",
            )),
        }
    }
}

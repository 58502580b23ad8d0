use crate::element::{reinterpret, truncate, ElemWidth, SignMode};
use crate::{HarnessError, HarnessResult};

/// The buffer handed to a routine under test, together with the sign mode and
/// element width it must honor.
///
/// Elements are tightly packed, little endian, `width` bytes each. The driver
/// builds a fresh frame for every call and lends it out as `&mut`, so the
/// routine cannot hold on to it after returning. Every accessor is bounds
/// checked against the element count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    width: ElemWidth,
    sign: SignMode,
    bytes: Vec<u8>,
}

impl CallFrame {
    /// Packs `values`, truncated to `width`.
    pub fn from_values(values: &[i64], width: ElemWidth, sign: SignMode) -> Self {
        let mut bytes = Vec::with_capacity(values.len() * width.bytes());
        for &v in values {
            let raw = truncate(v, width);
            bytes.extend_from_slice(&raw.to_le_bytes()[..width.bytes()]);
        }
        Self { width, sign, bytes }
    }

    pub fn width(&self) -> ElemWidth {
        self.width
    }

    pub fn sign(&self) -> SignMode {
        self.sign
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.width.bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn check(&self, index: usize) -> HarnessResult<usize> {
        if index < self.len() {
            Ok(index * self.width.bytes())
        } else {
            Err(HarnessError::FrameOutOfBounds {
                index,
                len: self.len(),
            })
        }
    }

    /// Raw bit pattern of element `index`.
    pub fn raw(&self, index: usize) -> HarnessResult<u32> {
        let off = self.check(index)?;
        let mut word = [0u8; 4];
        word[..self.width.bytes()].copy_from_slice(&self.bytes[off..off + self.width.bytes()]);
        Ok(u32::from_le_bytes(word))
    }

    /// Element `index` as a number under the frame's sign mode.
    pub fn value(&self, index: usize) -> HarnessResult<i64> {
        Ok(reinterpret(self.raw(index)?, self.width, self.sign))
    }

    /// Stores the low `width` bytes of `raw` at `index`.
    pub fn set_raw(&mut self, index: usize, raw: u32) -> HarnessResult<()> {
        let off = self.check(index)?;
        let n = self.width.bytes();
        self.bytes[off..off + n].copy_from_slice(&raw.to_le_bytes()[..n]);
        Ok(())
    }

    /// Exchanges two elements in place.
    pub fn exchange(&mut self, a: usize, b: usize) -> HarnessResult<()> {
        let va = self.raw(a)?;
        let vb = self.raw(b)?;
        self.set_raw(a, vb)?;
        self.set_raw(b, va)
    }

    /// All elements as numbers under the frame's sign mode.
    pub fn values(&self) -> Vec<i64> {
        self.bytes
            .chunks_exact(self.width.bytes())
            .map(|chunk| {
                let mut word = [0u8; 4];
                word[..chunk.len()].copy_from_slice(chunk);
                reinterpret(u32::from_le_bytes(word), self.width, self.sign)
            })
            .collect()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte view for routines that work on the packed buffer directly.
    /// The slice length is fixed, so writes cannot grow the frame.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_packs_little_endian() {
        let frame = CallFrame::from_values(&[0x0203, 0x0302], ElemWidth::Half, SignMode::Unsigned);
        assert_eq!(frame.as_bytes(), &[0x03, 0x02, 0x02, 0x03]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.values(), vec![0x0203, 0x0302]);
    }

    #[test]
    fn test_frame_truncates_on_pack() {
        let frame = CallFrame::from_values(&[0x0011_22AA, -1], ElemWidth::Byte, SignMode::Signed);
        assert_eq!(frame.as_bytes(), &[0xAA, 0xFF]);
        assert_eq!(frame.values(), vec![-86, -1]);
    }

    #[test]
    fn test_frame_bounds_checked() {
        let mut frame = CallFrame::from_values(&[1, 2], ElemWidth::Word, SignMode::Unsigned);
        assert!(matches!(
            frame.raw(2),
            Err(HarnessError::FrameOutOfBounds { index: 2, len: 2 })
        ));
        assert!(frame.set_raw(5, 0).is_err());
        assert!(frame.exchange(0, 2).is_err());
        // A failed exchange leaves the buffer untouched.
        assert_eq!(frame.values(), vec![1, 2]);
    }

    #[test]
    fn test_frame_exchange() {
        let mut frame = CallFrame::from_values(&[7, -7, 3], ElemWidth::Half, SignMode::Signed);
        frame.exchange(0, 1).unwrap();
        assert_eq!(frame.values(), vec![-7, 7, 3]);
        assert_eq!(frame.raw(0).unwrap(), 0xFFF9);
    }
}

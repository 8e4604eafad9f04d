//! CPU side of the per-frame uniform buffer used by [`WgpuDevice`](super::WgpuDevice).
//!
//! Every draw snapshots its program's uniform values into the arena, one
//! 256-byte aligned slot per uniform, and keeps the slot offsets as dynamic
//! offsets. The GPU buffer mirrors [`UniformArena::bytes`]; whenever it must be
//! recreated the generation changes so bind groups pointing at the old buffer
//! can be rebuilt.

use super::UniformValue;

/// Dynamic uniform offsets must be multiples of this on every backend.
pub const UNIFORM_ALIGN: usize = 256;

/// Smallest backing buffer; grows by powers of two.
pub const MIN_ARENA_BYTES: u64 = 16 * 1024;

#[derive(Debug, Default)]
pub struct UniformArena {
    bytes: Vec<u8>,
    capacity: u64,
    generation: u64,
}

impl UniformArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` at the next aligned offset and returns that offset.
    pub fn push(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.bytes.len().next_multiple_of(UNIFORM_ALIGN);
        self.bytes.resize(offset, 0);
        self.bytes.extend_from_slice(bytes);
        offset as u32
    }

    /// Pushes one slot per value. Offsets come back in the order of `values`.
    pub fn push_values(&mut self, values: &[UniformValue]) -> Vec<u32> {
        values.iter().map(|v| self.push(v.bytes())).collect()
    }

    /// Bytes the backing buffer needs to hold this frame's data.
    #[inline]
    pub fn required_capacity(&self) -> u64 {
        self.bytes.len().max(UNIFORM_ALIGN) as u64
    }

    /// Grows the recorded capacity if the data no longer fits, or if there is
    /// no backing buffer yet. Returns the new capacity when the buffer must be
    /// (re)created; the generation is bumped in that case.
    pub fn reserve(&mut self, has_buffer: bool) -> Option<u64> {
        let required = self.required_capacity();
        if has_buffer && required <= self.capacity {
            return None;
        }
        self.capacity = required.next_power_of_two().max(MIN_ARENA_BYTES);
        self.generation = self.generation.wrapping_add(1);
        Some(self.capacity)
    }

    /// Drops this frame's data. Capacity and generation are kept.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec4};

    use super::*;

    #[test]
    fn slots_are_256_byte_aligned_in_value_order() {
        let mut arena = UniformArena::new();
        let offsets = arena.push_values(&[
            UniformValue::Mat4(Mat4::IDENTITY),
            UniformValue::Mat4(Mat4::from_scale(glam::Vec3::splat(2.0))),
            UniformValue::Vec4(Vec4::new(1.0, 0.5, 0.25, 1.0)),
        ]);

        assert_eq!(offsets, [0, 256, 512]);
        assert_eq!(arena.bytes().len(), 512 + 16);
        assert_eq!(&arena.bytes()[..64], bytemuck::bytes_of(&Mat4::IDENTITY));
        assert_eq!(
            &arena.bytes()[512..],
            bytemuck::bytes_of(&Vec4::new(1.0, 0.5, 0.25, 1.0))
        );
        // Padding between slots is zeroed.
        assert!(arena.bytes()[64..256].iter().all(|b| *b == 0));
    }

    #[test]
    fn first_reserve_creates_minimum_buffer() {
        let mut arena = UniformArena::new();
        arena.push(&[1; 16]);

        assert_eq!(arena.reserve(false), Some(MIN_ARENA_BYTES));
        assert_eq!(arena.generation(), 1);
        assert_eq!(arena.reserve(true), None);
        assert_eq!(arena.generation(), 1);
    }

    #[test]
    fn growth_past_capacity_bumps_generation() {
        let mut arena = UniformArena::new();
        arena.push(&[0; 16]);
        arena.reserve(false);

        // 65 slots of 256 bytes no longer fit in 16 KiB.
        for _ in 0..64 {
            arena.push(&[0; 16]);
        }
        assert!(arena.required_capacity() > MIN_ARENA_BYTES);

        assert_eq!(arena.reserve(true), Some(2 * MIN_ARENA_BYTES));
        assert_eq!(arena.generation(), 2);
    }

    #[test]
    fn reset_restarts_offsets_and_keeps_buffer() {
        let mut arena = UniformArena::new();
        arena.push_values(&[UniformValue::Mat4(Mat4::IDENTITY); 2]);
        arena.reserve(false);
        arena.reset();

        assert!(arena.is_empty());
        assert_eq!(arena.push(&[0; 16]), 0);
        assert_eq!(arena.reserve(true), None);
        assert_eq!(arena.generation(), 1);
    }
}

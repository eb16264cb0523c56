use std::{mem, ptr, slice};

use kelp_core::{KelpError, KelpResult};

/// Borrowed array passed by the host: pointer plus element count.
#[repr(C)]
#[derive(Debug)]
pub struct Slice<T> {
    pub data: *const T,
    pub len: u64,
}

impl<T> Clone for Slice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Slice<T> {}

impl<T> Slice<T> {
    pub const fn empty() -> Self {
        Self {
            data: ptr::null(),
            len: 0,
        }
    }

    pub fn from_slice(items: &[T]) -> Self {
        Self {
            data: items.as_ptr(),
            len: items.len() as u64,
        }
    }

    /// Reborrows the host array.
    ///
    /// # Safety
    ///
    /// A non-empty slice must point at `len` initialised values of `T` that
    /// stay alive and unmodified for `'a`.
    pub unsafe fn as_slice<'a>(&self) -> KelpResult<&'a [T]> {
        if self.len == 0 {
            return Ok(&[]);
        }
        if self.data.is_null() {
            return Err(KelpError::Null("slice data"));
        }
        if self.data as usize % mem::align_of::<T>() != 0 {
            return Err(KelpError::invalid_input(format!(
                "slice data {:p} is not aligned to {}",
                self.data,
                mem::align_of::<T>()
            )));
        }
        let len = usize::try_from(self.len)
            .ok()
            .filter(|&len| {
                len.checked_mul(mem::size_of::<T>())
                    .is_some_and(|bytes| bytes <= isize::MAX as usize)
            })
            .ok_or_else(|| KelpError::invalid_input(format!("slice length {} is too large", self.len)))?;
        Ok(unsafe { slice::from_raw_parts(self.data, len) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kelp_core::InstanceData;

    #[test]
    fn empty_slice_may_be_null() {
        let s = Slice::<u8>::empty();
        assert!(unsafe { s.as_slice() }.unwrap().is_empty());
    }

    #[test]
    fn null_with_length_is_null() {
        let s = Slice::<u8> {
            data: ptr::null(),
            len: 4,
        };
        assert!(matches!(unsafe { s.as_slice() }, Err(KelpError::Null(_))));
    }

    #[test]
    fn misaligned_data_is_rejected() {
        let s = Slice::<InstanceData> {
            data: 2 as *const InstanceData,
            len: 1,
        };
        assert!(matches!(unsafe { s.as_slice() }, Err(KelpError::InvalidInput(_))));
    }

    #[test]
    fn oversized_length_is_rejected() {
        let s = Slice::<InstanceData> {
            data: ptr::NonNull::dangling().as_ptr(),
            len: u64::MAX / 2,
        };
        assert!(matches!(unsafe { s.as_slice() }, Err(KelpError::InvalidInput(_))));
    }

    #[test]
    fn borrows_rust_data() {
        let bytes = [1u8, 2, 3];
        let s = Slice::from_slice(&bytes);
        assert_eq!(unsafe { s.as_slice() }.unwrap(), &bytes);
    }
}

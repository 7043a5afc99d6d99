//! Host-memory bindings: script-facing typed reads/writes over an attached
//! [`tascore_arch::space::MemorySpace`], plus byte-width dispatch shared
//! with [`crate::bitlib`].

use tascore_arch::space::{Endian, MemorySpace, I24, U24};

use crate::bitlib::Width;
use crate::params::Cursor;
use crate::value::Value;

/// An error reading or writing through the scripting surface.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Param(#[from] crate::params::Error),
    #[error(transparent)]
    Space(#[from] tascore_arch::space::Error),
}

/// Reads `width` bits at `addr` from `space`, honoring its region's declared
/// endianness unless `swapped` requests the opposite.
///
/// # Errors
///
/// Propagates [`tascore_arch::space::Error`] if `addr` isn't covered by any
/// region.
pub fn read(space: &MemorySpace, addr: u64, width: Width, swapped: bool) -> Result<i64, tascore_arch::space::Error> {
    let value = match width {
        Width::W8 => i64::from(if swapped { space.read_swapped::<u8>(addr)? } else { space.read::<u8>(addr)? }),
        Width::W16 => i64::from(if swapped { space.read_swapped::<u16>(addr)? } else { space.read::<u16>(addr)? }),
        Width::W24 => {
            let U24(v) = if swapped { space.read_swapped::<U24>(addr)? } else { space.read::<U24>(addr)? };
            i64::from(v)
        }
        Width::W32 => i64::from(if swapped { space.read_swapped::<u32>(addr)? } else { space.read::<u32>(addr)? }),
        Width::W64 => {
            let v = if swapped { space.read_swapped::<u64>(addr)? } else { space.read::<u64>(addr)? };
            v as i64
        }
    };
    Ok(value)
}

/// Writes the low `width` bits of `value` to `addr` in `space`.
///
/// # Errors
///
/// Propagates [`tascore_arch::space::Error`], including [`tascore_arch::space::Error::Readonly`].
pub fn write(space: &mut MemorySpace, addr: u64, value: i64, width: Width) -> Result<(), tascore_arch::space::Error> {
    match width {
        Width::W8 => space.write(addr, value as u8),
        Width::W16 => space.write(addr, value as u16),
        Width::W24 => space.write(addr, U24(value as u32 & 0x00FF_FFFF)),
        Width::W32 => space.write(addr, value as u32),
        Width::W64 => space.write(addr, value as u64),
    }
}

/// Also available as a signed read: same bit pattern, sign-extended from
/// `width` instead of zero-extended.
///
/// # Errors
///
/// Propagates [`tascore_arch::space::Error`] if `addr` isn't covered.
pub fn read_signed(space: &MemorySpace, addr: u64, width: Width, swapped: bool) -> Result<i64, tascore_arch::space::Error> {
    let unsigned = read(space, addr, width, swapped)?;
    let bits = width.bits();
    if bits >= 64 {
        return Ok(unsigned);
    }
    let sign_bit = 1i64 << (bits - 1);
    Ok(if unsigned & sign_bit != 0 { unsigned - (1i64 << bits) } else { unsigned })
}

fn width_from_arg(n: i64) -> Option<Width> {
    match n {
        8 => Some(Width::W8),
        16 => Some(Width::W16),
        24 => Some(Width::W24),
        32 => Some(Width::W32),
        64 => Some(Width::W64),
        _ => None,
    }
}

/// `memory.read(addr, bits, signed)`, the variable-width binding a script
/// calls directly.
///
/// # Errors
///
/// Returns [`Error::Param`] on a malformed argument list or an unsupported
/// width, or [`Error::Space`] if the address is out of range.
pub fn read_binding(space: &MemorySpace, mut args: Cursor<'_>) -> Result<Value, Error> {
    let addr = args.arg::<i64>()? as u64;
    let bits = args.arg::<i64>()?;
    let signed = args.arg_opt::<bool>(false)?;
    let width = width_from_arg(bits).ok_or_else(|| args.expected("width in {8,16,24,32,64}"))?;
    let value = if signed { read_signed(space, addr, width, false)? } else { read(space, addr, width, false)? };
    Ok(Value::Integer(value))
}

/// `memory.write(addr, bits, value)`.
///
/// # Errors
///
/// Same as [`read_binding`], plus propagating a write error (e.g.
/// read-only region).
pub fn write_binding(space: &mut MemorySpace, mut args: Cursor<'_>) -> Result<Value, Error> {
    let addr = args.arg::<i64>()? as u64;
    let bits = args.arg::<i64>()?;
    let value = args.arg::<i64>()?;
    let width = width_from_arg(bits).ok_or_else(|| args.expected("width in {8,16,24,32,64}"))?;
    write(space, addr, value, width)?;
    Ok(Value::Nil)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tascore_arch::space::Region;
    use tascore_arch::Shared;

    fn fixture() -> MemorySpace {
        let mut space = MemorySpace::new();
        space.add_region(Region::new("ram", 0, 0x10, Endian::Little, false, Shared::new(vec![0u8; 0x10])));
        space
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut space = fixture();
        write(&mut space, 0, -1, Width::W8).unwrap();
        assert_eq!(read(&space, 0, Width::W8, false).unwrap(), 0xFF);
        assert_eq!(read_signed(&space, 0, Width::W8, false).unwrap(), -1);
    }

    #[test]
    fn binding_dispatches_on_width_argument() {
        let mut space = fixture();
        let args = vec![Value::Integer(0), Value::Integer(16), Value::Integer(0x1234)];
        write_binding(&mut space, Cursor::new(&args)).unwrap();

        let args = vec![Value::Integer(0), Value::Integer(16)];
        let result = read_binding(&space, Cursor::new(&args)).unwrap();
        assert_eq!(result, Value::Integer(0x1234));
    }

    #[test]
    fn unsupported_width_is_a_param_error() {
        let space = fixture();
        let args = vec![Value::Integer(0), Value::Integer(12)];
        assert!(matches!(read_binding(&space, Cursor::new(&args)), Err(Error::Param(_))));
    }
}

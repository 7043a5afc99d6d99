//! Typed, positional argument cursor.

use thiserror::Error;

use crate::value::Value;

/// An error extracting a typed argument from a [`Cursor`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("argument {argno}: expected {expected}, got {got}")]
pub struct Error {
    /// 1-based argument position.
    pub argno: usize,
    /// What the caller expected (`"number"`, `"string"`, …).
    pub expected: String,
    /// What was actually found, by [`Value::kind`].
    pub got: &'static str,
}

/// A type that can be pulled out of a single [`Value`].
pub trait FromValue: Sized {
    /// This type's expected-kind name, used in [`Error::expected`].
    const EXPECTED: &'static str;

    /// Converts `value`, or returns `None` on a kind mismatch.
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(*i),
            #[allow(clippy::cast_possible_truncation)]
            Value::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "number";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(*n),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// A 24-bit color plus 8-bit alpha, accepted as a bare ARGB integer,
/// `"#RRGGBB[AA]"`, or (not handled here — caller falls back to its own
/// table) a named color.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Color {
    pub rgb: u32,
    pub alpha: u8,
}

impl FromValue for Color {
    const EXPECTED: &'static str = "color";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(argb) => {
                let argb = *argb as u32;
                Some(Color { rgb: argb & 0x00FF_FFFF, alpha: ((argb >> 24) & 0xFF) as u8 })
            }
            Value::String(s) => {
                let (rgb, alpha) = tascore_media::color::parse_color(s).ok()?;
                Some(Color { rgb, alpha })
            }
            _ => None,
        }
    }
}

/// A positional cursor over a scripted callback's arguments.
///
/// The numeric index auto-advances on every successful [`Self::arg`],
/// [`Self::arg_opt`], [`Self::color`], or [`Self::skip`] call, matching the
/// binding surface's left-to-right parameter order.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    values: &'a [Value],
    index: usize,
}

impl<'a> Cursor<'a> {
    /// Wraps a callback's argument list.
    #[must_use]
    pub fn new(values: &'a [Value]) -> Self {
        Self { values, index: 0 }
    }

    /// The 1-based position of the next argument to be read.
    #[must_use]
    pub fn position(&self) -> usize {
        self.index + 1
    }

    fn peek(&self) -> &Value {
        self.values.get(self.index).unwrap_or(&Value::Nil)
    }

    /// Reads the next argument as `T`, advancing the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if the next value isn't convertible to `T`.
    pub fn arg<T: FromValue>(&mut self) -> Result<T, Error> {
        let value = self.peek();
        let parsed = T::from_value(value).ok_or_else(|| self.expected(T::EXPECTED));
        self.index += 1;
        parsed
    }

    /// Reads the next argument as `T`, or `default` if it's nil/missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if the next value is present but not convertible
    /// to `T`.
    pub fn arg_opt<T: FromValue>(&mut self, default: T) -> Result<T, Error> {
        if self.is_nil() {
            self.index += 1;
            return Ok(default);
        }
        self.arg()
    }

    /// Reads the next argument as a [`Color`], defaulting if nil/missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if the next value is present but not a valid
    /// color.
    pub fn color(&mut self, default: Color) -> Result<Color, Error> {
        self.arg_opt(default)
    }

    /// Advances past the next argument without reading it.
    pub fn skip(&mut self) {
        self.index += 1;
    }

    /// Whether the next argument (without advancing) is convertible to `T`.
    #[must_use]
    pub fn is<T: FromValue>(&self) -> bool {
        T::from_value(self.peek()).is_some()
    }

    /// Whether the next argument is nil or past the end of the list.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self.peek(), Value::Nil)
    }

    /// Whether the next argument is a number or integer.
    #[must_use]
    pub fn is_number(&self) -> bool {
        self.is::<f64>()
    }

    /// Builds an [`Error`] for the current position, without advancing.
    #[must_use]
    pub fn expected(&self, what: &str) -> Error {
        Error {
            argno: self.position(),
            expected: what.to_string(),
            got: self.peek().kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_typed_args_in_order() {
        let values = vec![Value::Integer(7), Value::String("hi".into())];
        let mut cursor = Cursor::new(&values);
        assert_eq!(cursor.arg::<i64>().unwrap(), 7);
        assert_eq!(cursor.arg::<String>().unwrap(), "hi");
    }

    #[test]
    fn mismatched_type_reports_position() {
        let values = vec![Value::Bool(true)];
        let mut cursor = Cursor::new(&values);
        let err = cursor.arg::<i64>().unwrap_err();
        assert_eq!(err.argno, 1);
        assert_eq!(err.got, "boolean");
    }

    #[test]
    fn arg_opt_uses_default_on_missing() {
        let values = vec![];
        let mut cursor = Cursor::new(&values);
        assert_eq!(cursor.arg_opt::<i64>(9).unwrap(), 9);
    }

    #[test]
    fn color_accepts_hex_string() {
        let values = vec![Value::String("#ff0000".into())];
        let mut cursor = Cursor::new(&values);
        let color = cursor.color(Color { rgb: 0, alpha: 0 }).unwrap();
        assert_eq!(color.rgb, 0x00FF_0000);
    }

    #[test]
    fn color_accepts_bare_argb_integer() {
        let values = vec![Value::Integer(0x80FF_0000u32 as i64)];
        let mut cursor = Cursor::new(&values);
        let color = cursor.color(Color { rgb: 0, alpha: 0 }).unwrap();
        assert_eq!(color.rgb, 0x00FF_0000);
        assert_eq!(color.alpha, 0x80);
    }

    #[test]
    fn skip_advances_without_reading() {
        let values = vec![Value::Nil, Value::Integer(5)];
        let mut cursor = Cursor::new(&values);
        cursor.skip();
        assert_eq!(cursor.arg::<i64>().unwrap(), 5);
    }
}

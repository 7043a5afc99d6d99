//! Drawing bindings: script-facing constructors for [`tascore_media::Object`],
//! queued under a caller-chosen tag so a later `kill` call can retract them.

use tascore_media::queue::Object;

use crate::params::{Color, Cursor};

/// A transparent default color (alpha 0xFF under the lsnes convention:
/// opaque is 0, so this is fully see-through), used when a drawing call
/// omits its color argument.
pub const TRANSPARENT: Color = Color { rgb: 0, alpha: 0xFF };

/// An opaque white default.
pub const OPAQUE_WHITE: Color = Color { rgb: 0x00FF_FFFF, alpha: 0x00 };

fn argb(color: Color) -> (u32, u8) {
    (color.rgb, color.alpha)
}

/// `gui.pixel(x, y, color)`.
///
/// # Errors
///
/// Returns an argument error if `x`/`y` aren't integers or `color` isn't a
/// valid color.
pub fn pixel(mut args: Cursor<'_>) -> Result<Object, crate::params::Error> {
    let x = args.arg::<i64>()? as i32;
    let y = args.arg::<i64>()? as i32;
    let color = args.color(OPAQUE_WHITE)?;
    let (rgb, alpha) = argb(color);
    Ok(Object::Pixel { x, y, color: rgb, alpha })
}

/// `gui.box(x, y, width, height, thickness, color)`.
///
/// # Errors
///
/// Returns an argument error on a malformed parameter list.
pub fn draw_box(mut args: Cursor<'_>) -> Result<Object, crate::params::Error> {
    let x = args.arg::<i64>()? as i32;
    let y = args.arg::<i64>()? as i32;
    let width = args.arg::<i64>()? as u32;
    let height = args.arg::<i64>()? as u32;
    let thickness = args.arg_opt::<i64>(1)? as u32;
    let color = args.color(OPAQUE_WHITE)?;
    let (rgb, alpha) = argb(color);
    Ok(Object::Box { x, y, width, height, thickness, color: rgb, alpha })
}

/// `gui.solidrectangle(x, y, width, height, color)`.
///
/// # Errors
///
/// Returns an argument error on a malformed parameter list.
pub fn solid_rectangle(mut args: Cursor<'_>) -> Result<Object, crate::params::Error> {
    let x = args.arg::<i64>()? as i32;
    let y = args.arg::<i64>()? as i32;
    let width = args.arg::<i64>()? as u32;
    let height = args.arg::<i64>()? as u32;
    let color = args.color(OPAQUE_WHITE)?;
    let (rgb, alpha) = argb(color);
    Ok(Object::SolidRectangle { x, y, width, height, color: rgb, alpha })
}

/// `gui.circle(x, y, radius, color)`.
///
/// # Errors
///
/// Returns an argument error on a malformed parameter list.
pub fn circle(mut args: Cursor<'_>) -> Result<Object, crate::params::Error> {
    let x = args.arg::<i64>()? as i32;
    let y = args.arg::<i64>()? as i32;
    let radius = args.arg::<i64>()? as u32;
    let color = args.color(OPAQUE_WHITE)?;
    let (rgb, alpha) = argb(color);
    Ok(Object::Circle { x, y, radius, color: rgb, alpha })
}

/// `gui.crosshair(x, y, color)`.
///
/// # Errors
///
/// Returns an argument error on a malformed parameter list.
pub fn crosshair(mut args: Cursor<'_>) -> Result<Object, crate::params::Error> {
    let x = args.arg::<i64>()? as i32;
    let y = args.arg::<i64>()? as i32;
    let color = args.color(OPAQUE_WHITE)?;
    let (rgb, alpha) = argb(color);
    Ok(Object::Crosshair { x, y, color: rgb, alpha })
}

/// `gui.text(x, y, text, fg, bg)`.
///
/// # Errors
///
/// Returns an argument error on a malformed parameter list.
pub fn text(mut args: Cursor<'_>) -> Result<Object, crate::params::Error> {
    let x = args.arg::<i64>()? as i32;
    let y = args.arg::<i64>()? as i32;
    let text = args.arg::<String>()?;
    let fg = args.color(OPAQUE_WHITE)?;
    let bg = args.color(TRANSPARENT)?;
    Ok(Object::Text {
        x,
        y,
        text,
        fg: fg.rgb,
        bg: bg.rgb,
        alpha: fg.alpha,
        halo: None,
        double_w: false,
        double_h: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn pixel_reads_position_and_defaults_color() {
        let args = vec![Value::Integer(3), Value::Integer(4)];
        let object = pixel(Cursor::new(&args)).unwrap();
        assert!(matches!(object, Object::Pixel { x: 3, y: 4, .. }));
    }

    #[test]
    fn box_reads_explicit_thickness_and_color() {
        let args = vec![
            Value::Integer(0),
            Value::Integer(0),
            Value::Integer(10),
            Value::Integer(10),
            Value::Integer(2),
            Value::String("#FF0000".into()),
        ];
        let object = draw_box(Cursor::new(&args)).unwrap();
        match object {
            Object::Box { thickness, color, .. } => {
                assert_eq!(thickness, 2);
                assert_eq!(color, 0x00FF_0000);
            }
            other => panic!("unexpected object: {other:?}"),
        }
    }

    #[test]
    fn text_reads_string_argument() {
        let args = vec![Value::Integer(0), Value::Integer(0), Value::String("hi".into())];
        let object = text(Cursor::new(&args)).unwrap();
        assert!(matches!(object, Object::Text { ref text, .. } if text == "hi"));
    }

    #[test]
    fn missing_required_argument_errors() {
        let args: Vec<Value> = vec![];
        assert!(pixel(Cursor::new(&args)).is_err());
    }
}

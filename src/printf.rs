//! C-style `printf` formatting over positional [`Arg`] lists.
//!
//! This is the formatter the crate's own tools replay into. It follows the C
//! conversions closely enough that replayed text matches what the same call
//! would have produced immediately:
//!
//! * conversions `d i u o x X c s p f F e E g G %`
//! * flags `-`, `+`, space, `#`, `0`
//! * width and precision, either as digits or `*` (taken from the arguments)
//! * length modifiers (`hh h l ll L j z t q`) are accepted and ignored, since
//!   every [`Arg`] already carries its full value
//!
//! `%n` is not supported and reports [`FormatError::UnknownConversion`].

use std::fmt::{self, Write as _};
use std::io;

use crate::error::FormatError;
use crate::printf_arg::Arg;

/// Formats `format` with `args` into a new string.
///
/// # Examples
///
/// ```
/// use deferred_printf::printf::format;
/// use deferred_printf::Arg;
///
/// let text = format("%-5s|%05.1f|%#x", &[Arg::Str("ab"), Arg::Float(3.14159), Arg::Uint(255)]).unwrap();
/// assert_eq!(text, "ab   |003.1|0xff");
/// ```
pub fn format(format: &str, args: &[Arg<'_>]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(format.len() + 16);
    write_formatted(&mut out, format, args)?;
    Ok(out)
}

/// Formats into `out`, returning the number of bytes written.
pub fn write_formatted<W>(out: &mut W, format: &str, args: &[Arg<'_>]) -> Result<usize, FormatError>
where
    W: fmt::Write + ?Sized,
{
    let mut out = Counted { inner: out, written: 0 };
    let mut args = Args { list: args, next: 0 };
    let bytes = format.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let literal_end = bytes[pos..]
            .iter()
            .position(|&b| b == b'%')
            .map_or(bytes.len(), |off| pos + off);
        out.write_str(&format[pos..literal_end])?;
        pos = literal_end;
        if pos >= bytes.len() {
            break;
        }

        pos += 1;
        let (spec, conversion, next) = parse_spec(bytes, pos, &mut args)?;
        pos = next;
        convert(&mut out, &spec, conversion, &mut args)?;
    }

    Ok(out.written)
}

/// `vsprintf`-shaped callback: appends to `dest` and returns the byte count,
/// or `-1` if formatting failed (in which case `dest` is untouched).
pub fn vsprintf(dest: &mut String, format: &str, args: &[Arg<'_>]) -> i32 {
    match self::format(format, args) {
        Ok(text) => {
            dest.push_str(&text);
            clamp_count(text.len())
        }
        Err(_) => -1,
    }
}

/// `vfprintf`-shaped callback: writes to `dest` and returns the byte count,
/// or `-1` on a formatting or I/O failure.
pub fn vfprintf<W>(dest: &mut W, format: &str, args: &[Arg<'_>]) -> i32
where
    W: io::Write + ?Sized,
{
    let Ok(text) = self::format(format, args) else {
        return -1;
    };
    match dest.write_all(text.as_bytes()) {
        Ok(()) => clamp_count(text.len()),
        Err(_) => -1,
    }
}

fn clamp_count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

struct Counted<'w, W: ?Sized> {
    inner: &'w mut W,
    written: usize,
}

impl<W: fmt::Write + ?Sized> fmt::Write for Counted<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.inner.write_str(s)?;
        self.written += s.len();
        Ok(())
    }
}

struct Args<'l, 'r> {
    list: &'l [Arg<'r>],
    next: usize,
}

impl<'l, 'r> Args<'l, 'r> {
    fn take(&mut self) -> Result<(usize, Arg<'r>), FormatError> {
        let index = self.next;
        let arg = self
            .list
            .get(index)
            .copied()
            .ok_or(FormatError::MissingArgument { index })?;
        self.next += 1;
        Ok((index, arg))
    }

    /// A `*` width or precision.
    fn take_star(&mut self) -> Result<i64, FormatError> {
        match self.take()? {
            (_, Arg::Int(v)) => Ok(v),
            (_, Arg::Uint(v)) => Ok(v as i64),
            (index, other) => Err(FormatError::TypeMismatch {
                index,
                conversion: '*',
                found: other.kind(),
            }),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    alt: bool,
    zero: bool,
    width: usize,
    precision: Option<usize>,
}

fn parse_spec(bytes: &[u8], mut pos: usize, args: &mut Args<'_, '_>) -> Result<(Spec, u8, usize), FormatError> {
    let mut spec = Spec::default();

    if bytes.get(pos) == Some(&b'%') {
        return Ok((spec, b'%', pos + 1));
    }

    while let Some(&flag) = bytes.get(pos) {
        match flag {
            b'-' => spec.left = true,
            b'+' => spec.plus = true,
            b' ' => spec.space = true,
            b'#' => spec.alt = true,
            b'0' => spec.zero = true,
            _ => break,
        }
        pos += 1;
    }

    if bytes.get(pos) == Some(&b'*') {
        pos += 1;
        let width = args.take_star()?;
        if width < 0 {
            spec.left = true;
        }
        spec.width = width.unsigned_abs() as usize;
    } else {
        let (width, next) = parse_number(bytes, pos);
        spec.width = width;
        pos = next;
    }

    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        if bytes.get(pos) == Some(&b'*') {
            pos += 1;
            let precision = args.take_star()?;
            spec.precision = usize::try_from(precision).ok();
        } else {
            let (precision, next) = parse_number(bytes, pos);
            spec.precision = Some(precision);
            pos = next;
        }
    }

    while matches!(bytes.get(pos), Some(b'h' | b'l' | b'L' | b'q' | b'j' | b'z' | b't')) {
        pos += 1;
    }

    match bytes.get(pos) {
        Some(&conversion) => Ok((spec, conversion, pos + 1)),
        None => Err(FormatError::Incomplete),
    }
}

fn parse_number(bytes: &[u8], mut pos: usize) -> (usize, usize) {
    let mut value = 0usize;
    while let Some(digit @ b'0'..=b'9') = bytes.get(pos).copied() {
        value = value.saturating_mul(10).saturating_add((digit - b'0') as usize);
        pos += 1;
    }
    (value, pos)
}

fn convert<W>(out: &mut W, spec: &Spec, conversion: u8, args: &mut Args<'_, '_>) -> Result<(), FormatError>
where
    W: fmt::Write + ?Sized,
{
    let conv = conversion as char;
    let mismatch = |index: usize, arg: Arg<'_>| FormatError::TypeMismatch {
        index,
        conversion: conv,
        found: arg.kind(),
    };

    match conversion {
        b'%' => out.write_char('%')?,
        b'd' | b'i' => {
            let value = match args.take()? {
                (_, Arg::Int(v)) => v as i128,
                (_, Arg::Uint(v)) => v as i64 as i128,
                (_, Arg::Char(c)) => c as i128,
                (index, other) => return Err(mismatch(index, other)),
            };
            let sign = if value < 0 {
                "-"
            } else if spec.plus {
                "+"
            } else if spec.space {
                " "
            } else {
                ""
            };
            let digits = with_precision(value.unsigned_abs().to_string(), value == 0, spec);
            pad_number(out, spec, sign, "", &digits, spec.precision.is_none())?;
        }
        b'u' | b'o' | b'x' | b'X' => {
            let value = match args.take()? {
                (_, Arg::Uint(v)) => v,
                (_, Arg::Int(v)) => v as u64,
                (_, Arg::Char(c)) => c as u64,
                (index, other) => return Err(mismatch(index, other)),
            };
            let raw = match conversion {
                b'u' => value.to_string(),
                b'o' => format!("{value:o}"),
                b'x' => format!("{value:x}"),
                _ => format!("{value:X}"),
            };
            let mut digits = with_precision(raw, value == 0, spec);
            let mut prefix = "";
            if spec.alt {
                match conversion {
                    b'o' if !digits.starts_with('0') => digits.insert(0, '0'),
                    b'x' if value != 0 => prefix = "0x",
                    b'X' if value != 0 => prefix = "0X",
                    _ => {}
                }
            }
            pad_number(out, spec, "", prefix, &digits, spec.precision.is_none())?;
        }
        b'c' => {
            let c = match args.take()? {
                (_, Arg::Char(c)) => c,
                (_, Arg::Int(v)) => char::from_u32(v as u32).unwrap_or(char::REPLACEMENT_CHARACTER),
                (_, Arg::Uint(v)) => char::from_u32(v as u32).unwrap_or(char::REPLACEMENT_CHARACTER),
                (index, other) => return Err(mismatch(index, other)),
            };
            let mut buf = [0u8; 4];
            pad_text(out, spec, c.encode_utf8(&mut buf))?;
        }
        b's' => {
            let s = match args.take()? {
                (_, Arg::Str(s)) => s,
                (index, other) => return Err(mismatch(index, other)),
            };
            let s = match spec.precision {
                Some(limit) => s.char_indices().nth(limit).map_or(s, |(end, _)| &s[..end]),
                None => s,
            };
            pad_text(out, spec, s)?;
        }
        b'p' => {
            let addr = match args.take()? {
                (_, Arg::Ptr(addr)) => addr,
                (index, other) => return Err(mismatch(index, other)),
            };
            let text = if addr == 0 {
                "(nil)".to_string()
            } else {
                format!("0x{addr:x}")
            };
            pad_text(out, spec, &text)?;
        }
        b'f' | b'F' | b'e' | b'E' | b'g' | b'G' => {
            let value = match args.take()? {
                (_, Arg::Float(v)) => v,
                (index, other) => return Err(mismatch(index, other)),
            };
            let sign = if value.is_sign_negative() && !value.is_nan() {
                "-"
            } else if spec.plus {
                "+"
            } else if spec.space {
                " "
            } else {
                ""
            };
            let body = float_body(value.abs(), conversion, spec);
            pad_number(out, spec, sign, "", &body, value.is_finite())?;
        }
        other => return Err(FormatError::UnknownConversion(other as char)),
    }
    Ok(())
}

/// Applies an integer precision: minimum digit count, and `%.0d` of zero
/// prints nothing.
fn with_precision(digits: String, is_zero: bool, spec: &Spec) -> String {
    match spec.precision {
        Some(0) if is_zero => String::new(),
        Some(min) if digits.len() < min => {
            let mut padded = "0".repeat(min - digits.len());
            padded.push_str(&digits);
            padded
        }
        _ => digits,
    }
}

fn float_body(value: f64, conversion: u8, spec: &Spec) -> String {
    let upper = conversion.is_ascii_uppercase();
    if !value.is_finite() {
        let text = if value.is_nan() { "nan" } else { "inf" };
        return if upper { text.to_ascii_uppercase() } else { text.to_string() };
    }

    let precision = spec.precision.unwrap_or(6);
    match conversion.to_ascii_lowercase() {
        b'f' => {
            let mut body = format!("{value:.precision$}");
            if spec.alt && precision == 0 {
                body.push('.');
            }
            body
        }
        b'e' => exponent_form(value, precision, upper, spec.alt),
        _ => general_form(value, precision, upper, spec.alt),
    }
}

/// `%e`: `d.ddde±XX` with at least two exponent digits.
fn exponent_form(value: f64, precision: usize, upper: bool, alt: bool) -> String {
    let rust = format!("{value:.precision$e}");
    let (mantissa, exponent) = rust.split_once('e').unwrap_or((rust.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let mut body = String::with_capacity(mantissa.len() + 5);
    body.push_str(mantissa);
    if alt && precision == 0 {
        body.push('.');
    }
    body.push(if upper { 'E' } else { 'e' });
    body.push(if exponent < 0 { '-' } else { '+' });
    let _ = write!(body, "{:02}", exponent.unsigned_abs());
    body
}

/// `%g`: `%e` or `%f` depending on the decimal exponent, trailing zeros
/// removed unless `#` is set.
fn general_form(value: f64, precision: usize, upper: bool, alt: bool) -> String {
    let precision = precision.max(1);
    let exponent = if value == 0.0 {
        0
    } else {
        let rounded = format!("{:.*e}", precision - 1, value);
        rounded
            .split_once('e')
            .and_then(|(_, exp)| exp.parse::<i64>().ok())
            .unwrap_or(0)
    };

    let body = if exponent >= -4 && exponent < precision as i64 {
        let decimals = (precision as i64 - 1 - exponent) as usize;
        format!("{value:.decimals$}")
    } else {
        exponent_form(value, precision - 1, upper, false)
    };

    let exp_start = body.find(['e', 'E']).unwrap_or(body.len());
    let (mantissa, tail) = body.split_at(exp_start);
    let mut mantissa = mantissa.to_string();
    if alt {
        if !mantissa.contains('.') {
            mantissa.push('.');
        }
    } else if mantissa.contains('.') {
        let trimmed = mantissa.trim_end_matches('0').trim_end_matches('.').len();
        mantissa.truncate(trimmed);
    }
    mantissa.push_str(tail);
    mantissa
}

fn pad_number<W>(out: &mut W, spec: &Spec, sign: &str, prefix: &str, body: &str, zero_ok: bool) -> Result<(), FormatError>
where
    W: fmt::Write + ?Sized,
{
    let len = sign.len() + prefix.len() + body.len();
    let fill = spec.width.saturating_sub(len);
    if spec.left {
        out.write_str(sign)?;
        out.write_str(prefix)?;
        out.write_str(body)?;
        write_repeated(out, ' ', fill)?;
    } else if spec.zero && zero_ok {
        out.write_str(sign)?;
        out.write_str(prefix)?;
        write_repeated(out, '0', fill)?;
        out.write_str(body)?;
    } else {
        write_repeated(out, ' ', fill)?;
        out.write_str(sign)?;
        out.write_str(prefix)?;
        out.write_str(body)?;
    }
    Ok(())
}

fn pad_text<W>(out: &mut W, spec: &Spec, text: &str) -> Result<(), FormatError>
where
    W: fmt::Write + ?Sized,
{
    let fill = spec.width.saturating_sub(text.chars().count());
    if spec.left {
        out.write_str(text)?;
        write_repeated(out, ' ', fill)?;
    } else {
        write_repeated(out, ' ', fill)?;
        out.write_str(text)?;
    }
    Ok(())
}

fn write_repeated<W>(out: &mut W, c: char, count: usize) -> fmt::Result
where
    W: fmt::Write + ?Sized,
{
    for _ in 0..count {
        out.write_char(c)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(format: &str, args: &[Arg<'_>]) -> String {
        super::format(format, args).unwrap()
    }

    #[test]
    fn test_integers() {
        assert_eq!(fmt("Hello %d %d", &[Arg::Int(1), Arg::Int(2)]), "Hello 1 2");
        assert_eq!(fmt("%5d|%-5d|%05d", &[Arg::Int(42), Arg::Int(42), Arg::Int(-42)]), "   42|42   |-0042");
        assert_eq!(fmt("%+d % d", &[Arg::Int(7), Arg::Int(7)]), "+7  7");
        assert_eq!(fmt("%.3d|%.0d|", &[Arg::Int(5), Arg::Int(0)]), "005||");
        assert_eq!(fmt("%ld %lld %hhd", &[Arg::Int(1), Arg::Int(2), Arg::Int(3)]), "1 2 3");
        assert_eq!(fmt("%d", &[Arg::Int(i64::MIN)]), "-9223372036854775808");
    }

    #[test]
    fn test_unsigned_radixes() {
        assert_eq!(fmt("%u %o %x %X", &[Arg::Uint(255), Arg::Uint(8), Arg::Uint(255), Arg::Uint(255)]), "255 10 ff FF");
        assert_eq!(fmt("%#o %#x %#X %#x", &[Arg::Uint(8), Arg::Uint(255), Arg::Uint(255), Arg::Uint(0)]), "010 0xff 0XFF 0");
        assert_eq!(fmt("%08x", &[Arg::Uint(0xbeef)]), "0000beef");
        assert_eq!(fmt("%#010x", &[Arg::Uint(0xbeef)]), "0x0000beef");
    }

    #[test]
    fn test_chars_and_strings() {
        assert_eq!(fmt("[%c%c]", &[Arg::Char('o'), Arg::Int(107)]), "[ok]");
        assert_eq!(fmt("Test %s", &[Arg::Str("string")]), "Test string");
        assert_eq!(fmt("[%6s][%-6s][%.2s]", &[Arg::Str("ab"), Arg::Str("ab"), Arg::Str("abcdef")]), "[    ab][ab    ][ab]");
        assert_eq!(fmt("%.1s", &[Arg::Str("über")]), "ü");
    }

    #[test]
    fn test_star_width_and_precision() {
        assert_eq!(fmt("[%*d]", &[Arg::Int(4), Arg::Int(7)]), "[   7]");
        assert_eq!(fmt("[%*d]", &[Arg::Int(-4), Arg::Int(7)]), "[7   ]");
        assert_eq!(fmt("[%.*f]", &[Arg::Int(2), Arg::Float(1.005)]), "[1.00]");
    }

    #[test]
    fn test_floats() {
        assert_eq!(fmt("%f", &[Arg::Float(3.5)]), "3.500000");
        assert_eq!(fmt("%.2f", &[Arg::Float(-0.1256)]), "-0.13");
        assert_eq!(fmt("%8.3f|%-8.1f|", &[Arg::Float(3.14159), Arg::Float(2.0)]), "   3.142|2.0     |");
        assert_eq!(fmt("%#.0f", &[Arg::Float(2.0)]), "2.");
        assert_eq!(fmt("%e", &[Arg::Float(1234.5)]), "1.234500e+03");
        assert_eq!(fmt("%.2E", &[Arg::Float(0.000123)]), "1.23E-04");
        assert_eq!(fmt("%e", &[Arg::Float(0.0)]), "0.000000e+00");
    }

    #[test]
    fn test_general_float() {
        assert_eq!(fmt("%g", &[Arg::Float(100000.0)]), "100000");
        assert_eq!(fmt("%g", &[Arg::Float(1000000.0)]), "1e+06");
        assert_eq!(fmt("%g", &[Arg::Float(0.0001)]), "0.0001");
        assert_eq!(fmt("%g", &[Arg::Float(0.00001)]), "1e-05");
        assert_eq!(fmt("%g", &[Arg::Float(3.14159)]), "3.14159");
        assert_eq!(fmt("%.3g", &[Arg::Float(2.5)]), "2.5");
        assert_eq!(fmt("%#.3g", &[Arg::Float(2.5)]), "2.50");
        assert_eq!(fmt("%G", &[Arg::Float(1.5e-10)]), "1.5E-10");
        assert_eq!(fmt("%g", &[Arg::Float(0.0)]), "0");
    }

    #[test]
    fn test_non_finite_floats() {
        assert_eq!(fmt("%f %F", &[Arg::Float(f64::INFINITY), Arg::Float(f64::NEG_INFINITY)]), "inf -INF");
        assert_eq!(fmt("%05f", &[Arg::Float(f64::NAN)]), "  nan");
    }

    #[test]
    fn test_pointers() {
        assert_eq!(fmt("%p", &[Arg::Ptr(0x1000)]), "0x1000");
        assert_eq!(fmt("%p", &[Arg::Ptr(0)]), "(nil)");
    }

    #[test]
    fn test_percent_literal() {
        assert_eq!(fmt("100%% done", &[]), "100% done");
    }

    #[test]
    fn test_errors() {
        assert_eq!(super::format("%d %d", &[Arg::Int(1)]), Err(FormatError::MissingArgument { index: 1 }));
        assert_eq!(
            super::format("%s", &[Arg::Int(1)]),
            Err(FormatError::TypeMismatch { index: 0, conversion: 's', found: "a signed integer" })
        );
        assert_eq!(super::format("%n", &[Arg::Int(1)]), Err(FormatError::UnknownConversion('n')));
        assert_eq!(super::format("trailing %-", &[]), Err(FormatError::Incomplete));
    }

    #[test]
    fn test_counts_bytes_written() {
        let mut out = String::from(">");
        assert_eq!(write_formatted(&mut out, "%s!", &[Arg::Str("héllo")]), Ok(7));
        assert_eq!(out, ">héllo!");
    }

    #[test]
    fn test_vsprintf_leaves_dest_untouched_on_failure() {
        let mut out = String::from("keep");
        assert_eq!(vsprintf(&mut out, "%d", &[]), -1);
        assert_eq!(out, "keep");
        assert_eq!(vsprintf(&mut out, " %d", &[Arg::Int(5)]), 2);
        assert_eq!(out, "keep 5");
    }

    #[test]
    fn test_vfprintf_writes_bytes() {
        let mut sink: Vec<u8> = Vec::new();
        assert_eq!(vfprintf(&mut sink, "%s=%u\n", &[Arg::Str("k"), Arg::Uint(9)]), 4);
        assert_eq!(sink, b"k=9\n");
    }
}

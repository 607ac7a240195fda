//! Encapsulated PostScript writer for rendered pixmaps.
//!
//! Output is a single-page EPSF-3.0 document holding one `image` operator
//! with DeviceRGB samples, Flate-compressed and ASCII85-encoded
//! (LanguageLevel 3). PostScript has no alpha, so pixels are composited over
//! white one row at a time while encoding. One pixel maps to one point.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::{self, Write};

/// Characters per ASCII85 data line (PostScript DSC keeps lines under 255 chars).
const LINE_WIDTH: usize = 75;

/// Write premultiplied RGBA8 `pixels` (row-major, `width × height`) as EPS.
pub fn write_eps<W: Write>(width: u32, height: u32, pixels: &[u8], out: &mut W) -> io::Result<()> {
    let row_len = width as usize * 4;
    if width == 0 || height == 0 || pixels.len() != row_len * height as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("pixel buffer does not match {width}x{height}"),
        ));
    }
    let (w, h) = (width, height);

    writeln!(out, "%!PS-Adobe-3.0 EPSF-3.0")?;
    writeln!(out, "%%Creator: {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "%%BoundingBox: 0 0 {w} {h}")?;
    writeln!(out, "%%HiResBoundingBox: 0 0 {w} {h}")?;
    writeln!(out, "%%LanguageLevel: 3")?;
    writeln!(out, "%%Pages: 1")?;
    writeln!(out, "%%EndComments")?;
    writeln!(out, "%%Page: 1 1")?;
    writeln!(out, "gsave")?;
    writeln!(out, "{w} {h} scale")?;
    writeln!(out, "/DeviceRGB setcolorspace")?;
    writeln!(out, "<<")?;
    writeln!(out, "  /ImageType 1")?;
    writeln!(out, "  /Width {w}")?;
    writeln!(out, "  /Height {h}")?;
    writeln!(out, "  /BitsPerComponent 8")?;
    writeln!(out, "  /Decode [0 1 0 1 0 1]")?;
    writeln!(out, "  /ImageMatrix [{w} 0 0 -{h} 0 {h}]")?;
    writeln!(out, "  /DataSource currentfile /ASCII85Decode filter /FlateDecode filter")?;
    writeln!(out, ">> image")?;

    let mut encoder = ZlibEncoder::new(Ascii85::new(&mut *out), Compression::default());
    let mut row = Vec::with_capacity(width as usize * 3);
    for src in pixels.chunks_exact(row_len) {
        row.clear();
        row.extend(src.chunks_exact(4).flat_map(over_white));
        encoder.write_all(&row)?;
    }
    encoder.finish()?.finish()?;

    writeln!(out, "grestore")?;
    writeln!(out, "showpage")?;
    writeln!(out, "%%Trailer")?;
    writeln!(out, "%%EOF")?;
    Ok(())
}

/// Premultiplied RGBA over opaque white: `out = c + (255 − a)`.
fn over_white(px: &[u8]) -> [u8; 3] {
    let bg = 255 - px[3];
    [
        px[0].saturating_add(bg),
        px[1].saturating_add(bg),
        px[2].saturating_add(bg),
    ]
}

/// ASCII85 encoder with line wrapping, terminated by `~>` on `finish`.
struct Ascii85<W: Write> {
    inner: W,
    group: [u8; 4],
    filled: usize,
    line: Vec<u8>,
}

impl<W: Write> Ascii85<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            group: [0; 4],
            filled: 0,
            line: Vec::with_capacity(LINE_WIDTH + 2),
        }
    }

    fn encode_group(&mut self) -> io::Result<()> {
        let value = u32::from_be_bytes(self.group);
        if self.filled == 4 && value == 0 {
            self.emit(b"z")?;
        } else {
            let mut digits = [0u8; 5];
            let mut v = value;
            for d in digits.iter_mut().rev() {
                *d = b'!' + (v % 85) as u8;
                v /= 85;
            }
            // a partial group of n bytes keeps n + 1 digits
            let keep = self.filled + 1;
            self.emit(&digits[..keep])?;
        }
        self.group = [0; 4];
        self.filled = 0;
        Ok(())
    }

    fn emit(&mut self, chars: &[u8]) -> io::Result<()> {
        for &c in chars {
            // DSC readers treat lines starting with '%' as comments
            if self.line.is_empty() && c == b'%' {
                self.line.push(b' ');
            }
            self.line.push(c);
            if self.line.len() >= LINE_WIDTH {
                self.line.push(b'\n');
                self.inner.write_all(&self.line)?;
                self.line.clear();
            }
        }
        Ok(())
    }

    fn finish(mut self) -> io::Result<W> {
        if self.filled > 0 {
            self.encode_group()?;
        }
        self.line.extend_from_slice(b"~>\n");
        self.inner.write_all(&self.line)?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for Ascii85<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &b in buf {
            self.group[self.filled] = b;
            self.filled += 1;
            if self.filled == 4 {
                self.encode_group()?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

//! Result lines written to the report stream.

use std::io::{self, Write};

use serde::Serialize;

use crate::device::Cipher;
use crate::sampler::Sample;
use crate::units::ScaledResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per completed chunk size.
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeResult {
    pub cipher: Cipher,
    pub chunk_size: usize,
    #[serde(flatten)]
    pub sample: Sample,
    pub scaled: ScaledResult,
}

pub fn progress_prefix(chunk_size: usize) -> String {
    format!("\tEncrypting in chunks of {} bytes: ", chunk_size)
}

pub fn completion(sample: &Sample, scaled: &ScaledResult) -> String {
    format!(
        "done. {:.2} {} in {:.2} secs: {:.2} {}/sec",
        scaled.value,
        scaled.unit,
        sample.elapsed_secs(),
        scaled.rate,
        scaled.unit
    )
}

/// Writes the part of a line known before sampling starts. Text only.
pub(crate) fn begin<W: Write>(
    out: &mut W,
    format: OutputFormat,
    chunk_size: usize,
) -> io::Result<()> {
    if format == OutputFormat::Text {
        out.write_all(progress_prefix(chunk_size).as_bytes())?;
        out.flush()?;
    }
    Ok(())
}

pub(crate) fn finish<W: Write>(
    out: &mut W,
    format: OutputFormat,
    result: &SizeResult,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", completion(&result.sample, &result.scaled))?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, result).map_err(io::Error::from)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()
}

pub(crate) fn abort<W: Write>(out: &mut W, format: OutputFormat) -> io::Result<()> {
    if format == OutputFormat::Text {
        writeln!(out, "failed.")?;
        out.flush()?;
    }
    Ok(())
}

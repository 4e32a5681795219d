// SPDX-FileCopyrightText: 2024 Google LLC
//
// SPDX-License-Identifier: Apache-2.0

use ufmt::{uWrite, uwrite};

use crate::stream::SampleBatch;

/// How a single sample is rendered on the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    /// `Data from AXI4-Stream (Sample <index>): <value>`, followed by a blank line.
    Labelled,
    /// Just the value.
    Bare,
}

/// Write every sample of `batch` to `w`, one line each, in index order.
pub fn print_batch<W, const N: usize>(
    w: &mut W,
    batch: &SampleBatch<N>,
    format: LineFormat,
) -> Result<(), W::Error>
where
    W: uWrite + ?Sized,
{
    for (index, sample) in batch.iter().enumerate() {
        match format {
            LineFormat::Labelled => uwrite!(
                w,
                "Data from AXI4-Stream (Sample {}): {}\n\r\n\r",
                index,
                *sample
            )?,
            LineFormat::Bare => uwrite!(w, "{}\n\r", *sample)?,
        }
    }
    Ok(())
}

//! CLI string parsing utilities

use anyhow::{Context, Result};

/// Parse a target size string (e.g., "128x128", "64X32") to (width, height)
pub fn parse_dimensions(s: &str) -> Result<(u32, u32)> {
    let s = s.trim().to_lowercase();

    let (w, h) = s
        .split_once('x')
        .with_context(|| format!("Invalid size format: {} (expected WIDTHxHEIGHT)", s))?;

    let width: u32 = w.trim().parse()
        .with_context(|| format!("Invalid width: {}", w))?;
    let height: u32 = h.trim().parse()
        .with_context(|| format!("Invalid height: {}", h))?;

    Ok((width, height))
}

/// Parse a comma-separated worker list (e.g., "1,2,4,8")
pub fn parse_worker_list(s: &str) -> Result<Vec<usize>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .with_context(|| format!("Invalid worker count: {}", part))
        })
        .collect()
}

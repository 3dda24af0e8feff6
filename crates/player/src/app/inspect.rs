use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use harness::{read_trace_archive, TraceArchive, TraceError};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum InspectError {
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}

/// Prints a summary of a recorded trace: shape, reward and how often each
/// action was taken.
pub(crate) fn run(path: &Path, out: &mut impl Write) -> Result<(), InspectError> {
    let archive = read_trace_archive(path)?;
    writeln!(out, "file={}", path.display())?;
    writeln!(out, "format_version={}", archive.format_version)?;
    writeln!(out, "rows={}", archive.rows)?;
    writeln!(out, "cols={}", archive.cols)?;
    writeln!(out, "observation_width={}", archive.observation_width())?;
    writeln!(out, "episode_reward={}", archive.episode_reward)?;
    let (counts, other) = action_histogram(&archive);
    for (action, count) in counts {
        writeln!(out, "action[{action}]={count}")?;
    }
    if other > 0 {
        writeln!(out, "action[other]={other}")?;
    }
    Ok(())
}

/// Counts per action index, ascending. Action cells that do not hold a
/// whole non-negative index are counted under `other`.
fn action_histogram(archive: &TraceArchive) -> (BTreeMap<u64, usize>, usize) {
    let action_col = archive.observation_width();
    let mut counts = BTreeMap::new();
    let mut other = 0usize;
    for row in (0..archive.rows).filter_map(|index| archive.row(index)) {
        let Some(&value) = row.get(action_col) else {
            continue;
        };
        match action_index(value) {
            Some(action) => *counts.entry(action).or_insert(0) += 1,
            None => other += 1,
        }
    }
    (counts, other)
}

fn action_index(value: f32) -> Option<u64> {
    let exact = value.is_finite() && value >= 0.0 && value.fract() == 0.0;
    (exact && value <= u32::MAX as f32).then(|| value as u64)
}

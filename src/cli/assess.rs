//! Classify and assess commands

use super::input::{collect, emit, finish, read_snapshots};
use super::{OutputArgs, Session};
use crate::reporters;
use anyhow::Result;
use repolens::AssessOptions;
use std::path::Path;

/// Assess every snapshot in `input`; no health report when `rule_set` is `None`
pub(crate) fn run(
    session: &Session,
    input: &Path,
    rule_set: Option<String>,
    theme: Option<String>,
    out: &OutputArgs,
) -> Result<()> {
    let format = session.format(out.format.as_deref())?;
    let snapshots = read_snapshots(input)?;
    let options = AssessOptions {
        rule_set,
        theme: session.theme(theme),
        ..AssessOptions::default()
    };

    let results = session
        .engine
        .assess_batch(&snapshots.items, &options, session.workers);
    let total = results.len();
    let (assessments, failed) = collect(results, snapshots.single)?;

    let text = reporters::assessments(&assessments, snapshots.single, format)?;
    emit(&text, out.output.as_deref())?;
    finish(failed, total)
}

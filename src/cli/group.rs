//! Group command

use super::input::{collect, emit, finish, read_snapshots};
use super::{OutputArgs, Session};
use crate::reporters;
use anyhow::Result;
use repolens::grouping::GroupMember;
use repolens::AssessOptions;
use std::path::Path;

pub(crate) fn run(session: &Session, input: &Path, theme: Option<String>, out: &OutputArgs) -> Result<()> {
    let format = session.format(out.format.as_deref())?;
    let theme = session.theme(theme);
    let snapshots = read_snapshots(input)?;
    let options = AssessOptions {
        rule_set: None,
        theme: theme.clone(),
        ..AssessOptions::default()
    };

    let results = session
        .engine
        .assess_batch(&snapshots.items, &options, session.workers);
    let total = results.len();
    // Pair each result with its snapshot's star count before failures are dropped
    let members = results
        .into_iter()
        .zip(&snapshots.items)
        .map(|(result, raw)| {
            result.map(|a| GroupMember {
                identifier: a.identifier,
                category: a.classification.category,
                stars: raw.stargazers_count,
            })
        })
        .collect();
    let (members, failed) = collect(members, snapshots.single)?;

    let groups = session.engine.group(&members, &theme);
    let text = reporters::groups(&groups, &session.engine.theme(&theme).name, format)?;
    emit(&text, out.output.as_deref())?;
    finish(failed, total)
}

//! Health command

use super::input::{collect, emit, finish, read_snapshots};
use super::{OutputArgs, Session};
use crate::reporters;
use anyhow::Result;
use repolens::health::{EvalContext, HealthReport};
use repolens::EngineResult;
use std::path::Path;
use tracing::info;

pub(crate) fn run(
    session: &Session,
    input: &Path,
    rules: Option<String>,
    min_score: Option<f64>,
    only_failed: bool,
    out: &OutputArgs,
) -> Result<()> {
    let format = session.format(out.format.as_deref())?;
    let rule_set = session.rule_set(rules);
    let min_score = session.min_score(min_score);
    let snapshots = read_snapshots(input)?;

    // Fail on an unknown rule set before touching any snapshot
    session.engine.health().registry().get(&rule_set)?;

    let ctx = EvalContext::default();
    let results: Vec<EngineResult<HealthReport>> = snapshots
        .items
        .iter()
        .map(|raw| {
            let signals = session.engine.extract(raw)?;
            session.engine.evaluate_with(&signals, &rule_set, &ctx)
        })
        .collect();
    let total = results.len();
    let (reports, failed) = collect(results, snapshots.single)?;
    info!("Scored {} repositories against '{}'", reports.len(), rule_set);

    let portfolio = (reports.len() > 1).then(|| session.engine.portfolio(&reports, min_score));
    let shown: Vec<HealthReport> = if only_failed {
        reports.into_iter().filter(|r| r.score < min_score).collect()
    } else {
        reports
    };

    let text = reporters::health(&shown, portfolio.as_ref(), snapshots.single, format)?;
    emit(&text, out.output.as_deref())?;
    finish(failed, total)
}

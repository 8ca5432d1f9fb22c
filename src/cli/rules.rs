//! Rules command - list registered rule sets

use super::Session;
use crate::reporters;
use anyhow::Result;

pub(crate) fn run(session: &Session, format: Option<&str>) -> Result<()> {
    let format = session.format(format)?;
    let text = reporters::rule_sets(session.engine.health().registry(), format)?;
    println!("{}", text);
    Ok(())
}

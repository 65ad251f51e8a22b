//! Check command handler

use super::ensure_exists;
use crate::cli::CheckArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use tracing::{info, instrument};
use treeform_core::{source, FunctionRegistry, Specification};

/// Handle the check command
///
/// Compiles the specification and lists every static problem. Succeeds only
/// when there are none.
#[instrument(skip(config, output), fields(spec = %args.spec.display()))]
pub async fn handle_check(args: CheckArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("check_command", &format!("spec: {}", args.spec.display()));
    output.info(&format!("Checking specification: {}", args.spec.display()))?;

    ensure_exists(&args.spec)?;
    let options = config.engine.map_options(args.max_depth);
    options.validate()?;

    let value = source::load_value(&args.spec)?;
    let specification = Specification::compile_with_limit(&value, options.max_depth)?;
    let issues = specification.check(&FunctionRegistry::builtin());
    info!(
        depth = specification.depth(),
        calls = specification.call_sites().len(),
        issues = issues.len(),
        "Specification checked"
    );

    output.info(&format!(
        "Depth {} (deepest at {}), {} function call(s)",
        specification.depth(),
        specification.deepest_path(),
        specification.call_sites().len()
    ))?;
    output.section("Issues")?;
    output.issues(&issues)?;

    if issues.is_empty() {
        output.success("✓ Specification is valid")?;
        Ok(())
    } else {
        Err(Error::SpecIssues {
            count: issues.len(),
        })
    }
}

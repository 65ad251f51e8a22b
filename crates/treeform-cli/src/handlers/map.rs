//! Map command handler

use super::{ensure_exists, read_input, save_to_file};
use crate::cli::{MapArgs, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use treeform_core::{
    source, DegradationReport, FieldPath, Format, Mapper, MappingOutcome, Specification, Value,
};

/// Handle the map command
#[instrument(skip(config, output), fields(spec = %args.spec.display()))]
pub async fn handle_map(args: MapArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("map_command", &format!("spec: {}", args.spec.display()));
    info!("Starting map command execution");

    ensure_exists(&args.spec)?;
    let options = config.engine.map_options(args.max_depth);
    options.validate()?;
    let mapper = Mapper::new().with_options(options);

    let spinner = output.spinner("Compiling specification...");
    let specification = mapper.compile(&source::load_value(&args.spec)?)?;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    debug!(
        depth = specification.depth(),
        issues = specification.issues().len(),
        "Specification compiled"
    );
    if !specification.issues().is_empty() {
        output.warning(&format!(
            "⚠ Specification has {} issue(s); run `treeform check {}` for details",
            specification.issues().len(),
            args.spec.display()
        ))?;
    }

    let text = read_input(args.input.as_deref())?;
    let format = args
        .input_format
        .map(Format::from)
        .or_else(|| args.input.as_deref().map(Format::from_path))
        .unwrap_or_default();
    let documents = if args.batch {
        source::parse_documents(&text, format)?
    } else {
        vec![source::parse_value(&text, format)?]
    };
    let anchor = config.engine.anchor(args.on.as_deref());
    info!(documents = documents.len(), anchor = ?anchor, "Mapping input");

    let outcomes = map_documents(
        Arc::new(mapper),
        Arc::new(specification),
        documents,
        anchor,
        args.report,
        mapping_concurrency(),
        output,
    )
    .await?;

    let mapped = if args.batch {
        Value::Sequence(outcomes.iter().map(|o| o.output.clone()).collect())
    } else {
        outcomes
            .first()
            .map(|o| o.output.clone())
            .unwrap_or_else(Value::null)
    };

    info!(
        documents = outcomes.len(),
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "Documents mapped"
    );

    if let Some(path) = &args.save_to {
        save_to_file(&mapped, path)?;
        output.success(&format!("✓ Output saved to {}", path.display()))?;
    }

    if !args.report {
        if args.save_to.is_none() {
            output.section("Output")?;
            output.data(&mapped)?;
        }
        return Ok(());
    }

    if output.format() == OutputFormat::Human {
        if args.save_to.is_none() {
            output.section("Output")?;
            output.data(&mapped)?;
        }
        for (index, outcome) in outcomes.iter().enumerate() {
            if args.batch {
                output.section(&format!("Degradation Report (document {})", index))?;
            } else {
                output.section("Degradation Report")?;
            }
            output.report(&outcome.report)?;
        }
    } else if args.batch {
        output.data(&outcomes)?;
    } else if let Some(outcome) = outcomes.first() {
        output.data(outcome)?;
    }

    Ok(())
}

/// Blocking tasks in flight at once while mapping a batch
fn mapping_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

/// Map documents on blocking tasks, at most `concurrency` at a time, keeping input order
async fn map_documents(
    mapper: Arc<Mapper>,
    specification: Arc<Specification>,
    documents: Vec<Value>,
    anchor: Option<FieldPath>,
    report: bool,
    concurrency: usize,
    output: &OutputWriter,
) -> Result<Vec<MappingOutcome>> {
    let total = documents.len();
    let progress = if total > 1 {
        output.progress_bar(total as u64, "Mapping documents")
    } else {
        None
    };

    let mut outcomes = Vec::with_capacity(total);
    let mut pending = documents.into_iter();
    loop {
        let handles: Vec<_> = pending
            .by_ref()
            .take(concurrency.max(1))
            .map(|document| {
                let mapper = Arc::clone(&mapper);
                let specification = Arc::clone(&specification);
                let anchor = anchor.clone();
                tokio::task::spawn_blocking(move || {
                    if report {
                        mapper.apply_with_report(&document, &specification, anchor.as_ref())
                    } else {
                        mapper
                            .apply(&document, &specification, anchor.as_ref())
                            .map(|output| MappingOutcome {
                                output,
                                report: DegradationReport::default(),
                            })
                    }
                })
            })
            .collect();
        if handles.is_empty() {
            break;
        }

        for handle in handles {
            outcomes.push(handle.await??);
            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(outcomes)
}

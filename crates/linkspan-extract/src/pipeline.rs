//! Extraction pipeline: parse → extract → merge, over many source files.
//!
//! Each unit fills its own [`FileRecordSet`]; results are merged in input
//! order, so a parallel run produces exactly the sequential output.

use linkspan_core::FileRecordSet;
use linkspan_parser::{CompileOptions, Frontend};
use rayon::prelude::*;

use crate::error::ExtractError;
use crate::extractor::Extractor;
use crate::filter::FileFilter;

/// A source file and the options to compile it with.
#[derive(Debug, Clone)]
pub struct UnitInput {
    pub path: String,
    pub options: CompileOptions,
}

/// What happened to one input.
#[derive(Debug)]
pub enum UnitOutcome {
    Extracted {
        file: String,
        records: usize,
        syntax_errors: usize,
    },
    Failed {
        file: String,
        error: ExtractError,
    },
}

impl UnitOutcome {
    #[must_use]
    pub fn file(&self) -> &str {
        match self {
            Self::Extracted { file, .. } | Self::Failed { file, .. } => file,
        }
    }

    /// Whether this outcome should make the run fail. Syntax errors count
    /// only when `syntax_errors_fail` is set.
    #[must_use]
    pub const fn is_failure(&self, syntax_errors_fail: bool) -> bool {
        match self {
            Self::Extracted { syntax_errors, .. } => syntax_errors_fail && *syntax_errors > 0,
            Self::Failed { .. } => true,
        }
    }

    /// The syntax-error diagnostic of an extracted unit whose main file did
    /// not parse cleanly.
    #[must_use]
    pub fn syntax_error(&self) -> Option<ExtractError> {
        match self {
            Self::Extracted {
                file,
                syntax_errors,
                ..
            } if *syntax_errors > 0 => Some(ExtractError::SyntaxErrors {
                file: file.clone(),
                count: *syntax_errors,
            }),
            _ => None,
        }
    }
}

/// Merged records plus one outcome per input, in input order.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub records: FileRecordSet,
    pub outcomes: Vec<UnitOutcome>,
}

impl ExtractionReport {
    #[must_use]
    pub fn failures(&self, syntax_errors_fail: bool) -> Vec<&UnitOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_failure(syntax_errors_fail))
            .collect()
    }
}

/// Drives extraction over a list of inputs.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    frontend: Frontend,
    filter: FileFilter,
    jobs: usize,
}

impl ExtractionPipeline {
    #[must_use]
    pub const fn new(frontend: Frontend, filter: FileFilter) -> Self {
        Self {
            frontend,
            filter,
            jobs: 1,
        }
    }

    /// Number of units processed concurrently (1 = sequential).
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Process every input. A unit that fails to load is reported in the
    /// outcomes; the others still contribute records.
    pub fn run(&self, inputs: &[UnitInput]) -> ExtractionReport {
        let results = if self.jobs > 1 && inputs.len() > 1 {
            self.run_parallel(inputs)
        } else {
            inputs.iter().map(|input| self.run_unit(input)).collect()
        };

        let mut report = ExtractionReport::default();
        for (records, outcome) in results {
            report.records.merge(records);
            report.outcomes.push(outcome);
        }
        tracing::info!(
            units = report.outcomes.len(),
            files = report.records.file_count(),
            records = report.records.record_count(),
            "extraction finished"
        );
        report
    }

    fn run_parallel(&self, inputs: &[UnitInput]) -> Vec<(FileRecordSet, UnitOutcome)> {
        match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
            Ok(pool) => pool.install(|| inputs.par_iter().map(|input| self.run_unit(input)).collect()),
            Err(error) => {
                tracing::warn!(%error, "thread pool unavailable, extracting sequentially");
                inputs.iter().map(|input| self.run_unit(input)).collect()
            }
        }
    }

    fn run_unit(&self, input: &UnitInput) -> (FileRecordSet, UnitOutcome) {
        let _span = tracing::debug_span!("unit", file = %input.path).entered();
        let mut records = FileRecordSet::new();

        let unit = match self.frontend.parse_file(&input.path, &input.options) {
            Ok(unit) => unit,
            Err(error) => {
                tracing::warn!(file = %input.path, %error, "failed to load translation unit");
                let outcome = UnitOutcome::Failed {
                    file: input.path.clone(),
                    error: error.into(),
                };
                return (records, outcome);
            }
        };

        let extractor = Extractor::new(self.frontend.target(), &self.filter);
        let outcome = match extractor.extract(&unit, &mut records) {
            Ok(count) => UnitOutcome::Extracted {
                file: input.path.clone(),
                records: count,
                syntax_errors: unit.syntax_errors(),
            },
            Err(error) => UnitOutcome::Failed {
                file: input.path.clone(),
                error,
            },
        };
        (records, outcome)
    }
}

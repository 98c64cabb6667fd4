//! Folding one interpreted build into the summary.

use crate::summary::{Summary, ValueIdentity};
use benchfold_kernel::{
    GroupClass, ResultTree, ThresholdCatalog, ThresholdRule, Verdict, VerdictReport,
};
use tracing::{debug, info};

/// The new summary and the verdicts of the condensed build.
#[derive(Debug, Clone)]
pub struct Condensation {
    pub summary: Summary,
    pub report: VerdictReport,
}

impl Condensation {
    pub fn failed(&self) -> bool {
        self.report.failed()
    }
}

/// Fold every sample of `tree` into a copy of `previous`.
///
/// Samples are taken in build order and each is judged against the
/// history as it stands before it. Its failure predicates decide
/// `failed_predicate`; its threshold rules (the tree's plus matching
/// `extra` ones) are checked against the entry's previous and average.
/// A value seen for the first time gets no threshold verdict. Samples from
/// builds the entry already covers are skipped.
pub fn condense(tree: &ResultTree, previous: &Summary, extra: &ThresholdCatalog) -> Condensation {
    let mut summary = previous.clone();
    let mut verdicts = Vec::new();

    for (id, node, value) in tree.values() {
        let identity = ValueIdentity::of(tree, id, node, value);
        let mut rules: Vec<&ThresholdRule> = tree.effective_thresholds(id);
        if node.class == GroupClass::Result {
            rules.extend(extra.rules_for(&node.name, &value.group_label));
        }

        for (build, literal) in &value.samples {
            let failed = value.failed_at(*build);
            let entry = summary.get(&node.hash);
            if entry.is_some_and(|e| e.stats.covers(*build)) {
                debug!(path = %node.path, build, "build already condensed");
                continue;
            }

            let violations = match (entry, literal.as_f64()) {
                (Some(entry), Some(x)) => rules
                    .iter()
                    .filter_map(|rule| {
                        rule.is_valid(x, entry.stats.previous, entry.stats.average)
                            .err()
                    })
                    .collect(),
                _ => Vec::new(),
            };
            for violation in &violations {
                debug!(path = %node.path, build, %violation, "threshold violated");
            }

            verdicts.push(Verdict {
                hash: node.hash.clone(),
                path: node.path.clone(),
                build: *build,
                failed_predicate: failed,
                violations,
            });
            summary.fold(&identity, *build, literal, failed);
        }
    }

    let report = VerdictReport::new(verdicts);
    info!(
        values = report.verdicts.len(),
        failing = report.failing().count(),
        "condensed build"
    );
    Condensation { summary, report }
}

use super::{required, Clause};
use crate::action::field;
use crate::cite::target_chains;
use crate::error::ApplyError;
use crate::overlay::{DiffRecord, OverlayView};
use crate::tree::CodeLookup;
use crate::Action;

/// Enumerators a target phrase lists, as they appear in labels:
/// `"paragraphs (3) and (4)"` -> `["(3)", "(4)"]`, `"section 5"` -> `["5"]`.
fn labels(phrase: &str) -> Result<Vec<String>, ApplyError> {
    let (_, chains) = target_chains(phrase).ok_or_else(|| ApplyError::BadLabel(phrase.to_string()))?;
    chains
        .iter()
        .map(|chain| match regex!(r"\([A-Za-z0-9]+\)").find_iter(chain).last() {
            Some(m) => Ok(m.as_str().to_string()),
            None => chain.split('(').next().map(str::to_string).ok_or_else(|| ApplyError::BadLabel(chain.clone())),
        })
        .collect()
}

/// `Redesignate`: swap the old enumerator for the new one in each target's
/// display label. Paths are left as they are.
pub(super) fn redesignate<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    action: &Action,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let old = labels(required(action, field::TARGET)?)?;
    let new = labels(required(action, field::REDESIGNATION)?)?;
    if old.len() != new.len() {
        return Err(ApplyError::BadLabel(format!("{} labels renamed to {}", old.len(), new.len())));
    }

    let paths = clause.paths(action);
    let mut targets = Vec::with_capacity(paths.len());
    for ((path, old), new) in paths.iter().zip(&old).zip(&new) {
        let node = view.find(path)?;
        let label = node.display_label.clone().unwrap_or_default();
        if !label.contains(old.as_str()) {
            return Err(ApplyError::LabelMismatch { old: old.clone(), label });
        }
        targets.push((node, label.replacen(old.as_str(), new, 1)));
    }

    let mut out = Vec::new();
    for (mut node, label) in targets {
        node.display_label = Some(label);
        out.extend(view.write(node));
    }
    Ok(out)
}

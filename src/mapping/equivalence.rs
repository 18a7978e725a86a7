use std::collections::BTreeSet;

use crate::ontology::{ClassExpression, Reasoner, ReasonerError};

/// Classes equivalent to `class` according to `reasoner`.
///
/// A named class gets the reasoner's set unchanged, which may contain the
/// class itself. An anonymous expression never becomes a node, so it is
/// removed from its own set.
///
/// # Errors
///
/// Propagates reasoner failures.
pub fn equivalent_classes<R>(
    reasoner: &R,
    class: &ClassExpression,
) -> Result<BTreeSet<ClassExpression>, ReasonerError>
where
    R: Reasoner + ?Sized,
{
    let mut equivalents = reasoner.equivalence_class_of(class)?;
    if class.is_anonymous() {
        equivalents.remove(class);
    }
    Ok(equivalents)
}

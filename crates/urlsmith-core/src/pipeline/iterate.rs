//! Cartesian expansion of `--iterate` component lists.
//!
//! Expansion is a flat worklist walk: every combination is materialized
//! as its own binding list and applied to a fresh clone of the base
//! handle, so no state leaks from one combination to the next.

use crate::accessor::{UrlComponent, UrlHandle};
use crate::diag;

/// One `--iterate component=v1 v2 …` directive, validated by the caller.
#[derive(Debug, Clone)]
pub struct IterateSpec {
    pub component: UrlComponent,
    /// `component:=…` syntax sets values verbatim.
    pub encode: bool,
    pub values: Vec<String>,
}

/// A single component assignment within one combination.
#[derive(Debug, Clone, Copy)]
pub struct Binding<'a> {
    pub component: UrlComponent,
    pub value: &'a str,
    pub encode: bool,
}

impl Binding<'_> {
    pub(crate) fn apply(&self, handle: &mut UrlHandle, quiet: bool) {
        if let Err(e) = handle.set(self.component, self.value, self.encode) {
            diag::note(quiet, &format!("error setting {}: {e}", self.component.name()));
        }
    }
}

/// All combinations across the given specs, last spec varying fastest.
/// With no specs there is exactly one empty combination.
pub(crate) fn combinations(specs: &[IterateSpec]) -> Vec<Vec<Binding<'_>>> {
    let mut combos: Vec<Vec<Binding<'_>>> = vec![Vec::new()];
    for spec in specs {
        let mut next = Vec::with_capacity(combos.len() * spec.values.len());
        for combo in &combos {
            for value in &spec.values {
                let mut extended = combo.clone();
                extended.push(Binding {
                    component: spec.component,
                    value,
                    encode: spec.encode,
                });
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

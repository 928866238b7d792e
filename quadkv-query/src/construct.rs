//! Construct stage - instantiates quad templates from bindings
//!
//! For each input binding, every free variable in the fixed template set is
//! replaced by its bound value and the resulting quads are emitted. A
//! template variable with no bound value is an error, as is a substituted
//! term that cannot occupy its position.

use crate::binding::Binding;
use crate::error::{Result, SearchError};
use crate::stage::QuadPattern;
use quadkv_core::{Quad, Term};

/// Instantiate every template against one binding
pub(crate) fn construct_quads(templates: &[QuadPattern], binding: &Binding) -> Result<Vec<Quad>> {
    let mut quads = Vec::with_capacity(templates.len());
    for template in templates {
        let subject = resolve(required(&template.subject, "subject")?, binding)?;
        let predicate = resolve(required(&template.predicate, "predicate")?, binding)?;
        let object = resolve(required(&template.object, "object")?, binding)?;
        let graph = match &template.graph {
            Some(term) => resolve(term, binding)?,
            None => Term::DefaultGraph,
        };
        let quad = Quad::new(subject, predicate, object, graph)
            .map_err(SearchError::Core)?;
        quads.push(quad);
    }
    Ok(quads)
}

fn required<'a>(slot: &'a Option<Term>, name: &str) -> Result<&'a Term> {
    slot.as_ref().ok_or_else(|| {
        SearchError::invalid_pipeline(format!("construct template is missing its {name} term"))
    })
}

fn resolve(term: &Term, binding: &Binding) -> Result<Term> {
    match term {
        Term::Variable { name } => binding
            .get(name)
            .cloned()
            .ok_or_else(|| SearchError::UnboundVariable(name.clone())),
        concrete => Ok(concrete.clone()),
    }
}

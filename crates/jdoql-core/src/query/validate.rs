//! Pre-execution checks over a query's accumulated state.

use crate::{
    expr::Expr,
    model::ClassModel,
    query::{QueryError, QueryState, RangeSpec, ValidateError},
    value::ValueDomain,
};
use std::collections::BTreeMap;

/// Validate `state` for an execution projecting `result` (`None` projects
/// the candidates).
pub(crate) fn validate(state: &QueryState, result: Option<&[Expr]>) -> Result<(), QueryError> {
    if let Some(err) = &state.error {
        return Err(err.clone());
    }

    validate_clauses(state, result)?;
    validate_range(state)?;
    validate_fields(state, result)?;
    validate_bindings(state, result)?;

    Ok(())
}

/// Whether an execution projecting `result` evaluates groups instead of rows.
pub(crate) fn is_grouped(state: &QueryState, result: Option<&[Expr]>) -> bool {
    !state.group_by.is_empty()
        || state.having.is_some()
        || result.is_some_and(|exprs| exprs.iter().any(Expr::contains_aggregate))
}

// ----------------------------------------------------------------------
// Clauses
// ----------------------------------------------------------------------

fn validate_clauses(state: &QueryState, result: Option<&[Expr]>) -> Result<(), ValidateError> {
    if let Some(filter) = &state.filter {
        let domain = filter.domain();
        if domain != ValueDomain::Boolean {
            return Err(ValidateError::FilterNotBoolean { domain });
        }
        if let Some(aggregate) = filter.first_aggregate() {
            return Err(ValidateError::AggregateInFilter {
                expr: aggregate.to_string(),
            });
        }
    }

    if let Some(having) = &state.having {
        if state.group_by.is_empty() {
            return Err(ValidateError::HavingWithoutGrouping);
        }
        let domain = having.domain();
        if domain != ValueDomain::Boolean {
            return Err(ValidateError::HavingNotBoolean { domain });
        }
    }

    for order in &state.order_by {
        let domain = order.expression().domain();
        if !domain.is_orderable() {
            return Err(ValidateError::NotOrderable {
                expr: order.expression().to_string(),
                domain,
            });
        }
    }

    // variables are bound while filtering and nowhere else
    let outside_filter = state
        .group_by
        .iter()
        .chain(state.having.iter())
        .chain(state.order_by.iter().map(|order| order.expression()))
        .chain(result.into_iter().flatten());
    for expr in outside_filter {
        if let Some(name) = expr.variable_names().first() {
            return Err(ValidateError::VariableOutsideFilter {
                name: (*name).to_string(),
            });
        }
    }

    if is_grouped(state, result) {
        for expr in result.into_iter().flatten() {
            let grouped = expr.contains_aggregate()
                || state.group_by.contains(expr)
                || !references_candidate(expr);
            if !grouped {
                return Err(ValidateError::UngroupedResult {
                    expr: expr.to_string(),
                });
            }
        }
    }

    Ok(())
}

fn references_candidate(expr: &Expr) -> bool {
    let mut found = false;
    expr.visit(&mut |node| {
        if matches!(node, Expr::This | Expr::Alias(_) | Expr::Variable { .. }) {
            found = true;
        }
    });

    found
}

// ----------------------------------------------------------------------
// Range
// ----------------------------------------------------------------------

fn validate_range(state: &QueryState) -> Result<(), QueryError> {
    match &state.range {
        None => Ok(()),
        Some(RangeSpec::Literal { from, to }) => check_range(*from, *to),
        Some(RangeSpec::Expression { from, to }) => {
            for bound in [from, to] {
                if bound.domain() != ValueDomain::Numeric {
                    return Err(ValidateError::RangeNotNumeric {
                        expr: bound.to_string(),
                    }
                    .into());
                }
            }
            Ok(())
        }
        Some(RangeSpec::Parameters { from, to }) => {
            for bound in [from, to] {
                if !matches!(bound, Expr::Parameter { .. }) {
                    return Err(ValidateError::RangeNotParameter {
                        expr: bound.to_string(),
                    }
                    .into());
                }
            }
            Ok(())
        }
    }
}

/// Lower bound inclusive, upper exclusive; both non-negative.
pub(crate) const fn check_range(from: i64, to: i64) -> Result<(), QueryError> {
    if from < 0 || to < 0 || from > to {
        return Err(QueryError::InvalidRange { from, to });
    }

    Ok(())
}

// ----------------------------------------------------------------------
// Fields
// ----------------------------------------------------------------------

fn validate_fields(state: &QueryState, result: Option<&[Expr]>) -> Result<(), ValidateError> {
    let exprs: Vec<&Expr> = state
        .clause_exprs()
        .chain(result.into_iter().flatten())
        .collect();

    // subquery aliases are unique within one query
    let mut aliases: BTreeMap<&str, &'static ClassModel> = BTreeMap::new();
    for expr in &exprs {
        expr.visit(&mut |node| {
            if let Expr::Subquery(sub) = node {
                aliases.entry(sub.alias.as_str()).or_insert(sub.class);
            }
        });
    }

    let scope = FieldScope {
        root: state.class,
        aliases,
    };
    let mut outcome = Ok(());
    for expr in exprs {
        expr.visit(&mut |node| {
            if outcome.is_ok() {
                outcome = scope.check(node);
            }
        });
    }

    outcome
}

struct FieldScope<'a> {
    root: &'static ClassModel,
    aliases: BTreeMap<&'a str, &'static ClassModel>,
}

impl FieldScope<'_> {
    fn check(&self, node: &Expr) -> Result<(), ValidateError> {
        let Expr::Field {
            target,
            name,
            domain,
        } = node
        else {
            return Ok(());
        };
        let Some(class) = self.class_of(target) else {
            return Ok(());
        };

        let field = class
            .field(name)
            .ok_or_else(|| ValidateError::UnknownField {
                class: class.path,
                field: name.clone(),
            })?;
        if !domains_compatible(field.domain, *domain) {
            return Err(ValidateError::FieldDomain {
                class: class.path,
                field: name.clone(),
                declared: field.domain,
                used: *domain,
            });
        }

        Ok(())
    }

    // Statically known class of an object-valued expression.
    fn class_of(&self, expr: &Expr) -> Option<&'static ClassModel> {
        match expr {
            Expr::This => Some(self.root),
            Expr::Alias(alias) => self.aliases.get(alias.as_str()).copied(),
            Expr::Cast { class, .. } => Some(*class),
            Expr::Variable { class, .. } => *class,
            Expr::Field { target, name, .. } => self.class_of(target)?.field(name)?.class,
            _ => None,
        }
    }
}

fn domains_compatible(declared: ValueDomain, used: ValueDomain) -> bool {
    use ValueDomain::{Collection, List, Object};

    declared == used
        || matches!(
            (declared, used),
            (_, Object) | (Object, _) | (Collection | List, Collection | List)
        )
}

// ----------------------------------------------------------------------
// Parameters
// ----------------------------------------------------------------------

fn validate_bindings(state: &QueryState, result: Option<&[Expr]>) -> Result<(), QueryError> {
    for expr in state.clause_exprs().chain(result.into_iter().flatten()) {
        for name in expr.parameter_names() {
            if !state.bindings.contains_key(name) {
                return Err(QueryError::UnboundParameter {
                    name: name.to_string(),
                });
            }
        }
    }

    Ok(())
}

//! Single-string JDOQL rendering of a query's state.
//!
//! Parameters are implicit (`:name`), so no `PARAMETERS` clause is written;
//! variables are declared explicitly.

use crate::{
    expr::{Expr, render::write_list},
    query::{QueryState, RangeSpec},
};
use std::fmt::{self, Display, Formatter};

///
/// Rendered
/// A query state together with the result clause of one execution.
///

pub(crate) struct Rendered<'a> {
    pub state: &'a QueryState,
    pub result: Option<&'a [Expr]>,
    pub distinct: bool,
}

impl Display for Rendered<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.state;

        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        if let Some(result) = self.result {
            write_list(f, result, ", ")?;
            f.write_str(" ")?;
        }
        write!(f, "FROM {}", state.class.path)?;
        if !state.include_subclasses {
            f.write_str(" EXCLUDE SUBCLASSES")?;
        }
        if let Some(filter) = &state.filter {
            write!(f, " WHERE {filter}")?;
        }
        if !state.variables.is_empty() {
            f.write_str(" VARIABLES ")?;
            for (i, var) in state.variables.iter().enumerate() {
                if i > 0 {
                    f.write_str("; ")?;
                }
                write!(f, "{} {}", var.type_name, var.name)?;
            }
        }
        if !state.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            write_list(f, &state.group_by, ", ")?;
        }
        if let Some(having) = &state.having {
            write!(f, " HAVING {having}")?;
        }
        if !state.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            write_list(f, &state.order_by, ", ")?;
        }
        match &state.range {
            None => Ok(()),
            Some(RangeSpec::Literal { from, to }) => write!(f, " RANGE {from}, {to}"),
            Some(RangeSpec::Expression { from, to } | RangeSpec::Parameters { from, to }) => {
                write!(f, " RANGE {from}, {to}")
            }
        }
    }
}

impl Display for QueryState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Rendered {
            state: self,
            result: None,
            distinct: false,
        }
        .fmt(f)
    }
}

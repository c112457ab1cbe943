use crate::expr::{BinaryOp, CallStyle, Expr, SubqueryExpr};
use std::fmt::{self, Display, Formatter};

// Binding strengths used to decide where parentheses are needed.
const PREC_CONDITIONAL: u8 = 0;
const PREC_RELATIONAL: u8 = 9;
const PREC_UNARY: u8 = 13;
const PREC_POSTFIX: u8 = 14;

impl Expr {
    const fn precedence(&self) -> u8 {
        match self {
            Self::Conditional { .. } => PREC_CONDITIONAL,
            Self::Binary { op, .. } => op.precedence(),
            Self::InstanceOf { .. } => PREC_RELATIONAL,
            Self::Unary { .. } | Self::Cast { .. } => PREC_UNARY,
            _ => PREC_POSTFIX,
        }
    }

    /// Write `self` as an operand of a context binding at `min` strength.
    fn fmt_operand(&self, f: &mut Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::This => f.write_str("this"),
            Self::Alias(alias) => f.write_str(alias),
            Self::Parameter { name, .. } => write!(f, ":{name}"),
            Self::Variable { name, .. } => f.write_str(name),
            Self::Field { target, name, .. } => {
                target.fmt_operand(f, PREC_POSTFIX)?;
                write!(f, ".{name}")
            }
            Self::Unary { op, operand } => {
                f.write_str(op.symbol())?;
                operand.fmt_operand(f, PREC_UNARY)
            }
            Self::Binary { op, left, right } => fmt_binary(f, *op, left, right),
            Self::Call { func, args, .. } => match func.style() {
                CallStyle::Method => {
                    let (target, rest) = args.split_first().ok_or(fmt::Error)?;
                    target.fmt_operand(f, PREC_POSTFIX)?;
                    write!(f, ".{}(", func.name())?;
                    fmt_args(f, rest)?;
                    f.write_str(")")
                }
                CallStyle::Static(owner) => {
                    write!(f, "{owner}.{}(", func.name())?;
                    fmt_args(f, args)?;
                    f.write_str(")")
                }
            },
            Self::Aggregate {
                func,
                distinct,
                operand,
            } => {
                let distinct = if *distinct { "DISTINCT " } else { "" };
                write!(f, "{}({distinct}{operand})", func.name())
            }
            Self::Conditional {
                branches,
                otherwise,
                ..
            } if branches.is_empty() => match otherwise {
                Some(value) => write!(f, "{value}"),
                None => f.write_str("null"),
            },
            Self::Conditional {
                branches,
                otherwise,
                ..
            } => {
                for (i, (cond, value)) in branches.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ELSE ")?;
                    }
                    write!(f, "IF ({cond}) ")?;
                    value.fmt_operand(f, PREC_CONDITIONAL + 1)?;
                }
                f.write_str(" ELSE ")?;
                match otherwise {
                    Some(value) => value.fmt_operand(f, PREC_CONDITIONAL + 1),
                    None => f.write_str("null"),
                }
            }
            Self::InstanceOf { operand, class } => {
                operand.fmt_operand(f, PREC_RELATIONAL + 1)?;
                write!(f, " instanceof {}", class.path)
            }
            Self::Cast { operand, class } => {
                write!(f, "({})", class.path)?;
                operand.fmt_operand(f, PREC_UNARY)
            }
            Self::Subquery(sub) => write!(f, "({sub})"),
        }
    }
}

fn fmt_binary(f: &mut Formatter<'_>, op: BinaryOp, left: &Expr, right: &Expr) -> fmt::Result {
    let prec = op.precedence();

    // Left-associative: equal strength on the right needs parentheses.
    left.fmt_operand(f, prec)?;
    write!(f, " {} ", op.symbol())?;
    right.fmt_operand(f, prec + 1)
}

fn fmt_args(f: &mut Formatter<'_>, args: &[Expr]) -> fmt::Result {
    write_list(f, args, ", ")
}

pub(crate) fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Display for SubqueryExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let unique = if self.unique { "UNIQUE " } else { "" };
        write!(
            f,
            "SELECT {unique}{} FROM {} {}",
            self.result, self.class.path, self.alias
        )?;
        if !self.include_subclasses {
            f.write_str(" EXCLUDE SUBCLASSES")?;
        }
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {filter}")?;
        }
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            write_list(f, &self.group_by, ", ")?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {having}")?;
        }
        Ok(())
    }
}

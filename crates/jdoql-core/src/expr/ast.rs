use crate::{
    expr::Function,
    model::ClassModel,
    value::{Value, ValueDomain},
};

///
/// Expr
///
/// Untyped expression node shared by every typed facade.
/// Typed wrappers guarantee domain correctness at build time; the tree itself
/// carries enough domain information for validation and rendering.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Value),

    /// The candidate of the outermost query in scope.
    This,

    /// A subquery candidate, referenced by its alias.
    Alias(String),

    Parameter {
        name: String,
        domain: ValueDomain,
    },

    Variable {
        name: String,
        domain: ValueDomain,
        class: Option<&'static ClassModel>,
    },

    Field {
        target: Box<Self>,
        name: String,
        domain: ValueDomain,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Self>,
    },

    Binary {
        op: BinaryOp,
        left: Box<Self>,
        right: Box<Self>,
    },

    /// Method-style calls carry their target as `args[0]`.
    Call {
        func: Function,
        args: Vec<Self>,
        domain: ValueDomain,
    },

    Aggregate {
        func: AggregateFunc,
        distinct: bool,
        operand: Box<Self>,
    },

    Conditional {
        branches: Vec<(Self, Self)>,
        otherwise: Option<Box<Self>>,
        domain: ValueDomain,
    },

    InstanceOf {
        operand: Box<Self>,
        class: &'static ClassModel,
    },

    Cast {
        operand: Box<Self>,
        class: &'static ClassModel,
    },

    Subquery(Box<SubqueryExpr>),
}

impl Expr {
    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    #[must_use]
    pub fn field(target: Self, name: impl Into<String>, domain: ValueDomain) -> Self {
        Self::Field {
            target: Box::new(target),
            name: name.into(),
            domain,
        }
    }

    #[must_use]
    pub fn unary(op: UnaryOp, operand: Self) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    #[must_use]
    pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub const fn call(func: Function, args: Vec<Self>, domain: ValueDomain) -> Self {
        Self::Call { func, args, domain }
    }

    #[must_use]
    pub fn aggregate(func: AggregateFunc, distinct: bool, operand: Self) -> Self {
        Self::Aggregate {
            func,
            distinct,
            operand: Box::new(operand),
        }
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Domain of the value this expression produces.
    #[must_use]
    pub fn domain(&self) -> ValueDomain {
        match self {
            Self::Literal(value) => value.domain().unwrap_or(ValueDomain::Object),
            Self::This | Self::Alias(_) | Self::Cast { .. } => ValueDomain::Persistable,
            Self::Parameter { domain, .. }
            | Self::Variable { domain, .. }
            | Self::Field { domain, .. }
            | Self::Call { domain, .. }
            | Self::Conditional { domain, .. } => *domain,
            Self::Unary { op, .. } => match op {
                UnaryOp::Not => ValueDomain::Boolean,
                UnaryOp::Neg | UnaryOp::Complement => ValueDomain::Numeric,
            },
            Self::Binary { op, left, right } => op.result_domain(left.domain(), right.domain()),
            Self::Aggregate { func, operand, .. } => match func {
                AggregateFunc::Count | AggregateFunc::Sum | AggregateFunc::Avg => {
                    ValueDomain::Numeric
                }
                AggregateFunc::Min | AggregateFunc::Max => operand.domain(),
            },
            Self::InstanceOf { .. } => ValueDomain::Boolean,
            Self::Subquery(sub) => sub.domain,
        }
    }

    /// Pre-order walk over this node and its children, subqueries included.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        f(self);
        match self {
            Self::Literal(_)
            | Self::This
            | Self::Alias(_)
            | Self::Parameter { .. }
            | Self::Variable { .. } => {}
            Self::Field { target, .. } => target.visit(f),
            Self::Unary { operand, .. }
            | Self::Aggregate { operand, .. }
            | Self::InstanceOf { operand, .. }
            | Self::Cast { operand, .. } => operand.visit(f),
            Self::Binary { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            Self::Call { args, .. } => {
                for arg in args {
                    arg.visit(&mut *f);
                }
            }
            Self::Conditional {
                branches,
                otherwise,
                ..
            } => {
                for (cond, value) in branches {
                    cond.visit(&mut *f);
                    value.visit(&mut *f);
                }
                if let Some(otherwise) = otherwise {
                    otherwise.visit(f);
                }
            }
            Self::Subquery(sub) => {
                for child in sub.children() {
                    child.visit(&mut *f);
                }
            }
        }
    }

    /// Names of every parameter referenced in this tree, in first-use order.
    #[must_use]
    pub fn parameter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        self.visit(&mut |node| {
            if let Self::Parameter { name, .. } = node
                && !names.contains(&name.as_str())
            {
                names.push(name);
            }
        });

        names
    }

    /// Names of every variable referenced in this tree, in first-use order.
    #[must_use]
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        self.visit(&mut |node| {
            if let Self::Variable { name, .. } = node
                && !names.contains(&name.as_str())
            {
                names.push(name);
            }
        });

        names
    }

    /// Whether an aggregate appears outside any nested subquery.
    #[must_use]
    pub fn contains_aggregate(&self) -> bool {
        self.first_aggregate().is_some()
    }

    /// First aggregate in pre-order, without descending into subqueries.
    #[must_use]
    pub fn first_aggregate(&self) -> Option<&Self> {
        match self {
            Self::Aggregate { .. } => Some(self),
            Self::Subquery(_)
            | Self::Literal(_)
            | Self::This
            | Self::Alias(_)
            | Self::Parameter { .. }
            | Self::Variable { .. } => None,
            Self::Field { target, .. } => target.first_aggregate(),
            Self::Unary { operand, .. }
            | Self::InstanceOf { operand, .. }
            | Self::Cast { operand, .. } => operand.first_aggregate(),
            Self::Binary { left, right, .. } => {
                left.first_aggregate().or_else(|| right.first_aggregate())
            }
            Self::Call { args, .. } => args.iter().find_map(Self::first_aggregate),
            Self::Conditional {
                branches,
                otherwise,
                ..
            } => branches
                .iter()
                .find_map(|(c, v)| c.first_aggregate().or_else(|| v.first_aggregate()))
                .or_else(|| otherwise.as_ref().and_then(|o| o.first_aggregate())),
        }
    }

    /// Whether the tree references the named variable.
    #[must_use]
    pub fn references_variable(&self, variable: &str) -> bool {
        let mut found = false;
        self.visit(&mut |node| {
            if matches!(node, Self::Variable { name, .. } if name == variable) {
                found = true;
            }
        });

        found
    }
}

///
/// UnaryOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryOp {
    Not,
    Neg,
    Complement,
}

impl UnaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Neg => "-",
            Self::Complement => "~",
        }
    }
}

///
/// BinaryOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    /// Numeric addition, or concatenation when either side is a string.
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
        }
    }

    /// Binding strength for rendering; higher binds tighter.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 3,
            Self::And => 4,
            Self::BitOr => 5,
            Self::BitXor => 6,
            Self::BitAnd => 7,
            Self::Eq | Self::Ne => 8,
            Self::Lt | Self::Lte | Self::Gt | Self::Gte => 9,
            Self::Add | Self::Sub => 11,
            Self::Mul | Self::Div | Self::Rem => 12,
        }
    }

    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Lte | Self::Gt | Self::Gte
        )
    }

    const fn result_domain(self, left: ValueDomain, right: ValueDomain) -> ValueDomain {
        match self {
            Self::Eq | Self::Ne | Self::Lt | Self::Lte | Self::Gt | Self::Gte => {
                ValueDomain::Boolean
            }
            Self::And | Self::Or => ValueDomain::Boolean,
            Self::Add
                if matches!(left, ValueDomain::String) || matches!(right, ValueDomain::String) =>
            {
                ValueDomain::String
            }
            Self::BitAnd | Self::BitOr | Self::BitXor if matches!(left, ValueDomain::Boolean) => {
                ValueDomain::Boolean
            }
            _ => ValueDomain::Numeric,
        }
    }
}

///
/// AggregateFunc
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunc {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

///
/// SubqueryExpr
///
/// Frozen snapshot of a `TypedSubquery` at the moment one of its result
/// producers was called.
///

#[derive(Clone, Debug, PartialEq)]
pub struct SubqueryExpr {
    pub class: &'static ClassModel,
    pub alias: String,
    pub include_subclasses: bool,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub result: Expr,
    /// `true` for single-valued results, `false` for collection results.
    pub unique: bool,
    pub domain: ValueDomain,
}

impl SubqueryExpr {
    fn children(&self) -> impl Iterator<Item = &Expr> {
        self.filter
            .iter()
            .chain(self.group_by.iter())
            .chain(self.having.iter())
            .chain(std::iter::once(&self.result))
    }
}

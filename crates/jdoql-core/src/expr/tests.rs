use super::*;
use crate::{
    test_fixtures::{Book, QProduct, date},
    traits::QueryClass,
    value::{Value, ValueDomain},
};

fn product() -> QProduct {
    QProduct::candidate()
}

fn param<E: Expression>(name: &str, domain: ValueDomain) -> E {
    E::from_expr(Expr::Parameter {
        name: name.to_string(),
        domain,
    })
}

//
// rendering
//

#[test]
fn field_comparison_renders_with_this_prefix() {
    let p = product();
    assert_eq!(p.price().gt(500.0).to_string(), "this.price > 500.0");
    assert_eq!(p.name().eq("Desk").to_string(), "this.name == 'Desk'");
    assert_eq!(p.released().lt(date(2021, 1, 1)).to_string(), "this.released < {d '2021-01-01'}");
}

#[test]
fn lower_precedence_operands_are_parenthesized() {
    let p = product();
    let stock = p.stock();

    let sum_then_mul = stock.add(1).mul(2);
    assert_eq!(sum_then_mul.to_string(), "(this.stock + 1) * 2");

    let mul_then_sum = stock.mul(2).add(1);
    assert_eq!(mul_then_sum.to_string(), "this.stock * 2 + 1");

    let or_inside_and = p.stock().gt(1).or(p.stock().lt(0)).and(p.price().gt(10.0));
    assert_eq!(
        or_inside_and.to_string(),
        "(this.stock > 1 || this.stock < 0) && this.price > 10.0"
    );
}

#[test]
fn right_operand_of_equal_strength_is_parenthesized() {
    let stock = product().stock();
    let expr = stock.sub(stock.sub(1));

    assert_eq!(expr.to_string(), "this.stock - (this.stock - 1)");
}

#[test]
fn unary_operators_wrap_compound_operands() {
    let p = product();
    assert_eq!(p.stock().gt(3).not().to_string(), "!(this.stock > 3)");
    assert_eq!(p.stock().neg().to_string(), "-this.stock");
    assert_eq!(p.stock().add(1).com().to_string(), "~(this.stock + 1)");
}

#[test]
fn method_and_static_calls_render_in_jdoql_form() {
    let p = product();
    assert_eq!(
        p.name().to_lower_case().starts_with("la").to_string(),
        "this.name.toLowerCase().startsWith('la')"
    );
    assert_eq!(p.name().substring_range(1, 3).to_string(), "this.name.substring(1, 3)");
    assert_eq!(p.price().sqrt().to_string(), "Math.sqrt(this.price)");
    assert_eq!(p.released().year().to_string(), "this.released.getYear()");
    assert_eq!(p.tags().size().to_string(), "this.tags.size()");
    assert_eq!(p.object_id().to_string(), "JDOHelper.getObjectId(this)");
    assert_eq!(p.version().to_string(), "JDOHelper.getVersion(this)");
}

#[test]
fn aggregates_render_with_optional_distinct() {
    let p = product();
    assert_eq!(p.price().avg().to_string(), "avg(this.price)");
    assert_eq!(p.stock().sum_distinct().to_string(), "sum(DISTINCT this.stock)");
    assert_eq!(p.name().count_distinct().to_string(), "count(DISTINCT this.name)");
    assert_eq!(p.price().max().to_string(), "max(this.price)");
}

#[test]
fn parameters_render_implicitly() {
    let min: NumericExpression<f64> = param("min", ValueDomain::Numeric);
    assert_eq!(product().price().gteq(&min).to_string(), "this.price >= :min");
}

#[test]
fn instanceof_and_cast_use_class_paths() {
    let p = product();
    assert_eq!(p.instance_of::<Book>().to_string(), "this instanceof shop.Book");

    let author: StringExpression = p.cast::<Book>().field::<String>("author");
    assert_eq!(author.to_string(), "((shop.Book)this).author");
}

#[test]
fn relation_navigation_chains_fields() {
    let p = product();
    let ranking = p.category().field::<i64>("ranking");

    assert_eq!(ranking.to_string(), "this.category.ranking");
    assert_eq!(ranking.as_expr().domain(), ValueDomain::Numeric);
}

#[test]
fn order_expressions_render_direction_and_nulls() {
    let p = product();
    assert_eq!(p.price().asc().to_string(), "this.price ASC");
    assert_eq!(p.name().desc().nulls_last().to_string(), "this.name DESC NULLS LAST");
    assert_eq!(
        p.released().asc().nulls_first().nulls(),
        NullOrdering::First
    );
}

//
// if-then-else
//

#[test]
fn conditional_renders_branches_in_call_order() {
    let p = product();
    let label = IfThenElseExpression::<String>::new()
        .if_then(p.price().gt(1000.0), "premium")
        .if_then(p.price().gt(100.0), "standard")
        .else_end("budget");

    assert_eq!(label.branch_count(), 2);
    assert_eq!(
        label.value().to_string(),
        "IF (this.price > 1000.0) 'premium' ELSE IF (this.price > 100.0) 'standard' ELSE 'budget'"
    );
}

#[test]
fn second_else_end_replaces_the_first() {
    let p = product();
    let label = IfThenElseExpression::<String>::new()
        .if_then(p.stock().eq(0), "sold out")
        .else_end("first")
        .else_end("second");

    let Expr::Conditional { otherwise, .. } = label.value().into_expr() else {
        panic!("expected a conditional node");
    };
    assert_eq!(otherwise.as_deref(), Some(&Expr::Literal(Value::from("second"))));
}

#[test]
fn conditional_without_else_falls_back_to_null() {
    let p = product();
    let label = IfThenElseExpression::<i64>::new().if_then(p.stock().gt(0), 1);

    assert_eq!(label.value().to_string(), "IF (this.stock > 0) 1 ELSE null");
}

#[test]
fn conditional_without_branches_renders_its_fallback() {
    let value = IfThenElseExpression::<i64>::new().else_end(7);

    assert_eq!(value.branch_count(), 0);
    assert_eq!(value.value().to_string(), "7");
}

//
// tree inspection
//

#[test]
fn parameter_and_variable_names_are_collected_in_order() {
    let p = product();
    let min: NumericExpression<f64> = param("min", ValueDomain::Numeric);
    let name: StringExpression = param("name", ValueDomain::String);
    let tag = StringExpression::from_expr(Expr::Variable {
        name: "t".to_string(),
        domain: ValueDomain::String,
        class: None,
    });

    let filter = p
        .price()
        .gt(&min)
        .and(p.name().eq(&name))
        .and(p.tags().contains(&tag));
    let expr = filter.as_expr();

    assert_eq!(expr.parameter_names(), ["min", "name"]);
    assert_eq!(expr.variable_names(), ["t"]);
    assert!(expr.references_variable("t"));
    assert!(!expr.contains_aggregate());
}

#[test]
fn aggregate_detection_looks_through_arithmetic() {
    let p = product();
    let expr = p.stock().sum().div(p.stock().count());

    assert!(expr.as_expr().contains_aggregate());
    assert!(!p.price().add(1.0).as_expr().contains_aggregate());
}

#[test]
fn binary_result_domains_follow_operands() {
    let p = product();
    assert_eq!(p.price().gt(1.0).as_expr().domain(), ValueDomain::Boolean);
    assert_eq!(p.stock().add(1).as_expr().domain(), ValueDomain::Numeric);
    assert_eq!(p.name().concat("!").as_expr().domain(), ValueDomain::String);
}

#[test]
fn literal_helper_types_arbitrary_values() {
    let seven: NumericExpression<i64> = literal(7);
    assert_eq!(seven.as_expr(), &Expr::Literal(Value::Int(7)));
    assert_eq!(seven.to_string(), "7");
}

use crate::{
    planner::{
        error::PlannerError,
        logical_plan::{EqualityFilter, Projection, SelectPlan},
    },
    types::value::Value,
};
use sqlparser::{
    ast::{
        BinaryOperator, Expr, FunctionArg, FunctionArgExpr, FunctionArguments, Query, Select,
        SelectItem, SetExpr, Statement, TableFactor, UnaryOperator, Value as SqlValue,
    },
    dialect::SQLiteDialect,
    parser::Parser,
};

#[derive(Debug, Default)]
pub struct SqlParser;

impl SqlParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_sql(&self, sql: &str) -> Result<SelectPlan, PlannerError> {
        let dialect = SQLiteDialect {};
        let statements = Parser::parse_sql(&dialect, sql)?;

        if statements.len() != 1 {
            return Err(PlannerError::InvalidQuery(
                "Expected exactly one statement".to_string(),
            ));
        }

        self.to_plan(&statements[0])
    }

    fn to_plan(&self, statement: &Statement) -> Result<SelectPlan, PlannerError> {
        match statement {
            Statement::Query(query) => self.plan_query(query),
            other => Err(PlannerError::UnsupportedStatement(other.to_string())),
        }
    }

    fn plan_query(&self, query: &Query) -> Result<SelectPlan, PlannerError> {
        if query.order_by.is_some() || query.limit.is_some() || query.offset.is_some() {
            return Err(PlannerError::InvalidQuery(
                "ORDER BY, LIMIT and OFFSET are not supported".to_string(),
            ));
        }
        let select = match query.body.as_ref() {
            SetExpr::Select(select) => select,
            other => return Err(PlannerError::UnsupportedStatement(other.to_string())),
        };

        let plan = SelectPlan {
            table_name: self.table_name(select)?,
            projection: self.projection(select)?,
            filter: select
                .selection
                .as_ref()
                .map(|expr| self.equality_filter(expr))
                .transpose()?,
        };
        tracing::debug!(?plan, "planned select");
        Ok(plan)
    }

    fn table_name(&self, select: &Select) -> Result<String, PlannerError> {
        let [from] = select.from.as_slice() else {
            return Err(PlannerError::InvalidQuery(
                "Expected exactly one table in FROM".to_string(),
            ));
        };
        if !from.joins.is_empty() {
            return Err(PlannerError::InvalidQuery("Joins are not supported".to_string()));
        }
        match &from.relation {
            TableFactor::Table { name, .. } => name
                .0
                .last()
                .map(|ident| ident.value.clone())
                .ok_or_else(|| PlannerError::InvalidQuery("Empty table name".to_string())),
            other => Err(PlannerError::UnsupportedExpression(other.to_string())),
        }
    }

    fn projection(&self, select: &Select) -> Result<Projection, PlannerError> {
        if let [item] = select.projection.as_slice() {
            match item {
                SelectItem::Wildcard(_) => return Ok(Projection::Wildcard),
                SelectItem::UnnamedExpr(expr) if is_count_star(expr) => {
                    return Ok(Projection::CountRows);
                }
                _ => {}
            }
        }

        select
            .projection
            .iter()
            .map(|item| match item {
                SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                    column_name(expr)
                        .ok_or_else(|| PlannerError::UnsupportedExpression(expr.to_string()))
                }
                other => Err(PlannerError::UnsupportedExpression(other.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Projection::Columns)
    }

    fn equality_filter(&self, expr: &Expr) -> Result<EqualityFilter, PlannerError> {
        match expr {
            Expr::Nested(inner) => self.equality_filter(inner),
            Expr::BinaryOp {
                left,
                op: BinaryOperator::Eq,
                right,
            } => {
                let oriented = |column: &Expr, literal: &Expr| {
                    Some(EqualityFilter {
                        column: column_name(column)?,
                        value: literal_value(literal)?,
                    })
                };
                let (left, right) = (left.as_ref(), right.as_ref());
                oriented(left, right)
                    .or_else(|| oriented(right, left))
                    .ok_or_else(|| PlannerError::UnsupportedExpression(expr.to_string()))
            }
            other => Err(PlannerError::UnsupportedExpression(other.to_string())),
        }
    }
}

fn is_count_star(expr: &Expr) -> bool {
    let Expr::Function(function) = expr else {
        return false;
    };
    let is_count = function
        .name
        .0
        .last()
        .is_some_and(|ident| ident.value.eq_ignore_ascii_case("count"));
    is_count
        && matches!(
            &function.args,
            FunctionArguments::List(list)
                if matches!(list.args.as_slice(), [FunctionArg::Unnamed(FunctionArgExpr::Wildcard)])
        )
}

fn column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|ident| ident.value.clone()),
        Expr::Nested(inner) => column_name(inner),
        _ => None,
    }
}

fn literal_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Value(value) => match value {
            SqlValue::Number(text, _) => number(text),
            SqlValue::SingleQuotedString(text) | SqlValue::DoubleQuotedString(text) => {
                Some(Value::Text(text.clone()))
            }
            SqlValue::Boolean(flag) => Some(Value::Integer(i64::from(*flag))),
            SqlValue::Null => Some(Value::Null),
            _ => None,
        },
        // SQLite reads an unresolvable "double quoted" name as a string.
        Expr::Identifier(ident) if ident.quote_style == Some('"') => {
            Some(Value::Text(ident.value.clone()))
        }
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => match literal_value(expr)? {
            Value::Integer(n) => Some(Value::Integer(n.checked_neg()?)),
            Value::Real(n) => Some(Value::Real(-n)),
            _ => None,
        },
        Expr::Nested(inner) => literal_value(inner),
        _ => None,
    }
}

fn number(text: &str) -> Option<Value> {
    text.parse::<i64>()
        .map(Value::Integer)
        .or_else(|_| text.parse::<f64>().map(Value::Real))
        .ok()
}

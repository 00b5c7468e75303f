//! Query assembly
//!
//! A small set of immutable query fragments and [`assemble`], which turns an
//! unordered bag of them into one statement plus its positional parameters.
//! Fragments are routed by kind into clause buffers which are always emitted
//! in the same order:
//!
//! ```text
//! SELECT ... FROM ... WHERE ... GROUP BY ... ORDER BY ... LIMIT ...
//! ```
//!
//! so callers may pass fragments in any order across kinds, while the order
//! within one kind is preserved.

use std::fmt;

use super::value::Value;

fn quote(name: &str) -> String {
    format!("`{}`", name)
}

/// A projected column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    target: ColumnTarget,
    alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum ColumnTarget {
    Named {
        table: Option<String>,
        name: String,
        function: Option<String>,
    },
    Expr(String),
}

impl ColumnDef {
    fn named(table: Option<&str>, name: &str, function: Option<&str>) -> Self {
        Self {
            target: ColumnTarget::Named {
                table: table.map(str::to_string),
                name: name.to_string(),
                function: function.map(str::to_string),
            },
            alias: None,
        }
    }

    /// Attach an `AS` alias
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            ColumnTarget::Named {
                table,
                name,
                function,
            } => {
                let mut rendered = if name == "*" {
                    name.clone()
                } else {
                    quote(name)
                };
                if let Some(table) = table {
                    rendered = format!("{}.{}", quote(table), rendered);
                }
                if let Some(function) = function {
                    rendered = format!("{}({})", function, rendered);
                }
                f.write_str(&rendered)?;
            }
            ColumnTarget::Expr(expr) => f.write_str(expr)?,
        }
        if let Some(alias) = &self.alias {
            write!(f, " AS {}", quote(alias))?;
        }
        Ok(())
    }
}

pub fn column(name: &str) -> ColumnDef {
    ColumnDef::named(None, name, None)
}

pub fn column_alias(name: &str, alias: &str) -> ColumnDef {
    column(name).alias(alias)
}

pub fn table_column(table: &str, name: &str) -> ColumnDef {
    ColumnDef::named(Some(table), name, None)
}

pub fn table_column_alias(table: &str, name: &str, alias: &str) -> ColumnDef {
    table_column(table, name).alias(alias)
}

/// `*`
pub fn star() -> ColumnDef {
    column("*")
}

/// `FUNCTION(`column`)`
pub fn function(function: &str, name: &str) -> ColumnDef {
    ColumnDef::named(None, name, Some(function))
}

pub fn sum(name: &str) -> ColumnDef {
    function("SUM", name)
}

pub fn sum_alias(name: &str, alias: &str) -> ColumnDef {
    sum(name).alias(alias)
}

pub fn count(name: &str) -> ColumnDef {
    function("COUNT", name)
}

pub fn count_alias(name: &str, alias: &str) -> ColumnDef {
    count(name).alias(alias)
}

pub fn min(name: &str) -> ColumnDef {
    function("MIN", name)
}

pub fn min_alias(name: &str, alias: &str) -> ColumnDef {
    min(name).alias(alias)
}

pub fn max(name: &str) -> ColumnDef {
    function("MAX", name)
}

pub fn max_alias(name: &str, alias: &str) -> ColumnDef {
    max(name).alias(alias)
}

/// A raw projection expression, emitted verbatim
pub fn expr(expr: &str) -> ColumnDef {
    ColumnDef {
        target: ColumnTarget::Expr(expr.to_string()),
        alias: None,
    }
}

pub fn expr_alias(raw: &str, alias: &str) -> ColumnDef {
    expr(raw).alias(alias)
}

/// A table reference with optional alias
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub alias: Option<String>,
}

impl fmt::Display for TableDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.name))?;
        if let Some(alias) = &self.alias {
            write!(f, " {}", quote(alias))?;
        }
        Ok(())
    }
}

pub fn table(name: &str) -> TableDef {
    TableDef {
        name: name.to_string(),
        alias: None,
    }
}

pub fn table_alias(name: &str, alias: &str) -> TableDef {
    TableDef {
        name: name.to_string(),
        alias: Some(alias.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanEqual,
    LessThanEqual,
    Null,
    NotNull,
    In,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanEqual => ">=",
            Operator::LessThanEqual => "<=",
            Operator::Null => "IS NULL",
            Operator::NotNull => "IS NOT NULL",
            Operator::In => "IN",
        }
    }
}

/// Left-hand side of a condition
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Column(String),
    Expr(String),
}

/// A single predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    lhs: Operand,
    operator: Operator,
    values: Vec<Value>,
}

impl Condition {
    fn new(lhs: Operand, operator: Operator, values: Vec<Value>) -> Self {
        Self {
            lhs,
            operator,
            values,
        }
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Append the values this condition binds
    fn add_values(&self, params: &mut Vec<Value>) {
        match self.operator {
            Operator::Null | Operator::NotNull => {}
            _ => params.extend(self.values.iter().cloned()),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lhs {
            Operand::Column(name) => f.write_str(&quote(name))?,
            Operand::Expr(expr) => f.write_str(expr)?,
        }
        match self.operator {
            Operator::Null | Operator::NotNull => write!(f, " {}", self.operator.as_str()),
            Operator::In if self.values.is_empty() => f.write_str(" IN (NULL)"),
            Operator::In => {
                let placeholders = vec!["?"; self.values.len()].join(", ");
                write!(f, " IN ({})", placeholders)
            }
            _ => write!(f, " {} ?", self.operator.as_str()),
        }
    }
}

macro_rules! comparisons {
    ($($name:ident, $expr_name:ident => $op:ident;)*) => {
        $(
            pub fn $name(name: &str, value: impl Into<Value>) -> Condition {
                Condition::new(Operand::Column(name.to_string()), Operator::$op, vec![value.into()])
            }

            pub fn $expr_name(expr: &str, value: impl Into<Value>) -> Condition {
                Condition::new(Operand::Expr(expr.to_string()), Operator::$op, vec![value.into()])
            }
        )*
    };
}

comparisons! {
    is_equal, is_equal_expr => Equal;
    is_not_equal, is_not_equal_expr => NotEqual;
    is_greater_than, is_greater_than_expr => GreaterThan;
    is_greater_than_equal, is_greater_than_equal_expr => GreaterThanEqual;
    is_less_than, is_less_than_expr => LessThan;
    is_less_than_equal, is_less_than_equal_expr => LessThanEqual;
}

pub fn is_null(name: &str) -> Condition {
    Condition::new(Operand::Column(name.to_string()), Operator::Null, Vec::new())
}

pub fn is_null_expr(expr: &str) -> Condition {
    Condition::new(Operand::Expr(expr.to_string()), Operator::Null, Vec::new())
}

pub fn is_not_null(name: &str) -> Condition {
    Condition::new(Operand::Column(name.to_string()), Operator::NotNull, Vec::new())
}

pub fn is_not_null_expr(expr: &str) -> Condition {
    Condition::new(Operand::Expr(expr.to_string()), Operator::NotNull, Vec::new())
}

/// Membership test, one placeholder per value
pub fn is_in<I, V>(name: &str, values: I) -> Condition
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let values = values.into_iter().map(Into::into).collect();
    Condition::new(Operand::Column(name.to_string()), Operator::In, values)
}

pub fn is_in_expr<I, V>(expr: &str, values: I) -> Condition
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let values = values.into_iter().map(Into::into).collect();
    Condition::new(Operand::Expr(expr.to_string()), Operator::In, values)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AndOr {
    And,
    Or,
}

impl AndOr {
    pub fn as_str(&self) -> &'static str {
        match self {
            AndOr::And => "AND",
            AndOr::Or => "OR",
        }
    }
}

/// A parenthesized list of conditions joined by AND or OR
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGroup {
    pub conditions: Vec<Condition>,
    pub joiner: AndOr,
}

impl ConditionGroup {
    fn add_values(&self, params: &mut Vec<Value>) {
        for condition in &self.conditions {
            condition.add_values(params);
        }
    }
}

impl fmt::Display for ConditionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = format!(" {} ", self.joiner.as_str());
        let rendered: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
        write!(f, "({})", rendered.join(&separator))
    }
}

pub fn or_group(conditions: impl IntoIterator<Item = Condition>) -> ConditionGroup {
    ConditionGroup {
        conditions: conditions.into_iter().collect(),
        joiner: AndOr::Or,
    }
}

pub fn and_group(conditions: impl IntoIterator<Item = Condition>) -> ConditionGroup {
    ConditionGroup {
        conditions: conditions.into_iter().collect(),
        joiner: AndOr::And,
    }
}

/// Equality between two raw expressions, e.g. `a.id = b.a_id`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinDef {
    pub left: String,
    pub right: String,
}

impl fmt::Display for JoinDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

pub fn join(left: &str, right: &str) -> JoinDef {
    JoinDef {
        left: left.to_string(),
        right: right.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupDef {
    pub name: String,
}

impl fmt::Display for GroupDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.name))
    }
}

pub fn group_by(name: &str) -> GroupDef {
    GroupDef {
        name: name.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDef {
    pub name: String,
    pub direction: Direction,
}

impl fmt::Display for OrderDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", quote(&self.name), self.direction.as_str())
    }
}

pub fn ascending(name: &str) -> OrderDef {
    OrderDef {
        name: name.to_string(),
        direction: Direction::Ascending,
    }
}

pub fn descending(name: &str) -> OrderDef {
    OrderDef {
        name: name.to_string(),
        direction: Direction::Descending,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitDef {
    pub total: u32,
}

impl fmt::Display for LimitDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LIMIT {}", self.total)
    }
}

pub fn limit(total: u32) -> LimitDef {
    LimitDef { total }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeDef {
    pub offset: u32,
    pub count: u32,
}

impl fmt::Display for RangeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LIMIT {},{}", self.offset, self.count)
    }
}

pub fn range(offset: u32, count: u32) -> RangeDef {
    RangeDef { offset, count }
}

/// Any query fragment accepted by [`assemble`]
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Column(ColumnDef),
    Table(TableDef),
    Condition(Condition),
    Group(ConditionGroup),
    Join(JoinDef),
    GroupBy(GroupDef),
    OrderBy(OrderDef),
    Limit(LimitDef),
    Range(RangeDef),
}

macro_rules! into_fragment {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Fragment {
                fn from(v: $ty) -> Self {
                    Fragment::$variant(v)
                }
            }
        )*
    };
}

into_fragment! {
    ColumnDef => Column,
    TableDef => Table,
    Condition => Condition,
    ConditionGroup => Group,
    JoinDef => Join,
    GroupDef => GroupBy,
    OrderDef => OrderBy,
    LimitDef => Limit,
    RangeDef => Range,
}

/// Collect heterogeneous fragments into a `Vec<Fragment>`
#[macro_export]
macro_rules! fragments {
    ($($fragment:expr),* $(,)?) => {
        vec![$($crate::orm::query::Fragment::from($fragment)),*]
    };
}

#[derive(Default)]
struct Clauses {
    projection: Vec<String>,
    source: Vec<String>,
    predicate: Vec<String>,
    grouping: Vec<String>,
    ordering: Vec<String>,
    limiting: Option<String>,
}

/// Assemble fragments into SQL text and its ordered parameter list
pub fn assemble<I>(components: I) -> (String, Vec<Value>)
where
    I: IntoIterator<Item = Fragment>,
{
    let mut clauses = Clauses::default();
    let mut params = Vec::new();

    for component in components {
        match component {
            Fragment::Column(c) => clauses.projection.push(c.to_string()),
            Fragment::Table(t) => clauses.source.push(t.to_string()),
            Fragment::Condition(c) => {
                clauses.predicate.push(c.to_string());
                c.add_values(&mut params);
            }
            Fragment::Group(g) => {
                if g.conditions.is_empty() {
                    continue;
                }
                clauses.predicate.push(g.to_string());
                g.add_values(&mut params);
            }
            Fragment::Join(j) => clauses.predicate.push(j.to_string()),
            Fragment::GroupBy(g) => clauses.grouping.push(g.to_string()),
            Fragment::OrderBy(o) => clauses.ordering.push(o.to_string()),
            Fragment::Limit(l) => {
                clauses.limiting.get_or_insert_with(|| l.to_string());
            }
            Fragment::Range(r) => {
                clauses.limiting.get_or_insert_with(|| r.to_string());
            }
        }
    }

    let mut parts = Vec::new();
    if !clauses.projection.is_empty() {
        parts.push(format!("SELECT {}", clauses.projection.join(", ")));
    }
    if !clauses.source.is_empty() {
        parts.push(format!("FROM {}", clauses.source.join(", ")));
    }
    if !clauses.predicate.is_empty() {
        parts.push(format!("WHERE {}", clauses.predicate.join(" AND ")));
    }
    if !clauses.grouping.is_empty() {
        parts.push(format!("GROUP BY {}", clauses.grouping.join(", ")));
    }
    if !clauses.ordering.is_empty() {
        parts.push(format!("ORDER BY {}", clauses.ordering.join(", ")));
    }
    if let Some(limiting) = clauses.limiting {
        parts.push(limiting);
    }

    (parts.join(" ").trim().to_string(), params)
}

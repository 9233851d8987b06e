//! Nested boolean filter expressions.
//!
//! The root holds conditions and groups; groups hold only conditions, so
//! the expression is at most one level deep by construction. Expressions
//! render to a SOQL `WHERE` clause body.

mod error;

pub use error::ExpressionError;

use lazy_static::lazy_static;
use log::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Identity of a condition or group, unique within one expression.
pub type NodeKey = u64;

/// How sibling nodes combine.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    And,
    Or,
}

impl Default for Logic {
    fn default() -> Self {
        Logic::And
    }
}

impl Logic {
    fn keyword(&self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }
}

/// Comparison applied by a condition.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
    Contains,
    StartsWith,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl Default for Operator {
    fn default() -> Self {
        Operator::Equals
    }
}

/// A single comparison of a field against a value.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub key: NodeKey,
    /// Field path the condition filters on, e.g. `Owner.Name`.
    pub resource_selection: String,
    pub operator: Operator,
    pub value: String,
}

impl Condition {
    fn new(key: NodeKey) -> Self {
        Condition {
            key,
            ..Condition::default()
        }
    }

    fn is_blank(&self) -> bool {
        self.resource_selection.trim().is_empty()
    }
}

/// Conditions combined under one logic operator.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub key: NodeKey,
    pub action: Logic,
    pub rows: Vec<Condition>,
}

/// Top-level entry of an expression.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Node {
    Condition(Condition),
    Group(Group),
}

impl Node {
    pub fn key(&self) -> NodeKey {
        match self {
            Node::Condition(c) => c.key,
            Node::Group(g) => g.key,
        }
    }
}

/// A filter expression under construction.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expression {
    #[serde(default)]
    next_key: NodeKey,
    pub action: Logic,
    pub rows: Vec<Node>,
}

impl Expression {
    pub fn new() -> Self {
        Expression::default()
    }

    fn allocate(&mut self) -> NodeKey {
        // Deserialized expressions may carry keys beyond the stored counter.
        let max = self
            .rows
            .iter()
            .flat_map(|n| match n {
                Node::Condition(c) => vec![c.key],
                Node::Group(g) => std::iter::once(g.key)
                    .chain(g.rows.iter().map(|c| c.key))
                    .collect(),
            })
            .max();
        let key = match max {
            Some(max) => self.next_key.max(max + 1),
            None => self.next_key,
        };
        self.next_key = key + 1;
        key
    }

    fn group_mut(&mut self, key: NodeKey) -> Result<&mut Group, ExpressionError> {
        if !self.contains(key) {
            return Err(ExpressionError::NodeNotFound(key));
        }
        self.rows
            .iter_mut()
            .find_map(|n| match n {
                Node::Group(g) if g.key == key => Some(g),
                _ => None,
            })
            .ok_or(ExpressionError::GroupNotFound(key))
    }

    /// Whether any node carries the key.
    ///
    pub fn contains(&self, key: NodeKey) -> bool {
        self.condition(key).is_some() || self.rows.iter().any(|n| n.key() == key)
    }

    /// Find a condition at either level.
    ///
    pub fn condition(&self, key: NodeKey) -> Option<&Condition> {
        self.rows.iter().find_map(|n| match n {
            Node::Condition(c) if c.key == key => Some(c),
            Node::Group(g) => g.rows.iter().find(|c| c.key == key),
            _ => None,
        })
    }

    fn condition_mut(&mut self, key: NodeKey) -> Option<&mut Condition> {
        self.rows.iter_mut().find_map(|n| match n {
            Node::Condition(c) if c.key == key => Some(c),
            Node::Group(g) => g.rows.iter_mut().find(|c| c.key == key),
            _ => None,
        })
    }

    /// Append an empty condition to the root or to a group.
    ///
    pub fn add_condition(&mut self, group: Option<NodeKey>) -> Result<NodeKey, ExpressionError> {
        if let Some(group) = group {
            self.group_mut(group)?;
        }
        let key = self.allocate();
        match group {
            Some(group) => self.group_mut(group)?.rows.push(Condition::new(key)),
            None => self.rows.push(Node::Condition(Condition::new(key))),
        }
        Ok(key)
    }

    /// Append a group holding one empty condition and return the group key.
    ///
    pub fn add_group(&mut self) -> NodeKey {
        let key = self.allocate();
        let condition = self.allocate();
        self.rows.push(Node::Group(Group {
            key,
            action: Logic::Or,
            rows: vec![Condition::new(condition)],
        }));
        key
    }

    pub fn update_condition(
        &mut self,
        key: NodeKey,
        resource_selection: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Result<(), ExpressionError> {
        let exists = self.contains(key);
        let condition = self.condition_mut(key).ok_or(if exists {
            ExpressionError::NotACondition(key)
        } else {
            ExpressionError::NodeNotFound(key)
        })?;
        condition.resource_selection = resource_selection.into();
        condition.operator = operator;
        condition.value = value.into();
        Ok(())
    }

    /// Set the logic of the root (`None`) or of a group.
    ///
    pub fn set_action(&mut self, group: Option<NodeKey>, logic: Logic) -> Result<(), ExpressionError> {
        match group {
            Some(group) => self.group_mut(group)?.action = logic,
            None => self.action = logic,
        }
        Ok(())
    }

    /// Remove a condition or a whole group. A group left without conditions
    /// is removed too.
    ///
    pub fn remove(&mut self, key: NodeKey) -> Result<(), ExpressionError> {
        self.detach(key)?;
        self.prune();
        Ok(())
    }

    fn detach(&mut self, key: NodeKey) -> Result<Node, ExpressionError> {
        if let Some(index) = self.rows.iter().position(|n| n.key() == key) {
            return Ok(self.rows.remove(index));
        }
        for node in self.rows.iter_mut() {
            if let Node::Group(g) = node {
                if let Some(index) = g.rows.iter().position(|c| c.key == key) {
                    return Ok(Node::Condition(g.rows.remove(index)));
                }
            }
        }
        Err(ExpressionError::NodeNotFound(key))
    }

    fn prune(&mut self) {
        self.rows.retain(|n| match n {
            Node::Group(g) => !g.rows.is_empty(),
            Node::Condition(_) => true,
        });
    }

    /// Move a node to `index` within the root (`None`) or a group. Groups
    /// can only move within the root.
    ///
    pub fn move_node(
        &mut self,
        key: NodeKey,
        target: Option<NodeKey>,
        index: usize,
    ) -> Result<(), ExpressionError> {
        let is_group = self
            .rows
            .iter()
            .any(|n| matches!(n, Node::Group(g) if g.key == key));
        if !self.contains(key) {
            return Err(ExpressionError::NodeNotFound(key));
        }
        if let Some(target) = target {
            if is_group {
                return Err(ExpressionError::NestingTooDeep(key));
            }
            self.group_mut(target)?;
        }

        let node = self.detach(key)?;
        match (target, node) {
            (None, node) => {
                let index = index.min(self.rows.len());
                self.rows.insert(index, node);
            }
            (Some(target), Node::Condition(condition)) => {
                let group = self.group_mut(target)?;
                let index = index.min(group.rows.len());
                group.rows.insert(index, condition);
            }
            (Some(_), Node::Group(group)) => return Err(ExpressionError::NestingTooDeep(group.key)),
        }
        self.prune();
        Ok(())
    }

    /// Render the expression as the body of a SOQL `WHERE` clause. Blank
    /// conditions are skipped; an expression without any renders empty.
    ///
    pub fn to_soql(&self) -> String {
        let parts: Vec<String> = self
            .rows
            .iter()
            .filter_map(|node| match node {
                Node::Condition(c) => render_condition(c),
                Node::Group(g) => {
                    let inner: Vec<String> = g.rows.iter().filter_map(render_condition).collect();
                    match inner.len() {
                        0 => None,
                        1 => inner.into_iter().next(),
                        _ => {
                            let separator = format!(" {} ", g.action.keyword());
                            Some(format!("({})", inner.join(separator.as_str())))
                        }
                    }
                }
            })
            .collect();
        let separator = format!(" {} ", self.action.keyword());
        let soql = parts.join(separator.as_str());
        trace!("Rendered filter expression: {}", soql);
        soql
    }
}

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?$").unwrap();
    static ref DATE: Regex =
        Regex::new(r"^\d{4}-\d{2}-\d{2}(T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2}))?$").unwrap();
    static ref DATE_LITERAL: Regex =
        Regex::new(r"^(TODAY|YESTERDAY|TOMORROW|(LAST|THIS|NEXT)_[A-Z_]+(:\d+)?|N_[A-Z_]+:\d+)$")
            .unwrap();
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Escape a value for use inside a `LIKE` pattern.
fn escape_like(value: &str) -> String {
    escape(value).replace('%', "\\%").replace('_', "\\_")
}

/// Plain decimals without leading zeros, booleans, `null`, ISO dates and
/// date literals such as `TODAY` or `LAST_N_DAYS:30` are emitted bare.
/// A value wrapped in single quotes is always text, so `'00123'` or `'42'`
/// can be compared against text fields. Everything else is quoted.
fn literal(value: &str) -> String {
    let value = value.trim();
    if let Some(text) = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
    {
        return format!("'{}'", escape(text));
    }
    let bare = NUMBER.is_match(value)
        || ["true", "false", "null"].contains(&value.to_lowercase().as_str())
        || DATE.is_match(value)
        || DATE_LITERAL.is_match(value);
    if bare {
        value.to_string()
    } else {
        format!("'{}'", escape(value))
    }
}

/// Blank out parenthesized sections and quoted strings, keeping byte
/// offsets, so keyword searches only see the outermost query.
///
pub fn mask_nested(soql: &str) -> String {
    let mut masked = String::with_capacity(soql.len());
    let mut depth = 0usize;
    let mut quoted = false;
    let mut escaped = false;
    for c in soql.chars() {
        let hidden = if quoted {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '\'' {
                quoted = false;
            }
            true
        } else {
            match c {
                '\'' => {
                    quoted = true;
                    true
                }
                '(' => {
                    depth += 1;
                    true
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    true
                }
                _ => depth > 0,
            }
        };
        if hidden {
            masked.extend(std::iter::repeat(' ').take(c.len_utf8()));
        } else {
            masked.push(c);
        }
    }
    masked
}

fn list(value: &str) -> String {
    let items: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(literal)
        .collect();
    format!("({})", items.join(", "))
}

fn render_condition(condition: &Condition) -> Option<String> {
    if condition.is_blank() {
        return None;
    }
    let field = condition.resource_selection.trim();
    let value = condition.value.as_str();
    let rendered = match condition.operator {
        Operator::Equals => format!("{} = {}", field, literal(value)),
        Operator::NotEquals => format!("{} != {}", field, literal(value)),
        Operator::LessThan => format!("{} < {}", field, literal(value)),
        Operator::GreaterThan => format!("{} > {}", field, literal(value)),
        Operator::LessOrEqual => format!("{} <= {}", field, literal(value)),
        Operator::GreaterOrEqual => format!("{} >= {}", field, literal(value)),
        Operator::Contains => format!("{} LIKE '%{}%'", field, escape_like(value)),
        Operator::StartsWith => format!("{} LIKE '{}%'", field, escape_like(value)),
        Operator::In => format!("{} IN {}", field, list(value)),
        Operator::NotIn => format!("{} NOT IN {}", field, list(value)),
        Operator::IsNull => format!("{} = null", field),
        Operator::IsNotNull => format!("{} != null", field),
    };
    Some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Expression, NodeKey, NodeKey, NodeKey) {
        let mut expression = Expression::new();
        let industry = expression.add_condition(None).unwrap();
        expression
            .update_condition(industry, "Industry", Operator::Equals, "Banking")
            .unwrap();
        let group = expression.add_group();
        let first = match &expression.rows[1] {
            Node::Group(g) => g.rows[0].key,
            _ => unreachable!(),
        };
        expression
            .update_condition(first, "AnnualRevenue", Operator::GreaterThan, "1000000")
            .unwrap();
        let second = expression.add_condition(Some(group)).unwrap();
        expression
            .update_condition(second, "Rating", Operator::Equals, "Hot")
            .unwrap();
        (expression, industry, group, second)
    }

    #[test]
    fn test_to_soql_renders_groups() {
        let (expression, _, _, _) = sample();
        assert_eq!(
            expression.to_soql(),
            "Industry = 'Banking' AND (AnnualRevenue > 1000000 OR Rating = 'Hot')"
        );
    }

    #[test]
    fn test_to_soql_quotes_and_literals() {
        let mut expression = Expression::new();
        expression.set_action(None, Logic::Or).unwrap();
        for (field, operator, value) in [
            ("Name", Operator::Contains, "O'Brien"),
            ("CloseDate", Operator::GreaterOrEqual, "LAST_N_DAYS:30"),
            ("CreatedDate", Operator::LessThan, "2024-01-31T00:00:00Z"),
            ("IsDeleted", Operator::Equals, "false"),
            ("StageName", Operator::In, "Prospecting, Closed Won"),
            ("ParentId", Operator::IsNull, ""),
        ] {
            let key = expression.add_condition(None).unwrap();
            expression.update_condition(key, field, operator, value).unwrap();
        }
        expression.add_condition(None).unwrap();
        assert_eq!(
            expression.to_soql(),
            "Name LIKE '%O\\'Brien%' OR CloseDate >= LAST_N_DAYS:30 OR \
             CreatedDate < 2024-01-31T00:00:00Z OR IsDeleted = false OR \
             StageName IN ('Prospecting', 'Closed Won') OR ParentId = null"
        );
    }

    fn render(field: &str, operator: Operator, value: &str) -> String {
        let mut expression = Expression::new();
        let key = expression.add_condition(None).unwrap();
        expression.update_condition(key, field, operator, value).unwrap();
        expression.to_soql()
    }

    #[test]
    fn test_to_soql_bare_values_follow_soql_numbers() {
        assert_eq!(render("Amount", Operator::GreaterThan, "1500.50"), "Amount > 1500.50");
        assert_eq!(render("Amount", Operator::LessThan, "-3"), "Amount < -3");
        assert_eq!(
            render("AccountNumber", Operator::Equals, "00123"),
            "AccountNumber = '00123'"
        );
        assert_eq!(render("Name", Operator::Equals, "NaN"), "Name = 'NaN'");
        assert_eq!(render("Name", Operator::Equals, "inf"), "Name = 'inf'");
        assert_eq!(render("Code__c", Operator::Equals, "1e5"), "Code__c = '1e5'");
    }

    #[test]
    fn test_to_soql_quoted_values_stay_text() {
        assert_eq!(render("Code__c", Operator::Equals, "'42'"), "Code__c = '42'");
        assert_eq!(render("Name", Operator::Equals, "'true'"), "Name = 'true'");
        assert_eq!(
            render("Name", Operator::In, "'7', 8"),
            "Name IN ('7', 8)"
        );
    }

    #[test]
    fn test_to_soql_escapes_like_wildcards() {
        assert_eq!(
            render("Name", Operator::Contains, "50%_off"),
            "Name LIKE '%50\\%\\_off%'"
        );
        assert_eq!(
            render("Name", Operator::StartsWith, "a_b"),
            "Name LIKE 'a\\_b%'"
        );
    }

    #[test]
    fn test_mask_nested_keeps_offsets() {
        let soql = "SELECT Id, (SELECT Id FROM Notes) FROM Café WHERE Name = 'x (y)'";
        let masked = mask_nested(soql);
        assert_eq!(masked.len(), soql.len());
        assert!(!masked.contains("Notes"));
        assert!(!masked.contains("x (y)"));
        assert!(masked.contains("FROM Café WHERE Name ="));
    }

    #[test]
    fn test_empty_expression_renders_empty() {
        assert_eq!(Expression::new().to_soql(), "");
    }

    #[test]
    fn test_remove_last_condition_drops_group() {
        let (mut expression, _, group, second) = sample();
        let first = expression.rows.iter().find_map(|n| match n {
            Node::Group(g) => Some(g.rows[0].key),
            _ => None,
        });
        expression.remove(second).unwrap();
        assert!(expression.contains(group));
        expression.remove(first.unwrap()).unwrap();
        assert!(!expression.contains(group));
        assert_eq!(expression.rows.len(), 1);
    }

    #[test]
    fn test_move_condition_into_group_and_back() {
        let (mut expression, industry, group, _) = sample();
        expression.move_node(industry, Some(group), 0).unwrap();
        assert_eq!(expression.rows.len(), 1);
        match &expression.rows[0] {
            Node::Group(g) => assert_eq!(g.rows[0].key, industry),
            _ => panic!("expected group"),
        }

        expression.move_node(industry, None, 5).unwrap();
        assert_eq!(expression.rows.last().map(Node::key), Some(industry));
    }

    #[test]
    fn test_move_group_into_group_is_rejected() {
        let (mut expression, _, group, _) = sample();
        let other = expression.add_group();
        assert_eq!(
            expression.move_node(group, Some(other), 0),
            Err(ExpressionError::NestingTooDeep(group))
        );
        expression.move_node(other, None, 0).unwrap();
        assert_eq!(expression.rows[0].key(), other);
    }

    #[test]
    fn test_moving_sole_condition_out_removes_group() {
        let mut expression = Expression::new();
        let group = expression.add_group();
        let only = match &expression.rows[0] {
            Node::Group(g) => g.rows[0].key,
            _ => unreachable!(),
        };
        expression.move_node(only, None, 0).unwrap();
        assert!(!expression.contains(group));
        assert!(expression.condition(only).is_some());
    }

    #[test]
    fn test_unknown_keys_are_errors() {
        let (mut expression, industry, _, _) = sample();
        assert_eq!(expression.remove(99), Err(ExpressionError::NodeNotFound(99)));
        assert_eq!(
            expression.add_condition(Some(industry)),
            Err(ExpressionError::GroupNotFound(industry))
        );
        assert_eq!(
            expression.set_action(Some(42), Logic::Or),
            Err(ExpressionError::NodeNotFound(42))
        );
    }

    #[test]
    fn test_update_group_key_is_not_a_condition() {
        let (mut expression, _, group, _) = sample();
        assert_eq!(
            expression.update_condition(group, "Name", Operator::Equals, "x"),
            Err(ExpressionError::NotACondition(group))
        );
    }

    #[test]
    fn test_deserialized_expression_allocates_fresh_keys() {
        let (expression, _, _, _) = sample();
        let json = serde_json::to_string(&expression).unwrap();
        let mut json: serde_json::Value = serde_json::from_str(&json).unwrap();
        json.as_object_mut().unwrap().remove("nextKey");
        let mut restored: Expression = serde_json::from_value(json).unwrap();
        assert_eq!(restored.to_soql(), expression.to_soql());

        let key = restored.add_condition(None).unwrap();
        assert!(key > 3);
    }
}

use serde_json::Value;

use super::error::ClauseError;

/// A SQL sub-expression with positional `$1..$n` placeholders and the
/// parameters they bind, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    pub clause: String,
    pub params: Vec<Value>,
}

impl SqlFragment {
    pub fn empty() -> Self {
        Self {
            clause: String::new(),
            params: vec![],
        }
    }
}

/// One recognized predicate shape for a WHERE clause.
///
/// `Positive` renders to a comparison against a literal zero and binds no
/// parameter; the other variants each consume exactly one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCond {
    /// `<column> ILIKE '%' || $n || '%'`
    Contains {
        column: &'static str,
        value: Value,
    },
    /// `<column> >= $n`
    AtLeast {
        column: &'static str,
        value: Value,
    },
    /// `<column> <= $n`
    AtMost {
        column: &'static str,
        value: Value,
    },
    /// `<column> > 0`, parameterless
    Positive { column: &'static str },
}

/// Build the assignment list for a partial UPDATE.
///
/// `data` pairs logical field names with their new values; iteration order
/// fixes both placeholder numbering and parameter order. `columns` maps
/// logical names to physical column names; a field with no entry is used
/// verbatim.
///
/// Fails with [`ClauseError::NoData`] when `data` is empty.
pub fn set_clause(
    data: &[(&str, Value)],
    columns: &[(&str, &str)],
) -> Result<SqlFragment, ClauseError> {
    if data.is_empty() {
        return Err(ClauseError::NoData);
    }

    let mut assignments = Vec::with_capacity(data.len());
    let mut params = Vec::with_capacity(data.len());

    for (field, value) in data {
        let column = columns
            .iter()
            .find(|(logical, _)| logical == field)
            .map(|(_, physical)| *physical)
            .unwrap_or(*field);
        params.push(value.clone());
        assignments.push(format!("\"{}\"=${}", column, params.len()));
    }

    Ok(SqlFragment {
        clause: assignments.join(", "),
        params,
    })
}

/// Build a WHERE clause from an already-filtered condition list.
///
/// Callers drop absent keys (and false boolean flags) before calling this,
/// and placeholder indices are assigned here as each condition is rendered.
/// Only value-binding conditions consume an index, so a dropped or
/// parameterless condition never leaves a numbering gap.
///
/// An empty condition list yields an empty fragment, not an error.
pub fn where_clause(conds: Vec<FilterCond>) -> SqlFragment {
    if conds.is_empty() {
        return SqlFragment::empty();
    }

    let mut predicates = Vec::with_capacity(conds.len());
    let mut params = Vec::new();

    for cond in conds {
        match cond {
            FilterCond::Contains { column, value } => {
                params.push(value);
                predicates.push(format!("{} ILIKE '%' || ${} || '%'", column, params.len()));
            }
            FilterCond::AtLeast { column, value } => {
                params.push(value);
                predicates.push(format!("{} >= ${}", column, params.len()));
            }
            FilterCond::AtMost { column, value } => {
                params.push(value);
                predicates.push(format!("{} <= ${}", column, params.len()));
            }
            FilterCond::Positive { column } => {
                predicates.push(format!("{} > 0", column));
            }
        }
    }

    SqlFragment {
        clause: format!("WHERE {}", predicates.join(" AND ")),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn placeholder_count(clause: &str) -> usize {
        clause.matches('$').count()
    }

    #[test]
    fn set_clause_maps_and_numbers_fields() {
        let frag = set_clause(
            &[
                ("firstName", json!("Test")),
                ("lastName", json!("Tester")),
                ("password", json!("password")),
                ("email", json!("test@test.com")),
            ],
            &[("firstName", "first_name"), ("lastName", "last_name")],
        )
        .unwrap();

        assert_eq!(
            frag.clause,
            "\"first_name\"=$1, \"last_name\"=$2, \"password\"=$3, \"email\"=$4"
        );
        assert_eq!(
            frag.params,
            vec![
                json!("Test"),
                json!("Tester"),
                json!("password"),
                json!("test@test.com")
            ]
        );
    }

    #[test]
    fn set_clause_falls_back_to_logical_name() {
        let frag = set_clause(&[("name", json!("Acme"))], &[("logoUrl", "logo_url")]).unwrap();
        assert_eq!(frag.clause, "\"name\"=$1");
        assert_eq!(frag.params, vec![json!("Acme")]);
    }

    #[test]
    fn set_clause_placeholders_match_values() {
        let frag = set_clause(
            &[("a", json!(1)), ("b", json!(true)), ("c", json!(null))],
            &[],
        )
        .unwrap();
        assert_eq!(placeholder_count(&frag.clause), frag.params.len());
        assert_eq!(frag.params.len(), 3);
    }

    #[test]
    fn set_clause_rejects_empty_data() {
        let err = set_clause(&[], &[("firstName", "first_name")]).unwrap_err();
        assert_eq!(err, ClauseError::NoData);
    }

    #[test]
    fn where_clause_empty_is_not_an_error() {
        let frag = where_clause(vec![]);
        assert_eq!(frag.clause, "");
        assert!(frag.params.is_empty());
    }

    #[test]
    fn where_clause_contains_only() {
        let frag = where_clause(vec![FilterCond::Contains {
            column: "name",
            value: json!("c1"),
        }]);
        assert_eq!(frag.clause, "WHERE name ILIKE '%' || $1 || '%'");
        assert_eq!(frag.params, vec![json!("c1")]);
    }

    #[test]
    fn where_clause_mixes_bound_and_parameterless() {
        let frag = where_clause(vec![
            FilterCond::Contains {
                column: "title",
                value: json!("j"),
            },
            FilterCond::AtLeast {
                column: "salary",
                value: json!(20000),
            },
            FilterCond::Positive { column: "equity" },
        ]);
        assert_eq!(
            frag.clause,
            "WHERE title ILIKE '%' || $1 || '%' AND salary >= $2 AND equity > 0"
        );
        assert_eq!(frag.params, vec![json!("j"), json!(20000)]);
    }

    #[test]
    fn where_clause_never_skips_an_index() {
        // A parameterless condition in the middle must not perturb numbering.
        let frag = where_clause(vec![
            FilterCond::AtLeast {
                column: "salary",
                value: json!(1),
            },
            FilterCond::Positive { column: "equity" },
            FilterCond::AtMost {
                column: "salary",
                value: json!(9),
            },
        ]);
        assert_eq!(
            frag.clause,
            "WHERE salary >= $1 AND equity > 0 AND salary <= $2"
        );
        assert_eq!(placeholder_count(&frag.clause), frag.params.len());
    }

    #[test]
    fn where_clause_bounds_pair() {
        let frag = where_clause(vec![
            FilterCond::AtLeast {
                column: "num_employees",
                value: json!(2),
            },
            FilterCond::AtMost {
                column: "num_employees",
                value: json!(5),
            },
        ]);
        assert_eq!(
            frag.clause,
            "WHERE num_employees >= $1 AND num_employees <= $2"
        );
        assert_eq!(frag.params, vec![json!(2), json!(5)]);
    }
}

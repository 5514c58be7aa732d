//! Criterion to Elasticsearch Query DSL compilation.
//!
//! [`QueryCompiler`] walks a [`Criterion`] tree and produces the engine query.
//! Boolean combinators map onto `bool` clauses; every leaf is resolved in the
//! [`FieldTypeRegistry`] and built by the handler of its declared type.

pub mod handlers;
mod multi_field;
mod sort;

pub use multi_field::multi_field_criterion;
pub use sort::{compile_sort, tie_breakers};

use serde_json::{Value, json};

use crate::criterion::Criterion;
use crate::error::CompileError;
use crate::registry::FieldTypeRegistry;

use handlers::{FieldRef, RangeOp, match_all, match_none, negate};

/// Compiles criteria against one index's field declarations.
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'a> {
    registry: &'a FieldTypeRegistry,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(registry: &'a FieldTypeRegistry) -> Self {
        Self { registry }
    }

    /// Compiles a criterion tree into a query clause.
    ///
    /// Nothing is sent to the engine when this fails.
    pub fn compile(&self, criterion: &Criterion) -> Result<Value, CompileError> {
        match criterion {
            Criterion::All => Ok(match_all()),
            Criterion::And(children) => {
                if children.is_empty() {
                    return Ok(match_all());
                }
                let clauses = self.compile_all(children)?;
                Ok(json!({ "bool": { "must": clauses } }))
            }
            Criterion::Or(children) => {
                if children.is_empty() {
                    return Ok(match_none());
                }
                let clauses = self.compile_all(children)?;
                Ok(json!({ "bool": { "should": clauses, "minimum_should_match": 1 } }))
            }
            Criterion::Not(child) => Ok(negate(self.compile(child)?)),
            Criterion::Eq {
                field,
                value,
                tolerance,
                match_type,
            } => self.field(field)?.eq(value, *tolerance, *match_type),
            Criterion::Ne {
                field,
                value,
                tolerance,
                match_type,
            } => Ok(negate(self.field(field)?.eq(value, *tolerance, *match_type)?)),
            Criterion::Gt { field, value } => self.field(field)?.compare(RangeOp::Gt, value),
            Criterion::Ge { field, value } => self.field(field)?.compare(RangeOp::Ge, value),
            Criterion::Lt { field, value } => self.field(field)?.compare(RangeOp::Lt, value),
            Criterion::Le { field, value } => self.field(field)?.compare(RangeOp::Le, value),
            Criterion::Between {
                field,
                lower,
                upper,
            } => self.field(field)?.between(lower, upper),
            Criterion::In {
                field,
                values,
                tolerance,
                match_type,
            } => self.field(field)?.any_of(values, *tolerance, *match_type),
            Criterion::StartsWith {
                field,
                text,
                match_type,
            } => self.field(field)?.starts_with(text, *match_type),
            Criterion::EndsWith {
                field,
                text,
                match_type,
            } => self.field(field)?.ends_with(text, *match_type),
            Criterion::Contains {
                field,
                value,
                tolerance,
            } => self.field(field)?.contains(value, *tolerance),
            Criterion::ContainsDateBetween { field, start, end } => {
                self.field(field)?.contains_date_between(*start, *end)
            }
            Criterion::Into { field, value } => self.field(field)?.into_range(value),
            Criterion::Intersects {
                field,
                lower,
                upper,
            } => self.field(field)?.intersects(lower, upper),
            Criterion::Exists { field } => Ok(self.field(field)?.exists()),
            Criterion::Regexp {
                field,
                pattern,
                match_type,
            } => self.field(field)?.regexp(pattern, *match_type),
        }
    }

    fn compile_all(&self, children: &[Criterion]) -> Result<Vec<Value>, CompileError> {
        children.iter().map(|c| self.compile(c)).collect()
    }

    fn field<'p>(&self, path: &'p str) -> Result<FieldRef<'p>, CompileError>
    where
        'a: 'p,
    {
        let def = self.registry.resolve(path)?;
        Ok(FieldRef::new(path, def))
    }
}

use crate::types::value::Value;

/// A single-table `SELECT`, reduced to what the b-tree engine can answer.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectPlan {
    pub table_name: String,
    pub projection: Projection,
    pub filter: Option<EqualityFilter>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Columns(Vec<String>),
    Wildcard,
    /// `COUNT(*)`
    CountRows,
}

/// `column = literal`
#[derive(Debug, Clone, PartialEq)]
pub struct EqualityFilter {
    pub column: String,
    pub value: Value,
}

impl SelectPlan {
    pub fn is_count(&self) -> bool {
        self.projection == Projection::CountRows
    }
}

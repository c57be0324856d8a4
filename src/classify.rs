// Column classification: declared types -> semantic kinds

use crate::data::{DeclaredType, Schema};

/// Semantic category of a column, as used by the plot planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numerical,
    Categorical,
}

impl ColumnKind {
    /// Map a declared type to a kind. Booleans and empty columns have no kind.
    pub fn of(declared: DeclaredType) -> Option<Self> {
        match declared {
            DeclaredType::Integer | DeclaredType::Float => Some(ColumnKind::Numerical),
            DeclaredType::Text => Some(ColumnKind::Categorical),
            DeclaredType::Boolean | DeclaredType::Empty => None,
        }
    }
}

/// A column reference carried by plot requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Numerical and categorical columns, each in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub numerical: Vec<ColumnDescriptor>,
    pub categorical: Vec<ColumnDescriptor>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.numerical.is_empty() && self.categorical.is_empty()
    }
}

/// Partition the schema's columns into numerical and categorical sequences.
///
/// Columns of any other type are left out.
pub fn classify(schema: &Schema) -> Classification {
    let mut classification = Classification::default();

    for column in schema.columns() {
        match ColumnKind::of(column.declared) {
            Some(kind @ ColumnKind::Numerical) => classification
                .numerical
                .push(ColumnDescriptor::new(column.name.clone(), kind)),
            Some(kind @ ColumnKind::Categorical) => classification
                .categorical
                .push(ColumnDescriptor::new(column.name.clone(), kind)),
            None => {}
        }
    }

    classification
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(columns: &[ColumnDescriptor]) -> Vec<&str> {
        columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_classify_mixed_schema() {
        let schema = Schema::from_pairs([
            ("age", DeclaredType::Integer),
            ("city", DeclaredType::Text),
            ("income", DeclaredType::Float),
            ("name", DeclaredType::Text),
        ]);
        let c = classify(&schema);
        assert_eq!(names(&c.numerical), vec!["age", "income"]);
        assert_eq!(names(&c.categorical), vec!["city", "name"]);
        assert!(c.numerical.iter().all(|d| d.kind == ColumnKind::Numerical));
        assert!(c.categorical.iter().all(|d| d.kind == ColumnKind::Categorical));
    }

    #[test]
    fn test_classify_excludes_unsupported() {
        let schema = Schema::from_pairs([
            ("flag", DeclaredType::Boolean),
            ("blank", DeclaredType::Empty),
            ("x", DeclaredType::Float),
        ]);
        let c = classify(&schema);
        assert_eq!(names(&c.numerical), vec!["x"]);
        assert!(c.categorical.is_empty());
    }

    #[test]
    fn test_classify_empty_schema() {
        let c = classify(&Schema::default());
        assert!(c.is_empty());
    }

    #[test]
    fn test_classify_is_deterministic() {
        let schema = Schema::from_pairs([
            ("b", DeclaredType::Integer),
            ("a", DeclaredType::Text),
            ("c", DeclaredType::Integer),
        ]);
        assert_eq!(classify(&schema), classify(&schema));
    }
}

// Plot selection parser
//
// Grammar:
//   selection := kind ( "(" column ( "," column )* ")" )?
//   column    := bare_column | string_literal

use super::lexer::{bare_column, identifier, string_literal, ws};
use crate::error::PlanError;
use crate::plan::{PlotKind, PlotSelection};
use nom::{
    branch::alt,
    character::complete::char,
    combinator::{eof, opt},
    multi::separated_list0,
    sequence::delimited,
    IResult,
};

/// Parse a column reference, quoted or bare
fn parse_column(input: &str) -> IResult<&str, String> {
    alt((string_literal, bare_column))(input)
}

/// Parse the raw parts of a selection: kind name and column list
/// Format: histogram(age) or scatter(age, "annual income") or pairplot
pub fn parse_selection(input: &str) -> IResult<&str, (String, Vec<String>)> {
    let (input, kind) = ws(identifier)(input)?;
    let (input, columns) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), ws(parse_column)),
        ws(char(')')),
    ))(input)?;
    let (input, _) = ws(eof)(input)?;

    Ok((input, (kind, columns.unwrap_or_default())))
}

/// Parse and validate a plot selection string
pub fn parse_plot_selection(input: &str) -> Result<PlotSelection, PlanError> {
    let (kind, columns) = match parse_selection(input) {
        Ok((_, parts)) => parts,
        Err(e) => {
            return Err(PlanError::InvalidSelection(format!(
                "could not parse '{}': {}",
                input.trim(),
                e
            )))
        }
    };

    let kind: PlotKind = kind.parse()?;
    let selection = PlotSelection::new(kind, columns);
    selection.validate()?;
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_histogram() {
        let selection = parse_plot_selection("histogram(age)").unwrap();
        assert_eq!(selection.kind, PlotKind::Histogram);
        assert_eq!(selection.columns, vec!["age"]);
    }

    #[test]
    fn test_parse_scatter_with_quoted_column() {
        let selection = parse_plot_selection(r#" scatter( age , "annual income" ) "#).unwrap();
        assert_eq!(selection.kind, PlotKind::Scatter);
        assert_eq!(selection.columns, vec!["age", "annual income"]);
    }

    #[test]
    fn test_parse_bare_kind() {
        let selection = parse_plot_selection("pairplot").unwrap();
        assert_eq!(selection.kind, PlotKind::Pairplot);
        assert!(selection.columns.is_empty());
    }

    #[test]
    fn test_parse_alias() {
        let selection = parse_plot_selection("pie(city)").unwrap();
        assert_eq!(selection.kind, PlotKind::PieChart);
        let selection = parse_plot_selection("heatmap()").unwrap();
        assert_eq!(selection.kind, PlotKind::CorrelationHeatmap);
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = parse_plot_selection("violin(age)").unwrap_err();
        assert!(err.to_string().contains("unknown plot kind"));
    }

    #[test]
    fn test_parse_wrong_arity() {
        let err = parse_plot_selection("scatter(age)").unwrap_err();
        assert!(matches!(err, PlanError::InvalidSelection(_)));
    }

    #[test]
    fn test_parse_trailing_garbage() {
        assert!(parse_plot_selection("histogram(age) extra").is_err());
        assert!(parse_plot_selection("histogram(age").is_err());
    }
}

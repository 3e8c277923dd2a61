use winnow::prelude::*;
use winnow::ascii::{line_ending, space0, space1, till_line_ending};
use winnow::combinator::{alt, eof, opt, repeat};
use winnow::token::{take_till, take_while};

use crate::diagram::*;
use crate::error::{CatalogError, error_context, error_line};

/// A catalog as written in the source text, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDecl {
    pub name: String,
    pub default: Option<String>,
    pub diagrams: Vec<Diagram>,
}

pub fn parse_catalog(input: &str) -> Result<CatalogDecl, CatalogError> {
    let mut rest = input;
    catalog_decl(&mut rest).map_err(|_| CatalogError::Syntax {
        line: error_line(input, rest),
        context: error_context(rest),
    })
}

fn catalog_decl(input: &mut &str) -> winnow::Result<CatalogDecl> {
    skip_trivia(input)?;
    space0.parse_next(input)?;
    "catalog".parse_next(input)?;
    space1.parse_next(input)?;
    let name = identifier.parse_next(input)?.to_string();
    end_of_line.parse_next(input)?;

    let mut default = None;
    let mut diagrams = Vec::new();
    loop {
        skip_trivia(input)?;
        if input.is_empty() {
            break;
        }
        // Diagram blocks rewind to their own failing line, so only the
        // single-line items are rewound here.
        if input.trim_start().starts_with("diagram") {
            diagrams.push(diagram_block.parse_next(input)?);
            continue;
        }
        let start = *input;
        match default_line.parse_next(input) {
            Ok(id) => default = Some(id),
            Err(e) => {
                *input = start;
                return Err(e);
            }
        }
    }

    Ok(CatalogDecl {
        name,
        default,
        diagrams,
    })
}

#[derive(Debug)]
enum DiagramLine {
    Summary(String),
    Node(DiagramNode),
    Edge(DiagramEdge),
}

/// Consume blank lines and `#` comments.
fn skip_trivia(input: &mut &str) -> winnow::Result<()> {
    loop {
        let line = input.lines().next().unwrap_or("").trim();
        if input.is_empty() || !(line.is_empty() || line.starts_with('#')) {
            return Ok(());
        }
        till_line_ending.parse_next(input)?;
        opt(line_ending).parse_next(input)?;
    }
}

fn end_of_line(input: &mut &str) -> winnow::Result<()> {
    space0.parse_next(input)?;
    alt((line_ending.void(), eof.void())).parse_next(input)
}

fn identifier<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '-' || c == '_').parse_next(input)
}

fn quoted(input: &mut &str) -> winnow::Result<String> {
    "\"".parse_next(input)?;
    let text = take_till(0.., |c: char| c == '"' || c == '\n').parse_next(input)?;
    "\"".parse_next(input)?;
    Ok(text.to_string())
}

fn number(input: &mut &str) -> winnow::Result<f64> {
    let text = take_while(1.., |c: char| c.is_ascii_digit() || c == '.' || c == '-')
        .parse_next(input)?;
    text.parse::<f64>()
        .map_err(|_| winnow::error::ParserError::from_input(input))
}

fn default_line(input: &mut &str) -> winnow::Result<String> {
    space0.parse_next(input)?;
    "default".parse_next(input)?;
    space1.parse_next(input)?;
    let id = identifier.parse_next(input)?;
    end_of_line.parse_next(input)?;
    Ok(id.to_string())
}

fn diagram_block(input: &mut &str) -> winnow::Result<Diagram> {
    space0.parse_next(input)?;
    "diagram".parse_next(input)?;
    space1.parse_next(input)?;
    let id = identifier.parse_next(input)?.to_string();
    space1.parse_next(input)?;
    let title = quoted.parse_next(input)?;
    end_of_line.parse_next(input)?;

    let mut summary = None;
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    loop {
        skip_trivia(input)?;
        if input.is_empty() {
            // Unterminated block.
            return Err(winnow::error::ParserError::from_input(input));
        }
        let start = *input;
        space0.parse_next(input)?;
        if opt(("end", end_of_line)).parse_next(input)?.is_some() {
            break;
        }
        let line = alt((
            summary_line.map(DiagramLine::Summary),
            node_block.map(DiagramLine::Node),
            edge_line.map(DiagramLine::Edge),
        ))
        .parse_next(input);
        match line {
            Ok(DiagramLine::Summary(text)) => summary = Some(text),
            Ok(DiagramLine::Node(node)) => nodes.push(node),
            Ok(DiagramLine::Edge(edge)) => edges.push(edge),
            Err(e) => {
                *input = start;
                return Err(e);
            }
        }
    }

    Ok(Diagram {
        id,
        title,
        summary,
        nodes,
        edges,
    })
}

fn summary_line(input: &mut &str) -> winnow::Result<String> {
    "summary".parse_next(input)?;
    space1.parse_next(input)?;
    let text = quoted.parse_next(input)?;
    end_of_line.parse_next(input)?;
    Ok(text)
}

fn node_block(input: &mut &str) -> winnow::Result<DiagramNode> {
    "node".parse_next(input)?;
    space1.parse_next(input)?;
    let id = identifier.parse_next(input)?.to_string();
    space1.parse_next(input)?;
    let label = quoted.parse_next(input)?;
    space1.parse_next(input)?;
    "at".parse_next(input)?;
    space1.parse_next(input)?;
    let x = number.parse_next(input)?;
    ",".parse_next(input)?;
    space0.parse_next(input)?;
    let y = number.parse_next(input)?;
    let size = opt(size_clause).parse_next(input)?;
    end_of_line.parse_next(input)?;

    let lines: Vec<&str> = repeat(0.., description_line).parse_next(input)?;
    Ok(DiagramNode {
        id,
        label,
        description: lines.join(" "),
        position: Point::new(x, y),
        size,
    })
}

fn size_clause(input: &mut &str) -> winnow::Result<Size> {
    space1.parse_next(input)?;
    "size".parse_next(input)?;
    space1.parse_next(input)?;
    let width = number.parse_next(input)?;
    "x".parse_next(input)?;
    let height = number.parse_next(input)?;
    Ok(Size::new(width, height))
}

fn description_line<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    space0.parse_next(input)?;
    "|".parse_next(input)?;
    let text = till_line_ending.parse_next(input)?;
    opt(line_ending).parse_next(input)?;
    Ok(text.trim())
}

fn edge_line(input: &mut &str) -> winnow::Result<DiagramEdge> {
    "edge".parse_next(input)?;
    space1.parse_next(input)?;
    let from = identifier.parse_next(input)?.to_string();
    space0.parse_next(input)?;
    "->".parse_next(input)?;
    space0.parse_next(input)?;
    let to = identifier.parse_next(input)?.to_string();
    end_of_line.parse_next(input)?;
    Ok(DiagramEdge { from, to })
}

/// Failures raised by the selection controller.
///
/// Both not-found variants are recoverable: a host that only offers ids taken
/// from the catalog never sees them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewerError {
    #[error("diagram not found: {0}")]
    DiagramNotFound(String),

    #[error("node `{node}` not found in diagram `{diagram}`")]
    NodeNotFound { diagram: String, node: String },

    #[error("{control} is not supported by the {viewer} viewer")]
    Unsupported {
        viewer: &'static str,
        control: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("syntax error in catalog at line {line}: unexpected `{context}`")]
    Syntax { line: usize, context: String },

    #[error("catalog `{0}` has no diagrams")]
    Empty(String),

    #[error("duplicate diagram id `{0}`")]
    DuplicateDiagram(String),

    #[error("duplicate node id `{node}` in diagram `{diagram}`")]
    DuplicateNode { diagram: String, node: String },

    #[error("edge `{from}` -> `{to}` in diagram `{diagram}` references an unknown node")]
    DanglingEdge {
        diagram: String,
        from: String,
        to: String,
    },

    #[error("node `{node}` in diagram `{diagram}` has an invalid {field}: {value}")]
    InvalidGeometry {
        diagram: String,
        node: String,
        field: &'static str,
        value: f64,
    },

    #[error("default diagram `{0}` is not in the catalog")]
    UnknownDefault(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("syntax error in event script at line {line}: unexpected `{context}`")]
    Syntax { line: usize, context: String },

    #[error("event on line {line} failed: {source}")]
    Rejected {
        line: usize,
        #[source]
        source: ViewerError,
    },
}

/// Top-level error for the one-call entry points in the crate root.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

/// Shorten a source line for error messages.
pub(crate) fn error_context(rest: &str) -> String {
    let context = rest.lines().next().unwrap_or("").trim();
    if context.chars().count() > 40 {
        let cut: String = context.chars().take(40).collect();
        format!("{cut}...")
    } else {
        context.to_string()
    }
}

/// One-based line number of `rest` inside `input`, where `rest` is a suffix
/// of `input` left behind by a failed parse.
pub(crate) fn error_line(input: &str, rest: &str) -> usize {
    let consumed = input.len().saturating_sub(rest.len());
    input[..consumed].matches('\n').count() + 1
}

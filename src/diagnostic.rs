use std::fmt;

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    Primary,
    Secondary,
}

/// A label pointing at a span in the source.
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub style: LabelStyle,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }
}

/// Computes 1-based line and column from a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn line_content(source: &str, line_num: usize) -> Option<&str> {
    source.lines().nth(line_num.saturating_sub(1))
}

/// Renders diagnostics in rustc-like form.
pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self {
            source,
            file_name,
            use_color,
        }
    }

    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();

        let severity_str = match diagnostic.severity {
            Severity::Error => self.style("error", "1;31"),
            Severity::Warning => self.style("warning", "1;33"),
        };
        match &diagnostic.code {
            Some(code) => output.push_str(&format!(
                "{}[{}]: {}\n",
                severity_str,
                code,
                self.style(&diagnostic.message, "1")
            )),
            None => output.push_str(&format!(
                "{}: {}\n",
                severity_str,
                self.style(&diagnostic.message, "1")
            )),
        }

        // Labels with a dummy span carry no useful location.
        let located: Vec<&Label> = diagnostic
            .labels
            .iter()
            .filter(|label| !label.span.is_dummy())
            .collect();

        if let Some(first) = located.first() {
            let (line, col) = line_col(self.source, first.span.start);
            output.push_str(&format!(
                "  {} {}:{}:{}\n",
                self.style("-->", "34"),
                self.file_name,
                line,
                col
            ));

            let width = line.to_string().len();
            let gutter = format!("{} {}", " ".repeat(width + 1), self.style("|", "34"));
            output.push_str(&gutter);
            output.push('\n');

            for label in &located {
                let (label_line, start_col) = line_col(self.source, label.span.start);
                let content = line_content(self.source, label_line).unwrap_or("");
                output.push_str(&format!(
                    "{:>width$} {} {}\n",
                    self.style(&label_line.to_string(), "34"),
                    self.style("|", "34"),
                    content,
                    width = width + 1
                ));

                let underline_len = label
                    .span
                    .end
                    .saturating_sub(label.span.start)
                    .clamp(1, content.len().saturating_sub(start_col - 1).max(1));
                let marker = match label.style {
                    LabelStyle::Primary => "^".repeat(underline_len),
                    LabelStyle::Secondary => "-".repeat(underline_len),
                };
                let marker_color = match label.style {
                    LabelStyle::Primary => "31",
                    LabelStyle::Secondary => "34",
                };
                output.push_str(&format!(
                    "{} {}{}{} {}\n",
                    " ".repeat(width + 1),
                    self.style("|", "34"),
                    " ".repeat(start_col),
                    self.style(&marker, marker_color),
                    self.style(&label.message, marker_color)
                ));
            }

            output.push_str(&gutter);
            output.push('\n');
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("  {} {}\n", self.style("=", "34"), note));
        }

        output
    }

    fn style(&self, s: &str, ansi: &str) -> String {
        if self.use_color {
            format!("\x1b[{}m{}\x1b[0m", ansi, s)
        } else {
            s.to_string()
        }
    }
}

/// Renders a batch of diagnostics followed by an error-count summary line.
pub fn render_diagnostics(
    source: &str,
    file_name: &str,
    diagnostics: &[Diagnostic],
    use_color: bool,
) -> String {
    let renderer = DiagnosticRenderer::new(source, file_name, use_color);
    let mut output = String::new();

    for diagnostic in diagnostics {
        output.push_str(&renderer.render(diagnostic));
        output.push('\n');
    }

    let error_count = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    if error_count > 0 {
        output.push_str(&format!(
            "error: aborting due to {} error{}\n",
            error_count,
            if error_count == 1 { "" } else { "s" }
        ));
    }

    output
}

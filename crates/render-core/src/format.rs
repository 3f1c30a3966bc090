use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Target formats a report can be rendered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Html,
    Pdf,
    Spreadsheet,
    Chart,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Spreadsheet => "spreadsheet",
            OutputFormat::Chart => "chart",
        }
    }

    /// Infers the format from an output file name.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "html" | "htm" => Some(OutputFormat::Html),
            "pdf" => Some(OutputFormat::Pdf),
            "xlsx" | "xls" => Some(OutputFormat::Spreadsheet),
            "png" => Some(OutputFormat::Chart),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "pdf" => Ok(OutputFormat::Pdf),
            "xlsx" | "excel" | "spreadsheet" => Ok(OutputFormat::Spreadsheet),
            "chart" | "png" => Ok(OutputFormat::Chart),
            other => Err(format!("Unknown output format '{}'", other)),
        }
    }
}

//! Output formatting for the `wsman` command

use colored::Colorize;
use wsman::XmlDoc;

/// Prints response documents and diagnostics.
pub struct OutputFormatter {
    use_color: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();
        Self { use_color }
    }

    /// Print a response document, or the value selected by `xpath`.
    pub fn document(&self, doc: &XmlDoc, xpath: Option<&str>) {
        if let Some(expr) = xpath {
            match doc.xpath_value(expr) {
                Some(value) => println!("{}", value),
                None => self.warning(&format!("No match for {}", expr)),
            }
            return;
        }
        match doc.to_pretty_string() {
            Ok(xml) => println!("{}", xml),
            Err(e) => self.error(&format!("Failed to serialize response: {}", e)),
        }
    }

    /// Report a SOAP fault carried by `doc`.
    pub fn fault(&self, doc: &XmlDoc) {
        let subcode = doc.fault_subcode().unwrap_or_else(|| "unknown".to_string());
        let reason = doc.fault_reason().unwrap_or_default();
        if self.use_color {
            eprintln!("{} {} {}", "FAULT:".red().bold(), subcode.yellow(), reason);
        } else {
            eprintln!("FAULT: {} {}", subcode, reason);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }
}

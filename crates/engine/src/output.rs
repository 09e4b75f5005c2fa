use core_types::OutputData;

/// Turns a computed result into whatever the caller wants to hand on.
pub trait OutputFormatter: Send + Sync {
    type Output;

    fn format(&self, data: &OutputData) -> Self::Output;
}

/// Hands the result back unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityFormatter;

impl OutputFormatter for IdentityFormatter {
    type Output = OutputData;

    fn format(&self, data: &OutputData) -> OutputData {
        data.clone()
    }
}

/// Renders the result as JSON text in the store's wire shape.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl OutputFormatter for JsonFormatter {
    type Output = Result<String, serde_json::Error>;

    fn format(&self, data: &OutputData) -> Self::Output {
        if self.pretty {
            serde_json::to_string_pretty(data)
        } else {
            serde_json::to_string(data)
        }
    }
}

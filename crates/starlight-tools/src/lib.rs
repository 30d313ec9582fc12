//! Built-in tools served by starlight.
//!
//! Tools are declared once at boot through [`builtin_tools`]; the registry
//! is read-only afterwards.

pub mod echo;
pub mod mood;
pub mod star;

use starlight_mcp::Tool;

/// Every built-in tool, in the order `tools/list` reports them.
pub fn builtin_tools() -> Vec<Tool> {
    vec![
        echo::tool(),
        star::star_info_tool(),
        star::classify_tool(),
        mood::tool(),
    ]
}

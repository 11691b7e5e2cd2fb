// ABOUTME: Injection Formatter — deterministic rendering of a selected atom list into the payload handed back to the caller
// ABOUTME: Pure function of its inputs; same atoms in the same order always render byte-identical output

use crate::types::AtomicConstraint;

const ANCHOR_HEADER: &str = "<!-- constraint-activation:begin -->";
const ANCHOR_FOOTER: &str = "<!-- constraint-activation:end -->";

/// Renders a final, ordered atom selection into the text injected back
/// into the live interaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectionFormatter;

impl InjectionFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Empty input renders to an empty string — nothing to inject.
    pub fn render(&self, atoms: &[AtomicConstraint], interaction_number: u64) -> String {
        if atoms.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        out.push_str(ANCHOR_HEADER);
        out.push('\n');
        for atom in atoms {
            out.push_str("- **");
            out.push_str(atom.title());
            out.push_str("**\n");
            for reminder in atom.reminders() {
                out.push_str("  - ");
                out.push_str(reminder);
                out.push('\n');
            }
        }
        out.push_str(ANCHOR_FOOTER);
        out.push('\n');
        out.push_str(&format!("<!-- interaction: {interaction_number} -->\n"));
        out
    }
}

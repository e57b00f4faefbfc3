use crate::compute::ledger::{Ledger, Outcome};
use std::collections::HashMap;
use std::fmt::Write;

/// Renders the derivation of `target` as an indented tree.
///
/// Each line shows the node, its value, the strategy that produced it and the
/// strategy's compliance tags. A node reached a second time is printed as a
/// reference to the level where it first appeared.
pub fn format_trace(ledger: &Ledger, target: &str) -> String {
    let mut tracer = Tracer { ledger, visited_at_level: HashMap::new(), output: String::new() };

    let _ = writeln!(tracer.output, "AUDIT TRACE for '{}':", target);
    let _ = writeln!(tracer.output, "--------------------------------------------------");
    tracer.trace_node(target, 1, "");

    if let Some(compliance) = ledger.derivation_compliance(target) {
        let _ = writeln!(tracer.output, "--------------------------------------------------");
        let _ = writeln!(tracer.output, "Complies with: {}", compliance);
    }
    tracer.output
}

struct Tracer<'a> {
    ledger: &'a Ledger,
    visited_at_level: HashMap<&'a str, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_node(&mut self, name: &'a str, level: usize, prefix: &str) {
        if let Some(&first_seen) = self.visited_at_level.get(name) {
            let _ = writeln!(self.output, "{}{} -> (Ref to L{})", prefix, name, first_seen);
            return;
        }
        self.visited_at_level.insert(name, level);

        let ledger = self.ledger;
        match ledger.get(name) {
            None => {
                let _ = writeln!(self.output, "{}[L{}] {} [?] (not evaluated)", prefix, level, name);
            }
            Some(Outcome::Unavailable) => {
                let _ = writeln!(self.output, "{}[L{}] {} [unavailable]", prefix, level, name);
            }
            Some(Outcome::Resolved { value, provenance }) => {
                if provenance.is_client_input() {
                    let _ = writeln!(self.output, "{}[L{}] {} [{}] <- {}", prefix, level, name, value, provenance.label);
                    return;
                }
                let _ = writeln!(
                    self.output,
                    "{}[L{}] {} [{}] = {} {}",
                    prefix, level, name, value, provenance.label, provenance.compliance
                );
                self.recurse_children(prefix, &provenance.inputs, level);
            }
        }
    }

    fn recurse_children(&mut self, prefix: &str, children: &'a [String], level: usize) {
        let stem = build_child_stem(prefix);
        for (i, child) in children.iter().enumerate() {
            let connector = if i == children.len() - 1 { "`--" } else { "|--" };
            let full_prefix = format!("{}{}", stem, connector);
            self.trace_node(child, level + 1, &full_prefix);
        }
    }
}

fn build_child_stem(current_prefix: &str) -> String {
    current_prefix.replace("`--", "   ").replace("|--", "|  ")
}

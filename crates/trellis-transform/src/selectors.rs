use ecow::{EcoString, eco_format};
use trellis_library::Node;

/// Collect the CSS selectors a stylesheet could target in a transformed
/// tree.
///
/// Yields class selectors for every class starting with `<prefix>-` and an
/// attribute selector for every `data-*` attribute. The result is
/// deduplicated and ordered blocks first, then modifiers, then elements,
/// then attributes; lexically within each group.
pub fn extract_selectors(node: &Node, prefix: &str) -> Vec<EcoString> {
    let mut selectors = Vec::new();
    collect(node, &eco_format!("{prefix}-"), &mut selectors);
    selectors.sort_by(|a, b| kind(a).cmp(&kind(b)).then_with(|| a.cmp(b)));
    selectors.dedup();
    selectors
}

fn collect(node: &Node, prefix: &str, selectors: &mut Vec<EcoString>) {
    match node {
        Node::Array(nodes) => nodes.iter().for_each(|node| collect(node, prefix, selectors)),
        Node::Element(elem) => {
            if let Some(class) = elem.attr("class") {
                selectors.extend(
                    class
                        .split_whitespace()
                        .filter(|class| class.starts_with(prefix))
                        .map(|class| eco_format!(".{class}")),
                );
            }
            selectors.extend(
                elem.attrs
                    .iter()
                    .filter(|(key, _)| key.starts_with("data-"))
                    .map(|(key, value)| eco_format!("[{key}=\"{value}\"]")),
            );
            for child in &elem.children {
                collect(child, prefix, selectors);
            }
        }
        _ => {}
    }
}

fn kind(selector: &str) -> u8 {
    if selector.starts_with('[') {
        3
    } else if selector.contains("__") {
        2
    } else if selector.contains("--") {
        1
    } else {
        0
    }
}

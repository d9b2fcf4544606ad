/// The HTML→markdown conversion step.
///
/// Deliberately a minimal seam: a deterministic pure function from an HTML
/// string to a markdown string, with no side effects. The transformer and
/// assembler only depend on this trait, so the conversion backend can be
/// swapped without touching the pipeline. Structural fidelity (headings,
/// links, images, code blocks, paragraphs) is what matters; byte-identical
/// output is not a goal.
pub trait MarkupConverter: Send + Sync {
    fn convert(&self, html: &str) -> String;
}

/// Default converter backed by the `html2md` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Html2md;

impl MarkupConverter for Html2md {
    fn convert(&self, html: &str) -> String {
        html2md::parse_html(html)
    }
}
